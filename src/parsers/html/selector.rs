//! 简单选择器
//!
//! 支持逗号分隔的复合选择器：`tag`、`#id`、`.class`、`[attr]`、`[attr=value]`
//! 及其组合（如 `main.content[data-page]`）。不支持组合符和伪类。

use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, Token};
use markup5ever_rcdom::Handle;

use super::dom::{find_elements, get_node_attr, get_node_name};
use crate::translation::error::{helpers::validation_error, TranslationError, TranslationResult};

type SelectorParseError<'i> = ParseError<'i, String>;

/// 单个复合选择器
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, Option<String>)>,
}

/// 选择器列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<CompoundSelector>,
}

fn invalid(selector: &str, reason: &str) -> TranslationError {
    validation_error(format!("无效的选择器 {:?}: {}", selector, reason))
}

fn describe(error: SelectorParseError<'_>) -> String {
    match error.kind {
        ParseErrorKind::Custom(reason) => reason,
        ParseErrorKind::Basic(kind) => format!("{:?}", kind),
    }
}

/// 解析 `[attr]` 或 `[attr=value]` 方括号内的部分
fn parse_attribute<'i>(
    block: &mut Parser<'i, '_>,
) -> Result<(String, Option<String>), SelectorParseError<'i>> {
    let name = match block.next().ok().cloned() {
        Some(Token::Ident(name)) => name.to_ascii_lowercase(),
        _ => return Err(block.new_custom_error("无效的属性名".to_string())),
    };
    if block.is_exhausted() {
        return Ok((name, None));
    }

    match block.next().ok().cloned() {
        Some(Token::Delim('=')) => {}
        _ => return Err(block.new_custom_error("只支持 [attr] 和 [attr=value]".to_string())),
    }

    let start = block.position();
    let value = match block.next().ok().cloned() {
        Some(Token::QuotedString(value)) | Some(Token::Ident(value)) => value.to_string(),
        Some(Token::Number { .. }) | Some(Token::Dimension { .. }) => {
            block.slice_from(start).trim().to_string()
        }
        _ => return Err(block.new_custom_error("无效的属性值".to_string())),
    };
    Ok((name, Some(value)))
}

impl CompoundSelector {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, SelectorParseError<'i>> {
        let mut selector = CompoundSelector::default();
        let mut empty = true;

        loop {
            let token = match parser.next_including_whitespace() {
                Ok(token) => token.clone(),
                Err(_) => break,
            };

            match token {
                Token::WhiteSpace(_) if empty => continue,
                Token::WhiteSpace(_) => {
                    if parser.is_exhausted() {
                        break;
                    }
                    return Err(parser.new_custom_error("不支持组合符".to_string()));
                }
                Token::Ident(tag) if empty => selector.tag = Some(tag.to_ascii_lowercase()),
                Token::Delim('*') if empty => {}
                Token::IDHash(id) | Token::Hash(id) => selector.id = Some(id.to_string()),
                Token::Delim('.') => match parser.next_including_whitespace().ok().cloned() {
                    Some(Token::Ident(class)) => selector.classes.push(class.to_string()),
                    _ => return Err(parser.new_custom_error("空的 class".to_string())),
                },
                Token::SquareBracketBlock => {
                    let start = parser.position();
                    let attr = parser.parse_nested_block(parse_attribute)?;
                    if !parser.slice_from(start).ends_with(']') {
                        return Err(parser.new_custom_error("缺少 ]".to_string()));
                    }
                    selector.attrs.push(attr);
                }
                other => {
                    return Err(parser.new_custom_error(format!("不支持的记号 {:?}", other)));
                }
            }
            empty = false;
        }

        if empty {
            return Err(parser.new_custom_error("空的选择器".to_string()));
        }
        Ok(selector)
    }

    /// 判断元素是否匹配
    pub fn matches(&self, node: &Handle) -> bool {
        let Some(name) = get_node_name(node) else {
            return false;
        };

        if self.tag.as_deref().is_some_and(|tag| !tag.eq_ignore_ascii_case(name)) {
            return false;
        }

        if let Some(id) = &self.id {
            if get_node_attr(node, "id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }

        if !self.classes.is_empty() {
            let class_attr = get_node_attr(node, "class").unwrap_or_default();
            let classes: Vec<&str> = class_attr.split_whitespace().collect();
            if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
                return false;
            }
        }

        self.attrs.iter().all(|(name, expected)| {
            match (get_node_attr(node, name), expected) {
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == *expected,
                (None, _) => false,
            }
        })
    }
}

impl SelectorList {
    /// 解析逗号分隔的选择器
    pub fn parse(input: &str) -> TranslationResult<Self> {
        let mut css = ParserInput::new(input);
        let mut parser = Parser::new(&mut css);
        let selectors = parser
            .parse_comma_separated(|item| CompoundSelector::parse(item))
            .map_err(|e| invalid(input, &describe(e)))?;

        Ok(Self { selectors })
    }

    pub fn matches(&self, node: &Handle) -> bool {
        self.selectors.iter().any(|selector| selector.matches(node))
    }

    /// 按文档顺序返回 `root` 子树中（含根）所有匹配的元素
    pub fn select_all(&self, root: &Handle) -> Vec<Handle> {
        let mut found = Vec::new();
        find_elements(root, &|node| self.matches(node), &mut found);
        found
    }
}
