//! 文本过滤器模块
//!
//! 判断一段文本是否值得发起翻译请求。过滤掉的文本原样保留。

use std::sync::OnceLock;

use regex::Regex;

/// 文本过滤器
#[derive(Debug, Default)]
pub struct TextFilter {
    /// 缓存的正则表达式
    regex_cache: RegexCache,
}

/// 正则表达式缓存
#[derive(Debug, Default)]
struct RegexCache {
    url_regex: OnceLock<Option<Regex>>,
    email_regex: OnceLock<Option<Regex>>,
}

impl TextFilter {
    /// 创建新的文本过滤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 判断文本是否需要翻译
    pub fn should_translate(&self, text: &str) -> bool {
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return false;
        }

        // 价格、时间、电话号码之类没有字母的内容
        if self.is_pure_symbols_or_numbers(trimmed) || !trimmed.chars().any(char::is_alphabetic)
        {
            return false;
        }

        if self.is_url(trimmed) || self.is_email(trimmed) {
            return false;
        }

        true
    }

    /// 检查是否为URL
    fn is_url(&self, text: &str) -> bool {
        if text.contains(char::is_whitespace) {
            return false;
        }

        if text.starts_with("http://") || text.starts_with("https://") || text.starts_with("www.")
        {
            return true;
        }

        self.regex_cache
            .url_regex
            .get_or_init(|| Regex::new(r"^(https?|ftp)://[^\s]+$").ok())
            .as_ref()
            .is_some_and(|re| re.is_match(text))
    }

    /// 检查是否为邮箱
    fn is_email(&self, text: &str) -> bool {
        if text.len() > 100 || !text.contains('@') || !text.contains('.') {
            return false;
        }

        self.regex_cache
            .email_regex
            .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok())
            .as_ref()
            .is_some_and(|re| re.is_match(text))
    }

    /// 检查是否为纯符号或数字
    fn is_pure_symbols_or_numbers(&self, text: &str) -> bool {
        text.chars()
            .all(|c| c.is_numeric() || c.is_ascii_punctuation() || c.is_whitespace())
    }
}
