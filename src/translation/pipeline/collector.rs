//! 文本收集器模块
//!
//! 从活动 DOM 子树中收集需要翻译的文本节点和属性。每一轮翻译都重新收集，
//! 结果只反映调用时刻的树。

use markup5ever_rcdom::{Handle, NodeData};

use crate::parsers::html::dom::{
    ancestors, get_node_attr, get_node_name, get_text, is_attached, is_inclusive_descendant,
    same_node,
};
use crate::translation::config::{constants, MarkerConfig};

/// 翻译单元类型
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// 文本节点内容
    Text,
    /// 元素属性
    Attribute(String),
}

/// 一个可翻译的位置及其收集时的原始值
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    /// 文本节点，或属性所在的元素
    pub node: Handle,
    /// 收集时所在的翻译根
    pub root: Handle,
    pub kind: UnitKind,
    /// 收集时的完整值（文本节点未去除首尾空白）
    pub original: String,
}

impl TranslationUnit {
    pub fn text(root: Handle, node: Handle, original: String) -> Self {
        Self {
            node,
            root,
            kind: UnitKind::Text,
            original,
        }
    }

    pub fn attribute(root: Handle, element: Handle, name: String, original: String) -> Self {
        Self {
            node: element,
            root,
            kind: UnitKind::Attribute(name),
            original,
        }
    }

    /// 属性名，文本单元返回 `None`
    pub fn attr_name(&self) -> Option<&str> {
        match &self.kind {
            UnitKind::Text => None,
            UnitKind::Attribute(name) => Some(name),
        }
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, UnitKind::Attribute(_))
    }

    /// 发送给翻译服务的文本
    pub fn source_text(&self) -> &str {
        self.original.trim()
    }

    /// 读取该位置当前的值
    pub fn read_live(&self) -> Option<String> {
        match &self.kind {
            UnitKind::Text => get_text(&self.node),
            UnitKind::Attribute(name) => get_node_attr(&self.node, name),
        }
    }
}

/// 一次收集的结果
#[derive(Debug, Clone, Default)]
pub struct CollectedUnits {
    pub text_units: Vec<TranslationUnit>,
    pub attribute_units: Vec<TranslationUnit>,
}

impl CollectedUnits {
    pub fn len(&self) -> usize {
        self.text_units.len() + self.attribute_units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 文本单元在前，属性单元在后
    pub fn into_units(self) -> Vec<TranslationUnit> {
        let mut units = self.text_units;
        units.extend(self.attribute_units);
        units
    }
}

/// 文本收集器配置
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 排除标记
    pub exclude_attr: String,
    pub exclude_value: String,
    /// 同时识别 `translate="no"`
    pub honor_standard_translate: bool,
    /// 属性翻译声明
    pub attr_list_attr: String,
    /// 跳过的元素标签
    pub skip_elements: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self::from(&MarkerConfig::default())
    }
}

impl From<&MarkerConfig> for CollectorConfig {
    fn from(markers: &MarkerConfig) -> Self {
        Self {
            exclude_attr: markers.exclude_attr.clone(),
            exclude_value: markers.exclude_value.clone(),
            honor_standard_translate: markers.honor_standard_translate,
            attr_list_attr: markers.attr_list_attr.clone(),
            skip_elements: markers
                .skip_tags
                .iter()
                .map(|tag| tag.to_ascii_lowercase())
                .collect(),
        }
    }
}

/// DOM文本收集器
#[derive(Debug, Clone, Default)]
pub struct DomTextCollector {
    config: CollectorConfig,
    stats: CollectionStats,
}

impl DomTextCollector {
    /// 创建新的文本收集器
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            config,
            stats: CollectionStats::default(),
        }
    }

    /// 收集 `root` 子树中的翻译单元
    ///
    /// `root` 不在 `document` 树上时返回空结果。
    pub fn collect(&mut self, root: &Handle, document: &Handle) -> CollectedUnits {
        self.stats.reset();

        let mut units = CollectedUnits::default();
        if !is_attached(root, document) {
            tracing::debug!("翻译根节点已脱离文档，跳过收集");
            return units;
        }

        self.collect_recursive(root, root, true, &mut units);

        self.stats.text_units = units.text_units.len();
        self.stats.attribute_units = units.attribute_units.len();
        units
    }

    /// 递归收集
    ///
    /// `text_allowed` 在进入排除区域或跳过元素后变为 false，属性声明不受影响。
    fn collect_recursive(
        &mut self,
        root: &Handle,
        node: &Handle,
        text_allowed: bool,
        units: &mut CollectedUnits,
    ) {
        self.stats.nodes_visited += 1;

        match node.data {
            NodeData::Text { ref contents } => {
                if !text_allowed {
                    return;
                }
                let text = contents.borrow().to_string();
                if !text.trim().is_empty() {
                    units
                        .text_units
                        .push(TranslationUnit::text(root.clone(), node.clone(), text));
                }
            }
            NodeData::Element { .. } => {
                let mut text_allowed = text_allowed;

                if self.should_skip_element(node) {
                    if text_allowed {
                        self.stats.skipped_elements += 1;
                    }
                    text_allowed = false;
                } else if text_allowed && self.is_excluded(node) {
                    self.stats.excluded_subtrees += 1;
                    text_allowed = false;
                }

                self.collect_element_attributes(root, node, units);

                for child in node.children.borrow().iter() {
                    self.collect_recursive(root, child, text_allowed, units);
                }
            }
            _ => {
                for child in node.children.borrow().iter() {
                    self.collect_recursive(root, child, text_allowed, units);
                }
            }
        }
    }

    /// 收集元素声明的属性
    fn collect_element_attributes(&mut self, root: &Handle, node: &Handle, units: &mut CollectedUnits) {
        let Some(declared) = get_node_attr(node, &self.config.attr_list_attr) else {
            return;
        };

        for attr_name in parse_attr_list(&declared) {
            match get_node_attr(node, &attr_name) {
                Some(value) if !value.trim().is_empty() => {
                    units
                        .attribute_units
                        .push(TranslationUnit::attribute(
                            root.clone(),
                            node.clone(),
                            attr_name,
                            value,
                        ));
                }
                _ => {}
            }
        }
    }

    /// 判断收集到的单元此刻是否仍可写回
    ///
    /// 根和单元都必须仍在文档上，且单元仍在根的子树中。文本单元另外要求
    /// 从父元素到根（含）之间没有跳过元素和排除标记；属性单元不受排除标记影响。
    pub fn is_writable(&self, unit: &TranslationUnit, document: &Handle) -> bool {
        if !is_attached(&unit.root, document) {
            return false;
        }
        if unit.is_attribute() {
            return is_inclusive_descendant(&unit.node, &unit.root);
        }

        for ancestor in ancestors(&unit.node) {
            if self.should_skip_element(&ancestor) || self.is_excluded(&ancestor) {
                return false;
            }
            if same_node(&ancestor, &unit.root) {
                return true;
            }
        }
        false
    }

    /// 检查元素是否带有排除标记
    fn is_excluded(&self, node: &Handle) -> bool {
        if get_node_attr(node, &self.config.exclude_attr)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case(&self.config.exclude_value))
        {
            return true;
        }

        self.config.honor_standard_translate
            && get_node_attr(node, constants::STANDARD_EXCLUDE_ATTR).is_some_and(|value| {
                value
                    .trim()
                    .eq_ignore_ascii_case(constants::STANDARD_EXCLUDE_VALUE)
            })
    }

    /// 检查是否应该跳过元素
    fn should_skip_element(&self, node: &Handle) -> bool {
        get_node_name(node).is_some_and(|tag| {
            self.config
                .skip_elements
                .iter()
                .any(|skip| skip.eq_ignore_ascii_case(tag))
        })
    }

    /// 获取最近一次收集的统计信息
    pub fn stats(&self) -> &CollectionStats {
        &self.stats
    }
}

/// 解析 `data-translate-attr="title, alt"`：去空白、忽略空项、去重并保持顺序
pub fn parse_attr_list(value: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let name = name.to_ascii_lowercase();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// 收集统计信息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionStats {
    pub nodes_visited: usize,
    pub skipped_elements: usize,
    pub excluded_subtrees: usize,
    pub text_units: usize,
    pub attribute_units: usize,
}

impl CollectionStats {
    /// 重置统计
    pub fn reset(&mut self) {
        *self = Default::default();
    }

    pub fn total_units(&self) -> usize {
        self.text_units + self.attribute_units
    }
}
