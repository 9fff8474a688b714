//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作
//! - `observer`: 活动文档和变更观察
//! - `selector`: 翻译根选择器
//! - `serializer`: 字符集处理与序列化

pub mod dom;
pub mod observer;
pub mod selector;
pub mod serializer;

// 重新导出主要的公共 API
pub use dom::{
    get_child_node_by_name, get_node_attr, get_node_name, get_parent_node, get_text, html_to_dom,
    set_node_attr,
};
pub use observer::{
    LiveDocument, MutationKind, MutationObserver, MutationRecord, ObserveOptions, ObserverHandle,
};
pub use selector::SelectorList;
pub use serializer::{get_charset, serialize_document, set_charset};
