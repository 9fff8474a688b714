//! # 解析器模块
//!
//! HTML 解析、活动文档、选择器匹配和序列化。

pub mod html;

// Re-export commonly used items for convenience
pub use html::{get_charset, html_to_dom, serialize_document, set_charset, LiveDocument};
