//! # Autotranslate
//!
//! 活动 HTML 文档的自动翻译引擎：发现文本节点、缓存译文、随 DOM 变更重新
//! 翻译，并从环境信号推断目标语言。
//!
//! ## 模块组织
//!
//! - `core` - 文档级入口（解析、翻译、序列化）
//! - `env` - 环境变量注册表
//! - `parsers` - HTML 解析、活动文档与变更观察
//! - `translation` - 语言解析、翻译器、缓存与编排器

pub mod core;
pub mod env;
pub mod parsers;
pub mod translation;

// Re-export commonly used items for convenience
pub use self::core::*;
pub use parsers::*;
