//! 存储模块
//!
//! 会话级翻译缓存。

pub mod cache;

pub use cache::{CacheKey, CacheStats, TranslationCache};
