//! 翻译缓存模块
//!
//! 以 (目标语言, 原文) 为键的会话级记忆表。条目只增不删，没有过期和容量
//! 上限：一个页面会话内出现的不同文本数量有限，长时间运行的进程需要自行
//! 替换缓存实例。

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::translation::language::TargetLanguage;

// ============================================================================
// 核心类型
// ============================================================================

/// 缓存键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub language: TargetLanguage,
    pub text: String,
}

/// 缓存统计信息
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_entries: usize,
}

/// 翻译缓存
///
/// 由翻译器和编排器通过 `Arc` 共享，同一实例可以服务多个根节点。
#[derive(Debug, Default)]
pub struct TranslationCache {
    entries: RwLock<HashMap<CacheKey, String>>,
    stats: RwLock<CacheStats>,
}

// ============================================================================
// 实现
// ============================================================================

impl CacheKey {
    pub fn new(language: &TargetLanguage, text: &str) -> Self {
        Self {
            language: language.clone(),
            text: text.to_string(),
        }
    }
}

impl TranslationCache {
    /// 创建新的翻译缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 查询译文
    pub fn get(&self, language: &TargetLanguage, text: &str) -> Option<String> {
        let key = CacheKey::new(language, text);
        let found = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();

        let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        stats.total_requests += 1;
        if found.is_some() {
            stats.cache_hits += 1;
        } else {
            stats.cache_misses += 1;
        }

        found
    }

    /// 写入译文，已有条目被覆盖
    pub fn put(&self, language: &TargetLanguage, text: &str, translated: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(CacheKey::new(language, text), translated.to_string());
    }

    /// 是否包含指定条目（不计入统计）
    pub fn contains(&self, language: &TargetLanguage, text: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&CacheKey::new(language, text))
    }

    /// 获取缓存大小
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 获取统计信息
    pub fn stats(&self) -> CacheStats {
        let mut result = self
            .stats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        result.total_entries = self.len();
        result
    }

    /// 获取缓存命中率
    pub fn hit_rate(&self) -> f64 {
        self.stats().hit_rate()
    }
}

impl CacheStats {
    /// 计算缓存命中率
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }
}
