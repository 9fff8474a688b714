//! 翻译器
//!
//! 对调用方不可失败：缓存未命中时向后端发出一次请求，成功写入缓存，
//! 任何失败都回退为原文并记录日志。

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::translation::error::{helpers::log_error, TranslationResult};
use crate::translation::language::TargetLanguage;
use crate::translation::pipeline::filters::TextFilter;
use crate::translation::storage::TranslationCache;

/// 翻译后端
///
/// 实现方只负责一次请求，缓存和失败回退由 [`Translator`] 处理。
#[async_trait(?Send)]
pub trait TranslationBackend {
    /// 把 `text` 从自动检测的源语言翻译为 `target`
    async fn translate(&self, text: &str, target: &TargetLanguage) -> TranslationResult<String>;

    /// 后端名称，用于日志
    fn backend_name(&self) -> &str;
}

/// 翻译器统计
#[derive(Debug, Default)]
struct TranslatorStats {
    requests: AtomicU64,
    skipped: AtomicU64,
    cache_hits: AtomicU64,
    backend_calls: AtomicU64,
    failures: AtomicU64,
}

/// 统计快照
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslatorStatsSnapshot {
    pub requests: u64,
    pub skipped: u64,
    pub cache_hits: u64,
    pub backend_calls: u64,
    pub failures: u64,
}

/// 带缓存的翻译器
pub struct Translator {
    backend: Rc<dyn TranslationBackend>,
    cache: Arc<TranslationCache>,
    filter: TextFilter,
    stats: TranslatorStats,
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("backend", &self.backend.backend_name())
            .field("cache_entries", &self.cache.len())
            .finish()
    }
}

impl Translator {
    pub fn new(backend: Rc<dyn TranslationBackend>, cache: Arc<TranslationCache>) -> Self {
        Self {
            backend,
            cache,
            filter: TextFilter::new(),
            stats: TranslatorStats::default(),
        }
    }

    /// 从具体后端创建
    pub fn with_backend(backend: impl TranslationBackend + 'static, cache: Arc<TranslationCache>) -> Self {
        Self::new(Rc::new(backend), cache)
    }

    pub fn cache(&self) -> &Arc<TranslationCache> {
        &self.cache
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    /// 翻译文本，失败时返回原文
    pub async fn translate(&self, text: &str, language: &TargetLanguage) -> String {
        self.stats.requests.fetch_add(1, Ordering::Relaxed);

        if !self.filter.should_translate(text) {
            self.stats.skipped.fetch_add(1, Ordering::Relaxed);
            return text.to_string();
        }

        if let Some(cached) = self.cache.get(language, text) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            return cached;
        }

        self.stats.backend_calls.fetch_add(1, Ordering::Relaxed);
        match self.backend.translate(text, language).await {
            Ok(translated) if !translated.trim().is_empty() => {
                self.cache.put(language, text, &translated);
                // 译文再次送来翻译时保持不变
                let settled = translated.trim();
                if settled != text && !self.cache.contains(language, settled) {
                    self.cache.put(language, settled, settled);
                }
                translated
            }
            Ok(_) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("{} 返回空译文，保留原文: {:?}", self.backend_name(), text);
                text.to_string()
            }
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                log_error(&e.with_context(format!("{} -> {}", self.backend_name(), language)));
                text.to_string()
            }
        }
    }

    pub fn stats(&self) -> TranslatorStatsSnapshot {
        TranslatorStatsSnapshot {
            requests: self.stats.requests.load(Ordering::Relaxed),
            skipped: self.stats.skipped.load(Ordering::Relaxed),
            cache_hits: self.stats.cache_hits.load(Ordering::Relaxed),
            backend_calls: self.stats.backend_calls.load(Ordering::Relaxed),
            failures: self.stats.failures.load(Ordering::Relaxed),
        }
    }
}
