//! 翻译模块
//!
//! 活动文档的自动翻译，按职责拆分为：
//! - **core**: 翻译后端、翻译器、轮次调度和编排器
//! - **language**: 目标语言解析与用户偏好
//! - **pipeline**: 文本收集和过滤
//! - **storage**: 翻译缓存
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use std::sync::Arc;
//!
//! use autotranslate::parsers::html::LiveDocument;
//! use autotranslate::translation::{
//!     AutoTranslateConfig, LanguageResolver, MockBackend, StaticSignals, TranslationCache,
//!     TranslationOrchestrator, Translator,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let document = LiveDocument::parse("<body><div>Hello</div></body>")?;
//! let translator = Translator::with_backend(MockBackend::suffix(), Arc::new(TranslationCache::new()));
//! let resolver = LanguageResolver::new(StaticSignals::new().with_time_zone("Europe/Moscow"));
//!
//! let mut orchestrator = TranslationOrchestrator::new(
//!     document,
//!     Rc::new(translator),
//!     resolver,
//!     AutoTranslateConfig::default(),
//! );
//! orchestrator.activate("body")?;
//! orchestrator.wait_for_passes(1).await?;
//! orchestrator.deactivate();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 配置管理模块 - 端点、语言、调度和标记约定
pub mod config;

/// 核心模块 - 翻译器与编排器
pub mod core;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 语言解析模块 - 环境信号、回退链和持久化偏好
pub mod language;

/// 文本处理管道模块 - 文本收集与过滤
pub mod pipeline;

/// 存储模块 - 翻译缓存
pub mod storage;

// ============================================================================
// 核心API导出
// ============================================================================

pub use config::{constants, AutoTranslateConfig, ConfigManager};
pub use self::core::{
    GoogleTranslateBackend, MockBackend, MockMode, OrchestratorState, PassStats, RootTarget,
    TranslationBackend, TranslationOrchestrator, Translator,
};
pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};
pub use language::{
    EnvironmentSignals, LanguagePreference, LanguageResolver, PreferenceStore, ProcessEnvironment,
    Resolution, SignalSource, StaticSignals, TargetLanguage,
};
pub use pipeline::{CollectedUnits, DomTextCollector, TextFilter, TranslationUnit};
pub use storage::{CacheStats, TranslationCache};

/// 检查文本是否需要翻译（便利函数）
///
/// ```rust
/// use autotranslate::translation::should_translate;
///
/// assert!(should_translate("Hello World"));
/// assert!(!should_translate("123"));
/// assert!(!should_translate("   "));
/// ```
pub fn should_translate(text: &str) -> bool {
    TextFilter::new().should_translate(text)
}
