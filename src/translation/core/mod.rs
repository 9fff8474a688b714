//! 核心翻译模块
//!
//! 包含翻译后端、带缓存的翻译器、轮次调度器和编排器。

pub mod google;
pub mod mock;
pub mod orchestrator;
pub mod scheduler;
pub mod translator;

pub use google::GoogleTranslateBackend;
pub use mock::{MockBackend, MockMode};
pub use orchestrator::{OrchestratorState, PassStats, RootTarget, TranslationOrchestrator};
pub use scheduler::{PassScheduler, PassState, SchedulerAction};
pub use translator::{TranslationBackend, Translator, TranslatorStatsSnapshot};
