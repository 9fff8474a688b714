//! 翻译管道模块
//!
//! 提供文本处理管道：从活动 DOM 收集翻译单元，过滤不需要翻译的文本

pub mod collector;
pub mod filters;

// 重新导出主要类型
pub use collector::{
    parse_attr_list, CollectedUnits, CollectionStats, CollectorConfig, DomTextCollector,
    TranslationUnit, UnitKind,
};
pub use filters::TextFilter;
