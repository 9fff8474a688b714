//! 目标语言解析器
//!
//! 按固定顺序检查信号，第一个能映射为支持语言的信号胜出：
//! 持久化偏好 → 首选区域列表 → 旧式区域 → 格式化区域 → 时区 → 默认语言。

use std::fmt;

use super::signals::EnvironmentSignals;
use super::tables::{map_locale_to_language, map_timezone_to_language};
use super::TargetLanguage;

/// 决定结果的信号类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSource {
    Preference,
    PreferredLocale,
    LegacyLocale,
    FormattingLocale,
    TimeZone,
    Default,
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalSource::Preference => "persisted preference",
            SignalSource::PreferredLocale => "preferred locale",
            SignalSource::LegacyLocale => "legacy locale",
            SignalSource::FormattingLocale => "formatting locale",
            SignalSource::TimeZone => "time zone",
            SignalSource::Default => "default",
        };
        f.write_str(name)
    }
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub language: TargetLanguage,
    pub source: SignalSource,
    /// 命中的原始信号值
    pub signal: Option<String>,
}

/// 语言解析器
pub struct LanguageResolver {
    signals: Box<dyn EnvironmentSignals>,
    default_language: TargetLanguage,
}

impl LanguageResolver {
    /// 创建解析器，默认语言为 `en`
    pub fn new(signals: impl EnvironmentSignals + 'static) -> Self {
        Self {
            signals: Box::new(signals),
            default_language: TargetLanguage::fallback(),
        }
    }

    /// 设置兜底语言
    pub fn with_default(mut self, default_language: TargetLanguage) -> Self {
        self.default_language = default_language;
        self
    }

    pub fn default_language(&self) -> &TargetLanguage {
        &self.default_language
    }

    /// 解析目标语言，从不失败
    pub fn resolve(&self) -> TargetLanguage {
        self.resolve_detailed().language
    }

    /// 解析目标语言并报告来源
    pub fn resolve_detailed(&self) -> Resolution {
        let resolution = self.walk_chain();
        tracing::debug!(
            "解析目标语言: {} (来源: {}, 信号: {:?})",
            resolution.language,
            resolution.source,
            resolution.signal
        );
        resolution
    }

    fn walk_chain(&self) -> Resolution {
        if let Some(preference) = self.signals.persisted_preference() {
            match TargetLanguage::new(&preference) {
                Ok(language) => {
                    return Resolution {
                        language,
                        source: SignalSource::Preference,
                        signal: Some(preference),
                    }
                }
                Err(_) => tracing::debug!("忽略无效的语言偏好: {:?}", preference),
            }
        }

        if let Some(found) = Self::first_mapped(self.signals.preferred_locales(), |_| true) {
            return Self::found(found, SignalSource::PreferredLocale);
        }

        if let Some(found) = Self::first_mapped(self.signals.legacy_locales(), |_| true) {
            return Self::found(found, SignalSource::LegacyLocale);
        }

        // 映射到默认语言的格式化区域通常只是运行时默认值，不具备信息量
        let default = self.default_language.as_str();
        if let Some(found) =
            Self::first_mapped(self.signals.formatting_locales(), |code| code != default)
        {
            return Self::found(found, SignalSource::FormattingLocale);
        }

        if let Some(zone) = self.signals.time_zone() {
            if let Some(language) = map_timezone_to_language(&zone)
                .and_then(|code| TargetLanguage::new(code).ok())
            {
                return Resolution {
                    language,
                    source: SignalSource::TimeZone,
                    signal: Some(zone),
                };
            }
        }

        Resolution {
            language: self.default_language.clone(),
            source: SignalSource::Default,
            signal: None,
        }
    }

    fn first_mapped<F>(locales: Vec<String>, accept: F) -> Option<(TargetLanguage, String)>
    where
        F: Fn(&str) -> bool,
    {
        locales.into_iter().find_map(|locale| {
            let code = map_locale_to_language(&locale).filter(|code| accept(code))?;
            TargetLanguage::new(code).ok().map(|language| (language, locale))
        })
    }

    fn found((language, signal): (TargetLanguage, String), source: SignalSource) -> Resolution {
        Resolution {
            language,
            source,
            signal: Some(signal),
        }
    }
}
