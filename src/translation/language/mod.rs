//! 目标语言解析模块
//!
//! 从环境信号（持久化偏好、首选区域列表、格式化区域、时区）推断翻译目标
//! 语言，失败时逐级回退，最终落到默认语言。

pub mod preference;
pub mod resolver;
pub mod signals;
pub mod tables;

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::translation::config::constants;
use crate::translation::error::{TranslationError, TranslationResult};

pub use preference::{LanguagePreference, PreferenceStore};
pub use resolver::{LanguageResolver, Resolution, SignalSource};
pub use signals::{EnvironmentSignals, ProcessEnvironment, StaticSignals};

/// 翻译目标语言代码（如 `ru`、`zh-CN`）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetLanguage(String);

fn code_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").ok())
        .as_ref()
}

impl TargetLanguage {
    /// 校验并构造语言代码
    pub fn new(code: &str) -> TranslationResult<Self> {
        let code = code.trim();
        if code_pattern().is_some_and(|pattern| pattern.is_match(code)) {
            Ok(Self(code.to_string()))
        } else {
            Err(TranslationError::InvalidInput(format!(
                "无效的语言代码: {:?}",
                code
            )))
        }
    }

    /// 内置默认语言
    pub fn fallback() -> Self {
        Self(constants::DEFAULT_LANGUAGE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TargetLanguage {
    type Error = TranslationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<TargetLanguage> for String {
    fn from(language: TargetLanguage) -> Self {
        language.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_service_codes() {
        for code in ["en", "ru", "zh-CN", "zh-TW", "haw", "ceb"] {
            assert_eq!(TargetLanguage::new(code).unwrap().as_str(), code);
        }
    }

    #[test]
    fn test_rejects_malformed_codes() {
        for code in ["", "e", "english", "en_US ok", "12"] {
            assert!(TargetLanguage::new(code).is_err(), "{code:?} should be rejected");
        }
    }

    #[test]
    fn test_fallback_is_english() {
        assert_eq!(TargetLanguage::fallback().to_string(), "en");
    }
}
