//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问：日志相关变量，以及语言解析读取的
//! 区域/时区信号。

use std::env;
use std::fmt;

use crate::translation::config::constants;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "AUTOTRANSLATE_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.trim().to_lowercase().as_str() {
                level @ ("trace" | "debug" | "info" | "warn" | "error") => Ok(level.to_string()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 禁用颜色输出
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // NO_COLOR 遵循标准：任何值都表示禁用颜色
            Ok(!value.is_empty())
        }
    }
}

/// 区域与时区信号
///
/// 未设置或为空的变量返回错误，调用方按"无信号"处理。
pub mod locale {
    use super::*;

    macro_rules! locale_var {
        ($ty:ident, $name:literal, $description:literal) => {
            pub struct $ty;
            impl EnvVar<String> for $ty {
                const NAME: &'static str = $name;
                const DEFAULT: Option<String> = None;
                const DESCRIPTION: &'static str = $description;

                fn parse(value: &str) -> EnvResult<String> {
                    parse_non_empty(value, Self::NAME)
                }
            }
        };
    }

    /// GNU 首选语言列表（冒号分隔）
    pub struct LanguageList;
    impl EnvVar<Vec<String>> for LanguageList {
        const NAME: &'static str = "LANGUAGE";
        const DEFAULT: Option<Vec<String>> = None;
        const DESCRIPTION: &'static str =
            "Colon-separated list of preferred locales, highest priority first";

        fn parse(value: &str) -> EnvResult<Vec<String>> {
            let list: Vec<String> = value
                .split(':')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();

            if list.is_empty() {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Locale list is empty".to_string(),
                })
            } else {
                Ok(list)
            }
        }
    }

    locale_var!(LcAll, "LC_ALL", "Locale override for every category");
    locale_var!(LcMessages, "LC_MESSAGES", "Locale for user-facing messages");
    locale_var!(Lang, "LANG", "Default locale");
    locale_var!(LcTime, "LC_TIME", "Locale used for date and time formatting");
    locale_var!(LcNumeric, "LC_NUMERIC", "Locale used for number formatting");
    locale_var!(Tz, "TZ", "IANA time zone name, e.g. Europe/Moscow");
}

/// 辅助函数
fn parse_non_empty(value: &str, var_name: &str) -> EnvResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(EnvError {
            variable: var_name.to_string(),
            message: "Value is empty".to_string(),
        })
    } else {
        Ok(trimmed.to_string())
    }
}

/// 环境变量配置汇总
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    // 核心配置
    pub log_level: String,
    pub no_color: bool,

    // 区域信号
    pub language_list: Vec<String>,
    pub lc_all: Option<String>,
    pub lc_messages: Option<String>,
    pub lang: Option<String>,
    pub lc_time: Option<String>,
    pub lc_numeric: Option<String>,
    pub tz: Option<String>,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> EnvResult<Self> {
        Ok(Self {
            log_level: core::LogLevel::get()?,
            no_color: core::NoColor::get_or_default(false),

            language_list: locale::LanguageList::get().unwrap_or_default(),
            lc_all: locale::LcAll::get().ok(),
            lc_messages: locale::LcMessages::get().ok(),
            lang: locale::Lang::get().ok(),
            lc_time: locale::LcTime::get().ok(),
            lc_numeric: locale::LcNumeric::get().ok(),
            tz: locale::Tz::get().ok(),
        })
    }

    /// 配置摘要
    pub fn summary(&self) -> String {
        let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

        let mut out = String::new();
        out.push_str("Environment Configuration Summary:\n");
        out.push_str(&format!("  Log Level: {}\n", self.log_level));
        out.push_str(&format!("  Color: {}\n", if self.no_color { "disabled" } else { "enabled" }));
        out.push_str(&format!("  LANGUAGE: {}\n", self.language_list.join(":")));
        out.push_str(&format!("  LC_ALL: {}\n", show(&self.lc_all)));
        out.push_str(&format!("  LC_MESSAGES: {}\n", show(&self.lc_messages)));
        out.push_str(&format!("  LANG: {}\n", show(&self.lang)));
        out.push_str(&format!("  LC_TIME: {}\n", show(&self.lc_time)));
        out.push_str(&format!("  LC_NUMERIC: {}\n", show(&self.lc_numeric)));
        out.push_str(&format!("  TZ: {}\n", show(&self.tz)));
        out
    }
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: \"info\")\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        core::NoColor::NAME,
        core::NoColor::DESCRIPTION,
        core::NoColor::DEFAULT
    ));

    docs.push_str("\n## Language Detection Signals\n\n");
    docs.push_str(&format!(
        "- `{}`: {}\n",
        locale::LanguageList::NAME,
        locale::LanguageList::DESCRIPTION
    ));
    for (name, description) in [
        (locale::LcAll::NAME, locale::LcAll::DESCRIPTION),
        (locale::LcMessages::NAME, locale::LcMessages::DESCRIPTION),
        (locale::Lang::NAME, locale::Lang::DESCRIPTION),
        (locale::LcTime::NAME, locale::LcTime::DESCRIPTION),
        (locale::LcNumeric::NAME, locale::LcNumeric::DESCRIPTION),
        (locale::Tz::NAME, locale::Tz::DESCRIPTION),
    ] {
        docs.push_str(&format!("- `{}`: {}\n", name, description));
    }

    docs.push_str("\n## Configuration Overrides\n\n");
    docs.push_str(&format!(
        "Any configuration key can be overridden with `{}_<SECTION>__<KEY>`, \
         e.g. `{}_SCHEDULING__DRIFT_INTERVAL_MS=5000` or `{}_ENDPOINT__URL=...`.\n",
        constants::ENV_PREFIX,
        constants::ENV_PREFIX,
        constants::ENV_PREFIX
    ));

    docs
}
