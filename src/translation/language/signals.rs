//! 环境信号来源
//!
//! 语言解析只通过 [`EnvironmentSignals`] 读取外部状态，测试使用
//! [`StaticSignals`] 注入固定值。

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::preference::PreferenceStore;
use crate::env::{locale, EnvVar};

/// 语言解析所需的环境信号
///
/// 每次调用都应读取当前值：漂移轮询依赖它发现环境变化。
pub trait EnvironmentSignals {
    /// 用户显式保存的语言
    fn persisted_preference(&self) -> Option<String>;

    /// 首选区域列表，主区域在前
    fn preferred_locales(&self) -> Vec<String>;

    /// 旧式单值区域信号
    fn legacy_locales(&self) -> Vec<String>;

    /// 格式化区域：日期时间在前，数字在后
    fn formatting_locales(&self) -> Vec<String>;

    /// IANA 时区名
    fn time_zone(&self) -> Option<String>;
}

impl<S: EnvironmentSignals + ?Sized> EnvironmentSignals for Rc<S> {
    fn persisted_preference(&self) -> Option<String> {
        (**self).persisted_preference()
    }

    fn preferred_locales(&self) -> Vec<String> {
        (**self).preferred_locales()
    }

    fn legacy_locales(&self) -> Vec<String> {
        (**self).legacy_locales()
    }

    fn formatting_locales(&self) -> Vec<String> {
        (**self).formatting_locales()
    }

    fn time_zone(&self) -> Option<String> {
        (**self).time_zone()
    }
}

impl<S: EnvironmentSignals> EnvironmentSignals for RefCell<S> {
    fn persisted_preference(&self) -> Option<String> {
        self.borrow().persisted_preference()
    }

    fn preferred_locales(&self) -> Vec<String> {
        self.borrow().preferred_locales()
    }

    fn legacy_locales(&self) -> Vec<String> {
        self.borrow().legacy_locales()
    }

    fn formatting_locales(&self) -> Vec<String> {
        self.borrow().formatting_locales()
    }

    fn time_zone(&self) -> Option<String> {
        self.borrow().time_zone()
    }
}

/// 从当前进程环境读取信号
#[derive(Debug, Clone)]
pub struct ProcessEnvironment {
    preference: PreferenceStore,
    timezone_file: PathBuf,
    localtime_path: PathBuf,
}

impl ProcessEnvironment {
    pub fn new(preference: PreferenceStore) -> Self {
        Self {
            preference,
            timezone_file: PathBuf::from("/etc/timezone"),
            localtime_path: PathBuf::from("/etc/localtime"),
        }
    }

    fn zone_from_file(path: &Path) -> Option<String> {
        let content = fs::read_to_string(path).ok()?;
        content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
    }

    /// `/etc/localtime -> /usr/share/zoneinfo/Europe/Moscow`
    fn zone_from_link(path: &Path) -> Option<String> {
        let target = fs::read_link(path).ok()?;
        let target = target.to_string_lossy();
        let (_, zone) = target.split_once("zoneinfo/")?;
        (!zone.is_empty()).then(|| zone.to_string())
    }
}

impl Default for ProcessEnvironment {
    fn default() -> Self {
        Self::new(PreferenceStore::default_location())
    }
}

impl EnvironmentSignals for ProcessEnvironment {
    fn persisted_preference(&self) -> Option<String> {
        self.preference
            .load()
            .map(|preference| preference.language.to_string())
    }

    fn preferred_locales(&self) -> Vec<String> {
        locale::LanguageList::get().unwrap_or_default()
    }

    fn legacy_locales(&self) -> Vec<String> {
        [
            locale::LcAll::get(),
            locale::LcMessages::get(),
            locale::Lang::get(),
        ]
        .into_iter()
        .filter_map(Result::ok)
        .collect()
    }

    fn formatting_locales(&self) -> Vec<String> {
        [locale::LcTime::get(), locale::LcNumeric::get()]
            .into_iter()
            .filter_map(Result::ok)
            .collect()
    }

    fn time_zone(&self) -> Option<String> {
        if let Ok(tz) = locale::Tz::get() {
            let tz = tz.trim_start_matches(':').to_string();
            if !tz.is_empty() {
                return Some(tz);
            }
        }

        Self::zone_from_file(&self.timezone_file)
            .or_else(|| Self::zone_from_link(&self.localtime_path))
    }
}

/// 固定信号，用于测试和显式注入
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticSignals {
    pub preference: Option<String>,
    /// 主区域
    pub language: Option<String>,
    /// 首选区域列表
    pub languages: Vec<String>,
    pub legacy: Vec<String>,
    pub date_locale: Option<String>,
    pub number_locale: Option<String>,
    pub time_zone: Option<String>,
}

impl StaticSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preference(mut self, language: &str) -> Self {
        self.preference = Some(language.to_string());
        self
    }

    pub fn with_language(mut self, locale: &str) -> Self {
        self.language = Some(locale.to_string());
        self
    }

    pub fn with_languages(mut self, locales: &[&str]) -> Self {
        self.languages = locales.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_legacy(mut self, locales: &[&str]) -> Self {
        self.legacy = locales.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_formatting(mut self, date: Option<&str>, number: Option<&str>) -> Self {
        self.date_locale = date.map(str::to_string);
        self.number_locale = number.map(str::to_string);
        self
    }

    pub fn with_time_zone(mut self, zone: &str) -> Self {
        self.time_zone = Some(zone.to_string());
        self
    }
}

impl EnvironmentSignals for StaticSignals {
    fn persisted_preference(&self) -> Option<String> {
        self.preference.clone()
    }

    fn preferred_locales(&self) -> Vec<String> {
        self.language
            .iter()
            .chain(self.languages.iter())
            .cloned()
            .collect()
    }

    fn legacy_locales(&self) -> Vec<String> {
        self.legacy.clone()
    }

    fn formatting_locales(&self) -> Vec<String> {
        self.date_locale
            .iter()
            .chain(self.number_locale.iter())
            .cloned()
            .collect()
    }

    fn time_zone(&self) -> Option<String> {
        self.time_zone.clone()
    }
}
