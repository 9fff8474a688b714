//! 语言映射静态表
//!
//! 区域设置 → 翻译服务语言代码，时区 → 语言代码。

use std::sync::OnceLock;

use regex::Regex;

/// 翻译服务支持的语言代码
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "af", "sq", "am", "ar", "hy", "az", "eu", "be", "bn", "bs", "bg", "ca", "ceb", "ny", "zh-CN",
    "zh-TW", "co", "hr", "cs", "da", "dv", "nl", "en", "eo", "et", "tl", "fi", "fr", "fy", "gl",
    "ka", "de", "el", "gu", "ht", "ha", "haw", "he", "hi", "hmn", "hu", "is", "ig", "id", "ga",
    "it", "ja", "jv", "kn", "kk", "km", "rw", "ko", "ku", "ky", "lo", "la", "lv", "lt", "lb", "mk",
    "mg", "ms", "ml", "mt", "mi", "mr", "mn", "my", "ne", "no", "or", "ps", "fa", "pl", "pt", "pa",
    "ro", "ru", "sm", "gd", "sr", "st", "sn", "sd", "si", "sk", "sl", "so", "es", "su", "sw", "sv",
    "tg", "ta", "tt", "te", "th", "tr", "uk", "ur", "uz", "vi", "cy", "xh", "yi", "yo", "zu",
];

/// 需要改写的区域标签（小写、连字符形式）
const LOCALE_ALIASES: &[(&str, &str)] = &[
    ("zh", "zh-CN"),
    ("zh-cn", "zh-CN"),
    ("zh-sg", "zh-CN"),
    ("zh-hans", "zh-CN"),
    ("zh-tw", "zh-TW"),
    ("zh-hk", "zh-TW"),
    ("zh-mo", "zh-TW"),
    ("zh-hant", "zh-TW"),
    ("iw", "he"),
    ("jw", "jv"),
    ("nb", "no"),
    ("nn", "no"),
    ("fil", "tl"),
];

/// 时区 → 语言
pub const TIMEZONE_LANGUAGES: &[(&str, &str)] = &[
    ("Europe/Moscow", "ru"),
    ("Asia/Tokyo", "ja"),
    ("Asia/Shanghai", "zh-CN"),
    ("Asia/Seoul", "ko"),
    ("Asia/Bangkok", "th"),
    ("Asia/Jakarta", "id"),
    ("Asia/Ho_Chi_Minh", "vi"),
    ("Europe/Berlin", "de"),
    ("Europe/Paris", "fr"),
    ("Europe/Madrid", "es"),
    ("Europe/Rome", "it"),
    ("Europe/Amsterdam", "nl"),
    ("Europe/Warsaw", "pl"),
    ("Europe/Prague", "cs"),
    ("Europe/Stockholm", "sv"),
    ("Europe/Oslo", "no"),
    ("Europe/Copenhagen", "da"),
    ("Europe/Helsinki", "fi"),
    ("America/Sao_Paulo", "pt"),
    ("America/Mexico_City", "es"),
    ("America/Argentina/Buenos_Aires", "es"),
    ("Africa/Cairo", "ar"),
    ("Asia/Dubai", "ar"),
    ("Asia/Riyadh", "ar"),
    ("Asia/Tel_Aviv", "he"),
    ("Asia/Jerusalem", "he"),
    ("Europe/Kiev", "uk"),
    ("Europe/Kyiv", "uk"),
    ("Europe/Istanbul", "tr"),
    ("Asia/Tashkent", "uz"),
    ("Asia/Samarkand", "uz"),
];

fn locale_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-z]{2,3}(-[a-z0-9]{2,8})*$").ok())
        .as_ref()
}

/// 规范化 POSIX / BCP-47 区域字符串
///
/// 去掉编码和修饰符后缀，统一为小写连字符形式；`C`、`POSIX` 和格式错误的
/// 字符串返回 `None`。
pub fn normalize_locale(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let without_modifier = trimmed.split('@').next().unwrap_or_default();
    let without_encoding = without_modifier.split('.').next().unwrap_or_default();

    let normalized = without_encoding.replace('_', "-").to_ascii_lowercase();
    if normalized.is_empty() || normalized == "c" || normalized == "posix" {
        return None;
    }

    locale_pattern()
        .is_some_and(|pattern| pattern.is_match(&normalized))
        .then_some(normalized)
}

/// 在支持列表中查找（大小写不敏感），返回规范写法
fn supported(code: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .copied()
        .find(|candidate| candidate.eq_ignore_ascii_case(code))
}

fn alias(code: &str) -> Option<&'static str> {
    LOCALE_ALIASES
        .iter()
        .find(|(from, _)| *from == code)
        .map(|(_, to)| *to)
}

/// 把区域字符串映射为翻译服务语言代码
///
/// 先尝试完整标签（`zh-TW` → `zh-TW`），再尝试基础语言（`ru-RU` → `ru`）。
pub fn map_locale_to_language(raw: &str) -> Option<&'static str> {
    let normalized = normalize_locale(raw)?;

    if let Some(mapped) = alias(&normalized).or_else(|| supported(&normalized)) {
        return Some(mapped);
    }

    // zh-hant-tw 这类三段标签，逐段缩短
    let mut parts: Vec<&str> = normalized.split('-').collect();
    while parts.len() > 1 {
        parts.pop();
        let prefix = parts.join("-");
        if let Some(mapped) = alias(&prefix).or_else(|| supported(&prefix)) {
            return Some(mapped);
        }
    }

    None
}

/// 时区映射
pub fn map_timezone_to_language(zone: &str) -> Option<&'static str> {
    let zone = zone.trim();
    TIMEZONE_LANGUAGES
        .iter()
        .find(|(name, _)| *name == zone)
        .map(|(_, language)| *language)
}
