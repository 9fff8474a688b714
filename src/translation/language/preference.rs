//! 持久化语言偏好
//!
//! 用户显式选择的语言优先于所有环境信号。文件缺失或损坏都视为"没有偏好"。

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::TargetLanguage;
use crate::translation::error::{TranslationError, TranslationResult};

const PREFERENCE_FILE: &str = "language.json";

/// 已保存的语言偏好
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguagePreference {
    pub language: TargetLanguage,
    /// RFC 3339 时间戳
    pub saved_at: String,
}

/// 偏好文件存储
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
}

impl PreferenceStore {
    /// 平台配置目录下的默认位置
    pub fn default_location() -> Self {
        let path = ProjectDirs::from("", "", "autotranslate")
            .map(|dirs| dirs.config_dir().join(PREFERENCE_FILE));
        Self { path }
    }

    /// 指定文件路径
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// 按配置选择位置，支持 `~` 展开
    pub fn from_config_path(path: Option<&str>) -> Self {
        match path {
            Some(path) => Self::at(shellexpand::tilde(path).into_owned()),
            None => Self::default_location(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 读取偏好
    pub fn load(&self) -> Option<LanguagePreference> {
        let path = self.path.as_ref()?;
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("无法读取语言偏好 {}: {}", path.display(), e);
                }
                return None;
            }
        };

        match serde_json::from_str::<LanguagePreference>(&content) {
            Ok(preference) => Some(preference),
            Err(e) => {
                tracing::warn!("语言偏好文件已损坏 {}: {}", path.display(), e);
                None
            }
        }
    }

    /// 保存偏好
    pub fn save(&self, language: &TargetLanguage) -> TranslationResult<LanguagePreference> {
        let path = self.path.as_ref().ok_or_else(|| {
            TranslationError::ConfigError("无法确定语言偏好文件位置".to_string())
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let preference = LanguagePreference {
            language: language.clone(),
            saved_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        fs::write(path, serde_json::to_string_pretty(&preference)?)?;

        tracing::info!("已保存语言偏好: {} -> {}", language, path.display());
        Ok(preference)
    }

    /// 清除偏好，返回是否确实删除了文件
    pub fn clear(&self) -> TranslationResult<bool> {
        let Some(path) = self.path.as_ref() else {
            return Ok(false);
        };

        match fs::remove_file(path) {
            Ok(()) => {
                tracing::info!("已清除语言偏好: {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
