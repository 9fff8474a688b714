//! 自动翻译配置管理模块
//!
//! 配置按以下顺序叠加：内置默认值 → 第一个存在的配置文件 → `AUTOTRANSLATE`
//! 前缀的环境变量（加载 `.env` 文件之后）。

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::translation::error::{helpers::config_error, TranslationError, TranslationResult};
use crate::translation::language::TargetLanguage;

/// 自动翻译配置常量
pub mod constants {
    pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
    pub const DEFAULT_CLIENT: &str = "gtx";
    pub const SOURCE_LANGUAGE: &str = "auto";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    pub const DEFAULT_LANGUAGE: &str = "en";

    /// 变更合并到下一帧，约 60Hz
    pub const FRAME_INTERVAL_MS: u64 = 16;
    pub const DRIFT_INTERVAL_MS: u64 = 2000;
    pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 8;

    pub const EXCLUDE_ATTR: &str = "data-translate";
    pub const EXCLUDE_VALUE: &str = "false";
    pub const STANDARD_EXCLUDE_ATTR: &str = "translate";
    pub const STANDARD_EXCLUDE_VALUE: &str = "no";
    pub const ATTR_LIST_ATTR: &str = "data-translate-attr";

    pub const SKIP_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

    pub const DEFAULT_TARGET_SELECTOR: &str = "body";

    pub const ENV_PREFIX: &str = "AUTOTRANSLATE";

    pub const CONFIG_PATHS: &[&str] = &[
        "autotranslate.toml",
        ".autotranslate.toml",
        "~/.config/autotranslate/config.toml",
    ];
}

/// 自动翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AutoTranslateConfig {
    /// 翻译服务端点
    pub endpoint: EndpointConfig,

    /// 语言解析
    pub language: LanguageConfig,

    /// 调度参数
    pub scheduling: SchedulingConfig,

    /// DOM 标记约定
    pub markers: MarkerConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// 翻译接口地址
    pub url: String,

    /// `client` 查询参数
    pub client: String,

    /// 单次请求超时（秒）
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LanguageConfig {
    /// 所有信号都失效时使用的语言
    pub default_language: String,

    /// 持久化偏好文件路径，为空时使用平台配置目录
    pub preference_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SchedulingConfig {
    /// 变更合并窗口（毫秒）
    pub frame_interval_ms: u64,

    /// 语言漂移轮询间隔（毫秒）
    pub drift_interval_ms: u64,

    /// 单次翻译轮次内的最大并发请求数
    pub max_concurrent_requests: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MarkerConfig {
    /// 排除标记属性名
    pub exclude_attr: String,

    /// 排除标记属性值
    pub exclude_value: String,

    /// 同时识别标准的 `translate="no"`
    pub honor_standard_translate: bool,

    /// 属性翻译声明属性名
    pub attr_list_attr: String,

    /// 跳过的元素
    pub skip_tags: Vec<String>,

    /// 默认翻译根选择器
    pub target_selector: String,
}

impl Default for AutoTranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            language: LanguageConfig::default(),
            scheduling: SchedulingConfig::default(),
            markers: MarkerConfig::default(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: constants::DEFAULT_ENDPOINT.to_string(),
            client: constants::DEFAULT_CLIENT.to_string(),
            timeout_secs: constants::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default_language: constants::DEFAULT_LANGUAGE.to_string(),
            preference_path: None,
        }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: constants::FRAME_INTERVAL_MS,
            drift_interval_ms: constants::DRIFT_INTERVAL_MS,
            max_concurrent_requests: constants::DEFAULT_MAX_CONCURRENT_REQUESTS,
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            exclude_attr: constants::EXCLUDE_ATTR.to_string(),
            exclude_value: constants::EXCLUDE_VALUE.to_string(),
            honor_standard_translate: true,
            attr_list_attr: constants::ATTR_LIST_ATTR.to_string(),
            skip_tags: constants::SKIP_ELEMENTS
                .iter()
                .map(|tag| tag.to_string())
                .collect(),
            target_selector: constants::DEFAULT_TARGET_SELECTOR.to_string(),
        }
    }
}

impl EndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SchedulingConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn drift_interval(&self) -> Duration {
        Duration::from_millis(self.drift_interval_ms)
    }
}

impl LanguageConfig {
    /// 解析默认语言，配置无效时回退到内置默认值
    pub fn default_target(&self) -> TargetLanguage {
        TargetLanguage::new(&self.default_language).unwrap_or_else(|_| TargetLanguage::fallback())
    }
}

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: AutoTranslateConfig,
    config_path: Option<String>,
}

impl ConfigManager {
    /// 按默认搜索路径加载配置
    pub fn load() -> TranslationResult<Self> {
        Self::load_with(None)
    }

    /// 加载配置；给定路径时只读取该文件，文件必须存在
    pub fn load_with(explicit_path: Option<&Path>) -> TranslationResult<Self> {
        Self::load_dotenv();

        let mut builder = Config::builder().add_source(
            Config::try_from(&AutoTranslateConfig::default())
                .map_err(|e| TranslationError::ConfigError(format!("默认配置错误: {}", e)))?,
        );

        let mut config_path = None;
        match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(TranslationError::ConfigError(format!(
                        "配置文件不存在: {}",
                        path.display()
                    )));
                }
                builder = builder.add_source(File::from(path));
                config_path = Some(path.display().to_string());
                tracing::info!("加载配置文件: {}", path.display());
            }
            None => {
                for path in constants::CONFIG_PATHS {
                    let expanded_path = shellexpand::tilde(path);
                    if Path::new(expanded_path.as_ref()).exists() {
                        builder = builder.add_source(File::with_name(&expanded_path));
                        config_path = Some(expanded_path.to_string());
                        tracing::info!("加载配置文件: {}", expanded_path);
                        break;
                    }
                }
            }
        }

        // 嵌套字段用双下划线分隔，例如 AUTOTRANSLATE_SCHEDULING__DRIFT_INTERVAL_MS
        builder = builder.add_source(
            Environment::with_prefix(constants::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("markers.skip_tags")
                .try_parsing(true),
        );

        let config: AutoTranslateConfig = builder
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("构建配置失败: {}", e)))?
            .try_deserialize()
            .map_err(|e| TranslationError::ConfigError(format!("反序列化配置失败: {}", e)))?;

        tracing::debug!("加载的配置 - 端点: {}", config.endpoint.url);
        tracing::debug!("加载的配置 - 默认语言: {}", config.language.default_language);

        Self::validate_config(&config)?;

        Ok(Self {
            config,
            config_path,
        })
    }

    /// 直接使用给定配置（会先校验）
    pub fn from_config(config: AutoTranslateConfig) -> TranslationResult<Self> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    /// 获取当前配置
    pub fn config(&self) -> &AutoTranslateConfig {
        &self.config
    }

    /// 实际加载的配置文件
    pub fn config_path(&self) -> Option<&str> {
        self.config_path.as_deref()
    }

    pub fn into_config(self) -> AutoTranslateConfig {
        self.config
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() {
                match dotenv::from_filename(env_file) {
                    Ok(_) => {
                        tracing::debug!("已加载环境变量文件: {}", env_file);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("无法加载环境变量文件 {}: {}", env_file, e);
                    }
                }
            }
        }
    }

    /// 验证配置
    pub fn validate_config(config: &AutoTranslateConfig) -> TranslationResult<()> {
        let url = url::Url::parse(&config.endpoint.url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(TranslationError::ConfigError(format!(
                "翻译端点必须是 http(s) 地址: {}",
                config.endpoint.url
            )));
        }

        if config.endpoint.client.trim().is_empty() {
            return Err(config_error("client 参数不能为空"));
        }

        if config.endpoint.timeout_secs == 0 {
            return Err(config_error("请求超时不能为0"));
        }

        if config.scheduling.frame_interval_ms == 0 {
            return Err(config_error("帧间隔不能为0"));
        }

        if config.scheduling.drift_interval_ms == 0 {
            return Err(TranslationError::ConfigError(
                "语言轮询间隔不能为0".to_string(),
            ));
        }

        if config.scheduling.max_concurrent_requests == 0 {
            return Err(TranslationError::ConfigError(
                "最大并发请求数不能为0".to_string(),
            ));
        }

        if config.markers.exclude_attr.trim().is_empty()
            || config.markers.attr_list_attr.trim().is_empty()
        {
            return Err(config_error("标记属性名不能为空"));
        }

        if config.markers.target_selector.trim().is_empty() {
            return Err(config_error("目标选择器不能为空"));
        }

        TargetLanguage::new(&config.language.default_language).map_err(|_| {
            TranslationError::ConfigError(format!(
                "无效的默认语言: {}",
                config.language.default_language
            ))
        })?;

        Ok(())
    }
}
