//! Google 网页翻译端点
//!
//! `GET {endpoint}?client=gtx&sl=auto&tl={lang}&dt=t&q={text}`，响应的第 0 个
//! 元素是分句数组，每个分句的第 0 个元素是译文片段，按顺序拼接即为结果。

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use super::translator::TranslationBackend;
use crate::translation::config::{constants, EndpointConfig};
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::language::TargetLanguage;

/// Google 翻译后端
#[derive(Debug, Clone)]
pub struct GoogleTranslateBackend {
    client: reqwest::Client,
    endpoint: Url,
    client_id: String,
}

impl GoogleTranslateBackend {
    pub fn new(config: &EndpointConfig) -> TranslationResult<Self> {
        let endpoint = Url::parse(&config.url)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(TranslationError::ConfigError(format!(
                "翻译端点必须是 http(s) 地址: {}",
                config.url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TranslationError::NetworkError(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            client_id: config.client.clone(),
        })
    }

    /// 构造请求地址
    pub fn request_url(&self, text: &str, target: &TargetLanguage) -> TranslationResult<Url> {
        Ok(Url::parse_with_params(
            self.endpoint.as_str(),
            &[
                ("client", self.client_id.as_str()),
                ("sl", constants::SOURCE_LANGUAGE),
                ("tl", target.as_str()),
                ("dt", "t"),
                ("q", text),
            ],
        )?)
    }
}

/// 解析响应体，拼接所有分句的译文
pub fn parse_response(body: &str) -> TranslationResult<String> {
    let json: Value = serde_json::from_str(body)?;

    let sentences = json
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslationError::ParseError("响应缺少分句数组".to_string()))?;

    let translated: String = sentences
        .iter()
        .filter_map(|sentence| sentence.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        return Err(TranslationError::ParseError("响应中没有译文".to_string()));
    }
    Ok(translated)
}

#[async_trait(?Send)]
impl TranslationBackend for GoogleTranslateBackend {
    async fn translate(&self, text: &str, target: &TargetLanguage) -> TranslationResult<String> {
        let url = self.request_url(text, target)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        parse_response(&body)
    }

    fn backend_name(&self) -> &str {
        "google"
    }
}
