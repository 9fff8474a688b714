//! 确定性的模拟翻译后端
//!
//! 不访问网络，记录调用次数，可注入失败和延迟。用于单元测试、集成测试
//! 以及 CLI 的离线模式。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use super::translator::TranslationBackend;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::language::TargetLanguage;

/// 模拟模式
#[derive(Debug, Clone)]
pub enum MockMode {
    /// 追加语言后缀："Hello" → "Hello_fr"
    Suffix,
    /// 预设映射 (原文, 目标语言) → 译文，未命中时退回后缀模式
    Mappings(HashMap<(String, String), String>),
    /// 原样返回
    Echo,
    /// 每次都失败
    Error(String),
}

/// 模拟后端
#[derive(Debug)]
pub struct MockBackend {
    mode: MockMode,
    delay: Option<Duration>,
    calls: Cell<usize>,
    pending_failures: Cell<usize>,
    requested: RefCell<Vec<(String, String)>>,
}

impl MockBackend {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay: None,
            calls: Cell::new(0),
            pending_failures: Cell::new(0),
            requested: RefCell::new(Vec::new()),
        }
    }

    pub fn suffix() -> Self {
        Self::new(MockMode::Suffix)
    }

    /// 从 `(原文, 语言, 译文)` 三元组创建
    pub fn mapping(entries: &[(&str, &str, &str)]) -> Self {
        let map = entries
            .iter()
            .map(|(text, lang, translated)| {
                ((text.to_string(), lang.to_string()), translated.to_string())
            })
            .collect();
        Self::new(MockMode::Mappings(map))
    }

    pub fn failing(message: &str) -> Self {
        Self::new(MockMode::Error(message.to_string()))
    }

    /// 每次请求前等待 `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 让接下来的 `count` 次请求失败
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.set(count);
    }

    pub fn call_count(&self) -> usize {
        self.calls.get()
    }

    /// 所有请求过的 (原文, 语言)，按调用顺序
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requested.borrow().clone()
    }

    fn apply(&self, text: &str, target: &str) -> TranslationResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => Ok(map
                .get(&(text.to_string(), target.to_string()))
                .cloned()
                .unwrap_or_else(|| format!("{}_{}", text, target))),
            MockMode::Echo => Ok(text.to_string()),
            MockMode::Error(message) => Err(TranslationError::NetworkError(message.clone())),
        }
    }
}

#[async_trait(?Send)]
impl TranslationBackend for MockBackend {
    async fn translate(&self, text: &str, target: &TargetLanguage) -> TranslationResult<String> {
        self.calls.set(self.calls.get() + 1);
        self.requested
            .borrow_mut()
            .push((text.to_string(), target.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let pending = self.pending_failures.get();
        if pending > 0 {
            self.pending_failures.set(pending - 1);
            return Err(TranslationError::NetworkError("模拟的网络故障".to_string()));
        }

        self.apply(text, target.as_str())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fr() -> TargetLanguage {
        TargetLanguage::new("fr").unwrap()
    }

    #[tokio::test]
    async fn test_suffix_and_mapping_modes() {
        let mock = MockBackend::suffix();
        assert_eq!(mock.translate("Hello", &fr()).await.unwrap(), "Hello_fr");

        let mock = MockBackend::mapping(&[("Hello", "fr", "Bonjour")]);
        assert_eq!(mock.translate("Hello", &fr()).await.unwrap(), "Bonjour");
        assert_eq!(mock.translate("Bye", &fr()).await.unwrap(), "Bye_fr");
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.requests()[1], ("Bye".to_string(), "fr".to_string()));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let mock = MockBackend::suffix();
        mock.fail_next(2);
        assert!(mock.translate("a", &fr()).await.is_err());
        assert!(mock.translate("a", &fr()).await.is_err());
        assert!(mock.translate("a", &fr()).await.is_ok());

        let mock = MockBackend::failing("down");
        assert!(matches!(
            mock.translate("a", &fr()).await,
            Err(TranslationError::NetworkError(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_uses_tokio_clock() {
        let mock = MockBackend::new(MockMode::Echo).with_delay(Duration::from_millis(500));
        let start = tokio::time::Instant::now();
        assert_eq!(mock.translate("Hi", &fr()).await.unwrap(), "Hi");
        assert!(start.elapsed() >= Duration::from_millis(500));
    }
}
