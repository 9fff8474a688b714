// 集成测试公共模块
//
// 提供测试辅助工具和共享功能

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use autotranslate::parsers::html::dom::get_text;
use autotranslate::parsers::html::LiveDocument;
use autotranslate::translation::config::{AutoTranslateConfig, SchedulingConfig};
use autotranslate::translation::{
    LanguageResolver, MockBackend, StaticSignals, TranslationCache, TranslationOrchestrator,
    Translator,
};
use markup5ever_rcdom::{Handle, NodeData};
use serde_json::json;

/// 测试配置构建器
pub struct TestConfigBuilder {
    config: AutoTranslateConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AutoTranslateConfig::default(),
        }
    }

    pub fn with_scheduling(mut self, frame_ms: u64, drift_ms: u64) -> Self {
        self.config.scheduling = SchedulingConfig {
            frame_interval_ms: frame_ms,
            drift_interval_ms: drift_ms,
            ..self.config.scheduling
        };
        self
    }

    pub fn with_concurrency(mut self, max_concurrent_requests: usize) -> Self {
        self.config.scheduling.max_concurrent_requests = max_concurrent_requests;
        self
    }

    pub fn with_endpoint(mut self, url: &str, timeout_secs: u64) -> Self {
        self.config.endpoint.url = url.to_string();
        self.config.endpoint.timeout_secs = timeout_secs;
        self
    }

    pub fn build(self) -> AutoTranslateConfig {
        self.config
    }
}

/// 测试环境
///
/// 文档、模拟后端、共享缓存和可在运行中修改的语言信号。
pub struct TestEnvironment {
    pub document: LiveDocument,
    pub backend: Rc<MockBackend>,
    pub cache: Arc<TranslationCache>,
    pub signals: Rc<RefCell<StaticSignals>>,
    pub config: AutoTranslateConfig,
}

impl TestEnvironment {
    /// 后缀模式后端，目标语言 fr
    pub fn new(html: &str) -> Self {
        Self::with_backend(html, MockBackend::suffix())
    }

    pub fn with_backend(html: &str, backend: MockBackend) -> Self {
        Self {
            document: LiveDocument::parse(html).unwrap(),
            backend: Rc::new(backend),
            cache: Arc::new(TranslationCache::new()),
            signals: Rc::new(RefCell::new(StaticSignals::new().with_language("fr-FR"))),
            config: TestConfigBuilder::new().build(),
        }
    }

    pub fn with_config(mut self, config: AutoTranslateConfig) -> Self {
        self.config = config;
        self
    }

    /// 修改环境报告的首选区域
    pub fn set_locale(&self, locale: &str) {
        *self.signals.borrow_mut() = StaticSignals::new().with_language(locale);
    }

    pub fn translator(&self) -> Rc<Translator> {
        Rc::new(Translator::new(self.backend.clone(), self.cache.clone()))
    }

    pub fn orchestrator(&self) -> TranslationOrchestrator {
        TranslationOrchestrator::new(
            self.document.clone(),
            self.translator(),
            LanguageResolver::new(self.signals.clone()),
            self.config.clone(),
        )
    }

    pub fn first(&self, selector: &str) -> Handle {
        self.document
            .query_selector_all(selector)
            .unwrap()
            .into_iter()
            .next()
            .unwrap_or_else(|| panic!("no element matches {selector}"))
    }

    /// 元素子树的文本内容
    pub fn text_of(&self, selector: &str) -> String {
        text_content(&self.first(selector))
    }

    /// 元素下的第一个文本节点
    pub fn text_node(&self, selector: &str) -> Handle {
        self.first(selector)
            .children
            .borrow()
            .iter()
            .find(|child| matches!(child.data, NodeData::Text { .. }))
            .cloned()
            .unwrap_or_else(|| panic!("{selector} has no text node"))
    }

    pub fn html(&self) -> String {
        self.document.to_html().unwrap()
    }
}

pub fn text_content(node: &Handle) -> String {
    let mut out = get_text(node).unwrap_or_default();
    for child in node.children.borrow().iter() {
        out.push_str(&text_content(child));
    }
    out
}

/// HTML测试工具
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    /// 带页头、正文、页脚的营销页面
    pub fn create_barbershop_page() -> String {
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>Sharp Cuts</title>
    <meta charset="UTF-8">
</head>
<body>
    <header>
        <h1>Sharp Cuts</h1>
        <nav><a href="/services">Services</a><a href="/book">Book now</a></nav>
    </header>
    <main>
        <p>Classic haircut</p>
        <p data-translate="false">Sharp Cuts Barbershop</p>
        <p translate="no">Signature Fade</p>
        <img src="chair.jpg" alt="Barber chair" title="Our chair" data-translate-attr="alt, title">
        <input placeholder="Your name" data-translate-attr="placeholder">
        <span>$25.00</span>
        <script>var price = "Classic haircut";</script>
    </main>
    <footer>Call us today</footer>
</body>
</html>"#
            .to_string()
    }

    pub fn create_simple_page(body: &str) -> String {
        format!("<!DOCTYPE html><html><head></head><body>{body}</body></html>")
    }
}

/// 翻译端点响应
pub struct GoogleResponseHelper;

impl GoogleResponseHelper {
    /// `[[["译文","原文",null,null,1]],null,"en"]`
    pub fn sentences(parts: &[(&str, &str)]) -> serde_json::Value {
        let sentences: Vec<serde_json::Value> = parts
            .iter()
            .map(|(translated, original)| json!([translated, original, null, null, 1]))
            .collect();
        json!([sentences, null, "en"])
    }
}

/// 断言辅助工具
pub struct AssertionHelper;

impl AssertionHelper {
    /// 断言 HTML 中包含全部片段
    pub fn assert_contains_all(html: &str, fragments: &[&str], description: &str) {
        for fragment in fragments {
            assert!(
                html.contains(fragment),
                "{}: expected to find {:?} in {}",
                description,
                fragment,
                html
            );
        }
    }

    /// 断言 HTML 中不包含任何片段
    pub fn assert_contains_none(html: &str, fragments: &[&str], description: &str) {
        for fragment in fragments {
            assert!(
                !html.contains(fragment),
                "{}: did not expect {:?} in {}",
                description,
                fragment,
                html
            );
        }
    }
}

/// 让出足够长的时间，使帧定时器和已排队的轮次都有机会运行
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
