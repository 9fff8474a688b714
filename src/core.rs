//! 文档级入口
//!
//! 把一个 HTML 文档当作活动页面：解析、激活编排器、等待初始轮次完成、
//! 停用并序列化。CLI 的 `translate` 子命令直接使用这里的函数。

use std::rc::Rc;
use std::sync::Arc;

use encoding_rs::Encoding;
use markup5ever_rcdom::RcDom;

use crate::parsers::html::{get_charset, html_to_dom, set_charset, LiveDocument};
use crate::translation::{
    AutoTranslateConfig, GoogleTranslateBackend, LanguageResolver, PassStats, PreferenceStore,
    ProcessEnvironment, Resolution, StaticSignals, TargetLanguage, TranslationBackend,
    TranslationCache, TranslationOrchestrator, TranslationResult, Translator,
};

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";

/// 单次文档翻译的选项
#[derive(Debug, Clone, Default)]
pub struct AutoTranslateOptions {
    pub config: AutoTranslateConfig,
    /// 强制使用的目标语言，跳过环境解析
    pub language: Option<String>,
    /// 翻译根选择器，默认取配置中的值
    pub selector: Option<String>,
    /// 输入编码，默认 UTF-8 并按文档声明重新解析
    pub encoding: Option<String>,
}

/// 翻译结果
#[derive(Debug, Clone)]
pub struct TranslatedDocument {
    pub html: Vec<u8>,
    pub language: TargetLanguage,
    pub stats: PassStats,
}

impl AutoTranslateOptions {
    /// 配置对应的偏好存储
    pub fn preference_store(&self) -> PreferenceStore {
        PreferenceStore::from_config_path(self.config.language.preference_path.as_deref())
    }

    /// 构造语言解析器
    pub fn resolver(&self) -> TranslationResult<LanguageResolver> {
        let default_language = self.config.language.default_target();

        let resolver = match &self.language {
            Some(code) => {
                let language = TargetLanguage::new(code)?;
                LanguageResolver::new(StaticSignals::new().with_preference(language.as_str()))
            }
            None => LanguageResolver::new(ProcessEnvironment::new(self.preference_store())),
        };
        Ok(resolver.with_default(default_language))
    }
}

/// 解析当前环境的目标语言
pub fn detect_language(options: &AutoTranslateOptions) -> TranslationResult<Resolution> {
    Ok(options.resolver()?.resolve_detailed())
}

/// 编码处理器
pub struct EncodingProcessor;

impl EncodingProcessor {
    pub fn new() -> Self {
        Self
    }

    /// 按给定编码解析；文档声明了有效字符集时按声明重新解析
    pub fn process_encoding(
        &self,
        input_data: &[u8],
        input_encoding: Option<&str>,
    ) -> TranslationResult<(RcDom, String)> {
        let mut document_encoding = input_encoding.unwrap_or("utf-8").to_string();
        let mut dom = html_to_dom(input_data, &document_encoding)?;

        if input_encoding.is_none() {
            if let Some(html_charset) = get_charset(&dom.document) {
                if let Some(charset) = Encoding::for_label_no_replacement(html_charset.as_bytes()) {
                    if charset != encoding_rs::UTF_8 {
                        dom = html_to_dom(input_data, charset.name())?;
                    }
                    document_encoding = charset.name().to_string();
                }
            }
        }

        Ok((dom, document_encoding))
    }
}

impl Default for EncodingProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// 使用配置中的 HTTP 端点翻译文档
///
/// 必须在 `LocalSet` 中调用。
pub async fn translate_document(
    input_data: &[u8],
    options: &AutoTranslateOptions,
) -> TranslationResult<TranslatedDocument> {
    let backend = GoogleTranslateBackend::new(&options.config.endpoint)?;
    translate_document_with(input_data, options, Rc::new(backend)).await
}

/// 使用给定后端翻译文档
pub async fn translate_document_with(
    input_data: &[u8],
    options: &AutoTranslateOptions,
    backend: Rc<dyn TranslationBackend>,
) -> TranslationResult<TranslatedDocument> {
    // 1. 解析并确定编码
    let (dom, document_encoding) =
        EncodingProcessor::new().process_encoding(input_data, options.encoding.as_deref())?;
    tracing::debug!("文档编码: {}", document_encoding);
    let document = LiveDocument::from_dom(dom);

    // 2. 组装翻译器和编排器
    let translator = Translator::new(backend, Arc::new(TranslationCache::new()));
    let mut orchestrator = TranslationOrchestrator::new(
        document.clone(),
        Rc::new(translator),
        options.resolver()?,
        options.config.clone(),
    );

    // 3. 激活并等待初始轮次
    let selector = options
        .selector
        .clone()
        .unwrap_or_else(|| options.config.markers.target_selector.clone());
    orchestrator.activate(selector.as_str())?;
    let stats = orchestrator.wait_for_passes(1).await?;
    let language = orchestrator.language();
    orchestrator.deactivate();

    // 4. 输出统一为 UTF-8
    set_charset(document.dom(), "utf-8");
    let html = document.serialize()?;

    Ok(TranslatedDocument {
        html,
        language,
        stats,
    })
}

/// Prints an error message to stderr
pub fn print_error_message(msg: &str) {
    eprintln!("{ANSI_COLOR_RED}{msg}{ANSI_COLOR_RESET}");
}

/// Prints an info message to stdout
pub fn print_info_message(msg: &str) {
    println!("{msg}");
}
