//! 翻译管道集成测试
//!
//! 测试从激活到写回的端到端流程

use std::rc::Rc;
use std::time::Duration;

use autotranslate::core::{translate_document_with, AutoTranslateOptions};
use autotranslate::parsers::html::LiveDocument;
use autotranslate::translation::config::AutoTranslateConfig;
use autotranslate::translation::pipeline::{CollectorConfig, DomTextCollector};
use autotranslate::translation::{GoogleTranslateBackend, MockBackend, RootTarget};
use tokio::task::LocalSet;
use tokio::time::sleep;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{
    settle, AssertionHelper, GoogleResponseHelper, HtmlTestHelper, TestConfigBuilder,
    TestEnvironment,
};

fn slow_backend() -> MockBackend {
    MockBackend::suffix().with_delay(Duration::from_millis(100))
}

/// `<div>Hello</div>` 翻译为翻译器对 ("Hello", fr) 的返回值，重复轮次不再变化
#[tokio::test]
async fn test_end_to_end_hello() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::with_backend(
                &HtmlTestHelper::create_simple_page("<div>Hello</div><aside></aside>"),
                MockBackend::mapping(&[("Hello", "fr", "Bonjour")]),
            );
            let mut orchestrator = env.orchestrator();

            orchestrator.activate("body").unwrap();
            orchestrator.wait_for_passes(1).await.unwrap();
            assert_eq!(env.text_of("div"), "Bonjour");

            // 无关的结构变更触发第二轮
            let aside = env.first("aside");
            env.document
                .append_child(&aside, &env.document.create_element("hr", &[]))
                .unwrap();
            orchestrator.wait_for_passes(2).await.unwrap();

            assert_eq!(env.text_of("div"), "Bonjour");
            assert_eq!(env.backend.call_count(), 1);
            assert_eq!(orchestrator.stats().writes_applied, 1);
            orchestrator.deactivate();
        })
        .await;
}

/// 第二轮不再改动任何文本
#[tokio::test]
async fn test_idempotent_passes() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::new(&HtmlTestHelper::create_barbershop_page());
            let mut orchestrator = env.orchestrator();

            orchestrator.activate("body").unwrap();
            orchestrator.wait_for_passes(1).await.unwrap();
            let after_first = env.html();
            let calls = env.backend.call_count();

            let footer = env.first("footer");
            env.document
                .append_child(&footer, &env.document.create_element("br", &[]))
                .unwrap();
            let stats = orchestrator.wait_for_passes(2).await.unwrap();

            assert_eq!(env.html(), after_first.replace("Call us today_fr", "Call us today_fr<br>"));
            assert_eq!(env.backend.call_count(), calls);
            assert_eq!(stats.passes_completed, 2);
        })
        .await;
}

/// 排除标记、跳过元素和属性声明
#[tokio::test]
async fn test_markers_and_attributes() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::new(&HtmlTestHelper::create_barbershop_page());
            let mut orchestrator = env.orchestrator();
            orchestrator.activate("body").unwrap();
            orchestrator.wait_for_passes(1).await.unwrap();

            let html = env.html();
            AssertionHelper::assert_contains_all(
                &html,
                &[
                    "Classic haircut_fr",
                    "Book now_fr",
                    "Call us today_fr",
                    "alt=\"Barber chair_fr\"",
                    "title=\"Our chair_fr\"",
                    "placeholder=\"Your name_fr\"",
                    "$25.00",
                ],
                "translated page",
            );
            AssertionHelper::assert_contains_none(
                &html,
                &[
                    "Sharp Cuts Barbershop_fr",
                    "Signature Fade_fr",
                    "var price = \"Classic haircut_fr\"",
                    "$25.00_fr",
                    "chair.jpg_fr",
                ],
                "excluded content",
            );
        })
        .await;
}

/// 排除区域内后来加入的内容同样不翻译
#[tokio::test]
async fn test_exclusion_holds_under_mutations() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::new(&HtmlTestHelper::create_simple_page(
                "<section data-translate=\"false\"><p>Brand</p></section><main></main>",
            ));
            let mut orchestrator = env.orchestrator();
            orchestrator.activate("body").unwrap();
            orchestrator.wait_for_passes(1).await.unwrap();

            let section = env.first("section");
            env.document
                .append_html(&section, "<div><span>Owner Name</span></div>")
                .unwrap();
            env.document.set_text(&env.text_node("p"), "Brand New").unwrap();
            let main = env.first("main");
            env.document.append_html(&main, "<p>Welcome</p>").unwrap();

            orchestrator.wait_for_passes(2).await.unwrap();
            settle().await;

            assert_eq!(env.text_of("section"), "Brand NewOwner Name");
            assert_eq!(env.text_of("main"), "Welcome_fr");
        })
        .await;
}

/// 轮次进行中祖先加上排除标记，已收集的文本不再写回
#[tokio::test(start_paused = true)]
async fn test_marker_added_during_pass_blocks_write() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::with_backend(
                &HtmlTestHelper::create_simple_page("<div><p>Hello</p></div><p>World</p>"),
                slow_backend(),
            );
            let mut orchestrator = env.orchestrator();
            orchestrator.activate("body").unwrap();

            sleep(Duration::from_millis(10)).await;
            let div = env.first("div");
            env.document.set_attribute(&div, "data-translate", "false").unwrap();

            sleep(Duration::from_millis(500)).await;
            assert_eq!(env.text_of("div"), "Hello");
            assert!(env.html().contains("<p>World_fr</p>"));
            assert_eq!(orchestrator.stats().stale_skipped, 1);
        })
        .await;
}

/// 轮次进行中被移入排除区域的节点不再写回
#[tokio::test(start_paused = true)]
async fn test_node_moved_into_excluded_subtree_during_pass() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::with_backend(
                &HtmlTestHelper::create_simple_page(
                    "<section data-translate=\"false\"></section><p>Hello</p>",
                ),
                slow_backend(),
            );
            let mut orchestrator = env.orchestrator();
            orchestrator.activate("body").unwrap();

            sleep(Duration::from_millis(10)).await;
            let section = env.first("section");
            let p = env.first("p");
            env.document.append_child(&section, &p).unwrap();

            sleep(Duration::from_millis(500)).await;
            assert_eq!(env.text_of("section"), "Hello");
            assert_eq!(orchestrator.stats().writes_applied, 0);
        })
        .await;
}

/// 轮次进行中移出翻译根或脱离文档的节点不再写回
#[tokio::test(start_paused = true)]
async fn test_node_leaving_root_during_pass() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::with_backend(
                &HtmlTestHelper::create_simple_page(
                    "<main><p>Hello</p><span>Bye</span></main><aside></aside>",
                ),
                slow_backend(),
            );
            let mut orchestrator = env.orchestrator();
            orchestrator.activate("main").unwrap();

            sleep(Duration::from_millis(10)).await;
            let aside = env.first("aside");
            let p = env.first("p");
            env.document.append_child(&aside, &p).unwrap();
            let span = env.first("span");
            env.document.remove(&span);

            sleep(Duration::from_millis(500)).await;
            assert_eq!(env.text_of("aside"), "Hello");
            assert_eq!(common::text_content(&span), "Bye");
            let stats = orchestrator.stats();
            assert_eq!(stats.writes_applied, 0);
            assert_eq!(stats.stale_skipped, 2);
        })
        .await;
}

/// 动态加入的内容在下一帧被翻译
#[tokio::test(start_paused = true)]
async fn test_dynamic_content_is_translated() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::new(&HtmlTestHelper::create_simple_page("<ul></ul>"));
            let mut orchestrator = env.orchestrator();
            orchestrator.activate("body").unwrap();
            orchestrator.wait_for_passes(1).await.unwrap();

            let ul = env.first("ul");
            env.document
                .append_html(&ul, "<li>Beard trim</li><li>Hot towel shave</li>")
                .unwrap();

            let stats = orchestrator.wait_for_passes(2).await.unwrap();
            assert_eq!(env.text_of("ul"), "Beard trim_frHot towel shave_fr");
            assert_eq!(stats.writes_applied, 2);
        })
        .await;
}

/// 选择器列表只翻译匹配的根
#[tokio::test]
async fn test_selector_roots_limit_scope() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::new(&HtmlTestHelper::create_barbershop_page());
            let mut orchestrator = env.orchestrator();
            orchestrator.activate("header, footer").unwrap();
            orchestrator.wait_for_passes(1).await.unwrap();

            assert_eq!(env.text_of("footer"), "Call us today_fr");
            assert!(env.text_of("header").contains("Services_fr"));
            assert!(env.text_of("main").contains("Classic haircut"));
            assert!(!env.text_of("main").contains("_fr"));
        })
        .await;
}

/// 元素目标只观察该元素
#[tokio::test(start_paused = true)]
async fn test_element_target_observes_only_its_subtree() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::new(&HtmlTestHelper::create_simple_page(
                "<main><p>Inside</p></main><aside></aside>",
            ));
            let mut orchestrator = env.orchestrator();
            orchestrator
                .activate(RootTarget::Element(env.first("main")))
                .unwrap();
            orchestrator.wait_for_passes(1).await.unwrap();
            assert_eq!(env.text_of("main"), "Inside_fr");

            let aside = env.first("aside");
            env.document.append_html(&aside, "<p>Outside</p>").unwrap();
            settle().await;

            assert_eq!(orchestrator.stats().passes_started, 1);
            assert_eq!(env.text_of("aside"), "Outside");
        })
        .await;
}

/// 用户在轮次进行中修改的文本不会被旧译文覆盖
#[tokio::test(start_paused = true)]
async fn test_stale_units_are_left_alone() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::with_backend(
                &HtmlTestHelper::create_simple_page("<p>Hello</p>"),
                MockBackend::suffix().with_delay(std::time::Duration::from_millis(100)),
            );
            let mut orchestrator = env.orchestrator();
            orchestrator.activate("body").unwrap();

            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            env.document.set_text(&env.text_node("p"), "Goodbye").unwrap();

            let stats = orchestrator.wait_for_passes(2).await.unwrap();
            assert_eq!(env.text_of("p"), "Goodbye_fr");
            assert_eq!(stats.stale_skipped, 1);
            assert_eq!(stats.writes_applied, 1);
        })
        .await;
}

/// 收集器直接作用于活动文档
#[test]
fn test_collector_reads_live_tree() {
    let document = LiveDocument::parse("<body><p>One</p></body>").unwrap();
    let body = document.body().unwrap();
    let mut collector = DomTextCollector::new(CollectorConfig::default());

    assert_eq!(collector.collect(&body, &document.document()).len(), 1);

    document.append_html(&body, "<p>Two</p><p>   </p>").unwrap();
    let units = collector.collect(&body, &document.document());
    let texts: Vec<&str> = units.text_units.iter().map(|u| u.source_text()).collect();
    assert_eq!(texts, vec!["One", "Two"]);
}

/// 通过 HTTP 端点翻译整个文档
#[tokio::test]
async fn test_document_through_http_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("client", "gtx"))
        .and(query_param("sl", "auto"))
        .and(query_param("tl", "ru"))
        .and(query_param("dt", "t"))
        .and(query_param("q", "Hello"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(GoogleResponseHelper::sentences(&[("Привет", "Hello")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config: AutoTranslateConfig = TestConfigBuilder::new()
        .with_endpoint(&format!("{}/translate_a/single", server.uri()), 5)
        .build();
    let options = AutoTranslateOptions {
        config: config.clone(),
        language: Some("ru".to_string()),
        ..Default::default()
    };

    let result = LocalSet::new()
        .run_until(async {
            let backend = GoogleTranslateBackend::new(&config.endpoint).unwrap();
            translate_document_with(
                HtmlTestHelper::create_simple_page("<div>Hello</div><div>Hello</div>").as_bytes(),
                &options,
                Rc::new(backend),
            )
            .await
            .unwrap()
        })
        .await;

    let html = String::from_utf8(result.html).unwrap();
    assert_eq!(html.matches("<div>Привет</div>").count(), 2);
    assert_eq!(result.language.as_str(), "ru");
}
