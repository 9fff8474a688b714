//! 编排器生命周期集成测试
//!
//! 使用暂停的时钟测试调度、合并、重入、语言漂移和停用

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use autotranslate::translation::{MockBackend, OrchestratorState};
use tokio::task::LocalSet;
use tokio::time::{sleep, Instant};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{settle, HtmlTestHelper, TestConfigBuilder, TestEnvironment};

fn slow_backend() -> MockBackend {
    MockBackend::suffix().with_delay(Duration::from_millis(100))
}

/// 同一帧内的多次变更只触发一个轮次
#[tokio::test(start_paused = true)]
async fn test_mutations_coalesce_into_one_pass() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::new(&HtmlTestHelper::create_simple_page("<ul></ul>"));
            let mut orchestrator = env.orchestrator();
            orchestrator.activate("body").unwrap();
            orchestrator.wait_for_passes(1).await.unwrap();

            let ul = env.first("ul");
            for i in 0..10 {
                env.document
                    .append_html(&ul, &format!("<li>Item number {i}</li>"))
                    .unwrap();
            }
            settle().await;

            let stats = orchestrator.stats();
            assert_eq!(stats.passes_started, 2);
            assert_eq!(stats.passes_completed, 2);
            assert_eq!(stats.writes_applied, 10);
        })
        .await;
}

/// 轮次进行中的变更只排一个后续轮次，任何时刻至多一个轮次在运行
#[tokio::test(start_paused = true)]
async fn test_mutations_during_pass_schedule_one_follow_up() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::with_backend(
                &HtmlTestHelper::create_simple_page("<p>One</p><div></div>"),
                slow_backend(),
            );
            let mut orchestrator = env.orchestrator();

            let max_running = Rc::new(Cell::new(0u64));
            let mut rx = orchestrator.subscribe();
            let watcher = {
                let max_running = max_running.clone();
                tokio::task::spawn_local(async move {
                    while rx.changed().await.is_ok() {
                        let stats = rx.borrow_and_update().clone();
                        let running = stats.passes_started - stats.passes_completed;
                        max_running.set(max_running.get().max(running));
                    }
                })
            };

            orchestrator.activate("body").unwrap();
            sleep(Duration::from_millis(10)).await;
            assert_eq!(orchestrator.state(), OrchestratorState::Translating);

            let div = env.first("div");
            env.document.append_html(&div, "<p>Two</p>").unwrap();
            sleep(Duration::from_millis(20)).await;
            env.document.append_html(&div, "<p>Three</p>").unwrap();

            sleep(Duration::from_millis(500)).await;

            let stats = orchestrator.stats();
            assert_eq!(stats.passes_started, 2);
            assert_eq!(stats.passes_completed, 2);
            assert_eq!(stats.writes_applied, 3);
            assert_eq!(env.backend.call_count(), 3);
            assert_eq!(max_running.get(), 1);
            assert_eq!(env.text_of("div"), "Two_frThree_fr");

            orchestrator.deactivate();
            watcher.abort();
        })
        .await;
}

/// 并发上限为 1 时请求依次发出
#[tokio::test(start_paused = true)]
async fn test_concurrency_limit_serializes_requests() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::with_backend(
                &HtmlTestHelper::create_simple_page("<p>Red</p><p>Green</p><p>Blue</p><p>Red</p>"),
                slow_backend(),
            )
            .with_config(TestConfigBuilder::new().with_concurrency(1).build());
            let mut orchestrator = env.orchestrator();

            let started = Instant::now();
            orchestrator.activate("body").unwrap();
            let stats = orchestrator.wait_for_passes(1).await.unwrap();

            assert!(started.elapsed() >= Duration::from_millis(300));
            assert_eq!(env.backend.call_count(), 3);
            assert_eq!(stats.writes_applied, 4);
        })
        .await;
}

/// 停用时进行中的轮次结果被丢弃
#[tokio::test(start_paused = true)]
async fn test_deactivate_during_pass_discards_results() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::with_backend(
                &HtmlTestHelper::create_simple_page("<p>Hello</p><div></div>"),
                slow_backend(),
            );
            let mut orchestrator = env.orchestrator();
            orchestrator.activate("body").unwrap();
            assert_eq!(env.document.observer_count(), 1);

            sleep(Duration::from_millis(10)).await;
            orchestrator.deactivate();
            assert_eq!(orchestrator.state(), OrchestratorState::Disposed);
            assert_eq!(env.document.observer_count(), 0);

            sleep(Duration::from_millis(200)).await;
            assert_eq!(env.text_of("p"), "Hello");
            assert_eq!(orchestrator.stats().writes_applied, 0);

            // 之后的变更和语言变化都不再触发轮次
            let div = env.first("div");
            env.document.append_html(&div, "<span>Later</span>").unwrap();
            env.set_locale("de-DE");
            sleep(Duration::from_secs(5)).await;

            assert_eq!(orchestrator.stats().passes_started, 1);
            assert_eq!(env.text_of("div"), "Later");
        })
        .await;
}

/// 环境语言变化后在下一次轮询时用新语言重新翻译
#[tokio::test(start_paused = true)]
async fn test_language_drift_retranslates() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::with_backend(
                &HtmlTestHelper::create_simple_page("<h1>Hello</h1>"),
                MockBackend::mapping(&[("Hello", "fr", "Bonjour"), ("Bonjour", "de", "Hallo")]),
            );
            let mut orchestrator = env.orchestrator();
            orchestrator.activate("body").unwrap();
            orchestrator.wait_for_passes(1).await.unwrap();
            assert_eq!(env.text_of("h1"), "Bonjour");
            assert_eq!(orchestrator.language().as_str(), "fr");

            env.set_locale("de-DE");
            sleep(Duration::from_millis(2100)).await;

            let stats = orchestrator.stats();
            assert_eq!(stats.passes_completed, 2);
            assert_eq!(stats.language.as_deref(), Some("de"));
            assert_eq!(orchestrator.language().as_str(), "de");
            assert_eq!(env.text_of("h1"), "Hallo");
        })
        .await;
}

/// 语言没有变化时轮询不触发轮次
#[tokio::test(start_paused = true)]
async fn test_drift_without_change_is_quiet() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::new(&HtmlTestHelper::create_simple_page("<p>Hello</p>"))
                .with_config(TestConfigBuilder::new().with_scheduling(16, 100).build());
            let mut orchestrator = env.orchestrator();
            orchestrator.activate("body").unwrap();
            orchestrator.wait_for_passes(1).await.unwrap();

            sleep(Duration::from_millis(1000)).await;
            assert_eq!(orchestrator.stats().passes_started, 1);

            env.set_locale("es-MX");
            sleep(Duration::from_millis(150)).await;
            assert_eq!(orchestrator.stats().passes_started, 2);
            assert_eq!(env.text_of("p"), "Hello_fr_es");
        })
        .await;
}

/// 编排器自身的写回不会触发新的轮次
#[tokio::test(start_paused = true)]
async fn test_own_writes_do_not_trigger_passes() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::new(&HtmlTestHelper::create_barbershop_page());
            let mut orchestrator = env.orchestrator();
            orchestrator.activate("body").unwrap();
            let stats = orchestrator.wait_for_passes(1).await.unwrap();
            assert!(stats.writes_applied > 0);

            sleep(Duration::from_millis(500)).await;
            assert_eq!(orchestrator.stats().passes_started, 1);
        })
        .await;
}

/// 轮次进行中被用户修改的文本记为过期，随后按新内容翻译
#[tokio::test(start_paused = true)]
async fn test_user_edit_during_pass_is_retranslated() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::with_backend(
                &HtmlTestHelper::create_simple_page("<p>Hello</p><p>World</p>"),
                slow_backend(),
            );
            let mut orchestrator = env.orchestrator();
            orchestrator.activate("body").unwrap();

            sleep(Duration::from_millis(10)).await;
            let first = env.text_node("p");
            env.document.set_text(&first, "Howdy").unwrap();

            sleep(Duration::from_millis(500)).await;
            let stats = orchestrator.stats();
            assert_eq!(stats.passes_completed, 2);
            assert_eq!(stats.stale_skipped, 1);
            assert_eq!(stats.writes_applied, 2);
            assert_eq!(env.html().matches("<p>Howdy_fr</p><p>World_fr</p>").count(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_state_transitions() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::with_backend(
                &HtmlTestHelper::create_simple_page("<p>Hello</p>"),
                slow_backend(),
            );
            let mut orchestrator = env.orchestrator();
            assert_eq!(orchestrator.state(), OrchestratorState::Idle);

            orchestrator.activate("body").unwrap();
            assert_eq!(orchestrator.state(), OrchestratorState::Activating);

            sleep(Duration::from_millis(10)).await;
            assert_eq!(orchestrator.state(), OrchestratorState::Translating);

            orchestrator.wait_for_passes(1).await.unwrap();
            sleep(Duration::from_millis(1)).await;
            assert_eq!(orchestrator.state(), OrchestratorState::Observing);

            orchestrator.deactivate();
            assert_eq!(orchestrator.state(), OrchestratorState::Disposed);
        })
        .await;
}

/// 释放编排器等同于停用
#[tokio::test(start_paused = true)]
async fn test_drop_deactivates() {
    LocalSet::new()
        .run_until(async {
            let env = TestEnvironment::new(&HtmlTestHelper::create_simple_page("<div></div>"));
            {
                let mut orchestrator = env.orchestrator();
                orchestrator.activate("body").unwrap();
                orchestrator.wait_for_passes(1).await.unwrap();
                assert_eq!(env.document.observer_count(), 1);
            }
            assert_eq!(env.document.observer_count(), 0);

            let div = env.first("div");
            env.document.append_html(&div, "<p>Hello</p>").unwrap();
            settle().await;
            assert_eq!(env.text_of("div"), "Hello");
        })
        .await;
}
