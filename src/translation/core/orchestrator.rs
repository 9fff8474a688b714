//! 翻译编排器
//!
//! 激活后解析目标语言、安装变更观察并立即执行初始轮次；之后由子树变更
//! （合并到下一帧）和语言漂移轮询触发新的轮次。控制任务独占观察者、帧定时器
//! 和漂移定时器，停用时整体释放。
//!
//! 所有任务都通过 `spawn_local` 运行，`activate` 必须在 `LocalSet` 中调用。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use markup5ever_rcdom::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::scheduler::{PassScheduler, SchedulerAction};
use super::translator::Translator;
use crate::parsers::html::dom::{is_inclusive_descendant, same_node};
use crate::parsers::html::observer::{
    LiveDocument, MutationKind, MutationObserver, MutationRecord, ObserveOptions, ObserverHandle,
};
use crate::parsers::html::selector::SelectorList;
use crate::translation::config::AutoTranslateConfig;
use crate::translation::error::{helpers::state_error, TranslationResult};
use crate::translation::language::{LanguageResolver, TargetLanguage};
use crate::translation::pipeline::collector::{
    CollectorConfig, DomTextCollector, TranslationUnit, UnitKind,
};

/// 翻译根
#[derive(Clone)]
pub enum RootTarget {
    /// 每轮重新匹配，观察整个文档
    Selector(String),
    /// 固定元素，只观察该元素的子树
    Element(Handle),
}

impl fmt::Debug for RootTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootTarget::Selector(selector) => f.debug_tuple("Selector").field(selector).finish(),
            RootTarget::Element(_) => f.write_str("Element(..)"),
        }
    }
}

impl From<&str> for RootTarget {
    fn from(selector: &str) -> Self {
        RootTarget::Selector(selector.to_string())
    }
}

impl From<Handle> for RootTarget {
    fn from(element: Handle) -> Self {
        RootTarget::Element(element)
    }
}

/// 编排器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Activating,
    Observing,
    Translating,
    Disposed,
}

/// 累计的轮次统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassStats {
    pub passes_started: u64,
    pub passes_completed: u64,
    pub units_collected: u64,
    pub writes_applied: u64,
    pub stale_skipped: u64,
    /// 最近一轮使用的语言
    pub language: Option<String>,
}

enum WriteOutcome {
    Applied,
    Unchanged,
    Stale,
    Inactive,
}

/// 解析后的翻译根
enum ResolvedTarget {
    Selector(SelectorList),
    Element(Handle),
}

impl ResolvedTarget {
    /// 当前的翻译根，去掉被其他根包含的重复项
    fn roots(&self, document: &LiveDocument) -> Vec<Handle> {
        match self {
            ResolvedTarget::Element(element) => vec![element.clone()],
            ResolvedTarget::Selector(selectors) => {
                let mut roots: Vec<Handle> = Vec::new();
                for found in document.select(selectors) {
                    if !roots.iter().any(|root| is_inclusive_descendant(&found, root)) {
                        roots.push(found);
                    }
                }
                roots
            }
        }
    }
}

struct Shared {
    document: LiveDocument,
    translator: Rc<Translator>,
    resolver: LanguageResolver,
    config: AutoTranslateConfig,
    active: Cell<bool>,
    state: Cell<OrchestratorState>,
    language: RefCell<TargetLanguage>,
    /// 本编排器写入的 (文本节点, 新值)，对应的变更记录不再触发轮次
    own_writes: RefCell<Vec<(Handle, String)>>,
    stats: watch::Sender<PassStats>,
}

impl Shared {
    fn is_own_write(&self, record: &MutationRecord) -> bool {
        if !matches!(record.kind, MutationKind::CharacterData) {
            return false;
        }

        let mut own_writes = self.own_writes.borrow_mut();
        let position = own_writes.iter().position(|(node, value)| {
            same_node(node, &record.target) && record.new_value.as_deref() == Some(value.as_str())
        });
        match position {
            Some(index) => {
                own_writes.swap_remove(index);
                true
            }
            None => false,
        }
    }

    fn write_back(
        &self,
        collector: &DomTextCollector,
        unit: &TranslationUnit,
        translated: &str,
    ) -> WriteOutcome {
        if !self.active.get() {
            return WriteOutcome::Inactive;
        }

        let source = unit.source_text();
        if translated == source {
            return WriteOutcome::Unchanged;
        }

        // 收集之后被改过的位置保持不动
        match unit.read_live() {
            Some(live) if live == unit.original => {}
            _ => return WriteOutcome::Stale,
        }
        // 移出根、脱离文档或进入排除区域的位置同样保持不动
        if !collector.is_writable(unit, &self.document.document()) {
            return WriteOutcome::Stale;
        }

        let written = match &unit.kind {
            UnitKind::Text => {
                let original = unit.original.as_str();
                let leading = original.len() - original.trim_start().len();
                let trailing = original.len() - original.trim_end().len();
                let value = format!(
                    "{}{}{}",
                    &original[..leading],
                    translated,
                    &original[original.len() - trailing..]
                );

                self.own_writes
                    .borrow_mut()
                    .push((unit.node.clone(), value.clone()));
                let result = self.document.set_text(&unit.node, &value);
                if result.is_err() {
                    self.own_writes.borrow_mut().pop();
                }
                result
            }
            UnitKind::Attribute(name) => self.document.set_attribute(&unit.node, name, translated),
        };

        match written {
            Ok(()) => WriteOutcome::Applied,
            Err(e) => {
                tracing::debug!("写回失败: {}", e);
                WriteOutcome::Stale
            }
        }
    }
}

/// 翻译编排器
pub struct TranslationOrchestrator {
    shared: Rc<Shared>,
    stats_rx: watch::Receiver<PassStats>,
    shutdown: Option<oneshot::Sender<()>>,
    control: Option<JoinHandle<()>>,
    observer: Option<ObserverHandle>,
}

impl fmt::Debug for TranslationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationOrchestrator")
            .field("state", &self.shared.state.get())
            .field("language", &*self.shared.language.borrow())
            .finish()
    }
}

impl TranslationOrchestrator {
    pub fn new(
        document: LiveDocument,
        translator: Rc<Translator>,
        resolver: LanguageResolver,
        config: AutoTranslateConfig,
    ) -> Self {
        let language = resolver.default_language().clone();
        let (stats, stats_rx) = watch::channel(PassStats::default());

        Self {
            shared: Rc::new(Shared {
                document,
                translator,
                resolver,
                config,
                active: Cell::new(false),
                state: Cell::new(OrchestratorState::Idle),
                language: RefCell::new(language),
                own_writes: RefCell::new(Vec::new()),
                stats,
            }),
            stats_rx,
            shutdown: None,
            control: None,
            observer: None,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.shared.state.get()
    }

    /// 当前目标语言
    pub fn language(&self) -> TargetLanguage {
        self.shared.language.borrow().clone()
    }

    pub fn document(&self) -> &LiveDocument {
        &self.shared.document
    }

    /// 订阅轮次统计
    pub fn subscribe(&self) -> watch::Receiver<PassStats> {
        self.stats_rx.clone()
    }

    pub fn stats(&self) -> PassStats {
        self.stats_rx.borrow().clone()
    }

    /// 等待累计完成 `count` 个轮次
    pub async fn wait_for_passes(&self, count: u64) -> TranslationResult<PassStats> {
        let mut rx = self.stats_rx.clone();
        let stats = rx
            .wait_for(|stats| stats.passes_completed >= count)
            .await
            .map_err(|_| state_error("编排器已释放"))?;
        Ok(stats.clone())
    }

    /// 激活：解析语言、安装观察、开始初始轮次
    ///
    /// # Panics
    ///
    /// 不在 `LocalSet` 中调用时由 `spawn_local` 触发 panic。
    pub fn activate(&mut self, target: impl Into<RootTarget>) -> TranslationResult<()> {
        match self.shared.state.get() {
            OrchestratorState::Idle => {}
            OrchestratorState::Disposed => {
                return Err(state_error("编排器已停用，不能再次激活"))
            }
            _ => {
                return Err(state_error("编排器已经激活"));
            }
        }

        let (resolved, observed) = match target.into() {
            RootTarget::Selector(selector) => (
                ResolvedTarget::Selector(SelectorList::parse(&selector)?),
                self.shared.document.document(),
            ),
            RootTarget::Element(element) => (ResolvedTarget::Element(element.clone()), element),
        };

        let shared = &self.shared;
        shared.state.set(OrchestratorState::Activating);
        shared.active.set(true);

        let resolution = shared.resolver.resolve_detailed();
        tracing::info!(
            "激活自动翻译: 目标语言 {} (来源: {})",
            resolution.language,
            resolution.source
        );
        *shared.language.borrow_mut() = resolution.language;

        // 先安装观察，初始轮次期间的变更不会漏掉
        let observer = shared.document.observe(&observed, ObserveOptions::content());
        self.observer = Some(observer.handle());

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown = Some(shutdown_tx);
        self.control = Some(tokio::task::spawn_local(control_loop(
            Rc::clone(shared),
            Rc::new(resolved),
            observer,
            shutdown_rx,
        )));
        Ok(())
    }

    /// 停用：断开观察、取消定时器，之后不再写入文档。可重复调用
    pub fn deactivate(&mut self) {
        let shared = &self.shared;
        if shared.state.get() == OrchestratorState::Disposed {
            return;
        }
        let was_active = shared.active.replace(false);
        shared.state.set(OrchestratorState::Disposed);

        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(control) = self.control.take() {
            control.abort();
        }
        shared.own_writes.borrow_mut().clear();

        if was_active {
            tracing::info!("自动翻译已停用");
        }
    }
}

impl Drop for TranslationOrchestrator {
    fn drop(&mut self) {
        self.deactivate();
    }
}

fn spawn_pass(shared: &Rc<Shared>, target: &Rc<ResolvedTarget>, done: &mpsc::UnboundedSender<()>) {
    let shared = Rc::clone(shared);
    let target = Rc::clone(target);
    let done = done.clone();
    tokio::task::spawn_local(async move {
        run_pass(&shared, &target).await;
        let _ = done.send(());
    });
}

async fn control_loop(
    shared: Rc<Shared>,
    target: Rc<ResolvedTarget>,
    mut observer: MutationObserver,
    mut shutdown: oneshot::Receiver<()>,
) {
    let scheduling = &shared.config.scheduling;
    let frame_interval = scheduling.frame_interval();
    let drift_interval = scheduling.drift_interval().max(Duration::from_millis(1));

    let mut scheduler = PassScheduler::new();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<()>();

    let frame = time::sleep(frame_interval);
    tokio::pin!(frame);
    let mut frame_armed = false;

    let mut drift = time::interval_at(Instant::now() + drift_interval, drift_interval);
    drift.set_missed_tick_behavior(MissedTickBehavior::Skip);

    if scheduler.start_now() == SchedulerAction::StartPass {
        spawn_pass(&shared, &target, &done_tx);
    }

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => break,

            Some(record) = observer.recv() => {
                if shared.is_own_write(&record) {
                    continue;
                }
                if let MutationKind::ChildList { added, .. } = &record.kind {
                    if added.is_empty() {
                        continue;
                    }
                }

                tracing::trace!("检测到子树变更: {:?}", record);
                if scheduler.request() == SchedulerAction::ArmFrame {
                    frame.as_mut().reset(Instant::now() + frame_interval);
                    frame_armed = true;
                }
            }

            () = &mut frame, if frame_armed => {
                frame_armed = false;
                if scheduler.frame_fired() == SchedulerAction::StartPass {
                    spawn_pass(&shared, &target, &done_tx);
                }
            }

            _ = drift.tick() => {
                let language = shared.resolver.resolve();
                if language != *shared.language.borrow() {
                    tracing::info!(
                        "目标语言变化: {} -> {}",
                        shared.language.borrow(),
                        language
                    );
                    *shared.language.borrow_mut() = language;
                    if scheduler.start_now() == SchedulerAction::StartPass {
                        spawn_pass(&shared, &target, &done_tx);
                    }
                }
            }

            Some(()) = done_rx.recv() => {
                if scheduler.pass_finished() == SchedulerAction::StartPass {
                    spawn_pass(&shared, &target, &done_tx);
                } else if shared.active.get() {
                    shared.state.set(OrchestratorState::Observing);
                }
            }
        }
    }

    observer.disconnect();
    tracing::debug!("控制任务退出");
}

/// 一个翻译轮次：收集 → 并发翻译 → 逐个写回
async fn run_pass(shared: &Rc<Shared>, target: &ResolvedTarget) {
    if !shared.active.get() {
        return;
    }
    shared.state.set(OrchestratorState::Translating);

    let language = shared.language.borrow().clone();
    let document = &shared.document;

    let mut collector = DomTextCollector::new(CollectorConfig::from(&shared.config.markers));
    let mut units = Vec::new();
    for root in target.roots(document) {
        units.extend(collector.collect(&root, &document.document()).into_units());
        tracing::trace!(
            "收集到 {} 个单元 (访问 {} 个节点)",
            collector.stats().total_units(),
            collector.stats().nodes_visited
        );
    }
    let collected = units.len() as u64;

    let mut pass_number = 0;
    shared.stats.send_modify(|stats| {
        stats.passes_started += 1;
        stats.units_collected += collected;
        stats.language = Some(language.to_string());
        pass_number = stats.passes_started;
    });

    // 相同原文在一轮内只翻译一次
    let mut groups: Vec<(String, Vec<TranslationUnit>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for unit in units {
        let text = unit.source_text().to_string();
        match index.get(&text) {
            Some(&i) => groups[i].1.push(unit),
            None => {
                index.insert(text.clone(), groups.len());
                groups.push((text, vec![unit]));
            }
        }
    }

    let limit = shared.config.scheduling.max_concurrent_requests.max(1);
    let mut results = stream::iter(groups.into_iter().map(|(text, units)| {
        let translator = Rc::clone(&shared.translator);
        let language = language.clone();
        async move {
            let translated = translator.translate(&text, &language).await;
            (units, translated)
        }
    }))
    .buffer_unordered(limit);

    let (mut applied, mut stale) = (0u64, 0u64);
    while let Some((units, translated)) = results.next().await {
        for unit in &units {
            match shared.write_back(&collector, unit, &translated) {
                WriteOutcome::Applied => applied += 1,
                WriteOutcome::Stale => stale += 1,
                WriteOutcome::Unchanged | WriteOutcome::Inactive => {}
            }
        }
    }

    shared.stats.send_modify(|stats| {
        stats.passes_completed += 1;
        stats.writes_applied += applied;
        stats.stale_skipped += stale;
    });

    if shared.active.get() {
        tracing::info!(
            "翻译轮次 #{} 完成 ({}): {} 个单元, 写回 {} 处, 过期 {} 处",
            pass_number,
            language,
            collected,
            applied,
            stale
        );
    } else {
        tracing::debug!("翻译轮次 #{} 在停用后结束，结果已丢弃", pass_number);
    }
}
