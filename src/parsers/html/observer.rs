//! 活动文档与变更观察
//!
//! `LiveDocument` 包装一棵 `RcDom`，所有结构和文本修改都经过它完成，并同步
//! 通知已注册的观察者。观察者通过无界通道接收 `MutationRecord`，由各自的
//! 任务在下一次调度时处理。

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use html5ever::interface::{Attribute, QualName};
use html5ever::tendril::format_tendril;
use html5ever::tree_builder::create_element;
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};
use tokio::sync::mpsc;

use super::dom::{
    get_child_node_by_name, get_node_attr, get_parent_node, get_text, html_to_dom,
    is_inclusive_descendant, same_node, set_node_attr, set_text,
};
use super::selector::SelectorList;
use super::serializer::serialize_document;
use crate::translation::error::{TranslationError, TranslationResult};

/// 观察选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub character_data: bool,
    pub attributes: bool,
    pub subtree: bool,
}

impl ObserveOptions {
    /// 子节点增删 + 文本变化，覆盖整个子树
    pub fn content() -> Self {
        Self {
            child_list: true,
            character_data: true,
            attributes: false,
            subtree: true,
        }
    }
}

/// 变更类型
#[derive(Debug, Clone)]
pub enum MutationKind {
    ChildList {
        added: Vec<Handle>,
        removed: Vec<Handle>,
    },
    CharacterData,
    Attributes {
        name: String,
    },
}

/// 一条变更记录
#[derive(Clone)]
pub struct MutationRecord {
    pub kind: MutationKind,
    /// 子节点变更时为父节点，文本变更时为文本节点，属性变更时为元素
    pub target: Handle,
    /// 文本或属性的新值
    pub new_value: Option<String>,
}

impl fmt::Debug for MutationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            MutationKind::ChildList { added, removed } => {
                format!("ChildList(+{}, -{})", added.len(), removed.len())
            }
            MutationKind::CharacterData => "CharacterData".to_string(),
            MutationKind::Attributes { name } => format!("Attributes({})", name),
        };
        f.debug_struct("MutationRecord")
            .field("kind", &kind)
            .field("new_value", &self.new_value)
            .finish()
    }
}

struct ObserverEntry {
    id: u64,
    target: Handle,
    options: ObserveOptions,
    sender: mpsc::UnboundedSender<MutationRecord>,
}

impl ObserverEntry {
    fn wants(&self, record: &MutationRecord) -> bool {
        let kind_matches = match record.kind {
            MutationKind::ChildList { .. } => self.options.child_list,
            MutationKind::CharacterData => self.options.character_data,
            MutationKind::Attributes { .. } => self.options.attributes,
        };

        kind_matches
            && (same_node(&record.target, &self.target)
                || (self.options.subtree && is_inclusive_descendant(&record.target, &self.target)))
    }
}

#[derive(Default)]
struct ObserverRegistry {
    next_id: Cell<u64>,
    entries: RefCell<Vec<ObserverEntry>>,
}

impl ObserverRegistry {
    fn register(&self, target: Handle, options: ObserveOptions) -> (u64, mpsc::UnboundedReceiver<MutationRecord>) {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let (sender, receiver) = mpsc::unbounded_channel();
        self.entries.borrow_mut().push(ObserverEntry {
            id,
            target,
            options,
            sender,
        });
        (id, receiver)
    }

    fn unregister(&self, id: u64) {
        self.entries.borrow_mut().retain(|entry| entry.id != id);
    }

    fn notify(&self, record: MutationRecord) {
        let mut closed = false;
        for entry in self.entries.borrow().iter() {
            if entry.wants(&record) && entry.sender.send(record.clone()).is_err() {
                closed = true;
            }
        }

        if closed {
            self.entries
                .borrow_mut()
                .retain(|entry| !entry.sender.is_closed());
        }
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// 子树变更观察者，销毁时自动断开
pub struct MutationObserver {
    id: u64,
    registry: Weak<ObserverRegistry>,
    receiver: mpsc::UnboundedReceiver<MutationRecord>,
    connected: bool,
}

impl MutationObserver {
    /// 等待下一条变更；断开后排空缓冲即返回 `None`
    pub async fn recv(&mut self) -> Option<MutationRecord> {
        self.receiver.recv().await
    }

    /// 取出所有已缓冲的变更
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        let mut records = Vec::new();
        while let Ok(record) = self.receiver.try_recv() {
            records.push(record);
        }
        records
    }

    /// 断开观察，可重复调用
    pub fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
        self.receiver.close();
    }

    pub fn is_connected(&self) -> bool {
        self.connected && self.registry.strong_count() > 0
    }

    /// 可以在别处断开本观察者的句柄
    pub fn handle(&self) -> ObserverHandle {
        ObserverHandle {
            id: self.id,
            registry: self.registry.clone(),
        }
    }
}

/// 观察者的断开句柄
///
/// 断开后观察者排空已缓冲的记录，之后 `recv` 返回 `None`。
#[derive(Clone)]
pub struct ObserverHandle {
    id: u64,
    registry: Weak<ObserverRegistry>,
}

impl ObserverHandle {
    pub fn disconnect(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
    }
}

impl Drop for MutationObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}

struct DocumentInner {
    dom: RcDom,
    observers: Rc<ObserverRegistry>,
}

/// 活动文档
#[derive(Clone)]
pub struct LiveDocument {
    inner: Rc<DocumentInner>,
}

impl fmt::Debug for LiveDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveDocument")
            .field("observers", &self.inner.observers.len())
            .finish()
    }
}

impl LiveDocument {
    /// 包装已解析的文档
    pub fn from_dom(dom: RcDom) -> Self {
        Self {
            inner: Rc::new(DocumentInner {
                dom,
                observers: Rc::new(ObserverRegistry::default()),
            }),
        }
    }

    /// 解析 UTF-8 HTML
    pub fn parse(html: &str) -> TranslationResult<Self> {
        Self::from_bytes(html.as_bytes(), "utf-8")
    }

    /// 按给定编码解析 HTML 字节
    pub fn from_bytes(data: &[u8], encoding: &str) -> TranslationResult<Self> {
        Ok(Self::from_dom(html_to_dom(data, encoding)?))
    }

    pub fn dom(&self) -> &RcDom {
        &self.inner.dom
    }

    /// 文档根节点
    pub fn document(&self) -> Handle {
        self.inner.dom.document.clone()
    }

    pub fn body(&self) -> Option<Handle> {
        get_child_node_by_name(&self.inner.dom.document, "html")
            .and_then(|html| get_child_node_by_name(&html, "body"))
    }

    /// 节点是否仍在文档树上
    pub fn contains(&self, node: &Handle) -> bool {
        is_inclusive_descendant(node, &self.inner.dom.document)
    }

    /// 按文档顺序查找匹配元素
    pub fn select(&self, selectors: &SelectorList) -> Vec<Handle> {
        selectors.select_all(&self.inner.dom.document)
    }

    /// 按选择器字符串查找
    pub fn query_selector_all(&self, selectors: &str) -> TranslationResult<Vec<Handle>> {
        Ok(self.select(&SelectorList::parse(selectors)?))
    }

    /// 创建游离元素
    pub fn create_element(&self, tag: &str, attrs: &[(&str, &str)]) -> Handle {
        let attrs = attrs
            .iter()
            .map(|(name, value)| Attribute {
                name: QualName::new(None, ns!(), LocalName::from(*name)),
                value: format_tendril!("{}", value),
            })
            .collect();

        create_element(
            &self.inner.dom,
            QualName::new(None, ns!(html), LocalName::from(tag)),
            attrs,
        )
    }

    /// 创建游离文本节点
    pub fn create_text(&self, text: &str) -> Handle {
        Node::new(NodeData::Text {
            contents: RefCell::new(text.into()),
        })
    }

    /// 从原父节点取下，返回原父节点
    fn detach(node: &Handle) -> Option<Handle> {
        let parent = get_parent_node(node)?;
        parent
            .children
            .borrow_mut()
            .retain(|child| !same_node(child, node));
        node.parent.set(None);
        Some(parent)
    }

    /// 追加子节点；已挂在别处的节点会先被移走
    pub fn append_child(&self, parent: &Handle, child: &Handle) -> TranslationResult<()> {
        if !matches!(parent.data, NodeData::Element { .. } | NodeData::Document) {
            return Err(TranslationError::InvalidInput(
                "只能向元素或文档追加子节点".to_string(),
            ));
        }
        if is_inclusive_descendant(parent, child) {
            return Err(TranslationError::InvalidInput(
                "不能把节点追加到它自己的子树中".to_string(),
            ));
        }

        if let Some(old_parent) = Self::detach(child) {
            self.notify(MutationRecord {
                kind: MutationKind::ChildList {
                    added: Vec::new(),
                    removed: vec![child.clone()],
                },
                target: old_parent,
                new_value: None,
            });
        }

        child.parent.set(Some(Rc::downgrade(parent)));
        parent.children.borrow_mut().push(child.clone());

        self.notify(MutationRecord {
            kind: MutationKind::ChildList {
                added: vec![child.clone()],
                removed: Vec::new(),
            },
            target: parent.clone(),
            new_value: None,
        });
        Ok(())
    }

    /// 解析 HTML 片段并追加到 `parent` 末尾，返回新增的顶层节点
    pub fn append_html(&self, parent: &Handle, html: &str) -> TranslationResult<Vec<Handle>> {
        let fragment = html_to_dom(format!("<body>{}</body>", html).as_bytes(), "utf-8")?;
        let Some(fragment_body) = get_child_node_by_name(&fragment.document, "html")
            .and_then(|root| get_child_node_by_name(&root, "body"))
        else {
            return Ok(Vec::new());
        };

        let added: Vec<Handle> = fragment_body.children.borrow_mut().drain(..).collect();
        {
            let mut children = parent.children.borrow_mut();
            for node in &added {
                node.parent.set(Some(Rc::downgrade(parent)));
                children.push(node.clone());
            }
        }

        if !added.is_empty() {
            self.notify(MutationRecord {
                kind: MutationKind::ChildList {
                    added: added.clone(),
                    removed: Vec::new(),
                },
                target: parent.clone(),
                new_value: None,
            });
        }
        Ok(added)
    }

    /// 移除节点，返回原父节点
    pub fn remove(&self, node: &Handle) -> Option<Handle> {
        let parent = Self::detach(node)?;
        self.notify(MutationRecord {
            kind: MutationKind::ChildList {
                added: Vec::new(),
                removed: vec![node.clone()],
            },
            target: parent.clone(),
            new_value: None,
        });
        Some(parent)
    }

    /// 改写文本节点
    pub fn set_text(&self, node: &Handle, value: &str) -> TranslationResult<()> {
        if !set_text(node, value) {
            return Err(TranslationError::InvalidInput("目标不是文本节点".to_string()));
        }

        self.notify(MutationRecord {
            kind: MutationKind::CharacterData,
            target: node.clone(),
            new_value: Some(value.to_string()),
        });
        Ok(())
    }

    /// 读取文本节点
    pub fn text(&self, node: &Handle) -> Option<String> {
        get_text(node)
    }

    /// 设置元素属性
    pub fn set_attribute(&self, element: &Handle, name: &str, value: &str) -> TranslationResult<()> {
        if !matches!(element.data, NodeData::Element { .. }) {
            return Err(TranslationError::InvalidInput("目标不是元素".to_string()));
        }

        set_node_attr(element, name, Some(value.to_string()));
        self.notify(MutationRecord {
            kind: MutationKind::Attributes {
                name: name.to_string(),
            },
            target: element.clone(),
            new_value: Some(value.to_string()),
        });
        Ok(())
    }

    /// 读取元素属性
    pub fn attribute(&self, element: &Handle, name: &str) -> Option<String> {
        get_node_attr(element, name)
    }

    /// 开始观察 `target`
    pub fn observe(&self, target: &Handle, options: ObserveOptions) -> MutationObserver {
        let (id, receiver) = self.inner.observers.register(target.clone(), options);
        MutationObserver {
            id,
            registry: Rc::downgrade(&self.inner.observers),
            receiver,
            connected: true,
        }
    }

    /// 当前注册的观察者数量
    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }

    fn notify(&self, record: MutationRecord) {
        self.inner.observers.notify(record);
    }

    /// 序列化为 HTML
    pub fn serialize(&self) -> TranslationResult<Vec<u8>> {
        Ok(serialize_document(&self.inner.dom.document)?)
    }

    /// 序列化为字符串
    pub fn to_html(&self) -> TranslationResult<String> {
        String::from_utf8(self.serialize()?)
            .map_err(|e| TranslationError::ParseError(format!("序列化结果不是 UTF-8: {}", e)))
    }
}
