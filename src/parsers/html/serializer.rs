use html5ever::interface::{Attribute, QualName};
use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::format_tendril;
use html5ever::tree_builder::create_element;
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, RcDom, SerializableHandle};

use super::dom::{get_child_node_by_name, get_node_attr, set_node_attr};

/// 查找 `<head>` 中的 meta 元素
fn head_meta_nodes(document: &Handle) -> Vec<Handle> {
    let Some(head) = get_child_node_by_name(document, "html")
        .and_then(|html| get_child_node_by_name(&html, "head"))
    else {
        return Vec::new();
    };

    let children = head.children.borrow();
    children
        .iter()
        .filter(|child| super::dom::get_node_name(child) == Some("meta"))
        .cloned()
        .collect()
}

fn charset_from_content_type(content: &str) -> Option<String> {
    content.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

/// 读取文档声明的字符集
pub fn get_charset(document: &Handle) -> Option<String> {
    for meta_node in head_meta_nodes(document).iter() {
        // 处理 <meta charset="..." /> 格式
        if let Some(charset) = get_node_attr(meta_node, "charset") {
            return Some(charset);
        }

        // 处理 <meta http-equiv="content-type" content="text/html; charset=..." /> 格式
        if get_node_attr(meta_node, "http-equiv")
            .unwrap_or_default()
            .eq_ignore_ascii_case("content-type")
        {
            if let Some(charset) =
                get_node_attr(meta_node, "content").and_then(|c| charset_from_content_type(&c))
            {
                return Some(charset);
            }
        }
    }

    None
}

/// 将字符集声明改写为给定值，没有声明时在 `<head>` 中插入
pub fn set_charset(dom: &RcDom, charset: &str) {
    let document = &dom.document;
    for meta_node in head_meta_nodes(document).iter() {
        if get_node_attr(meta_node, "charset").is_some() {
            set_node_attr(meta_node, "charset", Some(charset.to_string()));
            return;
        }

        if get_node_attr(meta_node, "http-equiv")
            .unwrap_or_default()
            .eq_ignore_ascii_case("content-type")
            && get_node_attr(meta_node, "content").is_some()
        {
            set_node_attr(
                meta_node,
                "content",
                Some(format!("text/html;charset={charset}")),
            );
            return;
        }
    }

    let Some(head) = get_child_node_by_name(document, "html")
        .and_then(|html| get_child_node_by_name(&html, "head"))
    else {
        return;
    };

    let meta: Handle = create_element(
        dom,
        QualName::new(None, ns!(), LocalName::from("meta")),
        vec![Attribute {
            name: QualName::new(None, ns!(), LocalName::from("charset")),
            value: format_tendril!("{}", charset),
        }],
    );
    // 字符集声明必须在前
    meta.parent.set(Some(std::rc::Rc::downgrade(&head)));
    head.children.borrow_mut().insert(0, meta);
}

/// 序列化文档
pub fn serialize_document(document: &Handle) -> std::io::Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();
    let serializable = SerializableHandle::from(document.clone());
    serialize(&mut buf, &serializable, SerializeOpts::default())?;
    Ok(buf)
}
