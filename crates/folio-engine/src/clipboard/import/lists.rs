//! Lists: `<ul>`, `<ol>` and check lists.
//!
//! Both nesting styles seen in the wild converge on the same shape:
//! `<ul><ul>` and `<li>text<ul>` each produce an item for the text (if any)
//! followed by a wrapper item holding the nested list.

use super::builder::{Builder, InlineBuf, Role, role};
use super::dom::{Element, HtmlNode};
use super::rules::Inherited;
use crate::model::{ListKind, Node, NodeKind};

fn is_list(el: &Element) -> bool {
    role(el) == Role::List
}

fn is_checkbox(el: &Element) -> bool {
    el.tag == "input"
        && el
            .attr("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("checkbox"))
}

/// Whether `li` marks itself as a check-list item.
fn is_check_item(li: &Element) -> bool {
    li.attr("role") == Some("checkbox")
        || li.has_attr("aria-checked")
        || li.classes().any(|c| c == "task-list-item" || c == "checked" || c == "unchecked")
        || li
            .descendants()
            .into_iter()
            .take_while(|e| !is_list(e))
            .any(is_checkbox)
}

fn is_checked(li: &Element) -> bool {
    li.attr("aria-checked") == Some("true")
        || li.classes().any(|c| c == "checked")
        || li
            .descendants()
            .into_iter()
            .take_while(|e| !is_list(e))
            .any(|e| is_checkbox(e) && e.has_attr("checked"))
}

fn list_kind(el: &Element) -> ListKind {
    let checklist = el.attr("data-list") == Some("check")
        || el
            .classes()
            .any(|c| c == "checklist" || c == "contains-task-list")
        || el.elements().any(|li| li.tag == "li" && is_check_item(li));
    if checklist {
        ListKind::Check
    } else if el.tag == "ol" {
        ListKind::Number
    } else {
        ListKind::Bullet
    }
}

pub(super) fn build_list(builder: &Builder, el: &Element, ctx: &Inherited) -> Node {
    let kind = list_kind(el);
    let start = match kind {
        ListKind::Number => el
            .attr("start")
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(1),
        _ => 1,
    };
    let mut items = Vec::new();
    for child in &el.children {
        match child {
            HtmlNode::Element(nested) if is_list(nested) => {
                let inner = builder.rules.enter(nested, ctx);
                items.push(Node::nested_item(build_list(builder, nested, &inner)));
            }
            HtmlNode::Element(li) if li.tag == "li" => push_item(builder, li, ctx, kind, &mut items),
            other if other.is_whitespace() => {}
            other => {
                // stray content between items
                let mut buf = InlineBuf::default();
                builder.inline_node(other, ctx, &mut buf);
                if buf.is_meaningful() {
                    items.push(item(kind, buf.finish().0));
                }
            }
        }
    }
    log::trace!("{} list with {} items", kind.as_str(), items.len());
    Node::new(NodeKind::List { kind, start }, items)
}

/// An `<li>` outside any list: a one-item bullet list.
pub(super) fn stray_item(builder: &Builder, li: &Element, ctx: &Inherited) -> Node {
    let kind = if is_check_item(li) {
        ListKind::Check
    } else {
        ListKind::Bullet
    };
    let mut items = Vec::new();
    push_item(builder, li, ctx, kind, &mut items);
    Node::list(kind, items)
}

fn item(kind: ListKind, children: Vec<Node>) -> Node {
    let checked = (kind == ListKind::Check).then_some(false);
    Node::new(NodeKind::ListItem { value: 1, checked }, children)
}

/// Items produced by one `<li>`: text segments split around nested lists.
struct ItemParts {
    checked: Option<bool>,
    buf: InlineBuf,
    out: Vec<Node>,
}

impl ItemParts {
    fn close_text(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        if buf.is_meaningful() {
            let (content, _) = buf.finish();
            self.out.push(Node::new(
                NodeKind::ListItem {
                    value: 1,
                    checked: self.checked,
                },
                content,
            ));
        }
    }

    fn push_list(&mut self, list: Node) {
        self.close_text();
        self.out.push(Node::nested_item(list));
    }

    fn finish(mut self) -> Vec<Node> {
        self.close_text();
        if self.out.is_empty() {
            self.out.push(Node::new(
                NodeKind::ListItem {
                    value: 1,
                    checked: self.checked,
                },
                Vec::new(),
            ));
        }
        self.out
    }
}

fn push_item(builder: &Builder, li: &Element, ctx: &Inherited, kind: ListKind, items: &mut Vec<Node>) {
    let inner = builder.rules.enter(li, ctx);
    let mut parts = ItemParts {
        checked: (kind == ListKind::Check).then(|| is_checked(li)),
        buf: InlineBuf::default(),
        out: Vec::new(),
    };
    collect_item(builder, &li.children, &inner, &mut parts);
    items.extend(parts.finish());
}

/// Walk item content, looking through block wrappers for nested lists.
fn collect_item(builder: &Builder, nodes: &[HtmlNode], ctx: &Inherited, parts: &mut ItemParts) {
    for node in nodes {
        let HtmlNode::Element(el) = node else {
            builder.inline_node(node, ctx, &mut parts.buf);
            continue;
        };
        match role(el) {
            Role::List => {
                let inner = builder.rules.enter(el, ctx);
                parts.push_list(build_list(builder, el, &inner));
            }
            Role::Ignore => {}
            Role::Block | Role::Transparent | Role::Heading(_) => {
                let inner = builder.rules.enter(el, ctx);
                parts.buf.separate();
                collect_item(builder, &el.children, &inner, parts);
            }
            _ => builder.inline_node(node, ctx, &mut parts.buf),
        }
    }
}
