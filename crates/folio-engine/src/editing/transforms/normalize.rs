//! The normalization pass every structural transform ends with.
//!
//! Rules, applied bottom-up until the tree is stable:
//! - empty lists are removed, as are nested-item wrappers left holding one
//! - adjacent sibling lists of the same kind merge (the first keeps its key)
//! - adjacent wrapper items whose nested lists share a kind merge
//! - adjacent text runs with identical marks merge, empty runs beside other
//!   content are dropped, empty links are dropped
//! - code blocks hold exactly one plain text run
//! - caret-holding blocks and table cells are never left without children
//! - list items are renumbered 1..N
//!
//! Subtrees that already satisfy the rules are not copied.

use std::sync::Arc;

use crate::model::{Document, ListKind, Node, NodeKind, TextRun};

/// Upper bound on fix-up rounds; each round settles at least one level.
const MAX_ROUNDS: usize = 16;

pub fn normalize(doc: &mut Document) {
    doc.with_root_mut(|root| {
        for _ in 0..MAX_ROUNDS {
            if !subtree_dirty(root) {
                break;
            }
            fix_tree(root);
        }
    });
    doc.renumber();
    doc.adopt_unset();
}

fn subtree_dirty(node: &Node) -> bool {
    locally_dirty(node) || node.children().iter().any(|c| subtree_dirty(c))
}

fn fix_tree(node: &mut Arc<Node>) {
    if node.children().iter().any(|c| subtree_dirty(c)) {
        let n = Arc::make_mut(node);
        for child in &mut n.children {
            fix_tree(child);
        }
    }
    if locally_dirty(node) {
        fix_local(Arc::make_mut(node));
    }
}

fn is_empty_list(node: &Node) -> bool {
    node.is_list() && node.children().is_empty()
}

fn is_dead_wrapper(node: &Node) -> bool {
    node.is_list_item() && node.children().len() == 1 && is_empty_list(&node.children()[0])
}

fn wrapper_kind(node: &Node) -> Option<ListKind> {
    if node.is_nested_list_item() {
        node.children()[0].list_kind()
    } else {
        None
    }
}

fn holds_inline(node: &Node) -> bool {
    matches!(
        node.kind(),
        NodeKind::Paragraph | NodeKind::Heading { .. } | NodeKind::Link { .. }
    ) || (node.is_list_item() && !node.children().iter().any(|c| c.is_list()))
}

fn mergeable_runs(a: &Node, b: &Node) -> bool {
    match (a.text_run(), b.text_run()) {
        (Some(x), Some(y)) => x.same_marks(y),
        _ => false,
    }
}

fn locally_dirty(node: &Node) -> bool {
    let children = node.children();

    if node.is_code_block() {
        return match children {
            [only] => only
                .text_run()
                .is_none_or(|run| !run.format.is_empty() || !run.style.is_empty()),
            _ => true,
        };
    }
    if children.is_empty() {
        return node.is_text_block() || node.is_table_cell() || *node.kind() == NodeKind::Root;
    }
    if !node.is_list_item() && children.iter().any(|c| is_empty_list(c)) {
        return true;
    }
    if node.is_list() && children.iter().any(|c| is_dead_wrapper(c)) {
        return true;
    }
    for pair in children.windows(2) {
        if let (Some(a), Some(b)) = (pair[0].list_kind(), pair[1].list_kind())
            && a == b
        {
            return true;
        }
        if node.is_list()
            && let (Some(a), Some(b)) = (wrapper_kind(&pair[0]), wrapper_kind(&pair[1]))
            && a == b
        {
            return true;
        }
        if holds_inline(node) && mergeable_runs(&pair[0], &pair[1]) {
            return true;
        }
    }
    if holds_inline(node) {
        if children.len() > 1 && children.iter().any(|c| c.text_str().is_some_and(str::is_empty)) {
            return true;
        }
        if children
            .iter()
            .any(|c| matches!(c.kind(), NodeKind::Link { .. }) && c.children().is_empty())
        {
            return true;
        }
    }
    false
}

fn fix_local(node: &mut Node) {
    if node.is_code_block() {
        let text = node.inline_text();
        let key = node
            .children
            .iter()
            .find(|c| c.is_text())
            .map(|c| c.key());
        let mut run = Node::run(TextRun::plain(text));
        if let Some(key) = key {
            run = run.keyed(key);
        }
        node.children = vec![Arc::new(run)];
        return;
    }

    if node.children.is_empty() {
        if node.is_text_block() {
            node.children.push(Arc::new(Node::text("")));
        } else if node.is_table_cell() || *node.kind() == NodeKind::Root {
            node.children.push(Arc::new(Node::paragraph_text("")));
        }
        return;
    }

    if !node.is_list_item() {
        node.children.retain(|c| !is_empty_list(c));
    }
    if node.is_list() {
        node.children.retain(|c| !is_dead_wrapper(c));
    }

    let is_list = node.is_list();
    let inline = holds_inline(node);
    let mut merged: Vec<Arc<Node>> = Vec::with_capacity(node.children.len());
    for child in std::mem::take(&mut node.children) {
        if inline && matches!(child.kind(), NodeKind::Link { .. }) && child.children().is_empty() {
            continue;
        }
        if let Some(last) = merged.last_mut() {
            if let (Some(a), Some(b)) = (last.list_kind(), child.list_kind())
                && a == b
            {
                Arc::make_mut(last)
                    .children
                    .extend(child.children().iter().cloned());
                continue;
            }
            if is_list
                && let (Some(a), Some(b)) = (wrapper_kind(last), wrapper_kind(&child))
                && a == b
            {
                let items = child.children()[0].children().to_vec();
                let nested = &mut Arc::make_mut(last).children[0];
                Arc::make_mut(nested).children.extend(items);
                continue;
            }
            if inline && mergeable_runs(last, &child) {
                let extra = child.text_str().unwrap_or_default().to_string();
                if let NodeKind::Text(run) = &mut Arc::make_mut(last).kind {
                    run.text.push_str(&extra);
                }
                continue;
            }
        }
        merged.push(child);
    }

    if inline && merged.len() > 1 {
        merged.retain(|c| !c.text_str().is_some_and(str::is_empty));
        if merged.is_empty() {
            merged.push(Arc::new(Node::text("")));
        }
    }
    if merged.is_empty() && (node.is_text_block() || node.is_table_cell()) {
        let filler = if node.is_table_cell() {
            Node::paragraph_text("")
        } else {
            Node::text("")
        };
        merged.push(Arc::new(filler));
    }
    node.children = merged;
}
