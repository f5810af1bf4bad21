//! Operations on the inline children of a text block.
//!
//! All functions take a block's children and return a new child list;
//! nodes that are not touched keep their `Arc` (and key). A text run that
//! is cut in two keeps its key on the first half; the second half is a new,
//! unkeyed node that the document adopts on insertion.

use std::sync::Arc;

use crate::model::{Node, NodeKey, NodeKind, TextRun, text};
use crate::selection::point::inline_len;

fn with_text(node: &Node, text: &str) -> Arc<Node> {
    let mut node = node.clone();
    if let NodeKind::Text(run) = &mut node.kind {
        run.text = text.to_string();
    }
    Arc::new(node)
}

/// Split at an inline offset. Links that straddle the offset are split
/// into two links.
pub(crate) fn split(children: &[Arc<Node>], offset: usize) -> (Vec<Arc<Node>>, Vec<Arc<Node>>) {
    let mut head = Vec::new();
    let mut tail = Vec::new();
    let mut pos = 0;
    for child in children {
        let len = inline_len(child);
        if pos + len <= offset {
            head.push(Arc::clone(child));
        } else if pos >= offset {
            tail.push(Arc::clone(child));
        } else {
            let at = offset - pos;
            match child.kind() {
                NodeKind::Text(run) => {
                    let (a, b) = text::split_at_char(&run.text, at);
                    head.push(with_text(child, a));
                    tail.push(Arc::new(Node::run(TextRun {
                        text: b.to_string(),
                        ..run.clone()
                    })));
                }
                NodeKind::Link { .. } => {
                    let (h, t) = split(child.children(), at);
                    head.push(Arc::new(child.with_children(h)));
                    tail.push(Arc::new(
                        child.with_children(t).keyed(NodeKey::UNSET),
                    ));
                }
                _ => tail.push(Arc::clone(child)),
            }
        }
        pos += len;
    }
    (head, tail)
}

/// Insert `nodes` at `offset`. An offset strictly inside a link inserts
/// into the link.
pub(crate) fn insert(children: &[Arc<Node>], offset: usize, nodes: Vec<Arc<Node>>) -> Vec<Arc<Node>> {
    let mut pos = 0;
    for (i, child) in children.iter().enumerate() {
        let len = inline_len(child);
        if matches!(child.kind(), NodeKind::Link { .. }) && pos < offset && offset < pos + len {
            let inner = insert(child.children(), offset - pos, nodes);
            let mut out = children.to_vec();
            out[i] = Arc::new(child.with_children(inner));
            return out;
        }
        pos += len;
    }
    let (mut head, tail) = split(children, offset);
    head.extend(nodes);
    head.extend(tail);
    head
}

/// Remove the content between two offsets.
pub(crate) fn delete(children: &[Arc<Node>], from: usize, to: usize) -> Vec<Arc<Node>> {
    let (from, to) = (from.min(to), from.max(to));
    let (mut head, _) = split(children, from);
    let (_, tail) = split(children, to);
    head.extend(tail);
    head
}

/// Copy of the content between two offsets.
pub(crate) fn slice(children: &[Arc<Node>], from: usize, to: usize) -> Vec<Arc<Node>> {
    let (from, to) = (from.min(to), from.max(to));
    let (head, _) = split(children, to);
    let (_, mid) = split(&head, from);
    mid
}

fn map_all(children: &[Arc<Node>], f: &mut impl FnMut(&mut TextRun)) -> Vec<Arc<Node>> {
    children
        .iter()
        .map(|child| match child.kind() {
            NodeKind::Text(_) => {
                let mut node = (**child).clone();
                if let NodeKind::Text(run) = &mut node.kind {
                    f(run);
                }
                Arc::new(node)
            }
            NodeKind::Link { .. } => Arc::new(child.with_children(map_all(child.children(), f))),
            _ => Arc::clone(child),
        })
        .collect()
}

/// Apply `f` to every text run between two offsets, splitting boundary runs.
pub(crate) fn map_runs(
    children: &[Arc<Node>],
    from: usize,
    to: usize,
    f: &mut impl FnMut(&mut TextRun),
) -> Vec<Arc<Node>> {
    let (from, to) = (from.min(to), from.max(to));
    let (mut out, rest) = split(children, from);
    let (mid, after) = split(&rest, to - from);
    out.extend(map_all(&mid, f));
    out.extend(after);
    out
}

/// Non-empty text runs between two offsets.
pub(crate) fn runs_in(children: &[Arc<Node>], from: usize, to: usize) -> Vec<TextRun> {
    slice(children, from, to)
        .iter()
        .flat_map(|n| n.descendants().filter_map(Node::text_run).cloned().collect::<Vec<_>>())
        .filter(|run| !run.text.is_empty())
        .collect()
}

/// Marks of the run just before `offset` (or at it, at the block start).
pub(crate) fn run_at(children: &[Arc<Node>], offset: usize) -> Option<TextRun> {
    let (head, tail) = split(children, offset);
    let last = |nodes: &[Arc<Node>]| {
        nodes
            .iter()
            .flat_map(|n| n.descendants().filter_map(Node::text_run).cloned().collect::<Vec<_>>())
            .last()
    };
    last(&head).or_else(|| {
        tail.iter()
            .find_map(|n| n.descendants().find_map(Node::text_run).cloned())
    })
}

/// Inline nodes for `text`, with `\n` turned into line breaks.
pub(crate) fn from_text(text: &str, template: &TextRun) -> Vec<Arc<Node>> {
    let mut out = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push(Arc::new(Node::line_break()));
        }
        if !line.is_empty() {
            out.push(Arc::new(Node::run(TextRun {
                text: line.to_string(),
                ..template.clone()
            })));
        }
    }
    out
}
