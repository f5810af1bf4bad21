//! Read-only views of a session for rendering, and the canonical text
//! form of a tree used by tests and the CLI.

use serde::Serialize;

use crate::model::{Document, Node, NodeKind};
use crate::selection::Selection;

/// Immutable view handed to the render layer after each command.
///
/// The document is an `Arc`-shared persistent value, so a snapshot costs one
/// clone of the root pointer. `version` increases with every applied command
/// that changed the tree or the selection.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub document: Document,
    pub selection: Selection,
    pub version: u64,
}

impl Snapshot {
    pub fn tree(&self) -> String {
        format_tree(&self.document)
    }
}

/// One line per node, two spaces of indent per level, starting at `Root`.
pub fn format_tree(doc: &Document) -> String {
    let mut out = String::new();
    write_node(doc.root(), 0, &mut out);
    out
}

/// Like [`format_tree`] for detached blocks, each starting at column 0.
pub fn format_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, 0, &mut out);
    }
    out
}

fn write_node(node: &Node, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(&describe(node.kind()));
    out.push('\n');
    for child in node.children() {
        write_node(child, depth + 1, out);
    }
}

fn describe(kind: &NodeKind) -> String {
    let mut line = kind.name().to_string();
    match kind {
        NodeKind::Heading { level } => line += &format!(" level={level}"),
        NodeKind::List { kind, start } => line += &format!(" {} start={start}", kind.as_str()),
        NodeKind::ListItem { value, checked } => {
            line += &format!(" value={value}");
            if let Some(checked) = checked {
                line += &format!(" checked={checked}");
            }
        }
        NodeKind::CodeBlock {
            language: Some(language),
        } => line += &format!(" language={language}"),
        NodeKind::TableCell {
            header,
            col_span,
            row_span,
        } => {
            if *header {
                line += " header=true";
            }
            if *col_span != 1 {
                line += &format!(" col_span={col_span}");
            }
            if *row_span != 1 {
                line += &format!(" row_span={row_span}");
            }
        }
        NodeKind::Link { url } => line += &format!(" url={url}"),
        NodeKind::Text(run) => {
            line += &format!(" {:?}", run.text);
            if !run.format.is_empty() {
                line += &format!(" [{}]", run.format.names().join(", "));
            }
            if !run.style.is_empty() {
                line += &format!(" style={:?}", run.style);
            }
        }
        NodeKind::Decorator { kind, payload } => line += &format!(" kind={kind} payload={payload}"),
        _ => {}
    }
    line
}
