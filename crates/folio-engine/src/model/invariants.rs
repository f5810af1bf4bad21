use std::collections::HashSet;

use thiserror::Error;

use super::node::{Node, NodeKey, NodeKind};
use super::table_map::TableMap;
use super::Document;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invariant violated at {key}: {message}")]
pub struct InvariantViolation {
    pub key: NodeKey,
    pub message: String,
}

fn violation(node: &Node, message: impl Into<String>) -> InvariantViolation {
    InvariantViolation {
        key: node.key(),
        message: message.into(),
    }
}

/// Validates document tree invariants.
///
/// Checks that:
/// - The root is a `Root` and every child is legal for its parent
/// - Keys are assigned and unique
/// - A list item holds inline content or exactly one nested list
/// - No two same-kind lists are adjacent siblings
/// - List items are numbered 1..N within their list
/// - Code blocks hold exactly one text run
/// - Tables form a rectangular grid
/// - Empty text runs only appear as the sole child of their parent
pub fn check(doc: &Document) -> Result<(), InvariantViolation> {
    let root = doc.root();
    if *root.kind() != NodeKind::Root {
        return Err(violation(root, "top node is not Root"));
    }
    let mut seen = HashSet::new();
    check_node(root, &mut seen)
}

fn check_node(node: &Node, seen: &mut HashSet<NodeKey>) -> Result<(), InvariantViolation> {
    if node.key().is_unset() {
        return Err(violation(node, "node has no key"));
    }
    if !seen.insert(node.key()) {
        return Err(violation(node, "duplicate key"));
    }

    for child in node.children() {
        if !node.kind().can_contain(child.kind()) {
            return Err(violation(
                child,
                format!("{} cannot contain {}", node.kind().name(), child.kind().name()),
            ));
        }
    }

    match node.kind() {
        NodeKind::ListItem { .. } => {
            if node.children().iter().any(|c| c.is_list()) && node.children().len() != 1 {
                return Err(violation(node, "list item mixes inline content and a nested list"));
            }
        }
        NodeKind::List { .. } => {
            for (i, item) in node.children().iter().enumerate() {
                if let NodeKind::ListItem { value, .. } = item.kind()
                    && *value as usize != i + 1
                {
                    return Err(violation(
                        item,
                        format!("list item value {value}, expected {}", i + 1),
                    ));
                }
            }
        }
        NodeKind::CodeBlock { .. } => {
            if node.children().len() != 1 {
                return Err(violation(node, "code block must hold exactly one text run"));
            }
        }
        NodeKind::Table => {
            if node.children().is_empty() || !TableMap::build(node).is_rectangular() {
                return Err(violation(node, "table is not a rectangular grid"));
            }
        }
        _ => {}
    }

    for pair in node.children().windows(2) {
        if let (Some(a), Some(b)) = (pair[0].list_kind(), pair[1].list_kind())
            && a == b
        {
            return Err(violation(&pair[1], "adjacent lists of the same kind"));
        }
    }

    if node.children().len() > 1
        && let Some(empty) = node
            .children()
            .iter()
            .find(|c| c.text_str().is_some_and(str::is_empty))
    {
        return Err(violation(empty, "empty text run beside other content"));
    }

    for child in node.children() {
        check_node(child, seen)?;
    }
    Ok(())
}
