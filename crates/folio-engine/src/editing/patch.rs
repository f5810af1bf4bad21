use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::model::{Document, Node, NodeKey};
use crate::selection::Selection;

/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Nodes whose subtree differs from the previous version, in document
    /// order. Ancestors of an edited node are included.
    pub changed: Vec<NodeKey>,
    /// Keys that no longer exist, sorted
    pub removed: Vec<NodeKey>,
    pub new_selection: Selection,
    pub version: u64,
}

impl Patch {
    /// Compare two versions of a document. Subtrees still shared between
    /// them are skipped without being walked.
    pub fn between(before: &Document, after: &Document, new_selection: Selection, version: u64) -> Self {
        let mut old = HashMap::new();
        index(before.root_arc(), &mut old);

        let mut changed = Vec::new();
        let mut present = HashSet::new();
        walk(after.root_arc(), &old, &mut changed, &mut present);

        let mut removed: Vec<NodeKey> = old
            .keys()
            .copied()
            .filter(|key| !present.contains(key))
            .collect();
        removed.sort();
        Self {
            changed,
            removed,
            new_selection,
            version,
        }
    }

    /// True when the tree did not change (selection-only commands).
    pub fn is_selection_only(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

fn index<'a>(node: &'a Arc<Node>, out: &mut HashMap<NodeKey, &'a Arc<Node>>) {
    out.insert(node.key(), node);
    for child in node.children() {
        index(child, out);
    }
}

fn mark_present(node: &Node, present: &mut HashSet<NodeKey>) {
    present.insert(node.key());
    for child in node.children() {
        mark_present(child, present);
    }
}

fn walk(
    node: &Arc<Node>,
    old: &HashMap<NodeKey, &Arc<Node>>,
    changed: &mut Vec<NodeKey>,
    present: &mut HashSet<NodeKey>,
) {
    if old.get(&node.key()).is_some_and(|prev| Arc::ptr_eq(prev, node)) {
        mark_present(node, present);
        return;
    }
    present.insert(node.key());
    changed.push(node.key());
    for child in node.children() {
        walk(child, old, changed, present);
    }
}
