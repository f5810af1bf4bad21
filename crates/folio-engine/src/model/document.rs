use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::node::{Node, NodeKey, NodeKind};
use super::ModelError;

/// The document tree plus the key allocator that owns it.
///
/// `Document` is a persistent value: cloning is cheap (one `Arc`), and every
/// mutating primitive copies only the path from the root to the edited node.
/// Undo history keeps whole `Document`s for that reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    root: Arc<Node>,
    next_key: u64,
}

/// Value equality of the trees; keys and allocator state are ignored.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root) || *self.root == *other.root
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Document {
    /// Build a document from top-level blocks.
    ///
    /// An empty block list yields a single empty paragraph so the caret
    /// always has somewhere to live. List values are numbered on the way in.
    pub fn new(blocks: Vec<Node>) -> Self {
        let blocks = if blocks.is_empty() {
            vec![Node::paragraph_text("")]
        } else {
            blocks
        };
        Self::from_root(Node::root(blocks))
    }

    pub fn from_root(root: Node) -> Self {
        let mut doc = Self {
            root: Arc::new(Node::root(Vec::new())),
            next_key: 1,
        };
        let mut root = root;
        doc.assign_keys(&mut root);
        doc.root = Arc::new(root);
        renumber_lists(&mut doc.root);
        doc
    }

    /// Re-key a deserialized document (keys are not part of the wire format).
    pub fn rekeyed(&self) -> Self {
        Self::from_root(self.root.detached())
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_key(&self) -> NodeKey {
        self.root.key
    }

    pub(crate) fn root_arc(&self) -> &Arc<Node> {
        &self.root
    }

    pub fn alloc_key(&mut self) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        key
    }

    fn assign_keys(&mut self, node: &mut Node) {
        if node.key.is_unset() {
            node.key = self.alloc_key();
        }
        for child in &mut node.children {
            if child.has_unset_keys() {
                self.assign_keys(Arc::make_mut(child));
            }
        }
    }

    /// Give every unkeyed node in `node` a fresh key from this document.
    pub fn adopt(&mut self, mut node: Node) -> Node {
        self.assign_keys(&mut node);
        node
    }

    fn adopt_arc(&mut self, node: Arc<Node>) -> Arc<Node> {
        if node.has_unset_keys() {
            let mut node = Arc::unwrap_or_clone(node);
            self.assign_keys(&mut node);
            Arc::new(node)
        } else {
            node
        }
    }

    // ----- queries -----

    pub fn contains(&self, key: NodeKey) -> bool {
        self.path_of(key).is_some()
    }

    /// Child-index path from the root to `key`; empty for the root itself.
    pub fn path_of(&self, key: NodeKey) -> Option<Vec<usize>> {
        fn walk(node: &Node, key: NodeKey, path: &mut Vec<usize>) -> bool {
            if node.key == key {
                return true;
            }
            for (i, child) in node.children.iter().enumerate() {
                path.push(i);
                if walk(child, key, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
        let mut path = Vec::new();
        walk(&self.root, key, &mut path).then_some(path)
    }

    pub fn node_at_path(&self, path: &[usize]) -> Option<&Node> {
        let mut node: &Node = &self.root;
        for &i in path {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.node_at_path(&self.path_of(key)?)
    }

    pub fn parent(&self, key: NodeKey) -> Option<&Node> {
        let path = self.path_of(key)?;
        let (_, parent) = path.split_last()?;
        self.node_at_path(parent)
    }

    pub fn parent_key(&self, key: NodeKey) -> Option<NodeKey> {
        self.parent(key).map(Node::key)
    }

    pub fn index_in_parent(&self, key: NodeKey) -> Option<usize> {
        self.path_of(key)?.last().copied()
    }

    pub fn children(&self, key: NodeKey) -> &[Arc<Node>] {
        self.node(key).map_or(&[], Node::children)
    }

    pub fn next_sibling(&self, key: NodeKey) -> Option<&Node> {
        let index = self.index_in_parent(key)?;
        self.parent(key)?.child(index + 1)
    }

    pub fn previous_sibling(&self, key: NodeKey) -> Option<&Node> {
        let index = self.index_in_parent(key)?;
        self.parent(key)?.child(index.checked_sub(1)?)
    }

    /// Ancestors of `key`, nearest first, excluding the node itself.
    pub fn ancestors(&self, key: NodeKey) -> Vec<&Node> {
        let Some(path) = self.path_of(key) else {
            return Vec::new();
        };
        let Some((_, parent_path)) = path.split_last() else {
            return Vec::new();
        };
        let mut node: &Node = &self.root;
        let mut out = vec![node];
        for &i in parent_path {
            node = &node.children[i];
            out.push(node);
        }
        out.reverse();
        out
    }

    /// Nearest strict ancestor matching `pred`.
    pub fn ancestor_where(&self, key: NodeKey, pred: impl Fn(&Node) -> bool) -> Option<&Node> {
        self.ancestors(key).into_iter().find(|n| pred(n))
    }

    /// `key` itself if it matches, else its nearest matching ancestor.
    pub fn closest(&self, key: NodeKey, pred: impl Fn(&Node) -> bool) -> Option<&Node> {
        let node = self.node(key)?;
        if pred(node) {
            return Some(node);
        }
        self.ancestor_where(key, pred)
    }

    /// Pre-order iteration over every node.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.root.descendants()
    }

    pub fn text_content(&self) -> String {
        self.root.text_content()
    }

    pub fn first_text(&self, key: NodeKey) -> Option<&Node> {
        self.node(key)?.descendants().find(|n| n.is_text())
    }

    pub fn last_text(&self, key: NodeKey) -> Option<&Node> {
        self.node(key)?.descendants().filter(|n| n.is_text()).last()
    }

    /// Every text leaf in document order.
    pub fn text_leaves(&self) -> Vec<&Node> {
        self.iter().filter(|n| n.is_text()).collect()
    }

    /// Blocks that can hold a caret, in document order.
    pub fn text_blocks(&self) -> Vec<&Node> {
        self.iter().filter(|n| n.is_text_block()).collect()
    }

    /// Nearest enclosing text block of `key` (itself included).
    pub fn text_block_of(&self, key: NodeKey) -> Option<&Node> {
        self.closest(key, Node::is_text_block)
    }

    // ----- checked primitives -----

    /// Mutable access to a node, copying the path from the root.
    pub(crate) fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        let path = self.path_of(key)?;
        let mut node: &mut Node = Arc::make_mut(&mut self.root);
        for i in path {
            node = Arc::make_mut(&mut node.children[i]);
        }
        Some(node)
    }

    fn node_mut_or_err(&mut self, key: NodeKey) -> Result<&mut Node, ModelError> {
        self.node_mut(key).ok_or(ModelError::NotFound(key))
    }

    fn check_child(parent: &Node, child: &Node) -> Result<(), ModelError> {
        if !parent.kind.can_contain(&child.kind) {
            return Err(ModelError::InvalidChild {
                parent: parent.kind.name(),
                child: child.kind.name(),
            });
        }
        Ok(())
    }

    /// First key that occurs twice in the tree. Only consulted in debug
    /// builds, after a primitive has inserted nodes.
    fn duplicate_key(&self) -> Option<NodeKey> {
        let mut seen = HashSet::new();
        self.iter().map(Node::key).find(|k| !seen.insert(*k))
    }

    fn check_shape(node: &Node) -> Result<(), ModelError> {
        match node.kind {
            NodeKind::ListItem { .. } => {
                let lists = node.children.iter().filter(|c| c.is_list()).count();
                if lists > 0 && node.children.len() > 1 {
                    return Err(ModelError::MixedListItem(node.key));
                }
            }
            NodeKind::CodeBlock { .. } if node.children.len() > 1 => {
                return Err(ModelError::InvalidChild {
                    parent: "CodeBlock",
                    child: "second Text",
                });
            }
            _ => {}
        }
        Ok(())
    }

    /// Insert `node` as the `index`-th child of `parent`. Returns the key of
    /// the inserted node (freshly assigned if it had none).
    pub fn insert_child(
        &mut self,
        parent: NodeKey,
        index: usize,
        node: impl Into<Arc<Node>>,
    ) -> Result<NodeKey, ModelError> {
        let node = node.into();
        let parent_node = self.node(parent).ok_or(ModelError::NotFound(parent))?;
        if index > parent_node.children.len() {
            return Err(ModelError::IndexOutOfBounds {
                parent,
                index,
                len: parent_node.children.len(),
            });
        }
        Self::check_child(parent_node, &node)?;
        let node = self.adopt_arc(node);
        let key = node.key;
        let parent_node = self.node_mut_or_err(parent)?;
        parent_node.children.insert(index, node);
        let shape = Self::check_shape(parent_node);
        let result = match shape {
            Ok(()) if cfg!(debug_assertions) => match self.duplicate_key() {
                Some(dup) => Err(ModelError::DuplicateKey(dup)),
                None => Ok(()),
            },
            other => other,
        };
        if let Err(err) = result {
            self.node_mut_or_err(parent)?.children.remove(index);
            return Err(err);
        }
        Ok(key)
    }

    pub fn append_child(
        &mut self,
        parent: NodeKey,
        node: impl Into<Arc<Node>>,
    ) -> Result<NodeKey, ModelError> {
        let len = self.children(parent).len();
        self.insert_child(parent, len, node)
    }

    pub fn remove_child(&mut self, parent: NodeKey, index: usize) -> Result<Arc<Node>, ModelError> {
        let parent_node = self.node_mut_or_err(parent)?;
        if index >= parent_node.children.len() {
            return Err(ModelError::IndexOutOfBounds {
                parent,
                index,
                len: parent_node.children.len(),
            });
        }
        Ok(parent_node.children.remove(index))
    }

    /// Detach `key` (and its subtree) from the tree.
    pub fn remove(&mut self, key: NodeKey) -> Result<Arc<Node>, ModelError> {
        if key == self.root.key {
            return Err(ModelError::RootMutation);
        }
        let parent = self.parent_key(key).ok_or(ModelError::NotFound(key))?;
        let index = self.index_in_parent(key).ok_or(ModelError::NotFound(key))?;
        self.remove_child(parent, index)
    }

    /// Put `node` where `key` was.
    pub fn replace_node(
        &mut self,
        key: NodeKey,
        node: impl Into<Arc<Node>>,
    ) -> Result<NodeKey, ModelError> {
        if key == self.root.key {
            return Err(ModelError::RootMutation);
        }
        let parent = self.parent_key(key).ok_or(ModelError::NotFound(key))?;
        let index = self.index_in_parent(key).ok_or(ModelError::NotFound(key))?;
        let removed = self.remove_child(parent, index)?;
        match self.insert_child(parent, index, node) {
            Ok(new_key) => Ok(new_key),
            Err(err) => {
                self.node_mut_or_err(parent)?.children.insert(index, removed);
                Err(err)
            }
        }
    }

    pub fn set_text(&mut self, key: NodeKey, text: impl Into<String>) -> Result<(), ModelError> {
        match &mut self.node_mut_or_err(key)?.kind {
            NodeKind::Text(run) => {
                run.text = text.into();
                Ok(())
            }
            _ => Err(ModelError::NotText(key)),
        }
    }

    /// Change a node's kind in place, keeping key and children. The new kind
    /// must accept the existing children and be accepted by the parent.
    pub fn set_kind(&mut self, key: NodeKey, kind: NodeKind) -> Result<(), ModelError> {
        let node = self.node(key).ok_or(ModelError::NotFound(key))?;
        if let Some(bad) = node.children.iter().find(|c| !kind.can_contain(&c.kind)) {
            return Err(ModelError::InvalidChild {
                parent: kind.name(),
                child: bad.kind.name(),
            });
        }
        if let Some(parent) = self.parent(key)
            && !parent.kind.can_contain(&kind)
        {
            return Err(ModelError::InvalidChild {
                parent: parent.kind.name(),
                child: kind.name(),
            });
        }
        if key == self.root.key && kind != NodeKind::Root {
            return Err(ModelError::RootMutation);
        }
        self.node_mut_or_err(key)?.kind = kind;
        Ok(())
    }

    /// Replace `range` of `parent`'s children with `nodes`, returning the
    /// removed children.
    pub fn splice_children(
        &mut self,
        parent: NodeKey,
        range: Range<usize>,
        nodes: Vec<Arc<Node>>,
    ) -> Result<Vec<Arc<Node>>, ModelError> {
        let parent_node = self.node(parent).ok_or(ModelError::NotFound(parent))?;
        let len = parent_node.children.len();
        if range.start > range.end || range.end > len {
            return Err(ModelError::IndexOutOfBounds {
                parent,
                index: range.end,
                len,
            });
        }
        for node in &nodes {
            Self::check_child(parent_node, node)?;
        }
        let inserted = nodes.len();
        let nodes: Vec<Arc<Node>> = nodes.into_iter().map(|n| self.adopt_arc(n)).collect();
        let parent_node = self.node_mut_or_err(parent)?;
        let removed: Vec<Arc<Node>> = parent_node.children.splice(range.clone(), nodes).collect();
        let shape = Self::check_shape(parent_node);
        let result = match shape {
            Ok(()) if cfg!(debug_assertions) => match self.duplicate_key() {
                Some(dup) => Err(ModelError::DuplicateKey(dup)),
                None => Ok(()),
            },
            other => other,
        };
        if let Err(err) = result {
            self.node_mut_or_err(parent)?
                .children
                .splice(range.start..range.start + inserted, removed);
            return Err(err);
        }
        Ok(removed)
    }

    /// Detach all children of `parent`.
    pub fn take_children(&mut self, parent: NodeKey) -> Result<Vec<Arc<Node>>, ModelError> {
        let node = self.node_mut_or_err(parent)?;
        Ok(std::mem::take(&mut node.children))
    }

    /// Run `f` on the root with copy-on-write access. Used by normalization
    /// passes that rewrite many places at once.
    pub(crate) fn with_root_mut<R>(&mut self, f: impl FnOnce(&mut Arc<Node>) -> R) -> R {
        f(&mut self.root)
    }

    pub(crate) fn renumber(&mut self) {
        renumber_lists(&mut self.root);
    }

    /// Assign keys to nodes a normalization pass created in place.
    pub(crate) fn adopt_unset(&mut self) {
        if self.root.has_unset_keys() {
            let mut root = Arc::clone(&self.root);
            self.assign_keys(Arc::make_mut(&mut root));
            self.root = root;
        }
    }
}

/// Set every list item's value to its 1-based position in its list.
/// Subtrees that are already numbered are left shared.
pub(crate) fn renumber_lists(node: &mut Arc<Node>) {
    fn needs(node: &Node) -> bool {
        let own = node.is_list()
            && node.children.iter().enumerate().any(|(i, item)| {
                matches!(item.kind, NodeKind::ListItem { value, .. } if value as usize != i + 1)
            });
        own || node.children.iter().any(|c| needs(c))
    }
    if !needs(node) {
        return;
    }
    let node = Arc::make_mut(node);
    let is_list = node.is_list();
    for (i, child) in node.children.iter_mut().enumerate() {
        if is_list
            && let NodeKind::ListItem { value, .. } = child.kind
            && value as usize != i + 1
            && let NodeKind::ListItem { value, .. } = &mut Arc::make_mut(child).kind
        {
            *value = (i + 1) as u32;
        }
        renumber_lists(child);
    }
}
