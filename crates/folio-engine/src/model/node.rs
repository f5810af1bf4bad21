use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Stable, opaque node identity.
///
/// Keys are allocated by the owning [`Document`](super::Document) from a
/// monotonically increasing counter, so replaying the same edits on the same
/// document yields the same keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey(pub u64);

impl NodeKey {
    /// Placeholder carried by nodes that have not been adopted by a document yet
    pub const UNSET: NodeKey = NodeKey(0);

    pub fn is_unset(self) -> bool {
        self == Self::UNSET
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Bullet,
    Number,
    Check,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListKind::Bullet => "bullet",
            ListKind::Number => "number",
            ListKind::Check => "check",
        }
    }
}

bitflags! {
    /// Inline formatting marks carried by a text run.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TextFormat: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const STRIKETHROUGH = 1 << 3;
        const SUBSCRIPT = 1 << 4;
        const SUPERSCRIPT = 1 << 5;
        const CODE = 1 << 6;
    }
}

impl TextFormat {
    /// Set `flags`, keeping subscript and superscript mutually exclusive.
    pub fn with(self, flags: TextFormat) -> TextFormat {
        let mut out = self | flags;
        if flags.contains(TextFormat::SUBSCRIPT) {
            out.remove(TextFormat::SUPERSCRIPT);
        } else if flags.contains(TextFormat::SUPERSCRIPT) {
            out.remove(TextFormat::SUBSCRIPT);
        }
        out
    }

    pub fn without(self, flags: TextFormat) -> TextFormat {
        self - flags
    }

    /// Lowercase names of the set flags, in declaration order.
    pub fn names(self) -> Vec<&'static str> {
        [
            (TextFormat::BOLD, "bold"),
            (TextFormat::ITALIC, "italic"),
            (TextFormat::UNDERLINE, "underline"),
            (TextFormat::STRIKETHROUGH, "strikethrough"),
            (TextFormat::SUBSCRIPT, "subscript"),
            (TextFormat::SUPERSCRIPT, "superscript"),
            (TextFormat::CODE, "code"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect()
    }
}

/// Content and marks of a `Text` leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "TextFormat::is_empty")]
    pub format: TextFormat,
    /// Normalized presentation declarations (`color`, `background-color`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub style: String,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn formatted(text: impl Into<String>, format: TextFormat) -> Self {
        Self {
            text: text.into(),
            format,
            style: String::new(),
        }
    }

    /// Same marks and style, so two adjacent runs can be merged.
    pub fn same_marks(&self, other: &TextRun) -> bool {
        self.format == other.format && self.style == other.style
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Paragraph,
    Heading {
        level: u8,
    },
    List {
        kind: ListKind,
        start: u32,
    },
    ListItem {
        value: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
    },
    CodeBlock {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    Table,
    TableRow,
    TableCell {
        header: bool,
        col_span: u32,
        row_span: u32,
    },
    Link {
        url: String,
    },
    Text(TextRun),
    LineBreak,
    HorizontalRule,
    Decorator {
        kind: String,
        payload: String,
    },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Root => "Root",
            NodeKind::Paragraph => "Paragraph",
            NodeKind::Heading { .. } => "Heading",
            NodeKind::List { .. } => "List",
            NodeKind::ListItem { .. } => "ListItem",
            NodeKind::CodeBlock { .. } => "CodeBlock",
            NodeKind::Table => "Table",
            NodeKind::TableRow => "TableRow",
            NodeKind::TableCell { .. } => "TableCell",
            NodeKind::Link { .. } => "Link",
            NodeKind::Text(_) => "Text",
            NodeKind::LineBreak => "LineBreak",
            NodeKind::HorizontalRule => "HorizontalRule",
            NodeKind::Decorator { .. } => "Decorator",
        }
    }

    /// Kinds that may appear inside paragraphs, headings and list items.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Text(_) | NodeKind::Link { .. } | NodeKind::LineBreak | NodeKind::Decorator { .. }
        )
    }

    /// Kinds that may appear directly under the root or a table cell.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph
                | NodeKind::Heading { .. }
                | NodeKind::List { .. }
                | NodeKind::CodeBlock { .. }
                | NodeKind::Table
                | NodeKind::HorizontalRule
                | NodeKind::Decorator { .. }
        )
    }

    /// Child rule of the tree; `child` must be a legal direct child of `self`.
    pub fn can_contain(&self, child: &NodeKind) -> bool {
        match self {
            NodeKind::Root => child.is_block(),
            NodeKind::TableCell { .. } => child.is_block() && *child != NodeKind::Table,
            NodeKind::Paragraph | NodeKind::Heading { .. } => child.is_inline(),
            NodeKind::List { .. } => matches!(child, NodeKind::ListItem { .. }),
            NodeKind::ListItem { .. } => child.is_inline() || matches!(child, NodeKind::List { .. }),
            NodeKind::CodeBlock { .. } => matches!(child, NodeKind::Text(_)),
            NodeKind::Table => *child == NodeKind::TableRow,
            NodeKind::TableRow => matches!(child, NodeKind::TableCell { .. }),
            NodeKind::Link { .. } => matches!(child, NodeKind::Text(_) | NodeKind::LineBreak),
            NodeKind::Text(_)
            | NodeKind::LineBreak
            | NodeKind::HorizontalRule
            | NodeKind::Decorator { .. } => false,
        }
    }
}

/// One node of the persistent document tree.
///
/// Children are `Arc`-shared between document versions; mutation goes
/// through [`Arc::make_mut`] so only the edited path is copied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    #[serde(skip, default = "unset_key")]
    pub(crate) key: NodeKey,
    #[serde(flatten)]
    pub(crate) kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) children: Vec<Arc<Node>>,
}

fn unset_key() -> NodeKey {
    NodeKey::UNSET
}

/// Value equality: kinds and children, keys ignored.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| Arc::ptr_eq(a, b) || **a == **b)
    }
}

impl Node {
    pub fn new(kind: NodeKind, children: Vec<Node>) -> Self {
        Self {
            key: NodeKey::UNSET,
            kind,
            children: children.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn leaf(kind: NodeKind) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[Arc<Node>] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index).map(|c| &**c)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.children.first().map(|c| &**c)
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.children.last().map(|c| &**c)
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    pub fn text_run(&self) -> Option<&TextRun> {
        match &self.kind {
            NodeKind::Text(run) => Some(run),
            _ => None,
        }
    }

    pub fn text_str(&self) -> Option<&str> {
        self.text_run().map(|run| run.text.as_str())
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, NodeKind::List { .. })
    }

    pub fn list_kind(&self) -> Option<ListKind> {
        match self.kind {
            NodeKind::List { kind, .. } => Some(kind),
            _ => None,
        }
    }

    pub fn is_list_item(&self) -> bool {
        matches!(self.kind, NodeKind::ListItem { .. })
    }

    /// A list item whose only child is a nested list.
    pub fn is_nested_list_item(&self) -> bool {
        self.is_list_item() && self.children.len() == 1 && self.children[0].is_list()
    }

    pub fn is_code_block(&self) -> bool {
        matches!(self.kind, NodeKind::CodeBlock { .. })
    }

    pub fn is_table_cell(&self) -> bool {
        matches!(self.kind, NodeKind::TableCell { .. })
    }

    /// Blocks whose children are inline content and can hold a caret.
    pub fn is_text_block(&self) -> bool {
        match self.kind {
            NodeKind::Paragraph | NodeKind::Heading { .. } | NodeKind::CodeBlock { .. } => true,
            NodeKind::ListItem { .. } => !self.is_nested_list_item(),
            _ => false,
        }
    }

    /// Inline-only plain text: text runs concatenated, line breaks as `\n`.
    pub fn inline_text(&self) -> String {
        let mut out = String::new();
        self.collect_inline_text(&mut out);
        out
    }

    fn collect_inline_text(&self, out: &mut String) {
        match &self.kind {
            NodeKind::Text(run) => out.push_str(&run.text),
            NodeKind::LineBreak => out.push('\n'),
            _ => {
                for child in &self.children {
                    if child.kind.is_inline() {
                        child.collect_inline_text(out);
                    }
                }
            }
        }
    }

    /// Plain text of the whole subtree; blocks are separated by `\n` and
    /// table cells by `\t`.
    pub fn text_content(&self) -> String {
        if self.is_text_block() || self.kind.is_inline() {
            return self.inline_text();
        }
        match self.kind {
            NodeKind::TableRow => self
                .children
                .iter()
                .map(|c| c.text_content())
                .collect::<Vec<_>>()
                .join("\t"),
            _ => self
                .children
                .iter()
                .map(|c| c.text_content())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Deep copy with every key reset, ready to be adopted by a document.
    pub fn detached(&self) -> Node {
        Node {
            key: NodeKey::UNSET,
            kind: self.kind.clone(),
            children: self
                .children
                .iter()
                .map(|c| Arc::new(c.detached()))
                .collect(),
        }
    }

    /// Same node with `key` as its identity.
    pub(crate) fn keyed(mut self, key: NodeKey) -> Node {
        self.key = key;
        self
    }

    /// Same key and kind, different children.
    pub(crate) fn with_children(&self, children: Vec<Arc<Node>>) -> Node {
        Node {
            key: self.key,
            kind: self.kind.clone(),
            children,
        }
    }

    pub(crate) fn has_unset_keys(&self) -> bool {
        self.key.is_unset() || self.children.iter().any(|c| c.has_unset_keys())
    }

    /// Pre-order walk over the subtree, including `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev().map(|c| &**c));
        Some(node)
    }
}

// Builders used by the importer, transforms and tests.
impl Node {
    pub fn root(blocks: Vec<Node>) -> Self {
        Self::new(NodeKind::Root, blocks)
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Paragraph, children)
    }

    /// Paragraph holding a single plain run (an empty run for `""`).
    pub fn paragraph_text(text: &str) -> Self {
        Self::paragraph(vec![Self::text(text)])
    }

    pub fn heading(level: u8, children: Vec<Node>) -> Self {
        Self::new(
            NodeKind::Heading {
                level: level.clamp(1, 6),
            },
            children,
        )
    }

    pub fn list(kind: ListKind, items: Vec<Node>) -> Self {
        Self::new(NodeKind::List { kind, start: 1 }, items)
    }

    pub fn list_item(children: Vec<Node>) -> Self {
        Self::new(
            NodeKind::ListItem {
                value: 1,
                checked: None,
            },
            children,
        )
    }

    pub fn list_item_text(text: &str) -> Self {
        Self::list_item(vec![Self::text(text)])
    }

    pub fn check_item(checked: bool, children: Vec<Node>) -> Self {
        Self::new(
            NodeKind::ListItem {
                value: 1,
                checked: Some(checked),
            },
            children,
        )
    }

    /// Wrapper item holding a nested list.
    pub fn nested_item(list: Node) -> Self {
        Self::list_item(vec![list])
    }

    pub fn code_block(language: Option<&str>, text: &str) -> Self {
        Self::new(
            NodeKind::CodeBlock {
                language: language.map(str::to_string),
            },
            vec![Self::text(text)],
        )
    }

    pub fn table(rows: Vec<Node>) -> Self {
        Self::new(NodeKind::Table, rows)
    }

    pub fn table_row(cells: Vec<Node>) -> Self {
        Self::new(NodeKind::TableRow, cells)
    }

    pub fn table_cell(children: Vec<Node>) -> Self {
        Self::new(
            NodeKind::TableCell {
                header: false,
                col_span: 1,
                row_span: 1,
            },
            children,
        )
    }

    pub fn header_cell(children: Vec<Node>) -> Self {
        Self::new(
            NodeKind::TableCell {
                header: true,
                col_span: 1,
                row_span: 1,
            },
            children,
        )
    }

    pub fn link(url: &str, children: Vec<Node>) -> Self {
        Self::new(
            NodeKind::Link {
                url: url.to_string(),
            },
            children,
        )
    }

    pub fn text(text: &str) -> Self {
        Self::leaf(NodeKind::Text(TextRun::plain(text)))
    }

    pub fn formatted(text: &str, format: TextFormat) -> Self {
        Self::leaf(NodeKind::Text(TextRun::formatted(text, format)))
    }

    pub fn run(run: TextRun) -> Self {
        Self::leaf(NodeKind::Text(run))
    }

    pub fn line_break() -> Self {
        Self::leaf(NodeKind::LineBreak)
    }

    pub fn horizontal_rule() -> Self {
        Self::leaf(NodeKind::HorizontalRule)
    }

    pub fn decorator(kind: &str, payload: &str) -> Self {
        Self::leaf(NodeKind::Decorator {
            kind: kind.to_string(),
            payload: payload.to_string(),
        })
    }
}
