use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::{Document, Node, NodeKey, NodeKind};

/// A position in the document.
///
/// For a `Text` node `offset` is a char index into its content; for any
/// other node it is a child index (the gap before `children[offset]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
}

impl Point {
    pub fn new(key: NodeKey, offset: usize) -> Self {
        Self { key, offset }
    }

    /// Sort key in document order: the node's path followed by the offset.
    pub fn order_key(&self, doc: &Document) -> Option<Vec<usize>> {
        let mut path = doc.path_of(self.key)?;
        path.push(self.offset);
        Some(path)
    }

    /// Document-order comparison; points that no longer exist sort first.
    pub fn cmp_in(&self, other: &Point, doc: &Document) -> Ordering {
        self.order_key(doc).cmp(&other.order_key(doc))
    }
}

/// Number of caret positions an inline leaf occupies.
fn leaf_len(node: &Node) -> usize {
    match node.kind() {
        NodeKind::Text(run) => run.char_len(),
        NodeKind::LineBreak | NodeKind::Decorator { .. } => 1,
        _ => 0,
    }
}

/// Length of a text block's inline content in caret positions.
pub fn inline_len(node: &Node) -> usize {
    if node.kind().is_inline() && !node.children().is_empty() {
        return node.children().iter().map(|c| inline_len(c)).sum();
    }
    if node.kind().is_inline() {
        return leaf_len(node);
    }
    node.children()
        .iter()
        .filter(|c| c.kind().is_inline())
        .map(|c| inline_len(c))
        .sum()
}

/// Inline content as a string with one char per caret position: line
/// breaks become `\n` and decorators U+FFFC.
pub fn inline_string(block: &Node) -> String {
    fn walk(node: &Node, out: &mut String) {
        match node.kind() {
            NodeKind::Text(run) => out.push_str(&run.text),
            NodeKind::LineBreak => out.push('\n'),
            NodeKind::Decorator { .. } => out.push('\u{FFFC}'),
            _ => {
                for child in node.children() {
                    if child.kind().is_inline() {
                        walk(child, out);
                    }
                }
            }
        }
    }
    let mut out = String::new();
    walk(block, &mut out);
    out
}

/// A caret position expressed as (text block, offset into its inline
/// content). Transforms work in this form; [`Point`]s are derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockOffset {
    pub block: NodeKey,
    pub offset: usize,
}

impl BlockOffset {
    pub fn new(block: NodeKey, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// Map a point onto its text block. Element points on containers resolve to
/// the nearest text block at or after the gap, else the one before it.
pub fn to_block_offset(doc: &Document, point: Point) -> Option<BlockOffset> {
    let node = doc.node(point.key)?;

    if node.is_text() || node.kind().is_inline() || node.is_text_block() {
        let block = doc.text_block_of(point.key)?;
        let mut offset = 0;
        let found = inline_start(block, point.key, &mut offset);
        debug_assert!(found, "text block must contain the point's node");
        let within = if node.is_text() {
            point.offset.min(leaf_len(node))
        } else {
            node.children()
                .iter()
                .take(point.offset)
                .map(|c| inline_len(c))
                .sum()
        };
        return Some(BlockOffset::new(block.key(), offset + within));
    }

    // Container: look forward from the gap, then backward
    let children = node.children();
    let at = point.offset.min(children.len());
    if let Some(block) = children[at..]
        .iter()
        .find_map(|c| c.descendants().find(|n| n.is_text_block()))
    {
        return Some(BlockOffset::new(block.key(), 0));
    }
    if let Some(block) = children[..at]
        .iter()
        .rev()
        .find_map(|c| c.descendants().filter(|n| n.is_text_block()).last())
    {
        return Some(BlockOffset::new(block.key(), inline_len(block)));
    }
    None
}

/// Accumulate into `offset` the inline offset at which `target` starts
/// within `node`. Returns false if `target` is not inside `node`.
fn inline_start(node: &Node, target: NodeKey, offset: &mut usize) -> bool {
    if node.key() == target {
        return true;
    }
    for child in node.children() {
        if !child.kind().is_inline() {
            continue;
        }
        if inline_start(child, target, offset) {
            return true;
        }
        *offset += inline_len(child);
    }
    false
}

/// Turn a block offset back into a point, preferring text points. At a
/// boundary between two runs the end of the earlier run wins.
pub fn to_point(doc: &Document, at: BlockOffset) -> Option<Point> {
    let block = doc.node(at.block)?;
    Some(point_in_block(block, at.offset))
}

pub fn point_in_block(block: &Node, offset: usize) -> Point {
    fn walk(node: &Node, offset: &mut usize) -> Option<Point> {
        for (i, child) in node.children().iter().enumerate() {
            if !child.kind().is_inline() {
                continue;
            }
            match child.kind() {
                NodeKind::Text(run) => {
                    let len = run.char_len();
                    if *offset <= len {
                        return Some(Point::new(child.key(), *offset));
                    }
                    *offset -= len;
                }
                NodeKind::Link { .. } => {
                    if let Some(point) = walk(child, offset) {
                        return Some(point);
                    }
                }
                _ => {
                    if *offset == 0 {
                        return Some(Point::new(node.key(), i));
                    }
                    *offset -= 1;
                }
            }
        }
        None
    }
    let mut remaining = offset.min(inline_len(block));
    walk(block, &mut remaining).unwrap_or_else(|| {
        let len = block
            .children()
            .iter()
            .filter(|c| c.kind().is_inline())
            .count();
        Point::new(block.key(), len)
    })
}

/// First caret position of the document.
pub fn document_start(doc: &Document) -> Point {
    doc.text_blocks()
        .first()
        .map(|b| point_in_block(b, 0))
        .unwrap_or_else(|| Point::new(doc.root_key(), 0))
}

pub fn document_end(doc: &Document) -> Point {
    doc.text_blocks()
        .last()
        .map(|b| point_in_block(b, inline_len(b)))
        .unwrap_or_else(|| Point::new(doc.root_key(), doc.root().children().len()))
}
