/*!
 * # Transform Engine
 *
 * Selection-aware structural operations. Every transform has the shape
 *
 * ```text
 * (&Document, &Selection, params) -> Result<Edit, EditError>
 * ```
 *
 * and is pure: the input document is never touched, the returned
 * [`Edit`] carries the next document version and the selection to use
 * with it. Identical inputs give identical outputs, keys included.
 *
 * ## Working form
 *
 * Transforms do not juggle [`Point`](crate::selection::Point)s while the
 * tree is in flux. The selection is first converted to
 * [`BlockOffset`]s (a text block key plus an offset into its inline
 * content). Blocks keep their keys across splits, merges, indent and
 * outdent, so those offsets stay meaningful through the edit; they are
 * turned back into points only at the very end.
 *
 * ## Finishing
 *
 * Every transform ends in [`finish`], which runs the shared
 * [`normalize`](normalize::normalize) pass and then
 * [`repair_dangling`] against the pre-edit document, so the returned
 * selection never references a node that no longer exists.
 */

pub mod blocks;
pub mod code;
pub mod delete;
pub(crate) mod inline;
pub mod insert;
pub mod lists;
pub mod normalize;
pub mod shortcuts;
pub mod tables;
pub mod text;

use std::cmp::Ordering;
use std::sync::Arc;

use thiserror::Error;

use crate::model::{Document, ModelError, Node, NodeKey, TextFormat, TextRun};
use crate::selection::point::{self, BlockOffset, inline_len};
use crate::selection::{RangeSelection, Selection, canonicalize, repair_dangling};

pub use blocks::{BlockType, insert_horizontal_rule, insert_paragraph, toggle_block_type};
pub use code::{detect_language, move_line, toggle_code_block};
pub use delete::{delete_backward, delete_forward, delete_selection};
pub use insert::insert_fragment;
pub use lists::{indent, outdent, toggle_checked};
pub use tables::{insert_table, merge_grids};
pub use text::{insert_line_break, insert_text, toggle_format};

/// Result of a transform: the next document and the selection that goes
/// with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub document: Document,
    pub selection: Selection,
}

impl Edit {
    /// An edit that changes nothing.
    pub fn unchanged(doc: &Document, selection: &Selection) -> Self {
        Self {
            document: doc.clone(),
            selection: *selection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("selection does not resolve to a caret position")]
    Unresolvable,

    #[error("nothing to {0}")]
    EmptyHistory(&'static str),
}

pub type Result<T, E = EditError> = std::result::Result<T, E>;

/// A selection in working form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Span {
    pub anchor: BlockOffset,
    pub focus: BlockOffset,
    pub start: BlockOffset,
    pub end: BlockOffset,
    pub format: TextFormat,
    /// Selected cells when the selection is a grid
    pub cells: Option<Vec<NodeKey>>,
}

impl Span {
    pub fn is_collapsed(&self) -> bool {
        self.cells.is_none() && self.start == self.end
    }
}

/// Document-order comparison of two block offsets.
pub(crate) fn cmp_offsets(doc: &Document, a: BlockOffset, b: BlockOffset) -> Ordering {
    let key = |at: BlockOffset| {
        doc.path_of(at.block).map(|mut path| {
            path.push(at.offset);
            path
        })
    };
    key(a).cmp(&key(b))
}

fn first_block_in(doc: &Document, key: NodeKey) -> Option<NodeKey> {
    doc.node(key)?
        .descendants()
        .find(|n| n.is_text_block())
        .map(Node::key)
}

fn last_block_in(doc: &Document, key: NodeKey) -> Option<NodeKey> {
    doc.node(key)?
        .descendants()
        .filter(|n| n.is_text_block())
        .last()
        .map(Node::key)
}

pub(crate) fn span(doc: &Document, selection: &Selection) -> Result<Span> {
    match canonicalize(selection, doc) {
        Selection::Range(range) => {
            let anchor =
                point::to_block_offset(doc, range.anchor).ok_or(EditError::Unresolvable)?;
            let focus = point::to_block_offset(doc, range.focus).ok_or(EditError::Unresolvable)?;
            let (start, end) = if cmp_offsets(doc, focus, anchor) == Ordering::Less {
                (focus, anchor)
            } else {
                (anchor, focus)
            };
            Ok(Span {
                anchor,
                focus,
                start,
                end,
                format: range.format,
                cells: None,
            })
        }
        Selection::Grid(grid) => {
            let cells = grid.cells(doc);
            let first = cells
                .iter()
                .find_map(|c| first_block_in(doc, *c))
                .ok_or(EditError::Unresolvable)?;
            let last = cells
                .iter()
                .rev()
                .find_map(|c| last_block_in(doc, *c))
                .ok_or(EditError::Unresolvable)?;
            let start = BlockOffset::new(first, 0);
            let end = BlockOffset::new(last, doc.node(last).map_or(0, inline_len));
            Ok(Span {
                anchor: start,
                focus: end,
                start,
                end,
                format: TextFormat::empty(),
                cells: Some(cells),
            })
        }
    }
}

/// Text blocks covered by the span, in document order. For a grid these
/// are the blocks inside the selected cells.
pub(crate) fn touched_blocks(doc: &Document, span: &Span) -> Vec<NodeKey> {
    if let Some(cells) = &span.cells {
        return cells
            .iter()
            .filter_map(|c| doc.node(*c))
            .flat_map(|cell| {
                cell.descendants()
                    .filter(|n| n.is_text_block())
                    .map(Node::key)
                    .collect::<Vec<_>>()
            })
            .collect();
    }
    let blocks: Vec<NodeKey> = doc.text_blocks().into_iter().map(Node::key).collect();
    let from = blocks.iter().position(|b| *b == span.start.block);
    let to = blocks.iter().position(|b| *b == span.end.block);
    match (from, to) {
        (Some(from), Some(to)) if from <= to => blocks[from..=to].to_vec(),
        _ => vec![span.start.block],
    }
}

/// Replace a text block's inline content. Code blocks get a single plain
/// run holding the concatenated text.
pub(crate) fn replace_inline(
    doc: &mut Document,
    block: NodeKey,
    children: Vec<Arc<Node>>,
) -> Result<()> {
    let node = doc.node(block).ok_or(ModelError::NotFound(block))?;
    let len = node.children().len();
    let children = if node.is_code_block() {
        let text: String = children.iter().map(|c| c.inline_text()).collect();
        let run = Node::run(TextRun::plain(text));
        let run = match children.iter().find(|c| c.is_text()) {
            Some(first) => run.keyed(first.key()),
            None => run,
        };
        vec![Arc::new(run)]
    } else {
        children
    };
    doc.splice_children(block, 0..len, children)?;
    Ok(())
}

/// Inline children of a block, cloned out of the document.
pub(crate) fn inline_children(doc: &Document, block: NodeKey) -> Vec<Arc<Node>> {
    doc.children(block).to_vec()
}

pub(crate) fn block_len(doc: &Document, block: NodeKey) -> usize {
    doc.node(block).map_or(0, inline_len)
}

/// Normalize, map the working-form endpoints back to points and repair
/// anything left dangling.
pub(crate) fn finish(
    before: &Document,
    mut doc: Document,
    anchor: BlockOffset,
    focus: BlockOffset,
    format: TextFormat,
) -> Edit {
    normalize::normalize(&mut doc);
    let to_point = |at: BlockOffset| {
        point::to_point(&doc, at).unwrap_or_else(|| crate::selection::Point::new(at.block, at.offset))
    };
    let selection = Selection::Range(
        RangeSelection::new(to_point(anchor), to_point(focus)).with_format(format),
    );
    let selection = repair_dangling(&selection, before, &doc);
    Edit {
        document: doc,
        selection,
    }
}

pub(crate) fn finish_caret(
    before: &Document,
    doc: Document,
    at: BlockOffset,
    format: TextFormat,
) -> Edit {
    finish(before, doc, at, at, format)
}

/// Finish with an explicit selection (grid results).
pub(crate) fn finish_with(before: &Document, mut doc: Document, selection: Selection) -> Edit {
    normalize::normalize(&mut doc);
    let selection = repair_dangling(&selection, before, &doc);
    Edit {
        document: doc,
        selection,
    }
}

/// The block holding `key` whose parent is the root or a table cell.
pub(crate) fn host_block(doc: &Document, key: NodeKey) -> Option<NodeKey> {
    let path = doc.path_of(key)?;
    let mut best = None;
    for depth in 1..=path.len() {
        let parent = doc.node_at_path(&path[..depth - 1])?;
        if matches!(parent.kind(), crate::model::NodeKind::Root) || parent.is_table_cell() {
            best = Some(doc.node_at_path(&path[..depth])?.key());
        }
    }
    best
}

/// The table cell or root that contains `key`.
pub(crate) fn host_container(doc: &Document, key: NodeKey) -> NodeKey {
    doc.ancestor_where(key, Node::is_table_cell)
        .map_or(doc.root_key(), Node::key)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::model::invariants;
    use crate::selection::Point;

    /// Caret in text block `block` (document order) at `offset`.
    pub fn caret(doc: &Document, block: usize, offset: usize) -> Selection {
        let key = doc.text_blocks()[block].key();
        Selection::caret(point::point_in_block(doc.node(key).unwrap(), offset))
    }

    pub fn range(doc: &Document, from: (usize, usize), to: (usize, usize)) -> Selection {
        let at = |(block, offset): (usize, usize)| -> Point {
            let key = doc.text_blocks()[block].key();
            point::point_in_block(doc.node(key).unwrap(), offset)
        };
        Selection::range(at(from), at(to))
    }

    /// (block index, offset) of the selection's focus.
    pub fn focus_of(edit: &Edit) -> (usize, usize) {
        let focus = match edit.selection {
            Selection::Range(range) => range.focus,
            Selection::Grid(_) => panic!("expected a range selection"),
        };
        let at = point::to_block_offset(&edit.document, focus).unwrap();
        let index = edit
            .document
            .text_blocks()
            .iter()
            .position(|b| b.key() == at.block)
            .unwrap();
        (index, at.offset)
    }

    pub fn checked(edit: Edit) -> Edit {
        invariants::check(&edit.document).unwrap();
        assert!(
            crate::selection::normalize(&edit.selection, &edit.document) == edit.selection,
            "selection must be valid for the new document"
        );
        edit
    }
}
