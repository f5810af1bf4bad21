//! Deletion: range removal, Backspace and Delete.

use std::sync::Arc;

use super::{
    Edit, Result, Span, block_len, code, finish_caret, host_container,
    inline, inline_children, lists, replace_inline, span,
};
use crate::model::{Document, Node, NodeKey, NodeKind, TextRun};
use crate::selection::navigation::{Direction, Granularity, step};
use crate::selection::point::BlockOffset;
use crate::selection::Selection;

fn is_prefix(prefix: &[usize], path: &[usize]) -> bool {
    path.len() >= prefix.len() && path[..prefix.len()] == *prefix
}

/// Top-most nodes strictly between two blocks in document order, excluding
/// ancestors and descendants of either block.
fn covered_nodes(doc: &Document, start: NodeKey, end: NodeKey) -> Vec<NodeKey> {
    let (Some(s), Some(e)) = (doc.path_of(start), doc.path_of(end)) else {
        return Vec::new();
    };
    let mut covered: Vec<(Vec<usize>, NodeKey)> = Vec::new();
    fn walk(
        node: &Node,
        path: &mut Vec<usize>,
        s: &[usize],
        e: &[usize],
        out: &mut Vec<(Vec<usize>, NodeKey)>,
    ) {
        for (i, child) in node.children().iter().enumerate() {
            path.push(i);
            let inside = path.as_slice() > s && path.as_slice() < e;
            if inside && !is_prefix(s, path) && !is_prefix(path, e) {
                out.push((path.clone(), child.key()));
            } else if is_prefix(path, s) || is_prefix(path, e) || inside {
                walk(child, path, s, e, out);
            }
            path.pop();
        }
    }
    walk(doc.root(), &mut Vec::new(), &s, &e, &mut covered);
    covered.into_iter().map(|(_, key)| key).collect()
}

fn clear_cell(doc: &mut Document, cell: NodeKey) -> Result<()> {
    let len = doc.children(cell).len();
    doc.splice_children(cell, 0..len, vec![Arc::new(Node::paragraph_text(""))])?;
    Ok(())
}

/// Remove a covered node. Rows and cells of a table that is only partly
/// covered are emptied instead.
fn remove_covered(doc: &mut Document, key: NodeKey) -> Result<()> {
    let Some(node) = doc.node(key) else {
        return Ok(());
    };
    match node.kind() {
        NodeKind::TableRow => {
            let cells: Vec<NodeKey> = node.children().iter().map(|c| c.key()).collect();
            for cell in cells {
                clear_cell(doc, cell)?;
            }
        }
        NodeKind::TableCell { .. } => clear_cell(doc, key)?,
        _ => {
            doc.remove(key)?;
        }
    }
    Ok(())
}

/// Tail of a block's inline content from `offset`, as content for a
/// non-code block.
fn tail_of(doc: &Document, block: NodeKey, offset: usize) -> Vec<Arc<Node>> {
    let children = inline_children(doc, block);
    let (_, tail) = inline::split(&children, offset);
    if doc.node(block).is_some_and(Node::is_code_block) {
        let text: String = tail.iter().map(|n| n.inline_text()).collect();
        return inline::from_text(&text, &TextRun::plain(""));
    }
    tail
}

/// Delete everything between two ordered block offsets and return the
/// caret position.
///
/// Within one table cell (or outside tables) the end block's remaining
/// content is appended to the start block and the end block goes away.
/// Across cells or table boundaries both edge blocks are only trimmed.
pub(crate) fn delete_range(
    doc: &mut Document,
    start: BlockOffset,
    end: BlockOffset,
) -> Result<BlockOffset> {
    if start.block == end.block {
        let children = inline_children(doc, start.block);
        let (from, to) = (start.offset.min(end.offset), start.offset.max(end.offset));
        replace_inline(doc, start.block, inline::delete(&children, from, to))?;
        return Ok(BlockOffset::new(start.block, from));
    }

    let covered = covered_nodes(doc, start.block, end.block);
    for key in covered.into_iter().rev() {
        remove_covered(doc, key)?;
    }

    let head = {
        let children = inline_children(doc, start.block);
        inline::split(&children, start.offset).0
    };
    let tail = tail_of(doc, end.block, end.offset);

    if host_container(doc, start.block) == host_container(doc, end.block) {
        doc.remove(end.block)?;
        let mut merged = head;
        merged.extend(tail);
        replace_inline(doc, start.block, merged)?;
    } else {
        replace_inline(doc, end.block, tail)?;
        replace_inline(doc, start.block, head)?;
    }
    Ok(start)
}

/// Delete the selected content (text range or cell contents).
pub fn delete_selection(doc: &Document, selection: &Selection) -> Result<Edit> {
    let span = span(doc, selection)?;
    let mut next = doc.clone();
    let at = delete_span(&mut next, &span)?;
    Ok(finish_caret(doc, next, at, span.format))
}

/// Delete a span in place: grid spans clear their cells, ranges go through
/// [`delete_range`].
pub(crate) fn delete_span(doc: &mut Document, span: &Span) -> Result<BlockOffset> {
    if let Some(cells) = &span.cells {
        for cell in cells {
            clear_cell(doc, *cell)?;
        }
        let first = cells
            .first()
            .and_then(|c| doc.node(*c))
            .and_then(|c| c.descendants().find(|n| n.is_text_block()))
            .map(Node::key)
            .ok_or(super::EditError::Unresolvable)?;
        return Ok(BlockOffset::new(first, 0));
    }
    if span.is_collapsed() {
        return Ok(span.start);
    }
    delete_range(doc, span.start, span.end)
}

fn sibling_leaf_block(doc: &Document, block: NodeKey, direction: Direction) -> Option<NodeKey> {
    let sibling = match direction {
        Direction::Backward => doc.previous_sibling(block)?,
        Direction::Forward => doc.next_sibling(block)?,
    };
    matches!(
        sibling.kind(),
        NodeKind::HorizontalRule | NodeKind::Decorator { .. }
    )
    .then(|| sibling.key())
}

fn adjacent_block(doc: &Document, block: NodeKey, direction: Direction) -> Option<NodeKey> {
    let blocks = doc.text_blocks();
    let index = blocks.iter().position(|b| b.key() == block)?;
    let other = match direction {
        Direction::Backward => blocks.get(index.checked_sub(1)?)?,
        Direction::Forward => blocks.get(index + 1)?,
    };
    (host_container(doc, other.key()) == host_container(doc, block)).then(|| other.key())
}

/// Backspace.
///
/// At the start of a block: list items outdent (a top-level item leaves
/// its list as a paragraph), code blocks and headings turn into
/// paragraphs, and a paragraph removes a preceding rule or decorator or
/// merges into the previous block of the same cell.
pub fn delete_backward(doc: &Document, selection: &Selection, granularity: Granularity) -> Result<Edit> {
    let span = span(doc, selection)?;
    if !span.is_collapsed() {
        return delete_selection(doc, selection);
    }
    let at = span.start;
    let mut next = doc.clone();
    let block = doc.node(at.block).ok_or(super::EditError::Unresolvable)?;

    if at.offset > 0 {
        let target = step(doc, at, Direction::Backward, granularity);
        let caret = delete_range(&mut next, target, at)?;
        return Ok(finish_caret(doc, next, caret, span.format));
    }

    match block.kind() {
        NodeKind::ListItem { .. } => {
            lists::outdent_item(&mut next, at.block)?;
            Ok(finish_caret(doc, next, at, span.format))
        }
        NodeKind::CodeBlock { .. } => {
            let lines = code::unfold(&mut next, at.block)?;
            let caret = code::unfolded_offset(&lines, 0);
            Ok(finish_caret(doc, next, caret, span.format))
        }
        NodeKind::Heading { .. } => {
            next.set_kind(at.block, NodeKind::Paragraph)?;
            Ok(finish_caret(doc, next, at, span.format))
        }
        _ => {
            if let Some(rule) = sibling_leaf_block(doc, at.block, Direction::Backward) {
                next.remove(rule)?;
                return Ok(finish_caret(doc, next, at, span.format));
            }
            if let Some(previous) = adjacent_block(doc, at.block, Direction::Backward) {
                let end = BlockOffset::new(previous, block_len(doc, previous));
                let caret = delete_range(&mut next, end, at)?;
                return Ok(finish_caret(doc, next, caret, span.format));
            }
            // First block of its cell, or right after a table: an empty
            // paragraph can still go away.
            let parent = doc.parent(at.block).ok_or(super::EditError::Unresolvable)?;
            if block_len(doc, at.block) == 0
                && parent.children().len() > 1
                && let Some(previous) = doc
                    .text_blocks()
                    .into_iter()
                    .take_while(|b| b.key() != at.block)
                    .last()
                    .map(Node::key)
            {
                next.remove(at.block)?;
                let caret = BlockOffset::new(previous, block_len(doc, previous));
                return Ok(finish_caret(doc, next, caret, span.format));
            }
            Ok(Edit::unchanged(doc, selection))
        }
    }
}

/// Delete (forward). At the end of a block the next block of the same cell
/// is merged in, or a following rule or decorator is removed.
pub fn delete_forward(doc: &Document, selection: &Selection, granularity: Granularity) -> Result<Edit> {
    let span = span(doc, selection)?;
    if !span.is_collapsed() {
        return delete_selection(doc, selection);
    }
    let at = span.start;
    let mut next = doc.clone();

    if at.offset < block_len(doc, at.block) {
        let target = step(doc, at, Direction::Forward, granularity);
        let caret = delete_range(&mut next, at, target)?;
        return Ok(finish_caret(doc, next, caret, span.format));
    }
    if let Some(rule) = sibling_leaf_block(doc, at.block, Direction::Forward) {
        next.remove(rule)?;
        return Ok(finish_caret(doc, next, at, span.format));
    }
    if let Some(following) = adjacent_block(doc, at.block, Direction::Forward) {
        let caret = delete_range(&mut next, at, BlockOffset::new(following, 0))?;
        return Ok(finish_caret(doc, next, caret, span.format));
    }
    Ok(Edit::unchanged(doc, selection))
}
