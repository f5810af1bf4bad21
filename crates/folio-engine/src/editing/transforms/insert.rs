//! Pasting a fragment at the selection.
//!
//! The caret block is split and the fragment goes in between: the first
//! fragment block's inline content joins the head, the last inline-bearing
//! block takes the tail, and everything in between becomes siblings. Inside
//! a list the fragment is first turned into list items; inside a table cell
//! pasted tables dissolve into their cell content.

use std::collections::VecDeque;
use std::sync::Arc;

use super::{
    Edit, EditError, Result, code, delete, finish_caret, host_container, inline, replace_inline, span,
    tables, text,
};
use crate::clipboard::Fragment;
use crate::editing::options::CodeOptions;
use crate::model::table_map::pad_table;
use crate::model::{Document, ListKind, ModelError, Node, NodeKey, NodeKind, TextFormat, TextRun};
use crate::selection::Selection;
use crate::selection::point::{BlockOffset, inline_len};

fn inline_bearing(node: &Node) -> bool {
    match node.kind() {
        NodeKind::Paragraph | NodeKind::Heading { .. } => true,
        NodeKind::ListItem { .. } => !node.is_nested_list_item(),
        _ => false,
    }
}

fn inline_width(children: &[Arc<Node>]) -> usize {
    children.iter().map(|c| inline_len(c)).sum()
}

/// Items for pasting `block` into a list of kind `host`. Lossy for blocks
/// a list item cannot hold.
fn push_items(block: &Node, host: ListKind, out: &mut Vec<Node>) {
    let checked = (host == ListKind::Check).then_some(false);
    let item = |children: Vec<Arc<Node>>| {
        Node::leaf(NodeKind::ListItem { value: 1, checked }).with_children(children)
    };
    match block.kind() {
        NodeKind::List { .. } => {
            for child in block.children() {
                let mut item = (**child).clone();
                let nested = item.is_nested_list_item();
                if let NodeKind::ListItem { checked, .. } = &mut item.kind {
                    *checked = match host {
                        ListKind::Check if !nested => Some(checked.unwrap_or(false)),
                        _ => None,
                    };
                }
                out.push(item);
            }
        }
        NodeKind::Paragraph | NodeKind::Heading { .. } => out.push(item(block.children().to_vec())),
        NodeKind::CodeBlock { .. } | NodeKind::Table => {
            out.push(item(inline::from_text(&block.text_content(), &TextRun::default())));
        }
        NodeKind::Decorator { .. } => out.push(item(vec![Arc::new(block.clone())])),
        _ => {}
    }
}

/// Fragment blocks reshaped for the place they are pasted into.
fn pieces_for(
    doc: &Document,
    at: BlockOffset,
    fragment: &Fragment,
    options: &CodeOptions,
) -> Vec<Node> {
    let blocks = fragment.blocks.iter().map(|block| {
        let mut block = block.detached();
        let text = block.inline_text();
        if let NodeKind::CodeBlock { language } = &mut block.kind
            && language.is_none()
        {
            *language = code::pick_language(&text, None, options);
        }
        block
    });
    if let Some(host) = doc.parent(at.block).and_then(Node::list_kind)
        && doc.node(at.block).is_some_and(Node::is_list_item)
    {
        let mut out = Vec::new();
        for block in blocks {
            push_items(&block, host, &mut out);
        }
        return out;
    }
    if host_container(doc, at.block) != doc.root_key() {
        return blocks
            .flat_map(|block| {
                if *block.kind() != NodeKind::Table {
                    return vec![block];
                }
                block
                    .children()
                    .iter()
                    .flat_map(|row| row.children().iter())
                    .flat_map(|cell| cell.children().iter().map(|b| (**b).clone()))
                    .collect()
            })
            .collect();
    }
    blocks
        .map(|block| {
            if *block.kind() == NodeKind::Table {
                pad_table(&block)
            } else {
                block
            }
        })
        .collect()
}

fn end_of(doc: &Document, key: NodeKey) -> Option<BlockOffset> {
    let block = doc
        .node(key)?
        .descendants()
        .filter(|n| n.is_text_block())
        .last()?;
    Some(BlockOffset::new(block.key(), inline_len(block)))
}

/// Paste `fragment` at the selection.
///
/// A single pasted table over a grid selection merges into the grid. In a
/// code block only the fragment's plain text is inserted. An empty
/// paragraph is replaced by the fragment outright.
pub fn insert_fragment(
    doc: &Document,
    selection: &Selection,
    fragment: &Fragment,
    options: &CodeOptions,
) -> Result<Edit> {
    if let Selection::Grid(grid) = selection
        && let Some(table) = fragment.single_table()
    {
        return tables::merge_grids(doc, grid, table);
    }
    if fragment.is_empty() {
        return delete::delete_selection(doc, selection);
    }
    let span = span(doc, selection)?;
    let mut next = doc.clone();
    let at = delete::delete_span(&mut next, &span)?;
    let block = next.node(at.block).ok_or(EditError::Unresolvable)?;
    let block_kind = block.kind().clone();
    let block_len = inline_len(block);
    log::debug!(
        "pasting {} block(s) into {} {}",
        fragment.blocks.len(),
        block_kind.name(),
        at.block
    );

    if block.is_code_block() {
        let caret = text::insert_run(&mut next, at, &fragment.plain_text(), TextFormat::empty())?;
        return Ok(finish_caret(doc, next, caret, span.format));
    }

    let pieces = pieces_for(&next, at, fragment, options);
    if pieces.is_empty() {
        return Ok(finish_caret(doc, next, at, span.format));
    }
    let parent = next.parent_key(at.block).ok_or(ModelError::NotFound(at.block))?;
    let index = next
        .index_in_parent(at.block)
        .ok_or(ModelError::NotFound(at.block))?;

    if block_kind == NodeKind::Paragraph && block_len == 0 {
        next.remove(at.block)?;
        let count = pieces.len();
        let caret_in_last = pieces
            .last()
            .is_some_and(|n| !matches!(n.kind(), NodeKind::Table));
        let mut last = at.block;
        for (i, piece) in pieces.into_iter().enumerate() {
            last = next.insert_child(parent, index + i, piece)?;
        }
        let caret = match end_of(&next, last) {
            Some(caret) if caret_in_last => caret,
            _ => {
                let key = next.insert_child(parent, index + count, Node::paragraph(Vec::new()))?;
                BlockOffset::new(key, 0)
            }
        };
        return Ok(finish_caret(doc, next, caret, span.format));
    }

    let (mut head, tail) = inline::split(next.children(at.block), at.offset);
    let mut pieces: VecDeque<Node> = pieces.into();
    let mut absorbed = false;
    if pieces.front().is_some_and(inline_bearing)
        && let Some(first) = pieces.pop_front()
    {
        head.extend(first.children().iter().cloned());
        absorbed = true;
    }
    let head_len = inline_width(&head);

    if pieces.is_empty() {
        head.extend(tail);
        replace_inline(&mut next, at.block, head)?;
        return Ok(finish_caret(doc, next, BlockOffset::new(at.block, head_len), span.format));
    }

    let last_inline = pieces.back().is_some_and(inline_bearing);
    let (tail_block, tail_offset) = match pieces.pop_back() {
        Some(last) if last_inline => {
            let offset = inline_width(last.children());
            let mut children = last.children().to_vec();
            children.extend(tail);
            (last.with_children(children), offset)
        }
        other => {
            pieces.extend(other);
            let kind = match block_kind.clone() {
                NodeKind::ListItem { checked, .. } => NodeKind::ListItem {
                    value: 1,
                    checked: checked.map(|_| false),
                },
                kind => kind,
            };
            (Node::leaf(kind).with_children(tail), 0)
        }
    };

    replace_inline(&mut next, at.block, head)?;
    let mut position = index + 1;
    for piece in pieces {
        next.insert_child(parent, position, piece)?;
        position += 1;
    }
    let tail_key = next.insert_child(parent, position, tail_block)?;
    if !absorbed && head_len == 0 && block_kind == NodeKind::Paragraph {
        next.remove(at.block)?;
    }
    Ok(finish_caret(
        doc,
        next,
        BlockOffset::new(tail_key, tail_offset),
        span.format,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::transforms::test_support::{caret, checked, focus_of};
    use crate::selection::{CellCoord, GridSelection};
    use crate::snapshot::format_tree;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn paste(doc: &Document, selection: &Selection, blocks: Vec<Node>) -> Edit {
        let fragment = Fragment::new(blocks);
        checked(insert_fragment(doc, selection, &fragment, &CodeOptions::default()).unwrap())
    }

    #[test]
    fn single_paragraph_concatenates_at_caret() {
        let doc = Document::new(vec![Node::paragraph_text("four")]);
        let edit = paste(&doc, &caret(&doc, 0, 4), vec![Node::paragraph_text("three")]);
        assert_eq!(edit.document.text_content(), "fourthree");
        assert_eq!(focus_of(&edit), (0, 9));
    }

    #[test]
    fn several_paragraphs_split_the_caret_block() {
        let doc = Document::new(vec![Node::paragraph_text("abcd")]);
        let edit = paste(
            &doc,
            &caret(&doc, 0, 2),
            vec![
                Node::paragraph_text("x"),
                Node::heading(2, vec![Node::text("mid")]),
                Node::paragraph_text("y"),
            ],
        );
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          Paragraph
            Text "abx"
          Heading level=2
            Text "mid"
          Paragraph
            Text "ycd"
        "#);
        assert_eq!(focus_of(&edit), (2, 1));
    }

    #[test]
    fn list_replaces_empty_paragraph() {
        let doc = Document::default();
        let edit = paste(
            &doc,
            &caret(&doc, 0, 0),
            vec![Node::list(
                ListKind::Bullet,
                vec![Node::list_item_text("Hello"), Node::list_item_text("world!")],
            )],
        );
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          List bullet start=1
            ListItem value=1
              Text "Hello"
            ListItem value=2
              Text "world!"
        "#);
        assert_eq!(focus_of(&edit), (1, 6));
    }

    #[test]
    fn list_items_splice_into_host_list() {
        let doc = Document::new(vec![Node::list(
            ListKind::Check,
            vec![Node::check_item(true, vec![Node::text("one")])],
        )]);
        let edit = paste(
            &doc,
            &caret(&doc, 0, 3),
            vec![
                Node::list(
                    ListKind::Bullet,
                    vec![Node::list_item_text("a"), Node::list_item_text("b")],
                ),
                Node::code_block(None, "x\ny"),
            ],
        );
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          List check start=1
            ListItem value=1 checked=true
              Text "onea"
            ListItem value=2 checked=false
              Text "b"
            ListItem value=3 checked=false
              Text "x"
              LineBreak
              Text "y"
        "#);
    }

    #[test]
    fn table_after_text_gets_a_following_paragraph() {
        let doc = Document::new(vec![Node::paragraph_text("ab")]);
        let table = Node::table(vec![
            Node::table_row(vec![
                Node::table_cell(vec![Node::paragraph_text("1")]),
                Node::table_cell(vec![Node::paragraph_text("2")]),
            ]),
            Node::table_row(vec![Node::table_cell(vec![Node::paragraph_text("3")])]),
        ]);
        let edit = paste(&doc, &caret(&doc, 0, 2), vec![table]);
        assert_eq!(edit.document.text_content(), "ab\n1\t2\n3\t\n");
        assert_eq!(focus_of(&edit), (5, 0));
    }

    #[test]
    fn table_pasted_into_cell_dissolves() {
        let doc = Document::new(vec![Node::table(vec![Node::table_row(vec![Node::table_cell(
            vec![Node::paragraph_text("")],
        )])])]);
        let inner = Node::table(vec![Node::table_row(vec![
            Node::table_cell(vec![Node::paragraph_text("p")]),
            Node::table_cell(vec![Node::paragraph_text("q")]),
        ])]);
        let edit = paste(&doc, &caret(&doc, 0, 0), vec![inner]);
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          Table
            TableRow
              TableCell
                Paragraph
                  Text "p"
                Paragraph
                  Text "q"
        "#);
    }

    #[test]
    fn code_block_takes_plain_text() {
        let doc = Document::new(vec![Node::code_block(None, "ab")]);
        let edit = paste(
            &doc,
            &caret(&doc, 0, 1),
            vec![Node::paragraph_text("x"), Node::paragraph_text("y")],
        );
        assert_eq!(edit.document.text_content(), "ax\nyb");
        assert_eq!(focus_of(&edit), (0, 4));
    }

    #[test]
    fn table_over_grid_merges() {
        let cell = |t: &str| Node::table_cell(vec![Node::paragraph_text(t)]);
        let doc = Document::new(vec![Node::table(vec![
            Node::table_row(vec![cell("a"), cell("b")]),
            Node::table_row(vec![cell("c"), cell("d")]),
        ])]);
        let table = doc.root().children()[0].key();
        let grid = Selection::Grid(GridSelection::new(
            table,
            CellCoord::new(0, 1),
            CellCoord::new(0, 1),
        ));
        let edit = paste(
            &doc,
            &grid,
            vec![Node::table(vec![Node::table_row(vec![cell("X")])])],
        );
        assert_eq!(edit.document.text_content(), "a\tX\nc\td");
    }
}
