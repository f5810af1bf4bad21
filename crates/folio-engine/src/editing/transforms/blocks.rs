//! Block-level transforms: block type toggling, Enter and horizontal rules.

use serde::{Deserialize, Serialize};

use super::{
    Edit, EditError, Result, code, delete, finish, finish_caret, host_block, inline, lists,
    replace_inline, shortcuts, span, text, touched_blocks,
};
use crate::editing::options::CodeOptions;
use crate::model::{Document, ListKind, ModelError, Node, NodeKey, NodeKind, TextFormat};
use crate::selection::Selection;
use crate::selection::point::{BlockOffset, inline_len};

/// Target of [`toggle_block_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Paragraph,
    Heading(u8),
    List(ListKind),
}

/// Split a text block at `at`. The head keeps the block's key; the tail
/// becomes a new sibling of kind `tail_kind`, whose key is returned.
pub(crate) fn split_block(doc: &mut Document, at: BlockOffset, tail_kind: NodeKind) -> Result<NodeKey> {
    let (head, tail) = inline::split(doc.children(at.block), at.offset);
    let parent = doc.parent_key(at.block).ok_or(ModelError::NotFound(at.block))?;
    let index = doc
        .index_in_parent(at.block)
        .ok_or(ModelError::NotFound(at.block))?;
    replace_inline(doc, at.block, head)?;
    let tail = Node::leaf(tail_kind).with_children(tail);
    Ok(doc.insert_child(parent, index + 1, tail)?)
}

/// Enter at `at` without any shortcut handling. Returns the caret.
///
/// List items split into a new item (unchecked in check lists). Headings
/// split into a heading, except at the end where a paragraph follows and at
/// the start where an empty paragraph is put in front.
pub(crate) fn break_block(doc: &mut Document, at: BlockOffset) -> Result<BlockOffset> {
    let node = doc.node(at.block).ok_or(ModelError::NotFound(at.block))?;
    let len = inline_len(node);
    let tail_kind = match node.kind().clone() {
        NodeKind::CodeBlock { .. } => {
            return text::insert_run(doc, at, "\n", TextFormat::empty());
        }
        NodeKind::ListItem { checked, .. } => NodeKind::ListItem {
            value: 1,
            checked: checked.map(|_| false),
        },
        NodeKind::Heading { .. } if at.offset >= len => NodeKind::Paragraph,
        NodeKind::Heading { .. } if at.offset == 0 => {
            let parent = doc.parent_key(at.block).ok_or(ModelError::NotFound(at.block))?;
            let index = doc
                .index_in_parent(at.block)
                .ok_or(ModelError::NotFound(at.block))?;
            doc.insert_child(parent, index, Node::paragraph(Vec::new()))?;
            return Ok(at);
        }
        heading @ NodeKind::Heading { .. } => heading,
        _ => NodeKind::Paragraph,
    };
    let tail = split_block(doc, at, tail_kind)?;
    Ok(BlockOffset::new(tail, 0))
}

/// Enter.
///
/// Code blocks get a newline. A paragraph reading ```` ```lang code ````
/// with the caret at its end becomes a code block. An empty list item
/// outdents one level (a top-level one leaves the list). Everything else
/// splits at the caret.
pub fn insert_paragraph(doc: &Document, selection: &Selection, options: &CodeOptions) -> Result<Edit> {
    let span = span(doc, selection)?;
    let mut next = doc.clone();
    let at = delete::delete_span(&mut next, &span)?;
    let node = next.node(at.block).ok_or(EditError::Unresolvable)?;
    let len = inline_len(node);
    let is_paragraph = *node.kind() == NodeKind::Paragraph;
    let is_item = node.is_list_item();

    if is_paragraph
        && at.offset == len
        && let Some(caret) = shortcuts::fence_on_enter(&mut next, at.block, options)?
    {
        return Ok(finish_caret(doc, next, caret, span.format));
    }
    if is_item && len == 0 {
        lists::outdent_item(&mut next, at.block)?;
        return Ok(finish_caret(doc, next, at, span.format));
    }
    let caret = break_block(&mut next, at)?;
    Ok(finish_caret(doc, next, caret, span.format))
}

/// Insert a horizontal rule at the caret's top-level block (or the block
/// inside the current table cell).
///
/// At the very start of a non-empty block the rule goes in front; in the
/// middle the block is split around it. The caret lands on the block after
/// the rule, which is created when missing.
pub fn insert_horizontal_rule(doc: &Document, selection: &Selection) -> Result<Edit> {
    let span = span(doc, selection)?;
    let mut next = doc.clone();
    let at = delete::delete_span(&mut next, &span)?;
    let host = host_block(&next, at.block).ok_or(EditError::Unresolvable)?;
    let container = next.parent_key(host).ok_or(ModelError::NotFound(host))?;
    let index = next.index_in_parent(host).ok_or(ModelError::NotFound(host))?;
    let len = next.node(at.block).map_or(0, inline_len);

    if host == at.block && at.offset == 0 && len > 0 {
        next.insert_child(container, index, Node::horizontal_rule())?;
        return Ok(finish_caret(doc, next, at, span.format));
    }
    if host == at.block && at.offset < len {
        let kind = next
            .node(host)
            .map(|n| n.kind().clone())
            .ok_or(ModelError::NotFound(host))?;
        split_block(&mut next, at, kind)?;
    }
    next.insert_child(container, index + 1, Node::horizontal_rule())?;
    let following = next
        .children(container)
        .get(index + 2)
        .and_then(|n| n.descendants().find(|d| d.is_text_block()))
        .map(Node::key);
    let caret = match following {
        Some(block) => BlockOffset::new(block, 0),
        None => {
            let key = next.insert_child(container, index + 2, Node::paragraph(Vec::new()))?;
            BlockOffset::new(key, 0)
        }
    };
    Ok(finish_caret(doc, next, caret, span.format))
}

fn set_plain(doc: &mut Document, blocks: &[NodeKey], kind: &NodeKind) -> Result<()> {
    for &block in blocks {
        if doc.node(block).is_some_and(Node::is_list_item) {
            lists::item_to_paragraph(doc, block)?;
        }
        doc.set_kind(block, kind.clone())?;
    }
    Ok(())
}

fn set_list(doc: &mut Document, blocks: &[NodeKey], kind: ListKind) -> Result<()> {
    let item_of = |doc: &Document, block: NodeKey| {
        doc.node(block)
            .filter(|n| n.is_list_item())
            .and_then(|_| doc.parent(block))
            .and_then(Node::list_kind)
    };
    if blocks.iter().all(|b| item_of(doc, *b) == Some(kind)) {
        return set_plain(doc, blocks, &NodeKind::Paragraph);
    }

    let mut other_lists: Vec<NodeKey> = Vec::new();
    for &block in blocks {
        if let Some(found) = item_of(doc, block)
            && found != kind
            && let Some(list) = doc.parent_key(block)
            && !other_lists.contains(&list)
        {
            other_lists.push(list);
        }
    }
    for list in other_lists {
        lists::switch_list_kind(doc, list, kind)?;
    }

    // Runs of consecutive sibling paragraphs/headings become one list each
    let mut groups: Vec<Vec<NodeKey>> = Vec::new();
    for &block in blocks {
        let convertible = doc
            .node(block)
            .is_some_and(|n| matches!(n.kind(), NodeKind::Paragraph | NodeKind::Heading { .. }));
        if !convertible {
            continue;
        }
        let follows = |group: &Vec<NodeKey>| {
            group
                .last()
                .and_then(|last| doc.next_sibling(*last))
                .is_some_and(|n| n.key() == block)
        };
        match groups.last_mut() {
            Some(group) if follows(group) => group.push(block),
            _ => groups.push(vec![block]),
        }
    }
    for group in groups {
        lists::wrap_in_list(doc, &group, kind, 1)?;
    }
    Ok(())
}

/// Convert every touched block to `target`.
///
/// Code blocks are first unfolded into one paragraph per line. A heading
/// target toggles back to paragraphs when every touched block already is
/// that heading; a list target removes the list when every touched block
/// already is an item of that kind. Neighbouring lists of the same kind are
/// merged by normalization.
pub fn toggle_block_type(doc: &Document, selection: &Selection, target: BlockType) -> Result<Edit> {
    let span = span(doc, selection)?;
    let mut next = doc.clone();
    let (mut anchor, mut focus) = (span.anchor, span.focus);
    let mut blocks = Vec::new();
    for block in touched_blocks(doc, &span) {
        if !doc.node(block).is_some_and(Node::is_code_block) {
            blocks.push(block);
            continue;
        }
        let lines = code::unfold(&mut next, block)?;
        if anchor.block == block {
            anchor = code::unfolded_offset(&lines, anchor.offset);
        }
        if focus.block == block {
            focus = code::unfolded_offset(&lines, focus.offset);
        }
        blocks.extend(lines.iter().map(|line| line.block));
    }

    match target {
        BlockType::Paragraph => set_plain(&mut next, &blocks, &NodeKind::Paragraph)?,
        BlockType::Heading(level) => {
            let level = level.clamp(1, 6);
            let heading = NodeKind::Heading { level };
            let all_heading = blocks
                .iter()
                .all(|b| next.node(*b).is_some_and(|n| *n.kind() == heading));
            let kind = if all_heading {
                NodeKind::Paragraph
            } else {
                heading
            };
            set_plain(&mut next, &blocks, &kind)?;
        }
        BlockType::List(kind) => set_list(&mut next, &blocks, kind)?,
    }
    Ok(finish(doc, next, anchor, focus, span.format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::transforms::test_support::{caret, checked, focus_of, range};
    use crate::snapshot::format_tree;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn abc_list(kind: ListKind) -> Document {
        Document::new(vec![Node::list(
            kind,
            vec![
                Node::list_item_text("a"),
                Node::list_item_text("b"),
                Node::list_item_text("c"),
            ],
        )])
    }

    #[test]
    fn heading_toggles_back_to_paragraph() {
        let doc = Document::new(vec![Node::paragraph_text("title")]);
        let edit = checked(toggle_block_type(&doc, &caret(&doc, 0, 2), BlockType::Heading(2)).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          Heading level=2
            Text "title"
        "#);
        assert_eq!(focus_of(&edit), (0, 2));
        let again = checked(
            toggle_block_type(&edit.document, &edit.selection, BlockType::Heading(2)).unwrap(),
        );
        assert_eq!(again.document, doc);
    }

    #[test]
    fn paragraphs_become_one_list_and_back() {
        let doc = Document::new(vec![Node::paragraph_text("one"), Node::paragraph_text("two")]);
        let sel = range(&doc, (0, 1), (1, 1));
        let edit = checked(toggle_block_type(&doc, &sel, BlockType::List(ListKind::Bullet)).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          List bullet start=1
            ListItem value=1
              Text "one"
            ListItem value=2
              Text "two"
        "#);
        let back = checked(
            toggle_block_type(&edit.document, &edit.selection, BlockType::List(ListKind::Bullet))
                .unwrap(),
        );
        assert_eq!(back.document, doc);
    }

    #[test]
    fn other_list_kind_switches_whole_list() {
        let doc = abc_list(ListKind::Number);
        let edit = checked(
            toggle_block_type(&doc, &caret(&doc, 1, 0), BlockType::List(ListKind::Check)).unwrap(),
        );
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          List check start=1
            ListItem value=1 checked=false
              Text "a"
            ListItem value=2 checked=false
              Text "b"
            ListItem value=3 checked=false
              Text "c"
        "#);
    }

    #[test]
    fn neighbour_list_absorbs_converted_paragraph() {
        let doc = Document::new(vec![
            Node::list(ListKind::Bullet, vec![Node::list_item_text("a")]),
            Node::paragraph_text("b"),
        ]);
        let edit = checked(
            toggle_block_type(&doc, &caret(&doc, 1, 1), BlockType::List(ListKind::Bullet)).unwrap(),
        );
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          List bullet start=1
            ListItem value=1
              Text "a"
            ListItem value=2
              Text "b"
        "#);
        assert_eq!(focus_of(&edit), (1, 1));
    }

    #[test]
    fn paragraph_target_splits_the_list() {
        let doc = abc_list(ListKind::Bullet);
        let edit = checked(toggle_block_type(&doc, &caret(&doc, 1, 0), BlockType::Paragraph).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          List bullet start=1
            ListItem value=1
              Text "a"
          Paragraph
            Text "b"
          List bullet start=1
            ListItem value=1
              Text "c"
        "#);
    }

    #[test]
    fn code_block_converts_line_per_block() {
        let doc = Document::new(vec![Node::code_block(None, "x\ny")]);
        let edit = checked(toggle_block_type(&doc, &caret(&doc, 0, 3), BlockType::Heading(1)).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          Heading level=1
            Text "x"
          Heading level=1
            Text "y"
        "#);
        assert_eq!(focus_of(&edit), (1, 1));
    }

    #[test]
    fn enter_splits_paragraph() {
        let doc = Document::new(vec![Node::paragraph_text("hello")]);
        let edit = checked(insert_paragraph(&doc, &caret(&doc, 0, 2), &CodeOptions::default()).unwrap());
        assert_eq!(edit.document.text_content(), "he\nllo");
        assert_eq!(focus_of(&edit), (1, 0));
    }

    #[test]
    fn enter_at_heading_end_starts_a_paragraph() {
        let doc = Document::new(vec![Node::heading(1, vec![Node::text("Title")])]);
        let edit = checked(insert_paragraph(&doc, &caret(&doc, 0, 5), &CodeOptions::default()).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          Heading level=1
            Text "Title"
          Paragraph
            Text ""
        "#);
        assert_eq!(focus_of(&edit), (1, 0));
    }

    #[test]
    fn enter_in_check_list_adds_unchecked_item() {
        let doc = Document::new(vec![Node::list(
            ListKind::Check,
            vec![Node::check_item(true, vec![Node::text("done")])],
        )]);
        let edit = checked(insert_paragraph(&doc, &caret(&doc, 0, 4), &CodeOptions::default()).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          List check start=1
            ListItem value=1 checked=true
              Text "done"
            ListItem value=2 checked=false
              Text ""
        "#);
    }

    #[test]
    fn enter_on_empty_items_outdents_then_exits() {
        let doc = Document::new(vec![Node::list(
            ListKind::Bullet,
            vec![
                Node::list_item_text("a"),
                Node::nested_item(Node::list(ListKind::Bullet, vec![Node::list_item_text("")])),
            ],
        )]);
        let options = CodeOptions::default();
        let edit = checked(insert_paragraph(&doc, &caret(&doc, 1, 0), &options).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          List bullet start=1
            ListItem value=1
              Text "a"
            ListItem value=2
              Text ""
        "#);
        let edit = checked(insert_paragraph(&edit.document, &edit.selection, &options).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          List bullet start=1
            ListItem value=1
              Text "a"
          Paragraph
            Text ""
        "#);
        assert_eq!(focus_of(&edit), (1, 0));
    }

    #[test]
    fn enter_after_code_fence_makes_code_block() {
        let doc = Document::new(vec![Node::paragraph_text("``` alert(1);")]);
        let edit = checked(insert_paragraph(&doc, &caret(&doc, 0, 13), &CodeOptions::default()).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          CodeBlock language=javascript
            Text "alert(1);"
        "#);
        assert_eq!(focus_of(&edit), (0, 9));
    }

    #[test]
    fn enter_in_code_inserts_newline() {
        let doc = Document::new(vec![Node::code_block(Some("rust"), "ab")]);
        let edit = checked(insert_paragraph(&doc, &caret(&doc, 0, 1), &CodeOptions::default()).unwrap());
        assert_eq!(edit.document.text_content(), "a\nb");
        assert_eq!(focus_of(&edit), (0, 2));
    }

    #[test]
    fn horizontal_rule_splits_paragraph() {
        let doc = Document::new(vec![Node::paragraph_text("abcd")]);
        let edit = checked(insert_horizontal_rule(&doc, &caret(&doc, 0, 2)).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          Paragraph
            Text "ab"
          HorizontalRule
          Paragraph
            Text "cd"
        "#);
        assert_eq!(focus_of(&edit), (1, 0));
    }

    #[test]
    fn horizontal_rule_at_end_adds_paragraph() {
        let doc = Document::new(vec![Node::paragraph_text("ab")]);
        let edit = checked(insert_horizontal_rule(&doc, &caret(&doc, 0, 2)).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          Paragraph
            Text "ab"
          HorizontalRule
          Paragraph
            Text ""
        "#);
    }
}
