//! List structure: indent, outdent, check state and list/paragraph
//! conversion.
//!
//! Nesting is always expressed with a wrapper item, `ListItem → List →
//! ListItem…`, and the operations here move content items between lists
//! without re-creating them, so item keys survive any number of indent and
//! outdent steps.

use std::sync::Arc;

use super::{Edit, EditError, Result, finish, span, touched_blocks};
use crate::model::{Document, ListKind, ModelError, Node, NodeKey, NodeKind};
use crate::selection::Selection;

fn empty_list(kind: ListKind) -> Node {
    Node::leaf(NodeKind::List { kind, start: 1 })
}

fn wrapper(list: Node) -> Node {
    Node::leaf(NodeKind::ListItem {
        value: 1,
        checked: None,
    })
    .with_children(vec![Arc::new(list)])
}

fn list_of(doc: &Document, item: NodeKey) -> Result<(NodeKey, ListKind)> {
    let list = doc.parent(item).ok_or(ModelError::NotFound(item))?;
    let kind = list.list_kind().ok_or(EditError::Unresolvable)?;
    Ok((list.key(), kind))
}

/// Content items (not wrappers) among the touched blocks.
pub(crate) fn touched_items(doc: &Document, blocks: &[NodeKey]) -> Vec<NodeKey> {
    blocks
        .iter()
        .copied()
        .filter(|b| doc.node(*b).is_some_and(Node::is_list_item))
        .collect()
}

/// Move one item a level deeper.
///
/// A wrapper just before the item receives it (and absorbs a wrapper just
/// after it); otherwise a wrapper just after it receives it at the front;
/// otherwise the item is wrapped in place.
pub(crate) fn indent_item(doc: &mut Document, item: NodeKey) -> Result<()> {
    let (list, kind) = list_of(doc, item)?;
    let index = doc.index_in_parent(item).ok_or(ModelError::NotFound(item))?;
    let siblings = doc.children(list);
    let previous = index
        .checked_sub(1)
        .and_then(|i| siblings.get(i))
        .filter(|n| n.is_nested_list_item())
        .map(|n| n.children()[0].key());
    let next_wrapper = siblings
        .get(index + 1)
        .filter(|n| n.is_nested_list_item())
        .map(|n| (n.key(), n.children()[0].key()));

    let moved = doc.remove(item)?;
    match (previous, next_wrapper) {
        (Some(inner), next) => {
            doc.append_child(inner, moved)?;
            if let Some((wrapper_key, next_inner)) = next {
                let items = doc.take_children(next_inner)?;
                doc.remove(wrapper_key)?;
                let len = doc.children(inner).len();
                doc.splice_children(inner, len..len, items)?;
            }
        }
        (None, Some((_, next_inner))) => {
            doc.insert_child(next_inner, 0, moved)?;
        }
        (None, None) => {
            let nested = empty_list(kind).with_children(vec![moved]);
            doc.insert_child(list, index, wrapper(nested))?;
        }
    }
    Ok(())
}

/// Move one item a level up; the exact inverse of [`indent_item`].
///
/// A nested item leaves its wrapper: the first item goes before it, the
/// last after it, a middle item splits the wrapper in two. A top-level
/// item becomes a paragraph (same key and content) and splits its list.
pub(crate) fn outdent_item(doc: &mut Document, item: NodeKey) -> Result<()> {
    let (list, kind) = list_of(doc, item)?;
    let parent = doc.parent(list).ok_or(ModelError::NotFound(list))?;
    if parent.is_list_item() {
        let wrapper_key = parent.key();
        let items: Vec<NodeKey> = doc.children(list).iter().map(|c| c.key()).collect();
        let index = items
            .iter()
            .position(|k| *k == item)
            .ok_or(ModelError::NotFound(item))?;
        let outer = doc.parent_key(wrapper_key).ok_or(ModelError::NotFound(wrapper_key))?;
        let wrapper_index = doc
            .index_in_parent(wrapper_key)
            .ok_or(ModelError::NotFound(wrapper_key))?;

        if index == 0 {
            let moved = doc.remove(item)?;
            doc.insert_child(outer, wrapper_index, moved)?;
            if doc.children(list).is_empty() {
                doc.remove(wrapper_key)?;
            }
        } else if index + 1 == items.len() {
            let moved = doc.remove(item)?;
            doc.insert_child(outer, wrapper_index + 1, moved)?;
        } else {
            let after = doc.splice_children(list, index + 1..items.len(), Vec::new())?;
            let moved = doc.remove(item)?;
            doc.insert_child(outer, wrapper_index + 1, moved)?;
            let rest = empty_list(kind).with_children(after);
            doc.insert_child(outer, wrapper_index + 2, wrapper(rest))?;
        }
        return Ok(());
    }

    // Top level: leave the list as a paragraph
    let host = parent.key();
    let list_index = doc.index_in_parent(list).ok_or(ModelError::NotFound(list))?;
    let index = doc.index_in_parent(item).ok_or(ModelError::NotFound(item))?;
    let len = doc.children(list).len();
    let after = doc.splice_children(list, index + 1..len, Vec::new())?;
    let moved = doc.remove(item)?;
    let mut paragraph = Arc::unwrap_or_clone(moved);
    paragraph.kind = NodeKind::Paragraph;
    doc.insert_child(host, list_index + 1, paragraph)?;
    if !after.is_empty() {
        let start = match doc.node(list).map(Node::kind) {
            Some(NodeKind::List { start, .. }) => *start,
            _ => 1,
        };
        let rest = Node::leaf(NodeKind::List { kind, start }).with_children(after);
        doc.insert_child(host, list_index + 2, rest)?;
    }
    if doc.children(list).is_empty() {
        doc.remove(list)?;
    }
    Ok(())
}

/// Outdent until the item has left every list.
pub(crate) fn item_to_paragraph(doc: &mut Document, item: NodeKey) -> Result<()> {
    while doc.node(item).is_some_and(Node::is_list_item) {
        outdent_item(doc, item)?;
    }
    Ok(())
}

/// Change the kind of a whole list; check state is added for check lists
/// and dropped otherwise.
pub(crate) fn switch_list_kind(doc: &mut Document, list: NodeKey, kind: ListKind) -> Result<()> {
    let start = match doc.node(list).map(Node::kind) {
        Some(NodeKind::List { start, .. }) => *start,
        _ => return Err(EditError::Unresolvable),
    };
    doc.set_kind(list, NodeKind::List { kind, start })?;
    let items: Vec<(NodeKey, NodeKind)> = doc
        .children(list)
        .iter()
        .map(|item| (item.key(), item.kind().clone()))
        .collect();
    for (key, item_kind) in items {
        let NodeKind::ListItem { value, checked } = item_kind else {
            continue;
        };
        let wrapper = doc.node(key).is_some_and(Node::is_nested_list_item);
        let checked = match kind {
            ListKind::Check if !wrapper => Some(checked.unwrap_or(false)),
            _ => None,
        };
        doc.set_kind(key, NodeKind::ListItem { value, checked })?;
    }
    Ok(())
}

/// Replace consecutive sibling blocks with one list holding them as
/// items. Blocks keep their keys and inline content.
pub(crate) fn wrap_in_list(
    doc: &mut Document,
    blocks: &[NodeKey],
    kind: ListKind,
    start: u32,
) -> Result<NodeKey> {
    let first = *blocks.first().ok_or(EditError::Unresolvable)?;
    let parent = doc.parent_key(first).ok_or(ModelError::NotFound(first))?;
    let index = doc.index_in_parent(first).ok_or(ModelError::NotFound(first))?;
    let removed = doc.splice_children(parent, index..index + blocks.len(), Vec::new())?;
    let items: Vec<Arc<Node>> = removed
        .into_iter()
        .map(|block| {
            let mut item = Arc::unwrap_or_clone(block);
            item.kind = NodeKind::ListItem {
                value: 1,
                checked: (kind == ListKind::Check).then_some(false),
            };
            Arc::new(item)
        })
        .collect();
    let list = Node::leaf(NodeKind::List { kind, start }).with_children(items);
    Ok(doc.insert_child(parent, index, list)?)
}

fn each_item(
    doc: &Document,
    selection: &Selection,
    mut f: impl FnMut(&mut Document, NodeKey) -> Result<()>,
) -> Result<Edit> {
    let span = span(doc, selection)?;
    let items = touched_items(doc, &touched_blocks(doc, &span));
    if items.is_empty() {
        return Ok(Edit::unchanged(doc, selection));
    }
    let mut next = doc.clone();
    for item in items {
        f(&mut next, item)?;
    }
    Ok(finish(doc, next, span.anchor, span.focus, span.format))
}

/// Indent every touched list item, in document order.
pub fn indent(doc: &Document, selection: &Selection) -> Result<Edit> {
    each_item(doc, selection, indent_item)
}

/// Outdent every touched list item, in document order.
pub fn outdent(doc: &Document, selection: &Selection) -> Result<Edit> {
    each_item(doc, selection, outdent_item)
}

/// Flip the check state of touched items of check lists.
pub fn toggle_checked(doc: &Document, selection: &Selection) -> Result<Edit> {
    each_item(doc, selection, |next, item| {
        let (_, kind) = list_of(next, item)?;
        if kind != ListKind::Check {
            return Ok(());
        }
        if let Some(NodeKind::ListItem { value, checked }) = next.node(item).map(Node::kind) {
            let kind = NodeKind::ListItem {
                value: *value,
                checked: Some(!checked.unwrap_or(false)),
            };
            next.set_kind(item, kind)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::transforms::test_support::{caret, checked, range};
    use crate::snapshot::format_tree;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn flat() -> Document {
        Document::new(vec![Node::list(
            ListKind::Bullet,
            vec![
                Node::list_item_text("one"),
                Node::list_item_text("two"),
                Node::list_item_text("three"),
            ],
        )])
    }

    #[test]
    fn indent_wraps_then_joins_previous_wrapper() {
        let doc = flat();
        let edit = checked(indent(&doc, &range(&doc, (1, 0), (2, 1))).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          List bullet start=1
            ListItem value=1
              Text "one"
            ListItem value=2
              List bullet start=1
                ListItem value=1
                  Text "two"
                ListItem value=2
                  Text "three"
        "#);
    }

    #[test]
    fn indent_folds_following_wrapper() {
        let doc = Document::new(vec![Node::list(
            ListKind::Number,
            vec![
                Node::list_item_text("a"),
                Node::nested_item(Node::list(ListKind::Number, vec![Node::list_item_text("b")])),
                Node::list_item_text("c"),
                Node::nested_item(Node::list(ListKind::Number, vec![Node::list_item_text("d")])),
            ],
        )]);
        let edit = checked(indent(&doc, &caret(&doc, 2, 0)).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          List number start=1
            ListItem value=1
              Text "a"
            ListItem value=2
              List number start=1
                ListItem value=1
                  Text "b"
                ListItem value=2
                  Text "c"
                ListItem value=3
                  Text "d"
        "#);
    }

    #[test]
    fn outdent_middle_item_splits_wrapper() {
        let doc = Document::new(vec![Node::list(
            ListKind::Bullet,
            vec![
                Node::list_item_text("a"),
                Node::nested_item(Node::list(
                    ListKind::Bullet,
                    vec![
                        Node::list_item_text("b"),
                        Node::list_item_text("c"),
                        Node::list_item_text("d"),
                    ],
                )),
            ],
        )]);
        let edit = checked(outdent(&doc, &caret(&doc, 2, 1)).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          List bullet start=1
            ListItem value=1
              Text "a"
            ListItem value=2
              List bullet start=1
                ListItem value=1
                  Text "b"
            ListItem value=3
              Text "c"
            ListItem value=4
              List bullet start=1
                ListItem value=1
                  Text "d"
        "#);
        let back = checked(indent(&edit.document, &edit.selection).unwrap());
        assert_eq!(back.document, doc);
        assert_eq!(back.selection, edit.selection);
    }

    #[test]
    fn outdent_top_level_item_splits_list() {
        let doc = flat();
        let two = doc.text_blocks()[1].key();
        let edit = checked(outdent(&doc, &caret(&doc, 1, 2)).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          List bullet start=1
            ListItem value=1
              Text "one"
          Paragraph
            Text "two"
          List bullet start=1
            ListItem value=1
              Text "three"
        "#);
        assert_eq!(edit.document.root().children()[1].key(), two);
    }

    #[test]
    fn indent_then_outdent_is_identity() {
        let doc = flat();
        for block in 0..3 {
            let sel = caret(&doc, block, 1);
            let indented = checked(indent(&doc, &sel).unwrap());
            let restored = checked(outdent(&indented.document, &indented.selection).unwrap());
            assert_eq!(restored.document, doc);
            assert_eq!(restored.selection, sel);
        }
    }

    fn four() -> Document {
        Document::new(vec![Node::list(
            ListKind::Bullet,
            ["a", "b", "c", "d"].into_iter().map(Node::list_item_text).collect(),
        )])
    }

    fn mixed_depth() -> Document {
        Document::new(vec![Node::list(
            ListKind::Bullet,
            vec![
                Node::list_item_text("a"),
                Node::nested_item(Node::list(
                    ListKind::Bullet,
                    vec![
                        Node::list_item_text("b"),
                        Node::nested_item(Node::list(ListKind::Bullet, vec![Node::list_item_text("c")])),
                    ],
                )),
                Node::list_item_text("d"),
            ],
        )])
    }

    #[rstest]
    #[case::range_of_siblings(four(), (1, 0), (2, 1))]
    #[case::backward_range(four(), (2, 1), (1, 0))]
    #[case::mixed_depth(mixed_depth(), (1, 0), (3, 1))]
    fn range_indent_then_outdent_is_identity(
        #[case] doc: Document,
        #[case] from: (usize, usize),
        #[case] to: (usize, usize),
    ) {
        let sel = range(&doc, from, to);
        let indented = checked(indent(&doc, &sel).unwrap());
        assert_ne!(indented.document, doc);
        let restored = checked(outdent(&indented.document, &indented.selection).unwrap());
        assert_eq!(restored.document, doc);
        assert_eq!(restored.selection, sel);
    }

    #[test]
    fn empty_item_can_be_indented() {
        let doc = Document::new(vec![Node::list(
            ListKind::Bullet,
            vec![Node::list_item_text("one"), Node::list_item_text("")],
        )]);
        let sel = caret(&doc, 1, 0);
        let edit = checked(indent(&doc, &sel).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          List bullet start=1
            ListItem value=1
              Text "one"
            ListItem value=2
              List bullet start=1
                ListItem value=1
                  Text ""
        "#);
        let back = checked(outdent(&edit.document, &edit.selection).unwrap());
        assert_eq!(back.document, doc);
        assert_eq!(back.selection, sel);
    }

    #[test]
    fn toggle_checked_flips_check_items_only() {
        let doc = Document::new(vec![Node::list(
            ListKind::Check,
            vec![
                Node::check_item(false, vec![Node::text("a")]),
                Node::check_item(true, vec![Node::text("b")]),
            ],
        )]);
        let edit = checked(toggle_checked(&doc, &range(&doc, (0, 0), (1, 1))).unwrap());
        let states: Vec<_> = edit
            .document
            .iter()
            .filter_map(|n| match n.kind() {
                NodeKind::ListItem { checked, .. } => *checked,
                _ => None,
            })
            .collect();
        assert_eq!(states, vec![true, false]);

        let plain = flat();
        let sel = caret(&plain, 0, 0);
        let edit = toggle_checked(&plain, &sel).unwrap();
        assert_eq!(edit.document, plain);
    }
}
