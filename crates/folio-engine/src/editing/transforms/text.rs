//! Typing: text insertion, soft line breaks and formatting marks.

use std::sync::Arc;

use super::{
    Edit, Result, Span, block_len, blocks, delete, finish, finish_caret, finish_with, inline,
    inline_children, replace_inline, shortcuts, span, touched_blocks,
};
use crate::editing::options::CodeOptions;
use crate::model::{Document, Node, NodeKey, TextFormat, TextRun, text};
use crate::selection::point::BlockOffset;
use crate::selection::{RangeSelection, Selection};

/// Insert `text` as one run at `at` and return the caret after it. Code
/// blocks take the text verbatim; elsewhere the run uses `format` and the
/// style of the run it lands next to.
pub(crate) fn insert_run(
    doc: &mut Document,
    at: BlockOffset,
    text: &str,
    format: TextFormat,
) -> Result<BlockOffset> {
    if text.is_empty() {
        return Ok(at);
    }
    let children = inline_children(doc, at.block);
    let is_code = doc.node(at.block).is_some_and(Node::is_code_block);
    let run = if is_code {
        TextRun::plain(text)
    } else {
        let style = inline::run_at(&children, at.offset)
            .map(|run| run.style)
            .unwrap_or_default();
        TextRun {
            text: text.to_string(),
            format,
            style,
        }
    };
    let updated = inline::insert(&children, at.offset, vec![Arc::new(Node::run(run))]);
    replace_inline(doc, at.block, updated)?;
    Ok(BlockOffset::new(at.block, at.offset + text::char_len(text)))
}

/// Insert typed or dropped text at the selection.
///
/// A non-collapsed selection is replaced. Newlines split the block outside
/// code blocks. A single typed space may trigger a block shortcut.
pub fn insert_text(
    doc: &Document,
    selection: &Selection,
    input: &str,
    options: &CodeOptions,
) -> Result<Edit> {
    let span = span(doc, selection)?;
    let mut next = doc.clone();
    let mut at = if span.cells.is_some() {
        span.start
    } else {
        delete::delete_span(&mut next, &span)?
    };
    let format = span.format;

    if next.node(at.block).is_some_and(Node::is_code_block) {
        at = insert_run(&mut next, at, input, format)?;
        return Ok(finish_caret(doc, next, at, format));
    }

    for (i, line) in input.split('\n').enumerate() {
        if i > 0 {
            at = blocks::break_block(&mut next, at)?;
        }
        at = insert_run(&mut next, at, line, format)?;
    }

    if input == " "
        && let Some(caret) = shortcuts::after_space(&mut next, at.block, at.offset, options)?
    {
        at = caret;
    }
    Ok(finish_caret(doc, next, at, format))
}

/// Shift+Enter: a line break inline, `\n` in code.
pub fn insert_line_break(doc: &Document, selection: &Selection) -> Result<Edit> {
    let span = span(doc, selection)?;
    let mut next = doc.clone();
    let at = delete::delete_span(&mut next, &span)?;
    if next.node(at.block).is_some_and(Node::is_code_block) {
        let at = insert_run(&mut next, at, "\n", span.format)?;
        return Ok(finish_caret(doc, next, at, span.format));
    }
    let children = inline_children(&next, at.block);
    let updated = inline::insert(&children, at.offset, vec![Arc::new(Node::line_break())]);
    replace_inline(&mut next, at.block, updated)?;
    let caret = BlockOffset::new(at.block, at.offset + 1);
    Ok(finish_caret(doc, next, caret, span.format))
}

fn block_range(span: &Span,block: NodeKey, len: usize) -> (usize, usize) {
    if span.cells.is_some() {
        return (0, len);
    }
    let from = if block == span.start.block { span.start.offset } else { 0 };
    let to = if block == span.end.block { span.end.offset } else { len };
    (from, to)
}

/// Toggle formatting marks.
///
/// A caret toggles the pending format used for the next typed text. A
/// range sets the marks on every selected run when any of them lacks them,
/// and clears them otherwise. Code blocks are left alone.
pub fn toggle_format(doc: &Document, selection: &Selection, flags: TextFormat) -> Result<Edit> {
    let span = span(doc, selection)?;
    let toggle_pending = |format: TextFormat| {
        if format.contains(flags) {
            format.without(flags)
        } else {
            format.with(flags)
        }
    };

    if span.is_collapsed() {
        let selection = match selection {
            Selection::Range(range) => {
                Selection::Range(RangeSelection {
                    format: toggle_pending(range.format),
                    ..*range
                })
            }
            grid => *grid,
        };
        return Ok(Edit {
            document: doc.clone(),
            selection,
        });
    }

    let blocks: Vec<(NodeKey, usize, usize)> = touched_blocks(doc, &span)
        .into_iter()
        .filter(|b| !doc.node(*b).is_some_and(Node::is_code_block))
        .map(|b| {
            let (from, to) = block_range(&span, b, block_len(doc, b));
            (b, from, to)
        })
        .collect();
    let runs: Vec<TextRun> = blocks
        .iter()
        .flat_map(|(b, from, to)| inline::runs_in(doc.children(*b), *from, *to))
        .collect();
    if runs.is_empty() {
        let format = toggle_pending(span.format);
        return Ok(finish(doc, doc.clone(), span.anchor, span.focus, format));
    }

    let set = runs.iter().any(|run| !run.format.contains(flags));
    let mut next = doc.clone();
    for (block, from, to) in blocks {
        let children = inline_children(&next, block);
        let updated = inline::map_runs(&children, from, to, &mut |run: &mut TextRun| {
            if !run.text.is_empty() {
                run.format = if set {
                    run.format.with(flags)
                } else {
                    run.format.without(flags)
                };
            }
        });
        replace_inline(&mut next, block, updated)?;
    }
    let format = if set {
        span.format.with(flags)
    } else {
        span.format.without(flags)
    };
    if let Selection::Grid(_) = selection {
        return Ok(finish_with(doc, next, *selection));
    }
    Ok(finish(doc, next, span.anchor, span.focus, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::transforms::test_support::{caret, checked, focus_of, range};
    use crate::model::{ListKind, NodeKind};
    use crate::snapshot::format_tree;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn options() -> CodeOptions {
        CodeOptions::default()
    }

    #[test]
    fn typing_uses_pending_format_and_merges_runs() {
        let doc = Document::new(vec![Node::paragraph_text("ab")]);
        let sel = toggle_format(&doc, &caret(&doc, 0, 1), TextFormat::BOLD)
            .unwrap()
            .selection;
        assert_eq!(sel.format(), TextFormat::BOLD);
        let edit = checked(insert_text(&doc, &sel, "X", &options()).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          Paragraph
            Text "a"
            Text "X" [bold]
            Text "b"
        "#);
        let edit = checked(insert_text(&edit.document, &edit.selection, "Y", &options()).unwrap());
        assert_eq!(edit.document.root().children()[0].children()[1].text_str(), Some("XY"));
        assert_eq!(focus_of(&edit), (0, 3));
    }

    #[test]
    fn typing_replaces_selection() {
        let doc = Document::new(vec![Node::paragraph_text("hello"), Node::paragraph_text("world")]);
        let edit = checked(insert_text(&doc, &range(&doc, (0, 2), (1, 3)), "-", &options()).unwrap());
        assert_eq!(edit.document.text_content(), "he-ld");
    }

    #[test]
    fn newlines_split_blocks_outside_code() {
        let doc = Document::new(vec![Node::paragraph_text("ab")]);
        let edit = checked(insert_text(&doc, &caret(&doc, 0, 1), "1\n2", &options()).unwrap());
        assert_eq!(edit.document.text_content(), "a1\n2b");
        assert_eq!(edit.document.root().children().len(), 2);
        assert_eq!(focus_of(&edit), (1, 1));

        let code = Document::new(vec![Node::code_block(None, "ab")]);
        let edit = checked(insert_text(&code, &caret(&code, 0, 1), "1\n2", &options()).unwrap());
        assert_eq!(edit.document.root().children().len(), 1);
        assert_eq!(edit.document.text_content(), "a1\n2b");
    }

    #[test]
    fn heading_shortcut_fires_on_space() {
        let doc = Document::new(vec![Node::paragraph_text("##Title")]);
        let edit = checked(insert_text(&doc, &caret(&doc, 0, 2), " ", &options()).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          Heading level=2
            Text "Title"
        "#);
        assert_eq!(focus_of(&edit), (0, 0));
    }

    #[test]
    fn list_shortcut_joins_previous_list() {
        let doc = Document::new(vec![
            Node::list(ListKind::Number, vec![Node::list_item_text("one")]),
            Node::paragraph_text("2."),
        ]);
        let edit = checked(insert_text(&doc, &caret(&doc, 1, 2), " ", &options()).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          List number start=1
            ListItem value=1
              Text "one"
            ListItem value=2
              Text ""
        "#);
    }

    #[test]
    fn line_break_inline_and_in_code() {
        let doc = Document::new(vec![Node::paragraph_text("ab")]);
        let edit = checked(insert_line_break(&doc, &caret(&doc, 0, 1)).unwrap());
        assert_eq!(edit.document.root().children()[0].children()[1].kind(), &NodeKind::LineBreak);
        assert_eq!(focus_of(&edit), (0, 2));
    }

    #[test]
    fn toggle_format_sets_then_clears() {
        let doc = Document::new(vec![Node::paragraph(vec![
            Node::text("plain "),
            Node::formatted("bold", TextFormat::BOLD),
        ])]);
        let sel = range(&doc, (0, 3), (0, 10));
        let edit = checked(toggle_format(&doc, &sel, TextFormat::BOLD).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          Paragraph
            Text "pla"
            Text "in bold" [bold]
        "#);
        let edit = checked(toggle_format(&edit.document, &edit.selection, TextFormat::BOLD).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          Paragraph
            Text "plain bold"
        "#);
    }

    #[test]
    fn toggle_format_swaps_sub_and_superscript() {
        let doc = Document::new(vec![Node::paragraph(vec![Node::formatted(
            "x",
            TextFormat::SUBSCRIPT,
        )])]);
        let edit = checked(
            toggle_format(&doc, &range(&doc, (0, 0), (0, 1)), TextFormat::SUPERSCRIPT).unwrap(),
        );
        let run = edit.document.text_leaves()[0].text_run().unwrap().clone();
        assert_eq!(run.format, TextFormat::SUPERSCRIPT);
    }
}
