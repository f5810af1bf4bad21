//! Code blocks: toggling, line moves and language detection.

use std::sync::OnceLock;

use regex::Regex;

use super::{Edit, EditError, Result, finish, inline, lists, span, touched_blocks};
use crate::editing::options::CodeOptions;
use crate::model::{Document, ModelError, Node, NodeKey, NodeKind, text};
use crate::selection::Selection;
use crate::selection::navigation::Direction;
use crate::selection::point::BlockOffset;

/// One line of an unfolded code block: the paragraph that now holds it and
/// the char offset the line started at inside the code text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UnfoldedLine {
    pub block: NodeKey,
    pub start: usize,
}

/// Replace a code block with one paragraph per line. The first paragraph
/// takes over the code block's key.
pub(crate) fn unfold(doc: &mut Document, code: NodeKey) -> Result<Vec<UnfoldedLine>> {
    let node = doc.node(code).ok_or(ModelError::NotFound(code))?;
    let source = node.inline_text();
    let parent = doc.parent_key(code).ok_or(ModelError::NotFound(code))?;
    let index = doc.index_in_parent(code).ok_or(ModelError::NotFound(code))?;
    doc.remove(code)?;

    let mut lines = Vec::new();
    let mut start = 0;
    for (i, line) in source.split('\n').enumerate() {
        let paragraph = Node::paragraph_text(line);
        let paragraph = if i == 0 { paragraph.keyed(code) } else { paragraph };
        let block = doc.insert_child(parent, index + i, paragraph)?;
        lines.push(UnfoldedLine { block, start });
        start += text::char_len(line) + 1;
    }
    Ok(lines)
}

/// Where an offset into the old code text ended up.
pub(crate) fn unfolded_offset(lines: &[UnfoldedLine], offset: usize) -> BlockOffset {
    let line = lines
        .iter()
        .rev()
        .find(|l| l.start <= offset)
        .or(lines.first())
        .copied()
        .unwrap_or(UnfoldedLine {
            block: NodeKey::UNSET,
            start: 0,
        });
    BlockOffset::new(line.block, offset.saturating_sub(line.start))
}

/// Guess a language from code text. Rules are tried in order; the first
/// match wins.
pub fn detect_language(code: &str) -> Option<&'static str> {
    static RULES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    let rules = RULES.get_or_init(|| {
        [
            ("html", r"(?i)^\s*(<!doctype html|<html|<div|<span|<p>|<body)"),
            ("json", r#"^\s*[\{\[]\s*("[^"]*"\s*:|\]|\})"#),
            ("python", r"(?m)^\s*(def \w+\(.*\):|import \w+|from \w+ import|class \w+.*:)"),
            ("rust", r"(?m)\b(fn \w+\(|let mut |impl\b|pub fn|use \w+::)"),
            ("go", r"(?m)^\s*(package \w+|func \w+\(|import \()"),
            ("java", r"(?m)\b(public (static )?(class|void)|System\.out\.print)"),
            ("cpp", r"(?m)(#include\s*<|std::|int main\s*\()"),
            ("sql", r"(?i)\b(select .+ from|insert into|create table|update \w+ set)\b"),
            ("bash", r"(?m)^(#!/bin/(ba)?sh|\s*(echo|export|sudo|cd) )"),
            ("css", r"(?m)^\s*[.#]?[\w-]+\s*\{[^}]*:[^}]*\}?"),
            (
                "javascript",
                r"(?m)\b(function\s*\w*\(|const \w+ =|console\.log|alert\(|=>|document\.)",
            ),
        ]
        .into_iter()
        .map(|(name, pattern)| (name, Regex::new(pattern).expect("Invalid language regex")))
        .collect()
    });
    rules
        .iter()
        .find(|(_, re)| re.is_match(code))
        .map(|(name, _)| *name)
}

pub(crate) fn pick_language(text: &str, language: Option<String>, options: &CodeOptions) -> Option<String> {
    language
        .or_else(|| {
            options
                .detect_language
                .then(|| detect_language(text).map(str::to_string))
                .flatten()
        })
        .or_else(|| options.default_language.clone())
}

/// Replace a paragraph with a code block holding `code`, under the
/// paragraph's key.
pub(crate) fn paragraph_to_code(
    doc: &mut Document,
    block: NodeKey,
    code: &str,
    language: Option<String>,
    options: &CodeOptions,
) -> Result<()> {
    let language = pick_language(code, language, options);
    let node = Node::new(NodeKind::CodeBlock { language }, vec![Node::text(code)]).keyed(block);
    doc.replace_node(block, node)?;
    Ok(())
}

/// Toggle touched blocks into code, or code blocks back into paragraphs.
///
/// Joining uses each block's plain text (line breaks become `\n`) and
/// turns list items into paragraphs first. Consecutive touched blocks under
/// one parent join into one code block, so a range reaching into a table
/// gives each cell its own. A code block keeps the first joined block's key
/// and the selection offsets are carried through the join or split.
pub fn toggle_code_block(
    doc: &Document,
    selection: &Selection,
    language: Option<String>,
    options: &CodeOptions,
) -> Result<Edit> {
    let span = span(doc, selection)?;
    let blocks = touched_blocks(doc, &span);
    let mut next = doc.clone();

    if blocks
        .iter()
        .all(|b| doc.node(*b).is_some_and(Node::is_code_block))
    {
        let mut mapped = Vec::new();
        for block in &blocks {
            let lines = unfold(&mut next, *block)?;
            mapped.push((*block, lines));
        }
        let remap = |at: BlockOffset| {
            mapped
                .iter()
                .find(|(code, _)| *code == at.block)
                .map_or(at, |(_, lines)| unfolded_offset(lines, at.offset))
        };
        return Ok(finish(
            doc,
            next,
            remap(span.anchor),
            remap(span.focus),
            span.format,
        ));
    }

    for block in &blocks {
        lists::item_to_paragraph(&mut next, *block)?;
    }
    let mut groups: Vec<Vec<NodeKey>> = Vec::new();
    for block in blocks {
        let parent = next.parent_key(block);
        match groups.last_mut() {
            Some(group) if next.parent_key(group[0]) == parent => group.push(block),
            _ => groups.push(vec![block]),
        }
    }

    let mut anchor = None;
    let mut focus = None;
    for group in groups {
        let first = group[0];
        let mut joined = String::new();
        for (i, block) in group.iter().enumerate() {
            if i > 0 {
                joined.push('\n');
            }
            let start = text::char_len(&joined);
            let Some(node) = next.node(*block) else {
                continue;
            };
            for (at, mapped) in [(span.anchor, &mut anchor), (span.focus, &mut focus)] {
                if at.block == *block {
                    *mapped = Some(BlockOffset::new(first, start + prefix_len(node, at.offset)));
                }
            }
            joined.push_str(&node.inline_text());
        }
        for block in &group[1..] {
            next.remove(*block)?;
        }
        paragraph_to_code(&mut next, first, &joined, language.clone(), options)?;
    }

    Ok(finish(
        doc,
        next,
        anchor.unwrap_or(span.anchor),
        focus.unwrap_or(span.focus),
        span.format,
    ))
}

/// Chars of inline content before `offset`, counted as plain text.
fn prefix_len(block: &Node, offset: usize) -> usize {
    let prefix: String = inline::slice(block.children(), 0, offset)
        .iter()
        .map(|n| n.inline_text())
        .collect();
    text::char_len(&prefix)
}

/// Swap the selected lines of a code block with the line above or below.
/// At the first or last line nothing changes.
pub fn move_line(doc: &Document, selection: &Selection, direction: Direction) -> Result<Edit> {
    let span = span(doc, selection)?;
    if span.start.block != span.end.block
        || !doc.node(span.start.block).is_some_and(Node::is_code_block)
    {
        return Ok(Edit::unchanged(doc, selection));
    }
    let block = span.start.block;
    let code = doc.node(block).ok_or(EditError::Unresolvable)?;
    let source = code.inline_text();
    let run = code.first_child().map(Node::key).ok_or(EditError::Unresolvable)?;

    let lines: Vec<&str> = source.split('\n').collect();
    let line_of = |offset: usize| {
        let mut start = 0;
        for (i, line) in lines.iter().enumerate() {
            let end = start + text::char_len(line);
            if offset <= end {
                return i;
            }
            start = end + 1;
        }
        lines.len() - 1
    };
    let first = line_of(span.start.offset);
    let last = line_of(span.end.offset);

    let (reordered, shift): (Vec<&str>, isize) = match direction {
        Direction::Backward if first > 0 => {
            let mut out = lines.clone();
            let above = out.remove(first - 1);
            out.insert(last, above);
            (out, -(text::char_len(above) as isize + 1))
        }
        Direction::Forward if last + 1 < lines.len() => {
            let mut out = lines.clone();
            let below = out.remove(last + 1);
            out.insert(first, below);
            (out, text::char_len(below) as isize + 1)
        }
        _ => return Ok(Edit::unchanged(doc, selection)),
    };
    let moved = reordered.join("\n");

    let mut next = doc.clone();
    next.set_text(run, moved)?;
    let shifted = |at: BlockOffset| BlockOffset::new(block, at.offset.saturating_add_signed(shift));
    Ok(finish(
        doc,
        next,
        shifted(span.anchor),
        shifted(span.focus),
        span.format,
    ))
}
