//! Markdown-style typing shortcuts.
//!
//! Block prefixes fire when a space is typed right after them at the start
//! of a paragraph (`# `, `- `, `1. `, `[ ] `, `--- `, ```` ```lang ````).
//! A paragraph that starts with a code fence turns into a code block on
//! Enter.

use std::sync::OnceLock;

use regex::Regex;

use super::{Result, code, inline, lists, replace_inline};
use crate::editing::options::CodeOptions;
use crate::model::{Document, ListKind, ModelError, Node, NodeKey, NodeKind, text};
use crate::selection::point::{BlockOffset, inline_string};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shortcut {
    Heading(u8),
    List {
        kind: ListKind,
        start: u32,
        checked: bool,
    },
    HorizontalRule,
    Code(Option<String>),
}

/// Match the text before the caret, trailing space included.
pub fn match_prefix(prefix: &str) -> Option<Shortcut> {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let re = PREFIX.get_or_init(|| {
        Regex::new(
            r"^(?:(?P<heading>#{1,6})|(?P<bullet>[-*+])|(?P<number>\d{1,9})\.|\[(?P<check>[ xX]?)\]|(?P<rule>---|\*\*\*|___)|```(?P<fence>[A-Za-z][\w+#-]*)?) $",
        )
        .expect("Invalid shortcut regex")
    });
    let caps = re.captures(prefix)?;
    if let Some(m) = caps.name("heading") {
        return Some(Shortcut::Heading(m.as_str().len() as u8));
    }
    if caps.name("bullet").is_some() {
        return Some(Shortcut::List {
            kind: ListKind::Bullet,
            start: 1,
            checked: false,
        });
    }
    if let Some(m) = caps.name("number") {
        return Some(Shortcut::List {
            kind: ListKind::Number,
            start: m.as_str().parse().unwrap_or(1),
            checked: false,
        });
    }
    if let Some(m) = caps.name("check") {
        return Some(Shortcut::List {
            kind: ListKind::Check,
            start: 1,
            checked: m.as_str().eq_ignore_ascii_case("x"),
        });
    }
    if caps.name("rule").is_some() {
        return Some(Shortcut::HorizontalRule);
    }
    Some(Shortcut::Code(caps.name("fence").map(|m| m.as_str().to_string())))
}

/// Split a code-fence line into its language and the code that follows.
pub fn code_fence(line: &str) -> Option<(Option<String>, String)> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let re = FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```([A-Za-z][\w+#-]*)?\s?(.*)$").expect("Invalid code fence regex")
    });
    let caps = re.captures(line)?;
    let language = caps.get(1).map(|m| m.as_str().to_string());
    let rest = caps.get(2).map_or("", |m| m.as_str()).to_string();
    Some((language, rest))
}

/// Apply a block shortcut after a typed space at `offset`. Returns the new
/// caret when one fired.
pub(crate) fn after_space(
    doc: &mut Document,
    block: NodeKey,
    offset: usize,
    options: &CodeOptions,
) -> Result<Option<BlockOffset>> {
    let Some(node) = doc.node(block) else {
        return Ok(None);
    };
    if *node.kind() != NodeKind::Paragraph {
        return Ok(None);
    }
    let prefix: String = inline_string(node).chars().take(offset).collect();
    let Some(shortcut) = match_prefix(&prefix) else {
        return Ok(None);
    };
    log::trace!("shortcut {shortcut:?} in {block}");

    let rest = inline::delete(node.children(), 0, offset);
    replace_inline(doc, block, rest)?;
    match shortcut {
        Shortcut::Heading(level) => doc.set_kind(block, NodeKind::Heading { level })?,
        Shortcut::List {
            kind,
            start,
            checked,
        } => {
            lists::wrap_in_list(doc, &[block], kind, start)?;
            if checked {
                doc.set_kind(
                    block,
                    NodeKind::ListItem {
                        value: 1,
                        checked: Some(true),
                    },
                )?;
            }
        }
        Shortcut::HorizontalRule => {
            let parent = doc.parent_key(block).ok_or(ModelError::NotFound(block))?;
            let index = doc.index_in_parent(block).ok_or(ModelError::NotFound(block))?;
            doc.insert_child(parent, index, Node::horizontal_rule())?;
        }
        Shortcut::Code(language) => {
            let text = doc.node(block).map(Node::inline_text).unwrap_or_default();
            code::paragraph_to_code(doc, block, &text, language, options)?;
        }
    }
    Ok(Some(BlockOffset::new(block, 0)))
}

/// Turn a paragraph that starts with a code fence into a code block.
/// Returns the caret at the end of the code when it fired.
pub(crate) fn fence_on_enter(
    doc: &mut Document,
    block: NodeKey,
    options: &CodeOptions,
) -> Result<Option<BlockOffset>> {
    let Some(node) = doc.node(block) else {
        return Ok(None);
    };
    if *node.kind() != NodeKind::Paragraph {
        return Ok(None);
    }
    let Some((language, rest)) = code_fence(&node.inline_text()) else {
        return Ok(None);
    };
    log::trace!("code fence in {block}, language {language:?}");
    code::paragraph_to_code(doc, block, &rest, language, options)?;
    Ok(Some(BlockOffset::new(block, text::char_len(&rest))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("# ", Some(Shortcut::Heading(1)))]
    #[case("### ", Some(Shortcut::Heading(3)))]
    #[case("####### ", None)]
    #[case("- ", Some(Shortcut::List { kind: ListKind::Bullet, start: 1, checked: false }))]
    #[case("* ", Some(Shortcut::List { kind: ListKind::Bullet, start: 1, checked: false }))]
    #[case("7. ", Some(Shortcut::List { kind: ListKind::Number, start: 7, checked: false }))]
    #[case("[ ] ", Some(Shortcut::List { kind: ListKind::Check, start: 1, checked: false }))]
    #[case("[x] ", Some(Shortcut::List { kind: ListKind::Check, start: 1, checked: true }))]
    #[case("--- ", Some(Shortcut::HorizontalRule))]
    #[case("```rust ", Some(Shortcut::Code(Some("rust".to_string()))))]
    #[case("``` ", Some(Shortcut::Code(None)))]
    #[case("a # ", None)]
    #[case("#", None)]
    fn prefixes(#[case] prefix: &str, #[case] expected: Option<Shortcut>) {
        assert_eq!(match_prefix(prefix), expected);
    }

    #[rstest]
    #[case("``` alert(1);", Some((None, "alert(1);")))]
    #[case("```js", Some((Some("js"), "")))]
    #[case("```python print(1)", Some((Some("python"), "print(1)")))]
    #[case("`` nope", None)]
    fn fences(#[case] line: &str, #[case] expected: Option<(Option<&str>, &str)>) {
        let expected = expected.map(|(l, r)| (l.map(str::to_string), r.to_string()));
        assert_eq!(code_fence(line), expected);
    }
}
