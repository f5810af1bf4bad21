//! Code blocks: `<pre>` and pre-formatted monospace containers.
//!
//! IDEs paste a `<div style="white-space: pre; font-family: ...">` holding
//! one `<div>` per line; `<pre>` may hold `<br>`s, nested blocks or raw
//! newlines. All of them become a single code block with the text intact.

use super::builder::{Role, role};
use super::dom::{Element, HtmlNode};
use super::rules::Inherited;
use crate::model::Node;

const LANGUAGE_ATTRS: &[&str] = &["data-language", "data-highlight-language", "data-lang", "lang"];
const LANGUAGE_CLASS_PREFIXES: &[&str] = &["language-", "lang-", "highlight-source-"];

pub(super) fn is_code_container(el: &Element, ctx: &Inherited) -> bool {
    el.tag == "pre" || (ctx.pre && ctx.monospace)
}

pub(super) fn build_code(el: &Element) -> Node {
    let language = language(el);
    log::trace!("code block, language {language:?}");
    Node::code_block(language.as_deref(), &code_text(el))
}

/// Language named on the container or on the first element inside it that
/// names one.
pub(super) fn language(el: &Element) -> Option<String> {
    std::iter::once(el)
        .chain(el.descendants())
        .find_map(language_of)
}

fn language_of(el: &Element) -> Option<String> {
    let from_attr = LANGUAGE_ATTRS
        .iter()
        .filter_map(|name| el.attr(name))
        .map(str::trim)
        .find(|v| !v.is_empty());
    let from_class = || {
        el.classes().find_map(|class| {
            LANGUAGE_CLASS_PREFIXES
                .iter()
                .find_map(|prefix| class.strip_prefix(prefix))
                .filter(|l| !l.is_empty())
        })
    };
    from_attr
        .or_else(from_class)
        .map(|l| l.to_ascii_lowercase())
}

/// Text of a code container: raw text kept verbatim, `<br>` and block
/// children on their own lines.
pub(super) fn code_text(el: &Element) -> String {
    let mut out = String::new();
    collect(&el.children, &mut out);
    let trimmed = out.trim_end_matches('\n').len();
    out.truncate(trimmed);
    out
}

fn collect(nodes: &[HtmlNode], out: &mut String) {
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.push_str(&text.replace("\r\n", "\n").replace('\u{a0}', " ")),
            HtmlNode::Element(el) => match role(el) {
                Role::Break => out.push('\n'),
                Role::Ignore => {}
                Role::Inline => collect(&el.children, out),
                _ => {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                    collect(&el.children, out);
                    if !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::import::dom::parse_body;
    use pretty_assertions::assert_eq;

    fn first(html: &str) -> Element {
        parse_body(html)
            .into_iter()
            .find_map(|n| n.as_element().cloned())
            .unwrap()
    }

    #[test]
    fn pre_keeps_text_and_reads_language() {
        let el = first("<pre class=\"highlight\"><code class=\"language-Rust\">fn main() {\n    run();\n}\n</code></pre>");
        assert_eq!(code_text(&el), "fn main() {\n    run();\n}");
        assert_eq!(language(&el).as_deref(), Some("rust"));
    }

    #[test]
    fn line_divs_and_breaks_become_newlines() {
        let el = first(
            "<div style=\"white-space: pre\"><div><span>let a = 1;</span></div><div><br></div><div><span>a</span></div></div>",
        );
        assert_eq!(code_text(&el), "let a = 1;\n\na");
        assert_eq!(language(&el), None);
    }
}
