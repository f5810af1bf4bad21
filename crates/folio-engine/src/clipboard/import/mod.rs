//! # Clipboard import
//!
//! ```text
//! raw HTML → strip CF_HTML header → html5ever → HtmlNode tree
//!          → builder (patterns + StyleRules) → blocks → normalize → Fragment
//! ```
//!
//! The builder recognises a fixed set of structural patterns (lists,
//! tables, code containers, transparent wrappers, implicit paragraphs);
//! formatting comes from the [`rules`] table. Import never fails: content
//! it cannot structure is taken as plain text.

pub mod builder;
pub mod code;
pub mod dom;
pub mod lists;
pub mod plain;
pub mod rules;
pub mod tables;

use serde::{Deserialize, Serialize};

use super::{ClipboardData, Fragment};
use crate::model::{Document, Node, invariants};

pub use plain::import_plain_text;
pub use rules::StyleRules;

/// Importer tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Turn a sole paragraph set in one large font into a heading
    pub promote_titles: bool,
    /// Minimum font size in points for heading levels 1, 2, 3, ...
    pub heading_sizes: Vec<f32>,
    /// Font families treated as code
    pub monospace_fonts: Vec<String>,
    /// Font size in points that relative sizes resolve against
    pub base_font_size: f32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            promote_titles: true,
            heading_sizes: vec![20.0, 16.0, 14.0],
            monospace_fonts: [
                "monospace",
                "consolas",
                "courier",
                "courier new",
                "menlo",
                "monaco",
                "sf mono",
                "source code pro",
                "fira code",
                "fira mono",
                "jetbrains mono",
                "dejavu sans mono",
                "liberation mono",
                "roboto mono",
                "ubuntu mono",
                "lucida console",
                "cascadia code",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            base_font_size: 12.0,
        }
    }
}

impl ImportOptions {
    /// Heading level for text set at `points`, if it is large enough.
    pub fn heading_level(&self, points: f32) -> Option<u8> {
        self.heading_sizes
            .iter()
            .position(|min| points >= *min)
            .and_then(|i| u8::try_from(i + 1).ok())
            .map(|level| level.min(6))
    }
}

/// Import pasted HTML.
pub fn import_html(html: &str, options: &ImportOptions) -> Fragment {
    let html = dom::strip_cf_html(html);
    if html.trim().is_empty() {
        return Fragment::default();
    }
    let body = dom::parse_body(html);
    let text = || {
        body.iter()
            .map(|node| match node {
                dom::HtmlNode::Text(t) => t.clone(),
                dom::HtmlNode::Element(el) => el.text(),
            })
            .collect::<String>()
    };

    let blocks = builder::build(&body, options);
    if blocks.is_empty() {
        let text = text();
        if text.trim().is_empty() {
            return Fragment::default();
        }
        log::warn!("no structure recognised in pasted HTML; importing its text");
        return import_plain_text(text.trim());
    }

    let fragment = Fragment::normalized(blocks);
    let doc = Document::from_root(Node::root(fragment.blocks.clone()));
    if let Err(err) = invariants::check(&doc) {
        log::warn!("pasted HTML produced an invalid tree ({err}); importing its text");
        return import_plain_text(text().trim());
    }
    log::debug!("imported {} blocks from HTML", fragment.blocks.len());
    fragment
}

/// Import the richest payload on the clipboard: the same-editor fragment,
/// then HTML, then plain text.
pub fn import_clipboard(data: &ClipboardData, options: &ImportOptions) -> Fragment {
    if let Some(json) = data.fragment() {
        match Fragment::from_json(json) {
            Ok(fragment) => return fragment,
            Err(err) => log::warn!("ignoring folio fragment payload: {err}"),
        }
    }
    if let Some(html) = data.html() {
        let fragment = import_html(html, options);
        if !fragment.is_empty() {
            return fragment;
        }
    }
    data.text().map(import_plain_text).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::{FRAGMENT_MIME, HTML_MIME, PLAIN_MIME};
    use crate::snapshot::format_nodes;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn import(html: &str) -> String {
        format_nodes(&import_html(html, &ImportOptions::default()).blocks)
    }

    #[rstest]
    #[case(26.0, Some(1))]
    #[case(20.0, Some(1))]
    #[case(18.0, Some(2))]
    #[case(14.0, Some(3))]
    #[case(11.0, None)]
    fn heading_levels(#[case] points: f32, #[case] level: Option<u8>) {
        assert_eq!(ImportOptions::default().heading_level(points), level);
    }

    #[test]
    fn pre_becomes_one_code_block() {
        let html = "<p>before</p><pre data-language=\"js\">alert(1);<br>done();</pre>";
        assert_snapshot!(import(html), @r#"
        Paragraph
          Text "before"
        CodeBlock language=js
          Text "alert(1);\ndone();"
        "#);
    }

    #[test]
    fn ide_container_becomes_code() {
        let html = r#"<meta charset='utf-8'><div style="color: #d4d4d4;background-color: #1e1e1e;font-family: Consolas, 'Courier New', monospace;font-size: 14px;white-space: pre;"><div><span style="color: #569cd6;">let</span><span> x = </span><span style="color: #b5cea8;">1</span>;</div><div><span>x</span></div></div>"#;
        assert_snapshot!(import(html), @r#"
        CodeBlock
          Text "let x = 1;\nx"
        "#);
    }

    #[test]
    fn cf_html_payload() {
        let raw = "Version:0.9\r\nStartHTML:0000000097\r\nEndHTML:0000000170\r\nStartFragment:0000000133\r\nEndFragment:0000000134\r\n<html><body><!--StartFragment--><p><u>u</u></p><!--EndFragment--></body></html>";
        assert_snapshot!(import(raw), @r#"
        Paragraph
          Text "u" [underline]
        "#);
    }

    #[test]
    fn unstructured_html_falls_back_to_text() {
        assert_snapshot!(import("<select><option>only text</option></select>"), @r#"
        Paragraph
          Text "only text"
        "#);
        assert!(import_html("  ", &ImportOptions::default()).is_empty());
    }

    #[test]
    fn clipboard_prefers_fragment_then_html_then_text() {
        let options = ImportOptions::default();
        let fragment = Fragment::normalized(vec![Node::heading(1, vec![Node::text("own")])]);
        let data = ClipboardData::new()
            .with(HTML_MIME, "<p>html</p>")
            .with(PLAIN_MIME, "plain")
            .with(FRAGMENT_MIME, fragment.to_json().unwrap());
        assert_eq!(import_clipboard(&data, &options), fragment);

        let data = data.with(FRAGMENT_MIME, "{broken");
        assert_eq!(import_clipboard(&data, &options).plain_text(), "html");

        let data = ClipboardData::new().with(PLAIN_MIME, "a\nb");
        assert_eq!(import_clipboard(&data, &options).blocks.len(), 2);
    }
}
