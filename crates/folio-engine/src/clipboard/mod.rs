/*!
 * # Clipboard Pipeline
 *
 * Conversion between documents and the MIME payloads of a system
 * clipboard.
 *
 * ## Architecture Overview
 *
 * ```text
 *  copy:  Document + Selection → export → ClipboardData {html, plain, fragment}
 *  paste: ClipboardData → import → Fragment → insert_fragment transform
 * ```
 *
 * ### 1. ClipboardData
 * - An ordered list of `(mime, payload)` pairs, the shape every platform
 *   clipboard API hands over
 *
 * ### 2. Fragment
 * - Detached, normalized top-level blocks ready to be pasted; keys are
 *   assigned by the receiving document
 * - Serialized as JSON under [`FRAGMENT_MIME`] so pastes between folio
 *   editors are lossless
 *
 * ### 3. Import ([`import`])
 * - HTML parsed with html5ever, then reduced to the document model by a
 *   set of structural patterns and a data table of style rules
 * - Never fails: anything it cannot make sense of degrades to plain text
 *
 * ### 4. Export ([`export`])
 * - Range selections are clipped character-accurately, grid selections
 *   become a standalone table
 */

pub mod export;
pub mod import;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editing::transforms::normalize::normalize;
use crate::model::{Document, Node, NodeKind};

pub const HTML_MIME: &str = "text/html";
pub const PLAIN_MIME: &str = "text/plain";
/// Same-editor payload: JSON of [`FragmentPayload`]
pub const FRAGMENT_MIME: &str = "application/x-folio-fragment";

/// Clipboard contents as MIME type / payload pairs, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipboardData {
    entries: Vec<(String, String)>,
}

impl ClipboardData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ClipboardData::set`].
    pub fn with(mut self, mime: &str, data: impl Into<String>) -> Self {
        self.set(mime, data);
        self
    }

    /// Store `data` under `mime`, replacing an earlier payload in place.
    pub fn set(&mut self, mime: &str, data: impl Into<String>) {
        let data = data.into();
        match self.entries.iter_mut().find(|(m, _)| m.eq_ignore_ascii_case(mime)) {
            Some(entry) => entry.1 = data,
            None => self.entries.push((mime.to_string(), data)),
        }
    }

    pub fn get(&self, mime: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(m, _)| m.eq_ignore_ascii_case(mime))
            .map(|(_, data)| data.as_str())
    }

    pub fn text(&self) -> Option<&str> {
        self.get(PLAIN_MIME)
    }

    pub fn html(&self) -> Option<&str> {
        self.get(HTML_MIME)
    }

    pub fn fragment(&self) -> Option<&str> {
        self.get(FRAGMENT_MIME)
    }

    pub fn mimes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(m, _)| m.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Detached top-level blocks, the unit of paste.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub blocks: Vec<Node>,
}

/// Wire form of a fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentPayload {
    pub version: u32,
    pub nodes: Vec<Node>,
}

impl FragmentPayload {
    pub const VERSION: u32 = 1;
}

impl Fragment {
    /// Wrap blocks as they are.
    pub fn new(blocks: Vec<Node>) -> Self {
        Self { blocks }
    }

    /// Blocks put through the same normalization pass as a document:
    /// adjacent same-kind lists merged, runs merged, lists numbered.
    pub fn normalized(blocks: Vec<Node>) -> Self {
        if blocks.is_empty() {
            return Self::default();
        }
        let mut doc = Document::from_root(Node::root(blocks));
        normalize(&mut doc);
        Self::from_document(&doc)
    }

    /// Every top-level block of `doc`, detached.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            blocks: doc.root().children().iter().map(|b| b.detached()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The table, when the fragment is exactly one table.
    pub fn single_table(&self) -> Option<&Node> {
        match self.blocks.as_slice() {
            [table] if *table.kind() == NodeKind::Table => Some(table),
            _ => None,
        }
    }

    /// Blocks joined by `\n`, cells by `\t`.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Node::text_content)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&FragmentPayload {
            version: FragmentPayload::VERSION,
            nodes: self.blocks.clone(),
        })
    }

    /// Parse a same-editor payload. The nodes are checked against the
    /// document rules before they are accepted.
    pub fn from_json(json: &str) -> Result<Self, FragmentError> {
        let payload: FragmentPayload = serde_json::from_str(json)?;
        if payload.version != FragmentPayload::VERSION {
            return Err(FragmentError::Version(payload.version));
        }
        let fragment = Self::normalized(payload.nodes);
        if !fragment.is_empty() {
            let doc = Document::from_root(Node::root(fragment.blocks.clone()));
            crate::model::invariants::check(&doc)?;
        }
        Ok(fragment)
    }
}

#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("invalid fragment JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported fragment version {0}")]
    Version(u32),

    #[error(transparent)]
    Invalid(#[from] crate::model::InvariantViolation),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn clipboard_data_keeps_order_and_replaces() {
        let mut data = ClipboardData::new()
            .with(HTML_MIME, "<p>a</p>")
            .with(PLAIN_MIME, "a");
        data.set("Text/HTML", "<p>b</p>");
        assert_eq!(data.mimes().collect::<Vec<_>>(), vec![HTML_MIME, PLAIN_MIME]);
        assert_eq!(data.html(), Some("<p>b</p>"));
        assert_eq!(data.fragment(), None);
    }

    #[test]
    fn normalized_merges_lists() {
        let fragment = Fragment::normalized(vec![
            Node::list(ListKind::Bullet, vec![Node::list_item_text("a")]),
            Node::list(ListKind::Bullet, vec![Node::list_item_text("b")]),
        ]);
        assert_eq!(fragment.blocks.len(), 1);
        assert_eq!(fragment.plain_text(), "a\nb");
    }

    #[test]
    fn json_payload_round_trips() {
        let fragment = Fragment::normalized(vec![
            Node::heading(2, vec![Node::text("Title")]),
            Node::paragraph_text("body"),
        ]);
        let json = fragment.to_json().unwrap();
        assert!(json.starts_with(r#"{"version":1,"nodes":[{"type":"heading","level":2"#));
        assert_eq!(Fragment::from_json(&json).unwrap(), fragment);
    }

    #[test]
    fn json_payload_is_validated() {
        let json = r#"{"version":1,"nodes":[{"type":"paragraph","children":[{"type":"table"}]}]}"#;
        assert!(matches!(Fragment::from_json(json), Err(FragmentError::Invalid(_))));
        let json = r#"{"version":7,"nodes":[]}"#;
        assert!(matches!(Fragment::from_json(json), Err(FragmentError::Version(7))));
    }
}
