//! Owned, simplified view of a parsed HTML document.
//!
//! html5ever builds an `RcDom` of reference-counted cells; the importer only
//! needs elements, attributes and text, so the body is copied into plain
//! [`HtmlNode`]s once and everything downstream works on those.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

#[derive(Debug, Clone, PartialEq)]
pub enum HtmlNode {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Lowercased local name
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<HtmlNode>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Whitespace-separated tokens of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(HtmlNode::as_element)
    }

    /// Pre-order walk over descendant elements, excluding `self`.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack: Vec<&Element> = self.elements().collect();
        stack.reverse();
        while let Some(el) = stack.pop() {
            out.push(el);
            let start = stack.len();
            stack.extend(el.elements());
            stack[start..].reverse();
        }
        out
    }

    /// Concatenated text of the subtree.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

impl HtmlNode {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            HtmlNode::Element(el) => Some(el),
            HtmlNode::Text(_) => None,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, HtmlNode::Text(t) if t.trim().is_empty())
    }
}

fn collect_text(nodes: &[HtmlNode], out: &mut String) {
    for node in nodes {
        match node {
            HtmlNode::Text(t) => out.push_str(t),
            HtmlNode::Element(el) => collect_text(&el.children, out),
        }
    }
}

/// Elements whose content never reaches the document.
const SKIPPED: &[&str] = &["head", "style", "script", "template", "title", "meta", "link", "noscript"];

/// Strip the Windows `CF_HTML` header (`Version:0.9 StartHTML:...`) that
/// precedes the markup on that platform.
pub fn strip_cf_html(raw: &str) -> &str {
    let trimmed = raw.trim_start_matches('\u{feff}');
    if trimmed.starts_with("Version:")
        && let Some(start) = trimmed.find('<')
    {
        return &trimmed[start..];
    }
    trimmed
}

/// Parse `html` and return the children of its `<body>`.
pub fn parse_body(html: &str) -> Vec<HtmlNode> {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
    match find_element(&dom.document, "body") {
        Some(body) => convert_children(&body),
        None => Vec::new(),
    }
}

fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &handle.data
        && &*name.local == tag
    {
        return Some(handle.clone());
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}

fn convert_children(handle: &Handle) -> Vec<HtmlNode> {
    handle.children.borrow().iter().filter_map(convert).collect()
}

fn convert(handle: &Handle) -> Option<HtmlNode> {
    match &handle.data {
        NodeData::Text { contents } => Some(HtmlNode::Text(contents.borrow().to_string())),
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.to_string();
            if SKIPPED.contains(&tag.as_str()) {
                return None;
            }
            let attrs = attrs
                .borrow()
                .iter()
                .map(|a| (a.name.local.to_string(), a.value.to_string()))
                .collect();
            Some(HtmlNode::Element(Element {
                tag,
                attrs,
                children: convert_children(handle),
            }))
        }
        _ => None,
    }
}
