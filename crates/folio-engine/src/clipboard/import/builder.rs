//! Structural pattern dispatch: [`HtmlNode`]s in, document blocks out.
//!
//! The walk keeps a [`Flow`] of finished blocks plus an open inline buffer.
//! Inline content outside any block collects in the buffer and becomes an
//! implicit paragraph when the next block starts; buffers holding only
//! formatting whitespace produce nothing.

use super::ImportOptions;
use super::code;
use super::dom::{Element, HtmlNode};
use super::lists;
use super::rules::{Inherited, StyleRules};
use super::tables;
use crate::model::{Node, NodeKind, TextFormat};

/// How an element takes part in the document structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Role {
    Inline,
    /// A block of its own when it holds inline content only
    Block,
    /// Never a block itself; its content flows into the parent
    Transparent,
    Heading(u8),
    List,
    Item,
    Table,
    Rule,
    Break,
    Ignore,
}

pub(super) fn role(el: &Element) -> Role {
    if el.attr("role") == Some("heading") {
        let level = el
            .attr("aria-level")
            .and_then(|l| l.trim().parse::<u8>().ok())
            .unwrap_or(2);
        return Role::Heading(level.clamp(1, 6));
    }
    match el.tag.as_str() {
        "p" | "div" | "pre" => Role::Block,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Role::Heading(el.tag.as_bytes()[1] - b'0'),
        "ul" | "ol" | "menu" => Role::List,
        "li" => Role::Item,
        "table" => Role::Table,
        "hr" => Role::Rule,
        "br" => Role::Break,
        "blockquote" | "section" | "article" | "main" | "header" | "footer" | "nav" | "aside"
        | "figure" | "figcaption" | "body" | "html" | "center" | "form" | "fieldset"
        | "details" | "summary" | "dl" | "dt" | "dd" | "address" | "hgroup" | "tbody"
        | "thead" | "tfoot" | "tr" | "td" | "th" | "caption" => Role::Transparent,
        "input" | "button" | "select" | "textarea" | "iframe" | "object" | "embed" | "svg"
        | "canvas" | "video" | "audio" | "map" | "colgroup" | "col" => Role::Ignore,
        _ => Role::Inline,
    }
}

/// Whether any element below `el` starts a block, looking through inline
/// wrappers.
pub(super) fn has_block_children(el: &Element) -> bool {
    el.elements().any(|child| match role(child) {
        Role::Inline => !child.has_attr("data-decorator") && has_block_children(child),
        Role::Break | Role::Ignore => false,
        _ => true,
    })
}

fn decorator(el: &Element) -> Option<Node> {
    let kind = el.attr("data-decorator")?;
    let payload = el
        .attr("data-payload")
        .map(str::to_string)
        .unwrap_or_else(|| el.text());
    Some(Node::decorator(kind, &payload))
}

/// Tracks whether a block is a single run at one font size, for title
/// detection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Title {
    #[default]
    Empty,
    Uniform(f32, TextFormat),
    Mixed,
}

/// Open inline content of the block being built.
#[derive(Debug, Default)]
pub(super) struct InlineBuf {
    nodes: Vec<Node>,
    title: Title,
}

impl InlineBuf {
    fn ends_in_space(&self) -> bool {
        match self.nodes.last().map(Node::kind) {
            None | Some(NodeKind::LineBreak) => true,
            Some(NodeKind::Text(run)) => run.text.ends_with(' ') || run.text.is_empty(),
            Some(_) => false,
        }
    }

    fn push_run(&mut self, text: String, ctx: &Inherited) {
        if !text.trim().is_empty() {
            self.title = match (self.title, ctx.font_pt) {
                (Title::Empty, Some(pt)) => Title::Uniform(pt, ctx.format),
                (Title::Uniform(p, f), Some(pt)) if p == pt && f == ctx.format => self.title,
                _ => Title::Mixed,
            };
        }
        self.nodes.push(Node::run(ctx.run(text)));
    }

    /// Append text, collapsing whitespace unless `ctx.pre` is set.
    pub(super) fn text(&mut self, text: &str, ctx: &Inherited) {
        if ctx.pre {
            for (i, line) in text.split('\n').enumerate() {
                if i > 0 {
                    self.line_break();
                }
                if !line.is_empty() {
                    self.push_run(line.trim_end_matches('\r').to_string(), ctx);
                }
            }
            return;
        }
        let mut collapsed = String::with_capacity(text.len());
        let mut in_space = false;
        for c in text.chars() {
            if matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{c}') {
                in_space = true;
            } else {
                if in_space {
                    collapsed.push(' ');
                }
                in_space = false;
                collapsed.push(c);
            }
        }
        if in_space {
            collapsed.push(' ');
        }
        if self.ends_in_space() && collapsed.starts_with(' ') {
            collapsed.remove(0);
        }
        if !collapsed.is_empty() {
            self.push_run(collapsed, ctx);
        }
    }

    pub(super) fn line_break(&mut self) {
        self.trim_end();
        self.nodes.push(Node::line_break());
        self.title = Title::Mixed;
    }

    /// Separate flattened block content with a line break.
    pub(super) fn separate(&mut self) {
        if self.is_meaningful()
            && !matches!(self.nodes.last().map(Node::kind), Some(NodeKind::LineBreak))
        {
            self.line_break();
        }
    }

    pub(super) fn push(&mut self, node: Node) {
        self.nodes.push(node);
        self.title = Title::Mixed;
    }

    fn trim_end(&mut self) {
        while let Some(last) = self.nodes.last_mut() {
            let NodeKind::Text(run) = &mut last.kind else {
                return;
            };
            let trimmed = run.text.trim_end_matches(' ').len();
            run.text.truncate(trimmed);
            if !run.text.is_empty() {
                return;
            }
            self.nodes.pop();
        }
    }

    /// Anything besides whitespace.
    pub(super) fn is_meaningful(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| !matches!(n.kind(), NodeKind::Text(run) if run.text.trim().is_empty()))
    }

    /// Close the buffer as the content of a block. A single trailing line
    /// break is dropped, as browsers do. Non-breaking spaces survive
    /// collapsing and become plain spaces here, unless they are all the
    /// block holds.
    pub(super) fn finish(mut self) -> (Vec<Node>, Option<f32>) {
        self.trim_end();
        if matches!(self.nodes.last().map(Node::kind), Some(NodeKind::LineBreak)) {
            self.nodes.pop();
            self.trim_end();
        }
        if !self.is_meaningful() {
            self.nodes.clear();
        }
        for node in &mut self.nodes {
            if let NodeKind::Text(run) = &mut node.kind
                && run.text.contains('\u{a0}')
            {
                run.text = run.text.replace('\u{a0}', " ");
            }
        }
        self.nodes
            .retain(|n| !matches!(n.kind(), NodeKind::Text(run) if run.text.is_empty()));
        let title = match self.title {
            Title::Uniform(pt, _) => Some(pt),
            _ => None,
        };
        (self.nodes, title)
    }
}

/// Finished blocks plus the open implicit paragraph.
#[derive(Debug, Default)]
pub(super) struct Flow {
    blocks: Vec<(Node, Option<f32>)>,
    pub(super) inline: InlineBuf,
}

impl Flow {
    pub(super) fn push_block(&mut self, node: Node) {
        self.flush();
        self.blocks.push((node, None));
    }

    fn push_text_block(&mut self, kind: NodeKind, buf: InlineBuf) {
        self.flush();
        let (children, title) = buf.finish();
        self.blocks.push((Node::new(kind, children), title));
    }

    /// Turn the open inline content into an implicit paragraph.
    pub(super) fn flush(&mut self) {
        let buf = std::mem::take(&mut self.inline);
        if buf.is_meaningful() {
            let (children, title) = buf.finish();
            self.blocks.push((Node::paragraph(children), title));
        }
    }

    pub(super) fn into_blocks(mut self) -> Vec<(Node, Option<f32>)> {
        self.flush();
        self.blocks
    }
}

pub(super) struct Builder {
    pub(super) rules: StyleRules,
}

/// Build top-level blocks from the body of a pasted document.
pub(super) fn build(nodes: &[HtmlNode], options: &ImportOptions) -> Vec<Node> {
    let builder = Builder {
        rules: StyleRules::new(options),
    };
    let mut flow = Flow::default();
    builder.blocks(nodes, &Inherited::default(), &mut flow);
    let mut blocks = flow.into_blocks();
    if options.promote_titles
        && let [(block, Some(points))] = blocks.as_mut_slice()
        && *block.kind() == NodeKind::Paragraph
        && let Some(level) = options.heading_level(*points)
    {
        log::trace!("promoting {points}pt title to heading level {level}");
        block.kind = NodeKind::Heading { level };
    }
    blocks.into_iter().map(|(node, _)| node).collect()
}

impl Builder {
    /// Walk `nodes` in block context.
    pub(super) fn blocks(&self, nodes: &[HtmlNode], ctx: &Inherited, flow: &mut Flow) {
        for node in nodes {
            match node {
                HtmlNode::Text(text) => flow.inline.text(text, ctx),
                HtmlNode::Element(el) => self.block_element(el, ctx, flow),
            }
        }
    }

    fn block_element(&self, el: &Element, ctx: &Inherited, flow: &mut Flow) {
        if let Some(node) = decorator(el) {
            flow.push_block(node);
            return;
        }
        let inner = self.rules.enter(el, ctx);
        let role = role(el);
        log::trace!("<{}> as {:?}", el.tag, role);
        match role {
            Role::Break => flow.inline.line_break(),
            Role::Rule => flow.push_block(Node::horizontal_rule()),
            Role::List => flow.push_block(lists::build_list(self, el, &inner)),
            Role::Item => flow.push_block(lists::stray_item(self, el, ctx)),
            Role::Table => {
                for block in tables::build_table(self, el, &inner) {
                    flow.push_block(block);
                }
            }
            Role::Heading(level) => {
                let mut buf = InlineBuf::default();
                self.inline_children(&el.children, &inner, &mut buf);
                flow.push_text_block(NodeKind::Heading { level }, buf);
            }
            Role::Block if code::is_code_container(el, &inner) => {
                flow.push_block(code::build_code(el));
            }
            Role::Block if !has_block_children(el) => {
                let mut buf = InlineBuf::default();
                self.inline_children(&el.children, &inner, &mut buf);
                flow.push_text_block(NodeKind::Paragraph, buf);
            }
            Role::Block | Role::Transparent => {
                flow.flush();
                self.blocks(&el.children, &inner, flow);
                flow.flush();
            }
            Role::Inline if has_block_children(el) => self.blocks(&el.children, &inner, flow),
            Role::Inline => self.inline_element(el, &inner, &mut flow.inline),
            Role::Ignore => {}
        }
    }

    /// Walk `nodes` in inline context; block structure is flattened into
    /// line breaks.
    pub(super) fn inline_children(&self, nodes: &[HtmlNode], ctx: &Inherited, buf: &mut InlineBuf) {
        for node in nodes {
            self.inline_node(node, ctx, buf);
        }
    }

    pub(super) fn inline_node(&self, node: &HtmlNode, ctx: &Inherited, buf: &mut InlineBuf) {
        match node {
            HtmlNode::Text(text) => buf.text(text, ctx),
            HtmlNode::Element(el) => {
                if let Some(node) = decorator(el) {
                    buf.push(node);
                    return;
                }
                let inner = self.rules.enter(el, ctx);
                match role(el) {
                    Role::Break => buf.line_break(),
                    Role::Ignore => {}
                    Role::Inline => self.inline_element(el, &inner, buf),
                    _ => {
                        buf.separate();
                        self.inline_children(&el.children, &inner, buf);
                    }
                }
            }
        }
    }

    /// An inline element whose own formatting is already in `inner`.
    fn inline_element(&self, el: &Element, inner: &Inherited, buf: &mut InlineBuf) {
        match el.tag.as_str() {
            "img" => {
                if let Some(src) = el.attr("src") {
                    buf.push(Node::decorator("image", src));
                }
            }
            "a" if el.has_attr("href") => {
                let url = el.attr("href").unwrap_or_default();
                let mut link = InlineBuf::default();
                self.inline_children(&el.children, inner, &mut link);
                let (children, _) = link.finish();
                if children.is_empty() {
                    return;
                }
                if children.iter().all(|c| c.is_text() || *c.kind() == NodeKind::LineBreak) {
                    buf.push(Node::link(url, children));
                } else {
                    // links hold text only; keep the content, drop the link
                    for child in children {
                        buf.push(child);
                    }
                }
            }
            _ => self.inline_children(&el.children, inner, buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::import::dom::parse_body;
    use crate::snapshot::format_nodes;
    use insta::assert_snapshot;

    fn build_html(html: &str) -> String {
        format_nodes(&build(&parse_body(html), &ImportOptions::default()))
    }

    #[test]
    fn implicit_paragraphs_and_whitespace() {
        assert_snapshot!(build_html("\n  <p>one</p>\n  loose <b>text</b>\n  <p></p>"), @r#"
        Paragraph
          Text "one"
        Paragraph
          Text "loose "
          Text "text" [bold]
        Paragraph
        "#);
    }

    #[test]
    fn transparent_inline_wrapper_inherits_formatting() {
        let html = r#"<b style="font-weight:normal;" id="docs-internal-guid-1"><p dir="ltr"><span style="font-size:11pt;font-weight:700">Bold</span><span style="font-size:11pt;font-style:italic"> and italic</span></p><br><p><span>next</span></p></b>"#;
        assert_snapshot!(build_html(html), @r#"
        Paragraph
          Text "Bold" [bold]
          Text " and italic" [italic]
        Paragraph
        Paragraph
          Text "next"
        "#);
    }

    #[test]
    fn sole_large_run_becomes_a_title() {
        let html = r#"<p><span style="font-size:26pt">Quarterly report</span></p>"#;
        assert_snapshot!(build_html(html), @r#"
        Heading level=1
          Text "Quarterly report"
        "#);
        let two = r#"<p><span style="font-size:26pt">A</span></p><p>b</p>"#;
        assert_snapshot!(build_html(two), @r#"
        Paragraph
          Text "A"
        Paragraph
          Text "b"
        "#);
    }

    #[test]
    fn headings_links_images_and_rules() {
        let html = r#"<h2>Head</h2><div role="heading" aria-level="3">Aria</div><p>see <a href="https://x.test">the <i>docs</i></a><img src="a.png"></p><hr><div data-decorator="mention" data-payload="@ann"></div>"#;
        assert_snapshot!(build_html(html), @r#"
        Heading level=2
          Text "Head"
        Heading level=3
          Text "Aria"
        Paragraph
          Text "see "
          Link url=https://x.test
            Text "the "
            Text "docs" [italic]
          Decorator kind=image payload=a.png
        HorizontalRule
        Decorator kind=mention payload=@ann
        "#);
    }

    #[test]
    fn line_breaks_inside_paragraphs() {
        assert_snapshot!(build_html("<p>a<br>b<br></p>"), @r#"
        Paragraph
          Text "a"
          LineBreak
          Text "b"
        "#);
    }
}
