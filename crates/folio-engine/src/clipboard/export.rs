//! Selection → clipboard payload.
//!
//! The selected content is first cut out of the document as a [`Fragment`]
//! (boundary text clipped, ancestor chain kept), then written three ways:
//! HTML for other applications, plain text, and the fragment JSON for
//! pastes into another folio editor.

use std::sync::Arc;

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::{ClipboardData, FRAGMENT_MIME, Fragment, HTML_MIME, PLAIN_MIME};
use crate::editing::transforms::{host_container, inline, span};
use crate::model::table_map::pad_table;
use crate::model::{Document, ListKind, Node, NodeKind, TableMap, TextFormat, TextRun};
use crate::selection::point::{BlockOffset, inline_len};
use crate::selection::{GridSelection, Selection};

/// Clipboard payload for `selection`. A collapsed selection copies nothing.
pub fn export_selection(doc: &Document, selection: &Selection) -> ClipboardData {
    let fragment = match selected_fragment(doc, selection) {
        Some(fragment) if !fragment.is_empty() => fragment,
        _ => return ClipboardData::default(),
    };
    export_fragment(&fragment)
}

/// Clipboard payload for an already detached fragment.
pub fn export_fragment(fragment: &Fragment) -> ClipboardData {
    let mut data = ClipboardData::new()
        .with(HTML_MIME, to_html(fragment))
        .with(PLAIN_MIME, fragment.plain_text());
    match fragment.to_json() {
        Ok(json) => data.set(FRAGMENT_MIME, json),
        Err(err) => log::warn!("could not serialize copied fragment: {err}"),
    }
    log::debug!(
        "exported {} blocks as {}",
        fragment.blocks.len(),
        data.mimes().collect::<Vec<_>>().join(", ")
    );
    data
}

/// The selected content as detached, normalized blocks.
pub fn selected_fragment(doc: &Document, selection: &Selection) -> Option<Fragment> {
    if let Selection::Grid(grid) = selection {
        return grid_table(doc, grid).map(|table| Fragment::normalized(vec![table]));
    }
    let span = span(doc, selection).ok()?;
    if span.is_collapsed() {
        return None;
    }
    Some(Fragment::normalized(clip_range(doc, span.start, span.end)))
}

/// A standalone table holding exactly the selected rectangle.
fn grid_table(doc: &Document, grid: &GridSelection) -> Option<Node> {
    let table = doc.node(grid.table)?;
    let map = TableMap::build(table);
    let rect = grid.clamped(&map).rect(&map);
    let slots = map.cells_in(rect);
    let rows = (rect.top..=rect.bottom)
        .map(|r| {
            let cells = slots
                .iter()
                .filter(|slot| slot.origin.0 == r)
                .filter_map(|slot| doc.node(slot.key))
                .map(Node::detached)
                .collect();
            Node::table_row(cells)
        })
        .collect();
    Some(pad_table(&Node::table(rows)))
}

#[derive(Clone, Copy)]
struct Bound<'a> {
    path: &'a [usize],
    offset: usize,
}

impl<'a> Bound<'a> {
    fn head(&self) -> Option<usize> {
        self.path.first().copied()
    }

    fn tail(&self) -> Bound<'a> {
        Bound {
            path: self.path.get(1..).unwrap_or_default(),
            offset: self.offset,
        }
    }
}

/// Blocks between two text block offsets. A range inside one table cell
/// copies the cell content rather than a one-cell table.
fn clip_range(doc: &Document, start: BlockOffset, end: BlockOffset) -> Vec<Node> {
    let host = host_container(doc, start.block);
    let host = if host == host_container(doc, end.block) {
        host
    } else {
        doc.root_key()
    };
    let (Some(node), Some(host_path), Some(start_path), Some(end_path)) = (
        doc.node(host),
        doc.path_of(host),
        doc.path_of(start.block),
        doc.path_of(end.block),
    ) else {
        return Vec::new();
    };
    let depth = host_path.len();
    let clipped = clip(
        node,
        Some(Bound {
            path: &start_path[depth..],
            offset: start.offset,
        }),
        Some(Bound {
            path: &end_path[depth..],
            offset: end.offset,
        }),
    );
    clipped.children().iter().map(|c| (**c).clone()).collect()
}

/// Copy of `node` between two bounds; `None` leaves that side open.
fn clip(node: &Node, start: Option<Bound>, end: Option<Bound>) -> Node {
    if node.is_text_block() {
        let from = start.map_or(0, |b| b.offset);
        let to = end.map_or_else(|| inline_len(node), |b| b.offset);
        return node.with_children(inline::slice(node.children(), from, to)).detached();
    }
    let children = node.children();
    if children.is_empty() {
        return node.detached();
    }
    let first = start.and_then(|b| b.head()).unwrap_or(0);
    let last = end
        .and_then(|b| b.head())
        .unwrap_or(children.len() - 1)
        .min(children.len() - 1);
    let clipped = (first..=last)
        .map(|i| {
            let from = start.filter(|_| i == first).map(|b| b.tail());
            let to = end.filter(|_| i == last).map(|b| b.tail());
            let child = &children[i];
            if from.is_none() && to.is_none() {
                Arc::new(child.detached())
            } else {
                Arc::new(clip(child, from, to))
            }
        })
        .collect();
    let out = node.with_children(clipped).detached();
    if *out.kind() == NodeKind::Table {
        pad_table(&out)
    } else {
        out
    }
}

/// HTML for a fragment, readable by browsers, office suites and by the
/// folio importer.
pub fn to_html(fragment: &Fragment) -> String {
    let mut out = String::new();
    for block in &fragment.blocks {
        write_block(block, &mut out);
    }
    out
}

fn write_block(node: &Node, out: &mut String) {
    match node.kind() {
        NodeKind::Paragraph => write_text_block("p", node, out),
        NodeKind::Heading { level } => write_text_block(&format!("h{}", (*level).clamp(1, 6)), node, out),
        NodeKind::List { kind, start } => write_list(node, *kind, *start, out),
        NodeKind::CodeBlock { language } => {
            out.push_str("<pre");
            if let Some(language) = language {
                attr(out, "data-language", language);
            }
            out.push_str("><code>");
            out.push_str(&encode_text(&node.inline_text()));
            out.push_str("</code></pre>");
        }
        NodeKind::Table => write_table(node, out),
        NodeKind::HorizontalRule => out.push_str("<hr>"),
        NodeKind::Decorator { kind, payload } => {
            out.push_str("<div");
            attr(out, "data-decorator", kind);
            attr(out, "data-payload", payload);
            out.push('>');
            if kind == "image" {
                out.push_str("<img");
                attr(out, "src", payload);
                out.push('>');
            }
            out.push_str("</div>");
        }
        kind if kind.is_inline() => {
            let mut spaces = Spaces::default();
            write_inline(node, &mut spaces, out);
            spaces.end_line(out);
        }
        _ => {
            for child in node.children() {
                write_block(child, out);
            }
        }
    }
}

fn write_text_block(tag: &str, node: &Node, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    write_inline_content(node, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Inline children; an empty block keeps its height with a `<br>`.
fn write_inline_content(node: &Node, out: &mut String) {
    let has_content = node
        .children()
        .iter()
        .any(|c| !c.is_text() || c.text_str().is_some_and(|t| !t.is_empty()));
    if !has_content {
        out.push_str("<br>");
        return;
    }
    let mut spaces = Spaces::default();
    for child in node.children() {
        write_inline(child, &mut spaces, out);
    }
    spaces.end_line(out);
}

fn write_list(node: &Node, kind: ListKind, start: u32, out: &mut String) {
    let tag = match kind {
        ListKind::Number => "ol",
        ListKind::Bullet | ListKind::Check => "ul",
    };
    out.push('<');
    out.push_str(tag);
    if kind == ListKind::Check {
        attr(out, "data-list", "check");
    }
    if kind == ListKind::Number && start != 1 {
        attr(out, "start", &start.to_string());
    }
    out.push('>');
    for item in node.children() {
        out.push_str("<li");
        if let NodeKind::ListItem {
            checked: Some(checked),
            ..
        } = item.kind()
        {
            attr(out, "role", "checkbox");
            attr(out, "aria-checked", if *checked { "true" } else { "false" });
        }
        out.push('>');
        if item.is_nested_list_item() {
            for list in item.children() {
                write_block(list, out);
            }
        } else {
            write_inline_content(item, out);
        }
        out.push_str("</li>");
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_table(node: &Node, out: &mut String) {
    out.push_str("<table><tbody>");
    for row in node.children() {
        out.push_str("<tr>");
        for cell in row.children() {
            let NodeKind::TableCell {
                header,
                col_span,
                row_span,
            } = *cell.kind()
            else {
                continue;
            };
            let tag = if header { "th" } else { "td" };
            out.push('<');
            out.push_str(tag);
            if col_span != 1 {
                attr(out, "colspan", &col_span.to_string());
            }
            if row_span != 1 {
                attr(out, "rowspan", &row_span.to_string());
            }
            out.push('>');
            for block in cell.children() {
                write_block(block, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
}

/// Format marks in nesting order, outermost first.
const FORMAT_TAGS: &[(TextFormat, &str)] = &[
    (TextFormat::BOLD, "b"),
    (TextFormat::ITALIC, "i"),
    (TextFormat::UNDERLINE, "u"),
    (TextFormat::STRIKETHROUGH, "s"),
    (TextFormat::SUBSCRIPT, "sub"),
    (TextFormat::SUPERSCRIPT, "sup"),
    (TextFormat::CODE, "code"),
];

fn write_inline(node: &Node, spaces: &mut Spaces, out: &mut String) {
    match node.kind() {
        NodeKind::Text(run) => write_run(run, spaces, out),
        NodeKind::LineBreak => {
            spaces.end_line(out);
            out.push_str("<br>");
        }
        NodeKind::Link { url } => {
            out.push_str("<a");
            attr(out, "href", url);
            out.push('>');
            for child in node.children() {
                write_inline(child, spaces, out);
            }
            out.push_str("</a>");
        }
        NodeKind::Decorator { kind, payload } if kind == "image" => {
            spaces.content();
            out.push_str("<img");
            attr(out, "src", payload);
            out.push('>');
        }
        NodeKind::Decorator { kind, payload } => {
            spaces.content();
            out.push_str("<span");
            attr(out, "data-decorator", kind);
            attr(out, "data-payload", payload);
            out.push('>');
            out.push_str(&encode_text(payload));
            out.push_str("</span>");
        }
        _ => write_block(node, out),
    }
}

fn write_run(run: &TextRun, spaces: &mut Spaces, out: &mut String) {
    if run.text.is_empty() {
        return;
    }
    let tags: Vec<&str> = FORMAT_TAGS
        .iter()
        .filter(|(flag, _)| run.format.contains(*flag))
        .map(|(_, tag)| *tag)
        .collect();
    if !run.style.is_empty() {
        out.push_str("<span");
        attr(out, "style", &run.style);
        out.push('>');
    }
    for tag in &tags {
        out.push('<');
        out.push_str(tag);
        out.push('>');
    }
    spaces.write(&encode_text(&run.text), out);
    for tag in tags.iter().rev() {
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
    if !run.style.is_empty() {
        out.push_str("</span>");
    }
}

/// Whitespace state of one line of inline content.
///
/// HTML collapses space runs and drops spaces at line edges, so a space at
/// the start of a line, after another space, or at the end of a line is
/// written as `&nbsp;`. The state spans every run of the line.
#[derive(Debug)]
struct Spaces {
    after_space: bool,
    /// Byte position in the output of a plain space nothing has followed yet
    trailing: Option<usize>,
}

impl Default for Spaces {
    fn default() -> Self {
        Self {
            after_space: true,
            trailing: None,
        }
    }
}

impl Spaces {
    fn write(&mut self, text: &str, out: &mut String) {
        for c in text.chars() {
            if c != ' ' {
                out.push(c);
                self.content();
            } else if self.after_space {
                out.push_str("&nbsp;");
                self.after_space = false;
                self.trailing = None;
            } else {
                self.trailing = Some(out.len());
                out.push(' ');
                self.after_space = true;
            }
        }
    }

    fn content(&mut self) {
        self.after_space = false;
        self.trailing = None;
    }

    fn end_line(&mut self, out: &mut String) {
        if let Some(at) = self.trailing.take() {
            out.replace_range(at..at + 1, "&nbsp;");
        }
        self.after_space = true;
    }
}

fn attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&encode_double_quoted_attribute(value));
    out.push('"');
}
