//! Tables: `<table>` to a rectangular `Table`.
//!
//! Cells keep block structure, with `<br>`-separated lines split into
//! separate paragraphs. Ragged rows are padded with empty cells.
//!
//! Padding is bounded by [`MAX_CELLS`]: spans that would grow the grid past
//! it are dropped, and a table that is still too large without spans comes
//! in as one paragraph per row.

use std::sync::Arc;

use super::builder::{Builder, Flow};
use super::dom::Element;
use super::rules::Inherited;
use crate::model::table_map::pad_table;
use crate::model::{Node, NodeKind, TableMap};

/// Largest grid, in cells, a pasted table may pad out to.
pub const MAX_CELLS: usize = 10_000;

fn span(el: &Element, name: &str) -> u32 {
    el.attr(name)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(1)
        .min(1000)
}

fn rows(table: &Element) -> Vec<&Element> {
    let mut out = Vec::new();
    for child in table.elements() {
        match child.tag.as_str() {
            "tr" => out.push(child),
            "thead" | "tbody" | "tfoot" => out.extend(child.elements().filter(|r| r.tag == "tr")),
            _ => {}
        }
    }
    out
}

/// Rows times the widest row, counting column spans.
fn grid_area(table: &Node) -> usize {
    let columns = table
        .children()
        .iter()
        .map(|row| {
            row.children()
                .iter()
                .map(|cell| match cell.kind() {
                    NodeKind::TableCell { col_span, .. } => *col_span as usize,
                    _ => 0,
                })
                .sum::<usize>()
        })
        .max()
        .unwrap_or(0);
    table.children().len().saturating_mul(columns)
}

pub(super) fn build_table(builder: &Builder, el: &Element, ctx: &Inherited) -> Vec<Node> {
    let rows: Vec<Node> = rows(el)
        .into_iter()
        .filter_map(|tr| {
            let row_ctx = builder.rules.enter(tr, ctx);
            let cells: Vec<Node> = tr
                .elements()
                .filter(|c| c.tag == "td" || c.tag == "th")
                .map(|c| build_cell(builder, c, &row_ctx))
                .collect();
            (!cells.is_empty()).then(|| Node::table_row(cells))
        })
        .collect();
    if rows.is_empty() {
        return Vec::new();
    }

    let mut table = Node::table(rows);
    if grid_area(&table) > MAX_CELLS {
        table = without_spans(&table);
        if grid_area(&table) > MAX_CELLS {
            log::warn!("pasted table exceeds {MAX_CELLS} cells; importing its rows as text");
            return table
                .children()
                .iter()
                .map(|row| Node::paragraph_text(&row.text_content()))
                .collect();
        }
        log::warn!("pasted table spans exceed {MAX_CELLS} cells; importing it without spans");
    }

    let table = pad_table(&table);
    let map = TableMap::build(&table);
    log::trace!("table {}x{}", map.rows(), map.columns());
    if !map.is_rectangular() {
        log::warn!("pasted table has overlapping spans; importing it without spans");
        return vec![pad_table(&without_spans(&table))];
    }
    vec![table]
}

fn build_cell(builder: &Builder, cell: &Element, ctx: &Inherited) -> Node {
    let inner = builder.rules.enter(cell, ctx);
    let mut flow = Flow::default();
    builder.blocks(&cell.children, &inner, &mut flow);

    let mut blocks = Vec::new();
    for (block, _) in flow.into_blocks() {
        cell_blocks(block, &mut blocks);
    }
    if blocks.is_empty() {
        blocks.push(Node::paragraph(Vec::new()));
    }
    Node::new(
        NodeKind::TableCell {
            header: cell.tag == "th",
            col_span: span(cell, "colspan"),
            row_span: span(cell, "rowspan"),
        },
        blocks,
    )
}

/// Blocks as a cell can hold them: nested tables become one paragraph per
/// row, lines become paragraphs.
fn cell_blocks(block: Node, out: &mut Vec<Node>) {
    match block.kind() {
        NodeKind::Table => {
            for row in block.children() {
                out.push(Node::paragraph_text(&row.text_content()));
            }
        }
        NodeKind::Paragraph | NodeKind::Heading { .. } => split_lines(&block, out),
        _ => out.push(block),
    }
}

fn split_lines(block: &Node, out: &mut Vec<Node>) {
    let mut line: Vec<Arc<Node>> = Vec::new();
    for child in block.children() {
        if *child.kind() == NodeKind::LineBreak {
            out.push(block.with_children(std::mem::take(&mut line)));
        } else {
            line.push(Arc::clone(child));
        }
    }
    out.push(block.with_children(line));
}

fn without_spans(table: &Node) -> Node {
    let rows = table
        .children()
        .iter()
        .map(|row| {
            let cells = row
                .children()
                .iter()
                .map(|cell| {
                    let header = matches!(cell.kind(), NodeKind::TableCell { header: true, .. });
                    let kind = NodeKind::TableCell {
                        header,
                        col_span: 1,
                        row_span: 1,
                    };
                    Arc::new(Node::leaf(kind).with_children(cell.children().to_vec()))
                })
                .collect();
            Arc::new(row.with_children(cells))
        })
        .collect();
    table.with_children(rows)
}

#[cfg(test)]
mod tests {
    use super::MAX_CELLS;
    use crate::clipboard::import::{ImportOptions, import_html};
    use crate::model::{NodeKind, TableMap};
    use crate::snapshot::format_nodes;
    use insta::assert_snapshot;

    fn import(html: &str) -> String {
        format_nodes(&import_html(html, &ImportOptions::default()).blocks)
    }

    #[test]
    fn ragged_rows_are_padded_and_breaks_split_cells() {
        let html = "<table><thead><tr><th>a</th><th>b</th></tr></thead><tbody><tr><td>1<br>2</td></tr></tbody></table>";
        assert_snapshot!(import(html), @r#"
        Table
          TableRow
            TableCell header=true
              Paragraph
                Text "a"
            TableCell header=true
              Paragraph
                Text "b"
          TableRow
            TableCell
              Paragraph
                Text "1"
              Paragraph
                Text "2"
            TableCell
              Paragraph
                Text ""
        "#);
    }

    #[test]
    fn spans_and_nested_tables() {
        let html = r#"<table><tr><td colspan="2"><table><tr><td>x</td><td>y</td></tr></table></td></tr><tr><td>c</td><td>d</td></tr></table>"#;
        assert_snapshot!(import(html), @r#"
        Table
          TableRow
            TableCell col_span=2
              Paragraph
                Text "x\ty"
          TableRow
            TableCell
              Paragraph
                Text "c"
            TableCell
              Paragraph
                Text "d"
        "#);
    }

    #[test]
    fn oversized_spans_are_dropped_before_padding() {
        let wide = "<td colspan=\"1000\">x</td>".repeat(300);
        let html = format!("<table><tr>{wide}</tr><tr><td>y</td></tr></table>");
        let fragment = import_html(&html, &ImportOptions::default());
        let [table] = fragment.blocks.as_slice() else {
            panic!("expected one table, got {:?}", fragment.blocks);
        };
        let map = TableMap::build(table);
        assert_eq!((map.rows(), map.columns()), (2, 300));
        assert!(map.rows() * map.columns() <= MAX_CELLS);
    }

    #[test]
    fn oversized_ragged_table_becomes_row_text() {
        let long_row = "<td>c</td>".repeat(200);
        let short_rows = "<tr><td>r</td></tr>".repeat(60);
        let html = format!("<table><tr>{long_row}</tr>{short_rows}</table>");
        let fragment = import_html(&html, &ImportOptions::default());
        assert_eq!(fragment.blocks.len(), 61);
        assert_eq!(fragment.blocks[1].text_content(), "r");
        assert!(fragment.blocks.iter().all(|b| *b.kind() == NodeKind::Paragraph));
    }
}
