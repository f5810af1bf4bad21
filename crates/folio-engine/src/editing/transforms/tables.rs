//! Table insertion and grid paste.

use std::sync::Arc;

use super::{Edit, EditError, Result, delete, finish_caret, finish_with, span};
use crate::model::{Document, ModelError, Node, NodeKind, TableMap};
use crate::selection::point::BlockOffset;
use crate::selection::{CellCoord, GridSelection, Selection};

fn empty_table(rows: usize, columns: usize) -> Node {
    let rows = (0..rows)
        .map(|r| {
            let cells = (0..columns)
                .map(|_| {
                    let content = vec![Node::paragraph(Vec::new())];
                    if r == 0 {
                        Node::header_cell(content)
                    } else {
                        Node::table_cell(content)
                    }
                })
                .collect();
            Node::table_row(cells)
        })
        .collect();
    Node::table(rows)
}

/// Insert an empty `rows` x `columns` table after the caret's top-level
/// block. The first row holds header cells and the caret moves into the
/// first cell. Tables never nest: inside a cell the new table goes after
/// the enclosing one.
pub fn insert_table(doc: &Document, selection: &Selection, rows: usize, columns: usize) -> Result<Edit> {
    let span = span(doc, selection)?;
    let mut next = doc.clone();
    let at = delete::delete_span(&mut next, &span)?;
    let path = next.path_of(at.block).ok_or(EditError::Unresolvable)?;
    let index = *path.first().ok_or(EditError::Unresolvable)?;
    let root = next.root_key();

    let table = next.insert_child(root, index + 1, empty_table(rows.max(1), columns.max(1)))?;
    if next.children(root).len() == index + 2 {
        next.append_child(root, Node::paragraph(Vec::new()))?;
    }
    let first = next
        .node(table)
        .and_then(|t| t.descendants().find(|n| n.is_text_block()))
        .map(Node::key)
        .ok_or(ModelError::NotFound(table))?;
    log::trace!("inserted {rows}x{columns} table {table}");
    Ok(finish_caret(doc, next, BlockOffset::new(first, 0), span.format))
}

/// Paste `table` into a grid selection.
///
/// Incoming cells are written cell by cell from the top-left corner of the
/// selected rectangle; whatever does not fit in the host table is dropped.
/// The host keeps its shape and cell kinds. The result selects the written
/// area.
pub fn merge_grids(doc: &Document, grid: &GridSelection, table: &Node) -> Result<Edit> {
    let host = doc.node(grid.table).ok_or(ModelError::NotFound(grid.table))?;
    if *host.kind() != NodeKind::Table || *table.kind() != NodeKind::Table {
        return Err(EditError::Unresolvable);
    }
    let host_map = TableMap::build(host);
    let rect = grid.rect(&host_map);

    // Key the incoming table so its map can point back at its cells
    let incoming = Document::from_root(Node::root(vec![table.detached()]));
    let incoming_table = incoming
        .root()
        .first_child()
        .ok_or(EditError::Unresolvable)?;
    let incoming_map = TableMap::build(incoming_table);

    let mut next = doc.clone();
    let mut written = (0, 0);
    for r in 0..incoming_map.rows() {
        for c in 0..incoming_map.columns() {
            let Some(source) = incoming_map.slot(r, c).filter(|s| s.origin == (r, c)) else {
                continue;
            };
            let (tr, tc) = (rect.top + r, rect.left + c);
            let Some(target) = host_map.slot(tr, tc).filter(|s| s.origin == (tr, tc)) else {
                continue;
            };
            let content: Vec<Arc<Node>> = incoming
                .children(source.key)
                .iter()
                .map(|child| Arc::new(child.detached()))
                .collect();
            let len = next.children(target.key).len();
            next.splice_children(target.key, 0..len, content)?;
            written = (written.0.max(r), written.1.max(c));
        }
    }
    log::trace!(
        "merged {}x{} grid into {} at ({}, {})",
        incoming_map.rows(),
        incoming_map.columns(),
        grid.table,
        rect.top,
        rect.left
    );

    let focus = CellCoord::new(
        (rect.top + written.0).min(host_map.rows().saturating_sub(1)),
        (rect.left + written.1).min(host_map.columns().saturating_sub(1)),
    );
    let selection = Selection::Grid(GridSelection::new(
        grid.table,
        CellCoord::new(rect.top, rect.left),
        focus,
    ));
    Ok(finish_with(doc, next, selection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::transforms::test_support::{caret, checked, focus_of};
    use crate::snapshot::format_tree;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn letters() -> Document {
        let cell = |t: &str| Node::table_cell(vec![Node::paragraph_text(t)]);
        let row = |ts: [&str; 3]| Node::table_row(ts.into_iter().map(cell).collect());
        Document::new(vec![Node::table(vec![
            row(["a", "b", "c"]),
            row(["d", "e", "f"]),
            row(["g", "h", "i"]),
        ])])
    }

    fn numbers() -> Node {
        let cell = |t: &str| Node::table_cell(vec![Node::paragraph_text(t)]);
        Node::table(vec![
            Node::table_row(vec![cell("1"), cell("2")]),
            Node::table_row(vec![cell("3"), cell("4")]),
        ])
    }

    #[test]
    fn inserts_table_after_block() {
        let doc = Document::new(vec![Node::paragraph_text("x")]);
        let edit = checked(insert_table(&doc, &caret(&doc, 0, 1), 2, 2).unwrap());
        assert_snapshot!(format_tree(&edit.document), @r#"
        Root
          Paragraph
            Text "x"
          Table
            TableRow
              TableCell header=true
                Paragraph
                  Text ""
              TableCell header=true
                Paragraph
                  Text ""
            TableRow
              TableCell
                Paragraph
                  Text ""
              TableCell
                Paragraph
                  Text ""
          Paragraph
            Text ""
        "#);
        assert_eq!(focus_of(&edit), (1, 0));
    }

    #[test]
    fn merge_writes_from_top_left_of_selection() {
        let doc = letters();
        let table = doc.root().children()[0].key();
        let grid = GridSelection::new(table, CellCoord::new(1, 1), CellCoord::new(1, 1));
        let edit = checked(merge_grids(&doc, &grid, &numbers()).unwrap());
        assert_eq!(edit.document.text_content(), "a\tb\tc\nd\t1\t2\ng\t3\t4");
        assert_eq!(
            edit.selection,
            Selection::Grid(GridSelection::new(table, CellCoord::new(1, 1), CellCoord::new(2, 2)))
        );
    }

    #[test]
    fn merge_clips_to_host_bounds() {
        let doc = letters();
        let table = doc.root().children()[0].key();
        let grid = GridSelection::new(table, CellCoord::new(2, 2), CellCoord::new(2, 2));
        let edit = checked(merge_grids(&doc, &grid, &numbers()).unwrap());
        assert_eq!(edit.document.text_content(), "a\tb\tc\nd\te\tf\ng\th\t1");
    }

    #[test]
    fn merge_rejects_non_tables() {
        let doc = letters();
        let table = doc.root().children()[0].key();
        let grid = GridSelection::new(table, CellCoord::new(0, 0), CellCoord::new(0, 0));
        assert_eq!(
            merge_grids(&doc, &grid, &Node::paragraph_text("x")),
            Err(EditError::Unresolvable)
        );
    }
}
