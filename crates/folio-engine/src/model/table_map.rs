use std::sync::Arc;

use super::node::{Node, NodeKey, NodeKind};

/// One occupied slot of a table grid, pointing at the cell that covers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSlot {
    pub key: NodeKey,
    /// Top-left corner of the covering cell
    pub origin: (usize, usize),
    pub row_span: usize,
    pub col_span: usize,
}

/// Dense row/column view of a table with spans resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMap {
    rows: usize,
    columns: usize,
    grid: Vec<Vec<Option<CellSlot>>>,
    overlapping: bool,
}

impl TableMap {
    pub fn build(table: &Node) -> Self {
        let rows = table.children().len();
        let mut grid: Vec<Vec<Option<CellSlot>>> = vec![Vec::new(); rows];
        let mut overlapping = false;

        for (r, row) in table.children().iter().enumerate() {
            let mut c = 0;
            for cell in row.children() {
                let NodeKind::TableCell {
                    col_span, row_span, ..
                } = *cell.kind()
                else {
                    continue;
                };
                while grid[r].get(c).is_some_and(Option::is_some) {
                    c += 1;
                }
                let slot = CellSlot {
                    key: cell.key(),
                    origin: (r, c),
                    row_span: row_span.max(1) as usize,
                    col_span: col_span.max(1) as usize,
                };
                // Spans past the last row are cut off
                for rr in r..(r + slot.row_span).min(rows) {
                    let line = &mut grid[rr];
                    if line.len() < c + slot.col_span {
                        line.resize(c + slot.col_span, None);
                    }
                    for entry in &mut line[c..c + slot.col_span] {
                        overlapping |= entry.is_some();
                        *entry = Some(slot);
                    }
                }
                c += slot.col_span;
            }
        }

        let columns = grid.iter().map(Vec::len).max().unwrap_or(0);
        for line in &mut grid {
            line.resize(columns, None);
        }
        Self {
            rows,
            columns,
            grid,
            overlapping,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn slot(&self, row: usize, column: usize) -> Option<&CellSlot> {
        self.grid.get(row)?.get(column)?.as_ref()
    }

    pub fn cell_at(&self, row: usize, column: usize) -> Option<NodeKey> {
        self.slot(row, column).map(|s| s.key)
    }

    pub fn slot_of(&self, key: NodeKey) -> Option<&CellSlot> {
        self.grid.iter().flatten().flatten().find(|s| s.key == key)
    }

    /// Origin coordinates of the cell `key`.
    pub fn position_of(&self, key: NodeKey) -> Option<(usize, usize)> {
        self.slot_of(key).map(|s| s.origin)
    }

    /// No holes, no overlapping spans.
    pub fn is_rectangular(&self) -> bool {
        !self.overlapping && self.grid.iter().flatten().all(Option::is_some)
    }

    /// Distinct cells whose origin lies inside the rectangle, row-major.
    pub fn cells_in(&self, rect: CellRect) -> Vec<CellSlot> {
        let mut out: Vec<CellSlot> = Vec::new();
        for r in rect.top..=rect.bottom.min(self.rows.saturating_sub(1)) {
            for c in rect.left..=rect.right.min(self.columns.saturating_sub(1)) {
                if let Some(slot) = self.slot(r, c)
                    && slot.origin == (r, c)
                {
                    out.push(*slot);
                }
            }
        }
        out
    }

    /// Grow `rect` until no spanned cell straddles its edge.
    pub fn expand(&self, mut rect: CellRect) -> CellRect {
        loop {
            let mut grown = rect;
            for r in rect.top..=rect.bottom {
                for c in rect.left..=rect.right {
                    if let Some(slot) = self.slot(r, c) {
                        let (or, oc) = slot.origin;
                        grown.top = grown.top.min(or);
                        grown.left = grown.left.min(oc);
                        grown.bottom = grown.bottom.max(or + slot.row_span - 1);
                        grown.right = grown.right.max(oc + slot.col_span - 1);
                    }
                }
            }
            grown.bottom = grown.bottom.min(self.rows.saturating_sub(1));
            grown.right = grown.right.min(self.columns.saturating_sub(1));
            if grown == rect {
                return rect;
            }
            rect = grown;
        }
    }
}

/// Inclusive cell rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
}

impl CellRect {
    /// Bounding box of two corners, in any order.
    pub fn spanning(a: (usize, usize), b: (usize, usize)) -> Self {
        Self {
            top: a.0.min(b.0),
            left: a.1.min(b.1),
            bottom: a.0.max(b.0),
            right: a.1.max(b.1),
        }
    }

    pub fn rows(&self) -> usize {
        self.bottom - self.top + 1
    }

    pub fn columns(&self) -> usize {
        self.right - self.left + 1
    }

    pub fn contains(&self, row: usize, column: usize) -> bool {
        (self.top..=self.bottom).contains(&row) && (self.left..=self.right).contains(&column)
    }
}

/// Fill holes at the end of ragged rows with empty cells, so the table is
/// rectangular.
pub fn pad_table(table: &Node) -> Node {
    let map = TableMap::build(table);
    let rows = table
        .children()
        .iter()
        .enumerate()
        .map(|(r, row)| {
            let holes = (0..map.columns())
                .filter(|c| map.slot(r, *c).is_none())
                .count();
            if holes == 0 {
                return Arc::clone(row);
            }
            let mut cells = row.children().to_vec();
            cells.extend(
                (0..holes).map(|_| Arc::new(Node::table_cell(vec![Node::paragraph(Vec::new())]))),
            );
            Arc::new(row.with_children(cells))
        })
        .collect();
    table.with_children(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(text: &str) -> Node {
        Node::table_cell(vec![Node::paragraph_text(text)])
    }

    fn spanned(text: &str, rows: u32, cols: u32) -> Node {
        Node::new(
            NodeKind::TableCell {
                header: false,
                col_span: cols,
                row_span: rows,
            },
            vec![Node::paragraph_text(text)],
        )
    }

    fn keyed(table: Node) -> Node {
        crate::model::Document::new(vec![table]).root().children()[0]
            .as_ref()
            .clone()
    }

    #[test]
    fn plain_grid() {
        let table = keyed(Node::table(vec![
            Node::table_row(vec![cell("a"), cell("b")]),
            Node::table_row(vec![cell("c"), cell("d")]),
        ]));
        let map = TableMap::build(&table);
        assert_eq!((map.rows(), map.columns()), (2, 2));
        assert!(map.is_rectangular());
        let d = table.children()[1].children()[1].key();
        assert_eq!(map.position_of(d), Some((1, 1)));
    }

    #[test]
    fn spans_resolve_and_expand() {
        // a a b
        // c d b
        let table = keyed(Node::table(vec![
            Node::table_row(vec![spanned("a", 1, 2), spanned("b", 2, 1)]),
            Node::table_row(vec![cell("c"), cell("d")]),
        ]));
        let map = TableMap::build(&table);
        assert_eq!(map.columns(), 3);
        assert!(map.is_rectangular());
        let d = table.children()[1].children()[1].key();
        assert_eq!(map.position_of(d), Some((1, 1)));

        let rect = map.expand(CellRect::spanning((1, 1), (0, 1)));
        assert_eq!(rect, CellRect::spanning((0, 0), (1, 1)));
        let rect = map.expand(CellRect::spanning((1, 1), (1, 2)));
        assert_eq!(rect, CellRect::spanning((0, 0), (1, 2)));
    }

    #[test]
    fn ragged_rows_are_not_rectangular() {
        let table = keyed(Node::table(vec![
            Node::table_row(vec![cell("a"), cell("b")]),
            Node::table_row(vec![cell("c")]),
        ]));
        assert!(!TableMap::build(&table).is_rectangular());
    }

    #[test]
    fn bounding_box_is_order_independent() {
        assert_eq!(
            CellRect::spanning((1, 1), (0, 0)),
            CellRect::spanning((0, 0), (1, 1))
        );
    }

    #[test]
    fn pad_fills_ragged_rows() {
        let table = Node::table(vec![
            Node::table_row(vec![cell("a"), cell("b"), cell("c")]),
            Node::table_row(vec![cell("d")]),
        ]);
        let padded = pad_table(&table);
        assert_eq!(padded.children()[1].children().len(), 3);
        assert!(TableMap::build(&keyed(padded)).is_rectangular());
    }
}
