use serde::{Deserialize, Serialize};

use crate::model::{CellRect, Document, Node, NodeKey, NodeKind, TableMap};

/// Row/column coordinate of a cell origin within a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub row: usize,
    pub column: usize,
}

impl CellCoord {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    fn tuple(self) -> (usize, usize) {
        (self.row, self.column)
    }
}

/// Rectangular cell selection inside one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSelection {
    pub table: NodeKey,
    pub anchor: CellCoord,
    pub focus: CellCoord,
}

impl GridSelection {
    pub fn new(table: NodeKey, anchor: CellCoord, focus: CellCoord) -> Self {
        Self {
            table,
            anchor,
            focus,
        }
    }

    /// Effective rectangle: bounding box of the corners, grown over spans.
    pub fn rect(&self, map: &TableMap) -> CellRect {
        map.expand(CellRect::spanning(self.anchor.tuple(), self.focus.tuple()))
    }

    /// Keys of the selected cells, row-major.
    pub fn cells(&self, doc: &Document) -> Vec<NodeKey> {
        let Some(table) = doc.node(self.table) else {
            return Vec::new();
        };
        let map = TableMap::build(table);
        map.cells_in(self.rect(&map))
            .into_iter()
            .map(|slot| slot.key)
            .collect()
    }

    /// Clamp both corners into the table's bounds.
    pub fn clamped(&self, map: &TableMap) -> Self {
        let clamp = |c: CellCoord| {
            CellCoord::new(
                c.row.min(map.rows().saturating_sub(1)),
                c.column.min(map.columns().saturating_sub(1)),
            )
        };
        Self {
            table: self.table,
            anchor: clamp(self.anchor),
            focus: clamp(self.focus),
        }
    }
}

/// Table and cell coordinate containing `key`, if any.
pub fn cell_of(doc: &Document, key: NodeKey) -> Option<(NodeKey, CellCoord)> {
    let cell = doc.closest(key, Node::is_table_cell)?;
    let table = doc.ancestor_where(cell.key(), |n| *n.kind() == NodeKind::Table)?;
    let (row, column) = TableMap::build(table).position_of(cell.key())?;
    Some((table.key(), CellCoord::new(row, column)))
}
