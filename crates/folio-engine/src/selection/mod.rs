//! # Selection Model
//!
//! A selection is either a [`RangeSelection`] (anchor and focus [`Point`]s,
//! plus the pending format used for the next typed text) or a
//! [`GridSelection`] (a rectangle of cells within one table).
//!
//! Selections only reference nodes by key. Anything arriving from outside
//! (the render layer, an undo entry, a stale command) goes through
//! [`normalize`] before use, and every transform ends with
//! [`repair_dangling`] so a selection never points at a removed node.

pub mod grid;
pub mod navigation;
pub mod point;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::{Document, Node, NodeKey, NodeKind, TableMap, TextFormat};

pub use grid::{CellCoord, GridSelection};
pub use navigation::{Direction, Granularity, extend, move_caret};
pub use point::{BlockOffset, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSelection {
    pub anchor: Point,
    pub focus: Point,
    /// Marks applied to the next inserted text
    #[serde(default, skip_serializing_if = "TextFormat::is_empty")]
    pub format: TextFormat,
}

impl RangeSelection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self {
            anchor,
            focus,
            format: TextFormat::empty(),
        }
    }

    pub fn caret(point: Point) -> Self {
        Self::new(point, point)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_backward(&self, doc: &Document) -> bool {
        self.focus.cmp_in(&self.anchor, doc) == Ordering::Less
    }

    /// (start, end) in document order.
    pub fn ordered(&self, doc: &Document) -> (Point, Point) {
        if self.is_backward(doc) {
            (self.focus, self.anchor)
        } else {
            (self.anchor, self.focus)
        }
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selection {
    Range(RangeSelection),
    Grid(GridSelection),
}

impl Selection {
    pub fn caret(point: Point) -> Self {
        Selection::Range(RangeSelection::caret(point))
    }

    pub fn range(anchor: Point, focus: Point) -> Self {
        Selection::Range(RangeSelection::new(anchor, focus))
    }

    pub fn as_range(&self) -> Option<&RangeSelection> {
        match self {
            Selection::Range(range) => Some(range),
            Selection::Grid(_) => None,
        }
    }

    pub fn as_grid(&self) -> Option<&GridSelection> {
        match self {
            Selection::Grid(grid) => Some(grid),
            Selection::Range(_) => None,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.as_range().is_some_and(RangeSelection::is_collapsed)
    }

    pub fn format(&self) -> TextFormat {
        self.as_range().map_or(TextFormat::empty(), |r| r.format)
    }
}

/// Concrete endpoints of a selection after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub anchor_node: NodeKey,
    pub anchor_offset: usize,
    pub focus_node: NodeKey,
    pub focus_offset: usize,
    pub is_backward: bool,
}

/// Largest valid offset for a point on `node`.
fn max_offset(node: &Node) -> usize {
    match node.kind() {
        NodeKind::Text(run) => run.char_len(),
        _ => node.children().len(),
    }
}

fn normalize_point(point: Point, doc: &Document) -> Point {
    match doc.node(point.key) {
        Some(node) => Point::new(point.key, point.offset.min(max_offset(node))),
        None => point::document_start(doc),
    }
}

/// Clamp a selection to the document: missing keys move to the document
/// start, offsets and cell coordinates are clamped, a grid whose table is
/// gone becomes a range selection.
pub fn normalize(selection: &Selection, doc: &Document) -> Selection {
    match selection {
        Selection::Range(range) => Selection::Range(RangeSelection {
            anchor: normalize_point(range.anchor, doc),
            focus: normalize_point(range.focus, doc),
            format: range.format,
        }),
        Selection::Grid(grid) => match doc.node(grid.table) {
            Some(table) if *table.kind() == NodeKind::Table => {
                Selection::Grid(grid.clamped(&TableMap::build(table)))
            }
            _ => Selection::caret(point::document_start(doc)),
        },
    }
}

/// Endpoints in node/offset form. Grid selections resolve to the anchor
/// and focus cells as element points.
pub fn resolve(selection: &Selection, doc: &Document) -> Resolved {
    match normalize(selection, doc) {
        Selection::Range(range) => Resolved {
            anchor_node: range.anchor.key,
            anchor_offset: range.anchor.offset,
            focus_node: range.focus.key,
            focus_offset: range.focus.offset,
            is_backward: range.is_backward(doc),
        },
        Selection::Grid(grid) => {
            let map = doc.node(grid.table).map(TableMap::build);
            let cell = |c: CellCoord| {
                map.as_ref()
                    .and_then(|m| m.cell_at(c.row, c.column))
                    .unwrap_or(grid.table)
            };
            let anchor = cell(grid.anchor);
            let focus = cell(grid.focus);
            Resolved {
                anchor_node: anchor,
                anchor_offset: 0,
                focus_node: focus,
                focus_offset: doc.node(focus).map_or(0, max_offset),
                is_backward: (grid.focus.row, grid.focus.column)
                    < (grid.anchor.row, grid.anchor.column),
            }
        }
    }
}

/// Everything: element points spanning the root's children.
pub fn select_all(doc: &Document) -> Selection {
    let root = doc.root_key();
    Selection::range(
        Point::new(root, 0),
        Point::new(root, doc.root().children().len()),
    )
}

/// Rewrite element points as text points where a text block is reachable.
pub fn canonicalize(selection: &Selection, doc: &Document) -> Selection {
    match normalize(selection, doc) {
        Selection::Range(range) => {
            let fix = |p: Point| {
                point::to_block_offset(doc, p)
                    .and_then(|at| point::to_point(doc, at))
                    .unwrap_or(p)
            };
            Selection::Range(RangeSelection {
                anchor: fix(range.anchor),
                focus: fix(range.focus),
                format: range.format,
            })
        }
        grid => grid,
    }
}

/// Retarget points whose node no longer exists in `after`: the next text
/// leaf of `before` that survived (at its start), else the previous one (at
/// its end), else the document start. Surviving points are clamped.
pub fn repair_dangling(selection: &Selection, before: &Document, after: &Document) -> Selection {
    let repair = |p: Point| -> Point {
        if after.contains(p.key) {
            return normalize_point(p, after);
        }
        let Some(order) = p.order_key(before) else {
            return point::document_start(after);
        };
        let leaves: Vec<(Vec<usize>, NodeKey)> = before
            .text_leaves()
            .into_iter()
            .filter_map(|leaf| Some((before.path_of(leaf.key())?, leaf.key())))
            .collect();
        let next = leaves
            .iter()
            .filter(|(path, _)| *path >= order)
            .find(|(_, key)| after.contains(*key));
        if let Some((_, key)) = next {
            return Point::new(*key, 0);
        }
        let previous = leaves
            .iter()
            .rev()
            .filter(|(path, _)| *path < order)
            .find(|(_, key)| after.contains(*key));
        if let Some((_, key)) = previous {
            let len = after.node(*key).map_or(0, max_offset);
            return Point::new(*key, len);
        }
        point::document_start(after)
    };

    match selection {
        Selection::Range(range) => Selection::Range(RangeSelection {
            anchor: repair(range.anchor),
            focus: repair(range.focus),
            format: range.format,
        }),
        Selection::Grid(_) => normalize(selection, after),
    }
}

/// Format of the text at a point, used as the pending format after caret
/// movement.
pub fn format_at(doc: &Document, point: Point) -> TextFormat {
    doc.node(point.key)
        .and_then(Node::text_run)
        .map_or(TextFormat::empty(), |run| run.format)
}
