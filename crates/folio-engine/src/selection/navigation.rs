//! Caret movement and selection extension.
//!
//! Motion works on [`BlockOffset`]s over the document's text blocks in
//! order, so the same code handles paragraphs, list items, code blocks and
//! blocks inside table cells. Within a block the inline content is read as
//! [`inline_string`], one char per caret position.

use serde::{Deserialize, Serialize};

use super::grid::{CellCoord, GridSelection, cell_of};
use super::point::{self, BlockOffset, Point, inline_string};
use super::{RangeSelection, Selection, format_at, normalize};
use crate::model::{Document, Node, NodeKind, TableMap, text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Backward,
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Character,
    Word,
    Line,
}

fn line_end(chars: &[char], mut i: usize) -> usize {
    if chars.get(i) == Some(&'\n') {
        i += 1;
    }
    while i < chars.len() && chars[i] != '\n' {
        i += 1;
    }
    i
}

fn line_start(chars: &[char], mut i: usize) -> usize {
    if i > 0 && chars[i - 1] == '\n' {
        i -= 1;
    }
    while i > 0 && chars[i - 1] != '\n' {
        i -= 1;
    }
    i
}

/// One motion step from `from`. Crossing a block edge lands at the start
/// of the next block or the end of the previous one.
pub fn step(
    doc: &Document,
    from: BlockOffset,
    direction: Direction,
    granularity: Granularity,
) -> BlockOffset {
    let blocks = doc.text_blocks();
    let Some(index) = blocks.iter().position(|b| b.key() == from.block) else {
        return from;
    };
    let s = inline_string(blocks[index]);
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let offset = from.offset.min(len);

    match direction {
        Direction::Forward => {
            if offset >= len {
                return blocks
                    .get(index + 1)
                    .map_or(BlockOffset::new(from.block, len), |b| {
                        BlockOffset::new(b.key(), 0)
                    });
            }
            let to = match granularity {
                Granularity::Character => text::next_grapheme(&s, offset),
                Granularity::Word => text::next_word(&s, offset),
                Granularity::Line => Some(line_end(&chars, offset)),
            };
            BlockOffset::new(from.block, to.unwrap_or(len))
        }
        Direction::Backward => {
            if offset == 0 {
                return match index.checked_sub(1).map(|i| blocks[i]) {
                    Some(b) => BlockOffset::new(b.key(), point::inline_len(b)),
                    None => BlockOffset::new(from.block, 0),
                };
            }
            let to = match granularity {
                Granularity::Character => text::previous_grapheme(&s, offset),
                Granularity::Word => text::previous_word(&s, offset),
                Granularity::Line => Some(line_start(&chars, offset)),
            };
            BlockOffset::new(from.block, to.unwrap_or(0))
        }
    }
}

fn step_point(doc: &Document, from: Point, direction: Direction, granularity: Granularity) -> Point {
    point::to_block_offset(doc, from)
        .map(|at| step(doc, at, direction, granularity))
        .and_then(|at| point::to_point(doc, at))
        .unwrap_or(from)
}

/// Move the focus, keeping the anchor. Landing in another cell of the
/// anchor's table turns the selection into a cell selection.
pub fn extend(
    selection: &Selection,
    doc: &Document,
    direction: Direction,
    granularity: Granularity,
) -> Selection {
    match normalize(selection, doc) {
        Selection::Range(range) => {
            let focus = step_point(doc, range.focus, direction, granularity);
            if let Some((table, anchor_cell)) = cell_of(doc, range.anchor.key)
                && let Some((focus_table, focus_cell)) = cell_of(doc, focus.key)
                && table == focus_table
                && anchor_cell != focus_cell
            {
                return Selection::Grid(GridSelection::new(table, anchor_cell, focus_cell));
            }
            Selection::Range(RangeSelection {
                anchor: range.anchor,
                focus,
                format: range.format,
            })
        }
        Selection::Grid(grid) => extend_grid(doc, grid, direction, granularity),
    }
}

fn extend_grid(
    doc: &Document,
    grid: GridSelection,
    direction: Direction,
    granularity: Granularity,
) -> Selection {
    let Some(table) = doc.node(grid.table) else {
        return normalize(&Selection::Grid(grid), doc);
    };
    let map = TableMap::build(table);
    let CellCoord { row, column } = grid.focus;
    let moved = match (direction, granularity) {
        (Direction::Forward, Granularity::Line) => (row + 1 < map.rows()).then(|| (row + 1, column)),
        (Direction::Backward, Granularity::Line) => row.checked_sub(1).map(|r| (r, column)),
        (Direction::Forward, _) => (column + 1 < map.columns()).then(|| (row, column + 1)),
        (Direction::Backward, _) => column.checked_sub(1).map(|c| (row, c)),
    };
    if let Some((row, column)) = moved {
        return Selection::Grid(GridSelection {
            focus: CellCoord::new(row, column),
            ..grid
        });
    }
    leave_table(doc, grid, table, direction).unwrap_or(Selection::Grid(grid))
}

/// Degrade a cell selection to a range that runs from the anchor cell to
/// the first caret position outside the table in `direction`.
fn leave_table(
    doc: &Document,
    grid: GridSelection,
    table: &Node,
    direction: Direction,
) -> Option<Selection> {
    let map = TableMap::build(table);
    let anchor_cell = doc.node(map.cell_at(grid.anchor.row, grid.anchor.column)?)?;
    let inside: Vec<_> = table
        .descendants()
        .filter(|n| n.is_text_block())
        .map(Node::key)
        .collect();
    let blocks = doc.text_blocks();
    let outside = match direction {
        Direction::Forward => {
            let last = blocks.iter().rposition(|b| inside.contains(&b.key()))?;
            blocks.get(last + 1).map(|b| point::point_in_block(b, 0))
        }
        Direction::Backward => {
            let first = blocks.iter().position(|b| inside.contains(&b.key()))?;
            first
                .checked_sub(1)
                .map(|i| point::point_in_block(blocks[i], point::inline_len(blocks[i])))
        }
    }?;
    let anchor_block = anchor_cell.descendants().find(|n| n.is_text_block())?;
    let anchor = match direction {
        Direction::Forward => point::point_in_block(anchor_block, 0),
        Direction::Backward => point::point_in_block(anchor_block, point::inline_len(anchor_block)),
    };
    Some(Selection::range(anchor, outside))
}

/// Collapse and move (plain arrow keys). A non-collapsed range collapses to
/// its edge in `direction` without moving further for character motion.
pub fn move_caret(
    selection: &Selection,
    doc: &Document,
    direction: Direction,
    granularity: Granularity,
) -> Selection {
    let from = match normalize(selection, doc) {
        Selection::Range(range) if !range.is_collapsed() => {
            let (start, end) = range.ordered(doc);
            let edge = match direction {
                Direction::Backward => start,
                Direction::Forward => end,
            };
            if granularity == Granularity::Character {
                return caret_with_format(doc, edge);
            }
            edge
        }
        Selection::Range(range) => range.focus,
        Selection::Grid(grid) => {
            let cell = doc
                .node(grid.table)
                .and_then(|t| TableMap::build(t).cell_at(grid.focus.row, grid.focus.column));
            let block = cell.and_then(|c| doc.node(c)?.descendants().find(|n| n.is_text_block()));
            return match block {
                Some(block) => caret_with_format(doc, point::point_in_block(block, 0)),
                None => Selection::caret(point::document_start(doc)),
            };
        }
    };
    caret_with_format(doc, step_point(doc, from, direction, granularity))
}

fn caret_with_format(doc: &Document, point: Point) -> Selection {
    let format = match doc.node(point.key).map(Node::kind) {
        Some(NodeKind::Text(_)) => format_at(doc, point),
        _ => Default::default(),
    };
    Selection::Range(RangeSelection::caret(point).with_format(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextFormat;
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        Document::new(vec![
            Node::paragraph(vec![
                Node::text("one two"),
                Node::line_break(),
                Node::formatted("three", TextFormat::BOLD),
            ]),
            Node::paragraph_text("four"),
        ])
    }

    fn at(doc: &Document, block: usize, offset: usize) -> BlockOffset {
        BlockOffset::new(doc.text_blocks()[block].key(), offset)
    }

    #[test]
    fn character_steps_cross_blocks() {
        let doc = doc();
        assert_eq!(
            step(&doc, at(&doc, 0, 13), Direction::Forward, Granularity::Character),
            at(&doc, 1, 0)
        );
        assert_eq!(
            step(&doc, at(&doc, 1, 0), Direction::Backward, Granularity::Character),
            at(&doc, 0, 13)
        );
        assert_eq!(
            step(&doc, at(&doc, 1, 4), Direction::Forward, Granularity::Character),
            at(&doc, 1, 4)
        );
    }

    #[test]
    fn word_and_line_steps() {
        let doc = doc();
        assert_eq!(
            step(&doc, at(&doc, 0, 0), Direction::Forward, Granularity::Word),
            at(&doc, 0, 3)
        );
        assert_eq!(
            step(&doc, at(&doc, 0, 2), Direction::Forward, Granularity::Line),
            at(&doc, 0, 7)
        );
        assert_eq!(
            step(&doc, at(&doc, 0, 7), Direction::Forward, Granularity::Line),
            at(&doc, 0, 13)
        );
        assert_eq!(
            step(&doc, at(&doc, 0, 10), Direction::Backward, Granularity::Line),
            at(&doc, 0, 8)
        );
    }

    #[test]
    fn move_caret_collapses_range_to_edge() {
        let doc = doc();
        let leaves = doc.text_leaves();
        let sel = Selection::range(Point::new(leaves[1].key(), 2), Point::new(leaves[0].key(), 1));
        assert_eq!(
            move_caret(&sel, &doc, Direction::Forward, Granularity::Character),
            Selection::Range(
                RangeSelection::caret(Point::new(leaves[1].key(), 2)).with_format(TextFormat::BOLD)
            )
        );
    }

    #[test]
    fn extend_keeps_anchor() {
        let doc = doc();
        let four = doc.text_leaves()[2].key();
        let sel = Selection::caret(Point::new(four, 4));
        let extended = extend(&sel, &doc, Direction::Backward, Granularity::Word);
        assert_eq!(extended, Selection::range(Point::new(four, 4), Point::new(four, 0)));
    }

    fn table_doc() -> Document {
        let cell = |t: &str| Node::table_cell(vec![Node::paragraph_text(t)]);
        Document::new(vec![
            Node::paragraph_text("before"),
            Node::table(vec![
                Node::table_row(vec![cell("a"), cell("b")]),
                Node::table_row(vec![cell("c"), cell("d")]),
            ]),
            Node::paragraph_text("after"),
        ])
    }

    #[test]
    fn extending_into_next_cell_becomes_grid() {
        let doc = table_doc();
        let a = doc.text_leaves()[1].key();
        let table = doc.root().children()[1].key();
        let sel = Selection::caret(Point::new(a, 1));
        let extended = extend(&sel, &doc, Direction::Forward, Granularity::Character);
        assert_eq!(
            extended,
            Selection::Grid(GridSelection::new(
                table,
                CellCoord::new(0, 0),
                CellCoord::new(0, 1)
            ))
        );
        let extended = extend(&extended, &doc, Direction::Forward, Granularity::Line);
        assert_eq!(extended.as_grid().unwrap().focus, CellCoord::new(1, 1));
    }

    #[test]
    fn extending_grid_past_the_edge_degrades() {
        let doc = table_doc();
        let table = doc.root().children()[1].key();
        let after = doc.text_leaves()[5].key();
        let a = doc.text_leaves()[1].key();
        let grid = Selection::Grid(GridSelection::new(
            table,
            CellCoord::new(0, 0),
            CellCoord::new(1, 1),
        ));
        let extended = extend(&grid, &doc, Direction::Forward, Granularity::Character);
        assert_eq!(
            extended,
            Selection::range(Point::new(a, 0), Point::new(after, 0))
        );
    }
}
