use serde::{Deserialize, Serialize};

use super::options::SessionOptions;
use super::transforms::{self, BlockType, Edit, EditError, Result};
use crate::clipboard::{self, ClipboardData};
use crate::model::{Document, Node, NodeKey, TextFormat};
use crate::selection::{
    self, CellCoord, Direction, Granularity, GridSelection, Selection, extend, move_caret,
};

/// Every edit the outside world can ask for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Cmd {
    InsertText {
        text: String,
    },
    InsertParagraph,
    InsertLineBreak,
    DeleteBackward {
        granularity: Granularity,
    },
    DeleteForward {
        granularity: Granularity,
    },
    ToggleFormat {
        format: TextFormat,
    },
    ToggleBlock {
        target: BlockType,
    },
    ToggleCodeBlock {
        language: Option<String>,
    },
    Indent,
    Outdent,
    ToggleChecked,
    MoveLine {
        direction: Direction,
    },
    /// Paste a table over the current cell selection
    MergeGrids {
        table: Node,
    },
    InsertTable {
        rows: usize,
        columns: usize,
    },
    InsertHorizontalRule,
    Paste {
        data: ClipboardData,
    },
    Select {
        selection: Selection,
    },
    Extend {
        direction: Direction,
        granularity: Granularity,
    },
    MoveCaret {
        direction: Direction,
        granularity: Granularity,
    },
    SelectAll,
    SelectCells {
        table: NodeKey,
        anchor: CellCoord,
        focus: CellCoord,
    },
    Undo,
    Redo,
}

impl Cmd {
    pub fn name(&self) -> &'static str {
        match self {
            Cmd::InsertText { .. } => "insert_text",
            Cmd::InsertParagraph => "insert_paragraph",
            Cmd::InsertLineBreak => "insert_line_break",
            Cmd::DeleteBackward { .. } => "delete_backward",
            Cmd::DeleteForward { .. } => "delete_forward",
            Cmd::ToggleFormat { .. } => "toggle_format",
            Cmd::ToggleBlock { .. } => "toggle_block",
            Cmd::ToggleCodeBlock { .. } => "toggle_code_block",
            Cmd::Indent => "indent",
            Cmd::Outdent => "outdent",
            Cmd::ToggleChecked => "toggle_checked",
            Cmd::MoveLine { .. } => "move_line",
            Cmd::MergeGrids { .. } => "merge_grids",
            Cmd::InsertTable { .. } => "insert_table",
            Cmd::InsertHorizontalRule => "insert_horizontal_rule",
            Cmd::Paste { .. } => "paste",
            Cmd::Select { .. } => "select",
            Cmd::Extend { .. } => "extend",
            Cmd::MoveCaret { .. } => "move_caret",
            Cmd::SelectAll => "select_all",
            Cmd::SelectCells { .. } => "select_cells",
            Cmd::Undo => "undo",
            Cmd::Redo => "redo",
        }
    }

    /// Commands that only move the selection.
    pub fn is_selection_only(&self) -> bool {
        matches!(
            self,
            Cmd::Select { .. }
                | Cmd::Extend { .. }
                | Cmd::MoveCaret { .. }
                | Cmd::SelectAll
                | Cmd::SelectCells { .. }
        )
    }
}

fn selected(doc: &Document, selection: Selection) -> Edit {
    Edit {
        document: doc.clone(),
        selection: selection::normalize(&selection, doc),
    }
}

/// Run one command against a document and selection.
///
/// History commands need a session and leave everything as it is here;
/// [`EditorSession::apply`](super::EditorSession::apply) handles them.
pub fn apply_command(
    doc: &Document,
    selection: &Selection,
    cmd: &Cmd,
    options: &SessionOptions,
) -> Result<Edit> {
    let selection = &selection::normalize(selection, doc);
    match cmd {
        Cmd::InsertText { text } => transforms::insert_text(doc, selection, text, &options.code),
        Cmd::InsertParagraph => transforms::insert_paragraph(doc, selection, &options.code),
        Cmd::InsertLineBreak => transforms::insert_line_break(doc, selection),
        Cmd::DeleteBackward { granularity } => {
            transforms::delete_backward(doc, selection, *granularity)
        }
        Cmd::DeleteForward { granularity } => {
            transforms::delete_forward(doc, selection, *granularity)
        }
        Cmd::ToggleFormat { format } => transforms::toggle_format(doc, selection, *format),
        Cmd::ToggleBlock { target } => transforms::toggle_block_type(doc, selection, *target),
        Cmd::ToggleCodeBlock { language } => {
            transforms::toggle_code_block(doc, selection, language.clone(), &options.code)
        }
        Cmd::Indent => transforms::indent(doc, selection),
        Cmd::Outdent => transforms::outdent(doc, selection),
        Cmd::ToggleChecked => transforms::toggle_checked(doc, selection),
        Cmd::MoveLine { direction } => transforms::move_line(doc, selection, *direction),
        Cmd::MergeGrids { table } => match selection {
            Selection::Grid(grid) => transforms::merge_grids(doc, grid, table),
            Selection::Range(_) => Err(EditError::Unresolvable),
        },
        Cmd::InsertTable { rows, columns } => {
            transforms::insert_table(doc, selection, *rows, *columns)
        }
        Cmd::InsertHorizontalRule => transforms::insert_horizontal_rule(doc, selection),
        Cmd::Paste { data } => {
            let fragment = clipboard::import::import_clipboard(data, &options.import);
            transforms::insert_fragment(doc, selection, &fragment, &options.code)
        }
        Cmd::Select { selection } => Ok(selected(doc, *selection)),
        Cmd::Extend {
            direction,
            granularity,
        } => Ok(selected(doc, extend(selection, doc, *direction, *granularity))),
        Cmd::MoveCaret {
            direction,
            granularity,
        } => Ok(selected(doc, move_caret(selection, doc, *direction, *granularity))),
        Cmd::SelectAll => Ok(selected(doc, selection::select_all(doc))),
        Cmd::SelectCells {
            table,
            anchor,
            focus,
        } => Ok(selected(
            doc,
            Selection::Grid(GridSelection::new(*table, *anchor, *focus)),
        )),
        Cmd::Undo | Cmd::Redo => Ok(Edit::unchanged(doc, selection)),
    }
}
