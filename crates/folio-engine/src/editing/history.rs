//! Undo/redo as a log of (document, selection) snapshots.
//!
//! Documents share structure between versions, so an entry costs one
//! `Arc` plus whatever the edit copied.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::transforms::{EditError, Result};
use crate::model::Document;
use crate::selection::Selection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub document: Document,
    pub selection: Selection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    undo: VecDeque<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    limit: usize,
    coalesce_typing: bool,
    /// Caret left by the last coalescable keystroke
    #[serde(skip)]
    typing_caret: Option<Selection>,
}

impl History {
    pub fn new(limit: usize, coalesce_typing: bool) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
            coalesce_typing,
            typing_caret: None,
        }
    }

    /// Record the state before an edit. `typing` marks a single typed
    /// character; such an edit continuing at the caret the previous one left
    /// joins its undo step.
    pub fn record(&mut self, before: HistoryEntry, typing: bool, caret_after: Selection) {
        self.redo.clear();
        let continues = typing
            && self.coalesce_typing
            && self.typing_caret == Some(before.selection)
            && !self.undo.is_empty();
        self.typing_caret = typing.then_some(caret_after);
        if continues || self.limit == 0 {
            return;
        }
        self.undo.push_back(before);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    /// Step back: returns the state to restore and remembers `current` for
    /// redo.
    pub fn undo(&mut self, current: HistoryEntry) -> Result<HistoryEntry> {
        let entry = self.undo.pop_back().ok_or(EditError::EmptyHistory("undo"))?;
        self.redo.push(current);
        self.typing_caret = None;
        Ok(entry)
    }

    pub fn redo(&mut self, current: HistoryEntry) -> Result<HistoryEntry> {
        let entry = self.redo.pop().ok_or(EditError::EmptyHistory("redo"))?;
        self.undo.push_back(current);
        self.typing_caret = None;
        Ok(entry)
    }

    /// Forget the typing run, so the next keystroke starts a new step.
    pub fn break_typing(&mut self) {
        self.typing_caret = None;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Undo entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.undo.iter()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(200, true)
    }
}
