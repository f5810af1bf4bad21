use unicode_segmentation::UnicodeSegmentation;

use super::commands::{Cmd, apply_command};
use super::history::{History, HistoryEntry};
use super::options::SessionOptions;
use super::patch::Patch;
use super::transforms::{Edit, Result, delete_selection};
use crate::clipboard::{ClipboardData, export};
use crate::model::{Document, invariants};
use crate::selection::point::document_start;
use crate::selection::{self, Selection};
use crate::snapshot::Snapshot;

/// One editor instance: the current document and selection, undo history
/// and options. All mutation goes through [`EditorSession::apply`].
#[derive(Debug, Clone)]
pub struct EditorSession {
    document: Document,
    selection: Selection,
    history: History,
    options: SessionOptions,
    version: u64,
}

impl EditorSession {
    /// Start editing `document` with the caret at its start.
    pub fn new(document: Document, options: SessionOptions) -> Self {
        let selection = Selection::caret(document_start(&document));
        Self {
            document,
            selection,
            history: History::new(options.history_limit, options.coalesce_typing),
            options,
            version: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Immutable view for rendering.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            document: self.document.clone(),
            selection: self.selection,
            version: self.version,
        }
    }

    fn current(&self) -> HistoryEntry {
        HistoryEntry {
            document: self.document.clone(),
            selection: self.selection,
        }
    }

    /// Apply a command and report what changed.
    ///
    /// Failed commands leave the session untouched. Edits that change the
    /// tree are recorded for undo; selection-only commands are not.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch> {
        log::debug!("apply {} at version {}", cmd.name(), self.version);
        let edit = match &cmd {
            Cmd::Undo => {
                let entry = self.history.undo(self.current())?;
                Edit {
                    document: entry.document,
                    selection: entry.selection,
                }
            }
            Cmd::Redo => {
                let entry = self.history.redo(self.current())?;
                Edit {
                    document: entry.document,
                    selection: entry.selection,
                }
            }
            _ => apply_command(&self.document, &self.selection, &cmd, &self.options)?,
        };

        let tree_changed = edit.document != self.document;
        if !matches!(cmd, Cmd::Undo | Cmd::Redo) {
            if cmd.is_selection_only() || !tree_changed {
                if edit.selection != self.selection {
                    self.history.break_typing();
                }
            } else {
                let typing = matches!(&cmd, Cmd::InsertText { text }
                    if text != "\n" && text.graphemes(true).count() == 1);
                self.history.record(self.current(), typing, edit.selection);
            }
        }
        Ok(self.commit(edit))
    }

    fn commit(&mut self, edit: Edit) -> Patch {
        let patch = Patch::between(&self.document, &edit.document, edit.selection, self.version + 1);
        self.document = edit.document;
        self.selection = edit.selection;
        self.version += 1;
        debug_assert!(
            invariants::check(&self.document).is_ok(),
            "document invariants violated: {:?}",
            invariants::check(&self.document)
        );
        debug_assert_eq!(
            selection::normalize(&self.selection, &self.document),
            self.selection,
            "selection dangles after an edit"
        );
        log::debug!(
            "version {}: {} changed, {} removed",
            patch.version,
            patch.changed.len(),
            patch.removed.len()
        );
        patch
    }

    /// Clipboard payload for the current selection.
    pub fn copy(&self) -> ClipboardData {
        export::export_selection(&self.document, &self.selection)
    }

    /// Copy, then delete the selection as one undo step.
    pub fn cut(&mut self) -> Result<(ClipboardData, Patch)> {
        let data = self.copy();
        let edit = delete_selection(&self.document, &self.selection)?;
        self.history.record(self.current(), false, edit.selection);
        Ok((data, self.commit(edit)))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(Document::default(), SessionOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::transforms::EditError;
    use crate::model::Node;
    use crate::selection::{Direction, Granularity};
    use pretty_assertions::assert_eq;

    fn type_text(session: &mut EditorSession, text: &str) {
        for grapheme in text.graphemes(true) {
            session
                .apply(Cmd::InsertText {
                    text: grapheme.to_string(),
                })
                .unwrap();
        }
    }

    #[test]
    fn typing_coalesces_into_one_undo_step() {
        let mut session = EditorSession::default();
        type_text(&mut session, "hello");
        assert_eq!(session.document().text_content(), "hello");
        session.apply(Cmd::Undo).unwrap();
        assert_eq!(session.document().text_content(), "");
        session.apply(Cmd::Redo).unwrap();
        assert_eq!(session.document().text_content(), "hello");
    }

    #[test]
    fn moving_the_caret_starts_a_new_step() {
        let mut session = EditorSession::default();
        type_text(&mut session, "ab");
        session
            .apply(Cmd::MoveCaret {
                direction: Direction::Backward,
                granularity: Granularity::Character,
            })
            .unwrap();
        type_text(&mut session, "X");
        assert_eq!(session.document().text_content(), "aXb");
        session.apply(Cmd::Undo).unwrap();
        assert_eq!(session.document().text_content(), "ab");
    }

    #[test]
    fn versions_and_patches_advance() {
        let mut session = EditorSession::new(
            Document::new(vec![Node::paragraph_text("x")]),
            SessionOptions::default(),
        );
        let patch = session.apply(Cmd::SelectAll).unwrap();
        assert!(patch.is_selection_only());
        assert_eq!(patch.version, 1);
        let patch = session.apply(Cmd::InsertText { text: "y".into() }).unwrap();
        assert!(!patch.is_selection_only());
        assert_eq!(session.snapshot().version, 2);
        assert_eq!(session.document().text_content(), "y");
    }

    #[test]
    fn undo_without_history_is_an_error() {
        let mut session = EditorSession::default();
        assert_eq!(session.apply(Cmd::Undo), Err(EditError::EmptyHistory("undo")));
        assert_eq!(session.version(), 0);
    }

    #[test]
    fn cut_copies_then_deletes() {
        let mut session = EditorSession::new(
            Document::new(vec![Node::paragraph_text("cut me")]),
            SessionOptions::default(),
        );
        session.apply(Cmd::SelectAll).unwrap();
        let (data, _) = session.cut().unwrap();
        assert_eq!(data.text(), Some("cut me"));
        assert_eq!(session.document().text_content(), "");
        session.apply(Cmd::Undo).unwrap();
        assert_eq!(session.document().text_content(), "cut me");
    }
}
