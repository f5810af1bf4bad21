/*!
 * # Editing Core
 *
 * The command layer between the outside world and the document.
 *
 * ## Architecture Overview
 *
 * ### 1. Persistent documents
 * - A [`Document`](crate::model::Document) is an immutable value; every
 *   edit produces the next version by copying only the edited path
 * - Undo history is a list of (document, selection) snapshots, cheap
 *   because untouched subtrees are shared
 *
 * ### 2. Command-based editing
 * - All edits are expressed as [`Cmd`]s
 * - [`apply_command`] maps a command onto a pure transform from
 *   [`transforms`]; the same inputs always give the same output, keys
 *   included
 *
 * ### 3. Explicit sessions
 * - [`EditorSession`] owns the current document, selection, history and
 *   options. There is no global "active editor"
 * - Every applied command returns a [`Patch`] naming the changed nodes,
 *   the removed keys and the new selection
 * - In debug builds the session checks the document invariants after each
 *   command
 *
 * ## Module Structure
 *
 * - **`transforms`**: selection-aware structural operations
 * - **`commands`**: the `Cmd` enum and its dispatch
 * - **`session`**: `EditorSession`
 * - **`history`**: bounded undo/redo with typing coalescing
 * - **`patch`**: edit result metadata
 * - **`options`**: tunables for code blocks, history and import
 *
 * ## Usage Pattern
 *
 * ```rust
 * use folio_engine::editing::{Cmd, EditorSession};
 *
 * let mut session = EditorSession::default();
 * session.apply(Cmd::InsertText { text: "# ".to_string() }).unwrap();
 * let patch = session.apply(Cmd::InsertText { text: "Title".to_string() }).unwrap();
 * assert_eq!(patch.version, session.version());
 *
 * let snapshot = session.snapshot();
 * assert_eq!(snapshot.document.text_content(), "Title");
 * ```
 */

pub mod commands;
pub mod history;
pub mod options;
pub mod patch;
pub mod session;
pub mod transforms;

pub use commands::{Cmd, apply_command};
pub use history::{History, HistoryEntry};
pub use options::{CodeOptions, SessionOptions};
pub use patch::Patch;
pub use session::EditorSession;
pub use transforms::{BlockType, Edit, EditError};
