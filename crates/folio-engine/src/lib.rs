/*!
 * # folio-engine
 *
 * The editing core of folio: a persistent rich-text document tree, a
 * selection model over it, pure selection-aware transforms, and the
 * clipboard pipeline that turns foreign HTML into document fragments and
 * back.
 *
 * ## Layers
 *
 * ```text
 *  Cmd ──▶ EditorSession ──▶ transforms ──▶ (Document', Selection') ──▶ Snapshot
 *                │
 *                └── copy/cut ──▶ clipboard::export ──▶ ClipboardData
 *  ClipboardData ──▶ clipboard::import ──▶ Fragment ──▶ insert_fragment
 * ```
 *
 * - [`model`]: nodes, documents, table maps and structural invariants
 * - [`selection`]: range and grid selections, normalization and navigation
 * - [`editing`]: transforms, the `Cmd` dispatcher, history and sessions
 * - [`clipboard`]: import and export of clipboard payloads
 * - [`snapshot`]: render views and the canonical tree dump
 *
 * Nothing in this crate performs I/O; every operation is a synchronous
 * function of its inputs.
 */

pub mod clipboard;
pub mod editing;
pub mod model;
pub mod selection;
pub mod snapshot;

pub use clipboard::{ClipboardData, Fragment};
pub use editing::{Cmd, EditorSession, SessionOptions};
pub use model::{Document, ListKind, Node, NodeKey, NodeKind, TextFormat, TextRun};
pub use selection::{GridSelection, Point, RangeSelection, Selection};
pub use snapshot::{Snapshot, format_nodes, format_tree};
