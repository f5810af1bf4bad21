//! # Document Model
//!
//! The node tree every other module operates on.
//!
//! - [`Node`] / [`NodeKind`]: a tagged tree of blocks and inline runs with
//!   `Arc`-shared children.
//! - [`Document`]: the rooted tree plus its key allocator, queries and the
//!   checked mutation primitives.
//! - [`TableMap`]: span-aware grid view of a table.
//! - [`invariants::check`]: the structural rules a document must satisfy
//!   after every command.
//!
//! Mutations never touch the previous version of a document: the edited
//! path is copied and the rest of the tree stays shared.

pub mod document;
pub mod invariants;
pub mod node;
pub mod table_map;
pub mod text;

use thiserror::Error;

pub use document::Document;
pub use invariants::InvariantViolation;
pub use node::{ListKind, Node, NodeKey, NodeKind, TextFormat, TextRun};
pub use table_map::{CellRect, CellSlot, TableMap};

/// Errors raised by the checked tree primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("node {0} not found")]
    NotFound(NodeKey),

    #[error("{parent} cannot contain {child}")]
    InvalidChild {
        parent: &'static str,
        child: &'static str,
    },

    #[error("index {index} out of bounds for {parent} with {len} children")]
    IndexOutOfBounds {
        parent: NodeKey,
        index: usize,
        len: usize,
    },

    #[error("the root node cannot be removed or replaced")]
    RootMutation,

    #[error("node {0} is not a text node")]
    NotText(NodeKey),

    #[error("list item {0} cannot hold both inline content and a nested list")]
    MixedListItem(NodeKey),

    #[error("key {0} is already in the document")]
    DuplicateKey(NodeKey),
}
