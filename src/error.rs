//! Error type for the fallible operations of the binding layer.
//!
//! Most failures in the engine are silent no-ops (a binding attached to a node
//! kind that does not support it, a write to a released node). Only indexed
//! list access and explicit tree edits surface an error to the caller.

use thiserror::Error;

use crate::types::NodeId;

/// Errors produced by [`VersionedList`](crate::VersionedList) and
/// [`Document`](crate::Document) tree edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Indexed access past the end of a list.
    #[error("index {index} is out of range for a list of {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    /// The node was released and its handle is no longer valid.
    #[error("node {0:?} is no longer part of the document")]
    StaleNode(NodeId),

    /// `remove_child` was called with a node that is not a child of `parent`.
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// Appending would make a node its own ancestor.
    #[error("appending {child:?} to {parent:?} would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
