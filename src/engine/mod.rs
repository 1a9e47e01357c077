//! DOM Engine - Node arena and headless document.
//!
//! The engine manages the host-side data structures:
//! - Registry: generation-checked slot allocation, free index pool
//! - Document: nodes, properties, focus, listeners, attach signals
//!
//! # Architecture
//!
//! Nodes are NOT objects. They are handles into an arena:
//!
//! ```text
//! n0v0: body  (parent=-,    children=[n1v0])
//! n1v0: ul    (parent=n0v0, children=[n2v0, n3v1], class="todo-list")
//! n2v0: li    (parent=n1v0, text="first")
//! n3v1: li    (parent=n1v0, text="second")   <- slot 3 reused once
//! ```
//!
//! Bindings key their subscriptions by these handles, so releasing a node
//! makes every stale write a cheap no-op instead of a dangling reference.

mod document;
mod registry;

pub use document::*;
