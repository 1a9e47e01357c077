//! Render Pipeline
//!
//! Connects views to a document:
//!
//! ```text
//! View tree -> render (nodes + bindings) -> Notifier fire -> binding writes
//! ```
//!
//! - [`session`] - the document, notifier and scheduler a tree renders against
//! - [`mount`] - render into the body, tick the loop, tear down

pub mod mount;
pub mod session;

pub use mount::{MountHandle, mount, tick, unmount};
pub use session::{Session, WeakSession};
