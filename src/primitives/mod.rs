//! Primitives - Element templates and the bindings applied to them.
//!
//! - [`types`] - `Value`, `Attribute`, `View`
//! - [`element`] - generic element and the tag constructors
//! - [`property`] - property, focus and scroll-into-view bindings
//! - [`events`] - sync and async event bindings
//! - [`control_flow`] - list-template binding
//!
//! # Reactivity
//!
//! Attribute sources can be:
//! - Literal values: `class_name("todo")`, written once
//! - Computed: `class_name(computed(move || ...))`, re-evaluated on every fire
//!
//! Pass the closure, not its current result. A value read before binding is
//! a literal and never updates:
//!
//! ```ignore
//! // CORRECT - re-evaluated on every fire
//! text(computed(move || format!("{} left", todos.count())))
//!
//! // WRONG - frozen at bind time
//! text(format!("{} left", todos.count()))
//! ```

pub mod control_flow;
pub mod element;
pub mod events;
pub mod property;
pub mod types;

pub use control_flow::{ListBinding, template};
pub use element::*;
pub use events::*;
pub use property::*;
pub use types::*;
