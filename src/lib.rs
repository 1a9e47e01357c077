//! # spark-dom
//!
//! Reactive view binding for a headless, DOM-like document.
//!
//! ## Architecture
//!
//! Views are inert templates. Rendering one creates nodes in a [`Document`]
//! arena and applies each element's attributes to the new node. An attribute
//! is either a literal (written once) or a computed value that subscribes to
//! the session [`Notifier`] under the node it is bound to.
//!
//! Nothing tracks dependencies. Event handlers fire the notifier after they
//! run, and every computed binding re-evaluates, writing to the document only
//! when its value changed:
//!
//! ```text
//! event -> handler mutates state -> Notifier::fire -> bindings re-evaluate -> writes
//! ```
//!
//! Lists render through [`template`] over a [`VersionedList`]; the region is
//! rebuilt whenever the list's identity or version changes.
//!
//! ## Modules
//!
//! - [`types`] - Node handles, node kinds and capabilities, events
//! - [`engine`] - Node registry and the document
//! - [`state`] - Notifier, versioned lists, scheduler, scroll easing
//! - [`primitives`] - Elements and bindings
//! - [`pipeline`] - Sessions and mounting
//! - [`error`] - Error type

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod primitives;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{Error, Result};

pub use engine::{Document, Listener, WeakDocument};

pub use state::{Notifier, Scheduler, ScrollOptions, VersionedList, WeakNotifier, WeakScheduler};

pub use pipeline::{MountHandle, Session, WeakSession, mount, tick, unmount};

pub use primitives::{
    // Core contracts
    AnyAttribute, AnyView, Attribute, Element, ListBinding, Value, View, computed,
    // Elements
    a, button, check_box, div, footer, h1, header, img, label, li, p, password_box, section,
    span, strong, text_area, text_box, ul,
    // Property bindings
    checked, class_name, disabled, focus, href, html_for, placeholder, scroll_into_view,
    scroll_into_view_with, text, title, value,
    // Event bindings
    on_blur, on_check_changed, on_click, on_click_async, on_double_click, on_key_down,
    on_key_up, on_key_up_async, on_text_changed,
    // Lists
    template,
};
