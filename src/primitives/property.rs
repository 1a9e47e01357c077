//! Property bindings - reactive writes to node properties.
//!
//! Every property binding follows the same protocol:
//! 1. Skip silently if the node's kind lacks the property's capability
//! 2. Literal source: write once, never subscribe
//! 3. Computed source: evaluate, cache, write, then subscribe under the node;
//!    on each fire re-evaluate and write only when the value changed
//!
//! The cache lives in the subscription closure, so each render of an element
//! gets its own. Subscriptions hold a weak document handle and do nothing
//! once the document is gone.
//!
//! Focus and scroll-into-view are special cases and live here too.

use std::cell::RefCell;
use std::fmt;

use tracing::trace;

use super::types::{AnyAttribute, Attribute, Value};
use crate::engine::Document;
use crate::pipeline::Session;
use crate::state::ScrollOptions;
use crate::state::scroll::scroll_steps;
use crate::types::{BoolProp, Caps, NodeId, StringProp};

// =============================================================================
// Property Trait
// =============================================================================

/// A writable node property.
pub trait Property: Copy + fmt::Debug + 'static {
    type Value: Clone + PartialEq + 'static;

    /// Capability the node must have for the property to apply.
    fn required_caps(self) -> Caps;

    fn write(self, document: &Document, node: NodeId, value: &Self::Value) -> bool;
}

impl Property for StringProp {
    type Value = String;

    fn required_caps(self) -> Caps {
        StringProp::required_caps(self)
    }

    fn write(self, document: &Document, node: NodeId, value: &String) -> bool {
        document.set_string(node, self, value)
    }
}

impl Property for BoolProp {
    type Value = bool;

    fn required_caps(self) -> Caps {
        BoolProp::required_caps(self)
    }

    fn write(self, document: &Document, node: NodeId, value: &bool) -> bool {
        document.set_flag(node, self, *value)
    }
}

// =============================================================================
// Property Binding
// =============================================================================

/// Binds a [`Value`] to a node property.
pub struct PropertyBinding<P: Property> {
    property: P,
    source: Value<P::Value>,
}

impl<P: Property> PropertyBinding<P> {
    pub fn new(property: P, source: Value<P::Value>) -> Self {
        Self { property, source }
    }
}

impl<P: Property> Attribute for PropertyBinding<P> {
    fn set(&self, node: NodeId, session: &Session) {
        let document = session.document();
        let property = self.property;

        if !document.caps(node).contains(property.required_caps()) {
            trace!(?node, ?property, "binding skipped, node kind lacks the property");
            return;
        }

        let compute = match &self.source {
            Value::Literal(value) => {
                property.write(document, node, value);
                return;
            }
            Value::Computed(compute) => compute.clone(),
        };

        let initial = compute();
        property.write(document, node, &initial);

        let cached = RefCell::new(initial);
        let document = document.downgrade();
        session.notifier().subscribe(node, move || {
            let next = compute();
            if *cached.borrow() == next {
                return;
            }
            cached.replace(next.clone());

            if let Some(document) = document.upgrade() {
                property.write(&document, node, &next);
            }
        });
    }
}

// =============================================================================
// Focus
// =============================================================================

/// Focuses the node while its source is true.
///
/// A computed source is checked on every fire: whenever it is true and the
/// node is not the active element, focus is taken back, even if the value
/// itself did not change.
pub struct FocusBinding {
    source: Value<bool>,
}

impl Attribute for FocusBinding {
    fn set(&self, node: NodeId, session: &Session) {
        let document = session.document();

        let compute = match &self.source {
            Value::Literal(wanted) => {
                if *wanted {
                    document.focus(node);
                }
                return;
            }
            Value::Computed(compute) => compute.clone(),
        };

        if compute() {
            document.focus(node);
        }

        let document = document.downgrade();
        session.notifier().subscribe(node, move || {
            let wanted = compute();
            let Some(document) = document.upgrade() else {
                return;
            };
            if wanted && document.active_element() != Some(node) {
                document.focus(node);
            }
        });
    }
}

// =============================================================================
// Scroll Into View
// =============================================================================

/// One-shot effect: once the node is attached, ease its parent's scroll
/// position so the node comes into view. Never subscribes.
pub struct ScrollIntoView {
    options: ScrollOptions,
}

impl Attribute for ScrollIntoView {
    fn set(&self, node: NodeId, session: &Session) {
        let options = self.options;
        let attached = session.document().when_attached(node);
        let weak = session.downgrade();

        session.scheduler().spawn(async move {
            if !attached.await {
                trace!(?node, "node released before attaching, scroll skipped");
                return;
            }

            let Some(session) = weak.upgrade() else {
                return;
            };
            let document = session.document();
            let Some(parent) = document.parent(node) else {
                return;
            };
            let start = document.scroll_top(parent);
            let target = document.offset_top(node) - options.margin;
            drop(session);

            for (i, position) in scroll_steps(start, target, options).enumerate() {
                if i > 0 {
                    let Some(session) = weak.upgrade() else {
                        return;
                    };
                    let tick = session.scheduler().delay(options.step_ms);
                    drop(session);
                    tick.await;
                }

                let Some(session) = weak.upgrade() else {
                    return;
                };
                if !session.document().set_scroll_top(parent, position) {
                    return;
                }
            }
        });
    }
}

// =============================================================================
// Factories
// =============================================================================

fn string_binding(property: StringProp, source: impl Into<Value<String>>) -> AnyAttribute {
    Box::new(PropertyBinding::new(property, source.into()))
}

fn flag_binding(property: BoolProp, source: impl Into<Value<bool>>) -> AnyAttribute {
    Box::new(PropertyBinding::new(property, source.into()))
}

/// Node text content.
pub fn text(source: impl Into<Value<String>>) -> AnyAttribute {
    string_binding(StringProp::TextContent, source)
}

pub fn title(source: impl Into<Value<String>>) -> AnyAttribute {
    string_binding(StringProp::Title, source)
}

pub fn class_name(source: impl Into<Value<String>>) -> AnyAttribute {
    string_binding(StringProp::ClassName, source)
}

/// Anchor-like nodes only.
pub fn href(source: impl Into<Value<String>>) -> AnyAttribute {
    string_binding(StringProp::Href, source)
}

/// Form-control value (button, input, option, select, textarea).
pub fn value(source: impl Into<Value<String>>) -> AnyAttribute {
    string_binding(StringProp::Value, source)
}

/// Label nodes only.
pub fn html_for(source: impl Into<Value<String>>) -> AnyAttribute {
    string_binding(StringProp::HtmlFor, source)
}

/// Input and textarea nodes only.
pub fn placeholder(source: impl Into<Value<String>>) -> AnyAttribute {
    string_binding(StringProp::Placeholder, source)
}

/// Form controls only.
pub fn disabled(source: impl Into<Value<bool>>) -> AnyAttribute {
    flag_binding(BoolProp::Disabled, source)
}

/// Input nodes only.
pub fn checked(source: impl Into<Value<bool>>) -> AnyAttribute {
    flag_binding(BoolProp::Checked, source)
}

pub fn focus(source: impl Into<Value<bool>>) -> AnyAttribute {
    Box::new(FocusBinding {
        source: source.into(),
    })
}

pub fn scroll_into_view() -> AnyAttribute {
    scroll_into_view_with(ScrollOptions::default())
}

pub fn scroll_into_view_with(options: ScrollOptions) -> AnyAttribute {
    Box::new(ScrollIntoView { options })
}
