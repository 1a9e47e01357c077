//! Primitive types - binding sources and the two core contracts.
//!
//! - [`Value`] - a literal or a zero-argument value-producing function
//! - [`Attribute`] - a binding applied to a freshly created node
//! - [`View`] - a reusable node-tree template

use std::fmt;
use std::rc::Rc;

use crate::pipeline::Session;
use crate::types::NodeId;

// =============================================================================
// Value - literal or computed binding source
// =============================================================================

/// Source of a bound property.
///
/// Literal values are written once and never re-evaluated. Computed values
/// are re-evaluated on every notifier fire, and written only when they
/// change.
pub enum Value<T> {
    /// Fixed value (not reactive).
    Literal(T),
    /// Function called at bind time and again on every fire.
    Computed(Rc<dyn Fn() -> T>),
}

impl<T> Value<T> {
    pub fn computed(f: impl Fn() -> T + 'static) -> Self {
        Self::Computed(Rc::new(f))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

impl<T: Clone> Value<T> {
    /// Current value (for immediate reads).
    pub fn get(&self) -> T {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Computed(f) => f(),
        }
    }
}

impl<T: Clone> Clone for Value<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Literal(value) => Self::Literal(value.clone()),
            Self::Computed(f) => Self::Computed(f.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl<T> From<T> for Value<T> {
    fn from(value: T) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for Value<String> {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_owned())
    }
}

/// Build a computed source: `text(computed(move || format!("{n} left")))`.
pub fn computed<T>(f: impl Fn() -> T + 'static) -> Value<T> {
    Value::computed(f)
}

// =============================================================================
// Attribute & View
// =============================================================================

/// A reactive property or event attachment.
///
/// `set` is called exactly once per render of the owning element, after the
/// node is created and before its children render. Each call gets its own
/// cache and subscription, so one attribute value can back many renders.
pub trait Attribute {
    fn set(&self, node: NodeId, session: &Session);
}

/// A composable node-tree template.
pub trait View {
    /// Create this view's node (and subtree), optionally appending it to
    /// `parent`. Returns the created node.
    fn render(&self, parent: NodeId, session: &Session, attach_to_parent: bool) -> NodeId;

    /// `render` with `attach_to_parent = true`.
    fn render_into(&self, parent: NodeId, session: &Session) -> NodeId {
        self.render(parent, session, true)
    }
}

/// Boxed attribute, as stored by elements.
pub type AnyAttribute = Box<dyn Attribute>;

/// Boxed view, as stored by elements and returned by item templates.
pub type AnyView = Box<dyn View>;

impl<V: View + ?Sized> View for Box<V> {
    fn render(&self, parent: NodeId, session: &Session, attach_to_parent: bool) -> NodeId {
        (**self).render(parent, session, attach_to_parent)
    }
}

impl<V: View + ?Sized> View for Rc<V> {
    fn render(&self, parent: NodeId, session: &Session, attach_to_parent: bool) -> NodeId {
        (**self).render(parent, session, attach_to_parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_value_literal_and_computed() {
        let literal: Value<String> = "hello".into();
        assert!(literal.is_literal());
        assert_eq!(literal.get(), "hello");

        let counter = Rc::new(Cell::new(1));
        let source = counter.clone();
        let computed = computed(move || source.get() * 10);
        assert!(!computed.is_literal());
        assert_eq!(computed.get(), 10);
        counter.set(2);
        assert_eq!(computed.get(), 20);
    }

    #[test]
    fn test_value_debug() {
        assert_eq!(format!("{:?}", Value::from(true)), "Literal(true)");
        assert_eq!(format!("{:?}", computed(|| 1)), "Computed(..)");
    }
}
