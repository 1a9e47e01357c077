//! Element - the node-tree template every constructor builds.
//!
//! An element is a node-creation function, attributes, and children. It is
//! inert until rendered; every render produces a fresh node subtree with its
//! own binding state, so the same element can be rendered any number of
//! times.
//!
//! # Render order
//!
//! 1. Create the node
//! 2. Apply attributes in list order (initial writes, subscriptions)
//! 3. Render children into the node (children always attach)
//! 4. Append the node to `parent` if asked to
//!
//! # Example
//!
//! ```ignore
//! let view = div(vec![class_name("todo")], vec![
//!     label(vec![text(computed(move || title.borrow().clone()))], vec![]),
//!     button(vec![class_name("destroy"), on_click(move |_| remove())], vec![]),
//! ]);
//! let node = view.render_into(session.document().body(), &session);
//! ```

use std::rc::Rc;

use tracing::warn;

use super::types::{AnyAttribute, AnyView, View};
use crate::engine::Document;
use crate::pipeline::Session;
use crate::types::{InputType, NodeId, NodeKind};

/// Node-creation function of an [`Element`].
pub type Creator = Rc<dyn Fn(&Document) -> NodeId>;

/// Generic element template.
pub struct Element {
    creator: Creator,
    attributes: Vec<AnyAttribute>,
    children: Vec<AnyView>,
}

impl Element {
    /// Element whose nodes come from `creator`.
    pub fn new(
        creator: impl Fn(&Document) -> NodeId + 'static,
        attributes: Vec<AnyAttribute>,
        children: Vec<AnyView>,
    ) -> Self {
        Self {
            creator: Rc::new(creator),
            attributes,
            children,
        }
    }

    /// Element creating plain nodes of `kind`.
    pub fn of_kind(kind: NodeKind, attributes: Vec<AnyAttribute>, children: Vec<AnyView>) -> Self {
        Self::new(move |document| document.create_element(kind), attributes, children)
    }

    pub fn boxed(self) -> AnyView {
        Box::new(self)
    }
}

impl View for Element {
    fn render(&self, parent: NodeId, session: &Session, attach_to_parent: bool) -> NodeId {
        let document = session.document();
        let node = (self.creator)(document);

        for attribute in &self.attributes {
            attribute.set(node, session);
        }

        for child in &self.children {
            child.render(node, session, true);
        }

        if attach_to_parent {
            if let Err(err) = document.append_child(parent, node) {
                warn!(?parent, ?node, %err, "rendered node could not be attached");
            }
        }

        node
    }
}

// =============================================================================
// Constructors
// =============================================================================

macro_rules! container_elements {
    ($($(#[$meta:meta])* $name:ident => $kind:expr;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(attributes: Vec<AnyAttribute>, children: Vec<AnyView>) -> AnyView {
                Element::of_kind($kind, attributes, children).boxed()
            }
        )*
    };
}

container_elements! {
    div => NodeKind::Div;
    section => NodeKind::Section;
    header => NodeKind::Header;
    footer => NodeKind::Footer;
    p => NodeKind::P;
    h1 => NodeKind::H1;
    span => NodeKind::Span;
    strong => NodeKind::Strong;
    ul => NodeKind::Ul;
    li => NodeKind::Li;
    /// Anchor. Accepts `href`.
    a => NodeKind::A;
    /// Accepts `html_for`.
    label => NodeKind::Label;
    /// Accepts `disabled` and `value`.
    button => NodeKind::Button;
}

pub fn img(attributes: Vec<AnyAttribute>) -> AnyView {
    Element::of_kind(NodeKind::Img, attributes, Vec::new()).boxed()
}

/// Single-line text input.
pub fn text_box(attributes: Vec<AnyAttribute>) -> AnyView {
    Element::of_kind(NodeKind::Input(InputType::Text), attributes, Vec::new()).boxed()
}

pub fn password_box(attributes: Vec<AnyAttribute>) -> AnyView {
    Element::of_kind(NodeKind::Input(InputType::Password), attributes, Vec::new()).boxed()
}

pub fn check_box(attributes: Vec<AnyAttribute>) -> AnyView {
    Element::of_kind(NodeKind::Input(InputType::Checkbox), attributes, Vec::new()).boxed()
}

pub fn text_area(attributes: Vec<AnyAttribute>) -> AnyView {
    Element::of_kind(NodeKind::TextArea, attributes, Vec::new()).boxed()
}
