//! Control Flow - List rendering over a [`VersionedList`].
//!
//! [`template`] binds a node's children to a list: one rendered item view per
//! element, or a placeholder when the list is empty.
//!
//! # Pattern: Identity + Version
//!
//! There is no keyed diffing. The binding remembers the list it rendered
//! (by identity) and that list's version. On every notifier fire it
//! re-resolves the source, and when either differs the whole region is
//! rebuilt:
//! 1. Every rendered child's subtree has its subscriptions revoked
//! 2. The child is detached and released
//! 3. Items render in list order (or the placeholder if there are none)
//!
//! # Literal sources render once
//!
//! `template(list, ..)` with a plain list renders the list as it is at bind
//! time and never subscribes, so later mutations are not shown. Pass a
//! computed source (`computed(move || list.clone())`) for a live region.
//!
//! ```ignore
//! let todos: VersionedList<Todo> = VersionedList::new();
//! let source = todos.clone();
//! ul(
//!     vec![template(
//!         computed(move || source.clone()),
//!         |todo: &Todo| li(vec![text(todo.title.clone())], vec![]),
//!         Some(p(vec![text("Nothing to do")], vec![])),
//!     )],
//!     vec![],
//! )
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use super::types::{AnyAttribute, AnyView, Attribute, Value, View};
use crate::pipeline::Session;
use crate::state::VersionedList;
use crate::types::NodeId;

/// Per-item view factory.
pub type ItemTemplate<T> = Rc<dyn Fn(&T) -> AnyView>;

/// Renders a list's items as the bound node's children.
pub struct ListBinding<T> {
    source: Value<VersionedList<T>>,
    item_template: ItemTemplate<T>,
    placeholder: Option<Rc<dyn View>>,
}

impl<T> ListBinding<T> {
    pub fn new(
        source: Value<VersionedList<T>>,
        item_template: impl Fn(&T) -> AnyView + 'static,
        placeholder: Option<AnyView>,
    ) -> Self {
        Self {
            source,
            item_template: Rc::new(item_template),
            placeholder: placeholder.map(Rc::<dyn View>::from),
        }
    }
}

impl<T: Clone + 'static> Attribute for ListBinding<T> {
    fn set(&self, node: NodeId, session: &Session) {
        let compute = match &self.source {
            Value::Literal(list) => {
                load(node, session, list, &self.item_template, self.placeholder.as_ref());
                return;
            }
            Value::Computed(compute) => compute.clone(),
        };

        let list = compute();
        let cached = RefCell::new((list.clone(), list.version()));
        load(node, session, &list, &self.item_template, self.placeholder.as_ref());

        let weak = session.downgrade();
        let item_template = self.item_template.clone();
        let placeholder = self.placeholder.clone();
        session.notifier().subscribe(node, move || {
            let Some(session) = weak.upgrade() else {
                return;
            };
            if !session.document().is_alive(node) {
                return;
            }

            let next = compute();
            let version = next.version();
            let unchanged = {
                let cached = cached.borrow();
                cached.0.ptr_eq(&next) && cached.1 == version
            };
            if unchanged {
                return;
            }
            cached.replace((next.clone(), version));
            load(node, &session, &next, &item_template, placeholder.as_ref());
        });
    }
}

/// Replace every child of `node` with the rendered items of `list`.
fn load<T: Clone>(
    node: NodeId,
    session: &Session,
    list: &VersionedList<T>,
    item_template: &ItemTemplate<T>,
    placeholder: Option<&Rc<dyn View>>,
) {
    let document = session.document();
    let notifier = session.notifier();

    let mut removed = 0;
    while let Some(child) = document.first_child(node) {
        notifier.cleanup_all(document.subtree(child));
        document.release(child);
        removed += 1;
    }

    // Templates may read the list; render from a snapshot.
    let items = list.snapshot();
    for item in &items {
        item_template(item).render(node, session, true);
    }
    if items.is_empty() {
        if let Some(placeholder) = placeholder {
            placeholder.render(node, session, true);
        }
    }

    debug!(
        ?node,
        removed,
        items = items.len(),
        version = list.version(),
        "list reload"
    );
}

/// Bind the node's children to `source`, rendering `item_template(item)` per
/// item, or `placeholder` while the list is empty.
pub fn template<T: Clone + 'static>(
    source: impl Into<Value<VersionedList<T>>>,
    item_template: impl Fn(&T) -> AnyView + 'static,
    placeholder: Option<AnyView>,
) -> AnyAttribute {
    Box::new(ListBinding::new(source.into(), item_template, placeholder))
}
