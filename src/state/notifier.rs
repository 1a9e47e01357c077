//! Notifier - The change bus every dynamic binding listens to.
//!
//! A notifier carries a single zero-payload signal: "something may have
//! changed, re-evaluate". Bindings subscribe under the node they are bound to
//! (the owner), so that a whole node's subscriptions can be revoked at once
//! when the node leaves the tree.
//!
//! # API
//!
//! - `fire()` - Run every live subscriber, in registration order
//! - `subscribe(owner, handler)` - Register a handler under `owner`
//! - `cleanup(owner)` - Revoke everything registered under `owner`
//!
//! # Re-entrancy
//!
//! `fire()` works on a snapshot of the subscriber list and holds no borrow
//! while handlers run. A handler may subscribe, clean up, or fire again.
//! Subscribers revoked mid-fire are skipped; subscribers added mid-fire run
//! from the next `fire()` on.
//!
//! # Example
//!
//! ```ignore
//! let notifier = Notifier::new();
//! notifier.subscribe(node, move || refresh_label());
//!
//! notifier.fire();          // refresh_label runs
//! notifier.cleanup(node);   // revoked
//! notifier.fire();          // nothing runs
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::types::NodeId;

// =============================================================================
// TYPES
// =============================================================================

struct Subscriber {
    handler: Box<dyn Fn()>,
    closed: Cell<bool>,
}

#[derive(Default)]
struct Subscribers {
    /// Live subscribers in registration order.
    active: Vec<Rc<Subscriber>>,
    /// Owner buckets for bulk revocation.
    owners: HashMap<NodeId, Vec<Rc<Subscriber>>>,
    fired: u64,
}

/// Per-session change bus. Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct Notifier {
    inner: Rc<RefCell<Subscribers>>,
}

/// Non-owning handle to a [`Notifier`].
#[derive(Clone)]
pub struct WeakNotifier {
    inner: Weak<RefCell<Subscribers>>,
}

impl WeakNotifier {
    pub fn upgrade(&self) -> Option<Notifier> {
        self.inner.upgrade().map(|inner| Notifier { inner })
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Notifier")
                .field("subscribers", &inner.active.len())
                .field("owners", &inner.owners.len())
                .field("fired", &inner.fired)
                .finish(),
            Err(_) => f.write_str("Notifier { <borrowed> }"),
        }
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downgrade(&self) -> WeakNotifier {
        WeakNotifier {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Notify every current subscriber.
    pub fn fire(&self) {
        let snapshot = {
            let mut inner = self.inner.borrow_mut();
            inner.fired += 1;
            inner.active.clone()
        };

        trace!(subscribers = snapshot.len(), "fire");
        for subscriber in snapshot {
            if !subscriber.closed.get() {
                (subscriber.handler)();
            }
        }
    }

    /// Register `handler` to run on every future `fire()` until `owner` is
    /// cleaned up.
    pub fn subscribe(&self, owner: NodeId, handler: impl Fn() + 'static) {
        let subscriber = Rc::new(Subscriber {
            handler: Box::new(handler),
            closed: Cell::new(false),
        });

        let mut inner = self.inner.borrow_mut();
        inner.active.push(subscriber.clone());
        inner.owners.entry(owner).or_default().push(subscriber);
    }

    /// Revoke every subscription registered under `owner` and forget the
    /// owner. Returns how many subscriptions were revoked; 0 if `owner` had
    /// none.
    pub fn cleanup(&self, owner: NodeId) -> usize {
        self.cleanup_all([owner])
    }

    /// `cleanup` for many owners at once, compacting the subscriber list a
    /// single time. Returns the total number of revoked subscriptions.
    pub fn cleanup_all(&self, owners: impl IntoIterator<Item = NodeId>) -> usize {
        let buckets: Vec<Vec<Rc<Subscriber>>> = {
            let mut inner = self.inner.borrow_mut();
            let buckets: Vec<_> = owners
                .into_iter()
                .filter_map(|owner| inner.owners.remove(&owner))
                .collect();
            for subscriber in buckets.iter().flatten() {
                subscriber.closed.set(true);
            }
            if !buckets.is_empty() {
                inner.active.retain(|subscriber| !subscriber.closed.get());
            }
            buckets
        };

        let revoked: usize = buckets.iter().map(Vec::len).sum();
        if revoked > 0 {
            trace!(owners = buckets.len(), revoked, "cleanup");
        }
        // Handlers are dropped outside the borrow
        revoked
    }

    /// Revoke every subscription on this bus.
    pub fn clear(&self) {
        let dropped = {
            let mut inner = self.inner.borrow_mut();
            for subscriber in &inner.active {
                subscriber.closed.set(true);
            }
            inner.owners.clear();
            std::mem::take(&mut inner.active)
        };
        // Handlers are dropped outside the borrow
        drop(dropped);
    }

    /// Live subscriptions registered under `owner`.
    pub fn subscriber_count(&self, owner: NodeId) -> usize {
        self.inner
            .borrow()
            .owners
            .get(&owner)
            .map_or(0, Vec::len)
    }

    pub fn has_owner(&self, owner: NodeId) -> bool {
        self.inner.borrow().owners.contains_key(&owner)
    }

    pub fn total_subscribers(&self) -> usize {
        self.inner.borrow().active.len()
    }

    /// How many times `fire()` has been called.
    pub fn fire_count(&self) -> u64 {
        self.inner.borrow().fired
    }
}
