//! Render session - the document, change bus, and event loop a tree is
//! rendered against.
//!
//! A session is created once per top-level render and lives as long as the
//! tree it rendered. Nothing here is a process global, so independent
//! sessions (and tests) never observe each other.

use crate::engine::{Document, WeakDocument};
use crate::state::{Notifier, Scheduler, WeakNotifier, WeakScheduler};

/// Everything a binding needs to attach itself. Cloning is cheap.
#[derive(Clone, Debug, Default)]
pub struct Session {
    document: Document,
    notifier: Notifier,
    scheduler: Scheduler,
}

/// Non-owning handle to a [`Session`], held by long-lived subscriptions so
/// they do not keep their own session alive.
#[derive(Clone)]
pub struct WeakSession {
    document: WeakDocument,
    notifier: WeakNotifier,
    scheduler: WeakScheduler,
}

impl WeakSession {
    pub fn upgrade(&self) -> Option<Session> {
        Some(Session {
            document: self.document.upgrade()?,
            notifier: self.notifier.upgrade()?,
            scheduler: self.scheduler.upgrade()?,
        })
    }
}

impl Session {
    /// Fresh session over a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Session rendering into an existing document.
    pub fn with_document(document: Document) -> Self {
        Self {
            document,
            notifier: Notifier::new(),
            scheduler: Scheduler::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn downgrade(&self) -> WeakSession {
        WeakSession {
            document: self.document.downgrade(),
            notifier: self.notifier.downgrade(),
            scheduler: self.scheduler.downgrade(),
        }
    }

    /// Shorthand for `notifier().fire()`.
    pub fn fire(&self) {
        self.notifier.fire();
    }
}
