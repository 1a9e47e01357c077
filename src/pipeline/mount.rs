//! Mount API - Render a view into a session's document body.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::pipeline::{mount, tick};
//!
//! let session = Session::new();
//! let handle = mount(&app_view(), &session);
//!
//! // Drive async handlers and timers from the host loop
//! tick(&handle, 16);
//!
//! // Clean up
//! handle.unmount();
//! ```

use tracing::{debug, info};

use super::session::Session;
use crate::primitives::View;
use crate::types::NodeId;

// =============================================================================
// Mount Handle
// =============================================================================

/// Handle to a mounted tree.
///
/// Dropping the handle unmounts the tree.
pub struct MountHandle {
    session: Session,
    root: Option<NodeId>,
}

impl MountHandle {
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Root node of the mounted tree, `None` once unmounted.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn is_mounted(&self) -> bool {
        self.root.is_some()
    }

    /// Tear the tree down.
    ///
    /// This will:
    /// 1. Revoke the subscriptions of every node in the tree
    /// 2. Release the tree
    ///
    /// Other trees mounted on the same session keep their subscriptions.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let Some(root) = self.root.take() else {
            return;
        };

        let document = self.session.document();
        let notifier = self.session.notifier();
        let subtree = document.subtree(root);
        let revoked = notifier.cleanup_all(subtree.iter().copied());
        document.release(root);

        info!(?root, nodes = subtree.len(), revoked, "unmounted");
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

// =============================================================================
// Mount Function
// =============================================================================

/// Render `view` into the session's document body.
pub fn mount(view: &dyn View, session: &Session) -> MountHandle {
    let document = session.document();
    let root = view.render_into(document.body(), session);

    info!(?root, nodes = document.subtree(root).len(), "mounted");
    MountHandle {
        session: session.clone(),
        root: Some(root),
    }
}

/// Unmount and clean up.
pub fn unmount(handle: MountHandle) {
    handle.unmount();
}

// =============================================================================
// Event Loop
// =============================================================================

/// Pump spawned futures and advance the clock by `elapsed_ms`.
///
/// Returns `false` once the handle is unmounted.
pub fn tick(handle: &MountHandle, elapsed_ms: u64) -> bool {
    if !handle.is_mounted() {
        return false;
    }
    let scheduler = handle.session.scheduler();
    scheduler.advance(elapsed_ms);
    debug!(now = scheduler.now(), pending = scheduler.pending_timers(), "tick");
    true
}
