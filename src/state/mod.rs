//! State modules - change bus, versioned lists, event loop, scroll math.
//!
//! - [`notifier`] - publish/subscribe bus with per-node owner buckets
//! - [`versioned_list`] - shared list with a structural version stamp
//! - [`scheduler`] - virtual-clock event loop for timers and local futures
//! - [`scroll`] - easing for scroll-into-view

pub mod notifier;
pub mod scheduler;
pub mod scroll;
pub mod versioned_list;

pub use notifier::{Notifier, WeakNotifier};
pub use scheduler::{Scheduler, WeakScheduler};
pub use scroll::ScrollOptions;
pub use versioned_list::VersionedList;
