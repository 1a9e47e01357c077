//! Scheduler - Single-threaded event loop with a virtual clock.
//!
//! The binding layer is cooperative: nothing runs in parallel, and the only
//! suspension points are async event handlers, the scroll-into-view task and
//! consumer code. This module provides what those need:
//! - `set_timeout(ms, f)` - one-shot delayed callback
//! - `delay(ms)` - future resolving after `ms`
//! - `spawn(fut)` - run a local future on the loop
//! - `run_task(...)` - deferred task with a cancel predicate, fires the notifier
//!
//! Time is virtual. The host drives it with [`Scheduler::advance`], which
//! runs due timers in deadline order (FIFO on ties) and pumps spawned futures
//! after each one. [`Scheduler::run_until_stalled`] pumps futures without
//! moving the clock.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use tracing::{trace, warn};

use super::notifier::Notifier;

type Timer = Box<dyn FnOnce()>;

struct Clock {
    now: u64,
    next_seq: u64,
    /// Keyed by (deadline, sequence) so equal deadlines keep insertion order.
    timers: BTreeMap<(u64, u64), Timer>,
}

struct SchedulerState {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    clock: RefCell<Clock>,
}

/// Handle to the session event loop. Cloning is cheap.
#[derive(Clone)]
pub struct Scheduler {
    state: Rc<SchedulerState>,
}

/// Non-owning handle to a [`Scheduler`].
#[derive(Clone)]
pub struct WeakScheduler {
    state: Weak<SchedulerState>,
}

impl WeakScheduler {
    pub fn upgrade(&self) -> Option<Scheduler> {
        self.state.upgrade().map(|state| Scheduler { state })
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now())
            .field("pending_timers", &self.pending_timers())
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            state: Rc::new(SchedulerState {
                pool: RefCell::new(pool),
                spawner,
                clock: RefCell::new(Clock {
                    now: 0,
                    next_seq: 0,
                    timers: BTreeMap::new(),
                }),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakScheduler {
        WeakScheduler {
            state: Rc::downgrade(&self.state),
        }
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.state.clock.borrow().now
    }

    pub fn pending_timers(&self) -> usize {
        self.state.clock.borrow().timers.len()
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Run `callback` once, `delay_ms` after the current virtual time.
    pub fn set_timeout(&self, delay_ms: u64, callback: impl FnOnce() + 'static) {
        let mut clock = self.state.clock.borrow_mut();
        let deadline = clock.now + delay_ms;
        let seq = clock.next_seq;
        clock.next_seq += 1;
        clock.timers.insert((deadline, seq), Box::new(callback));
    }

    /// Resolves after `delay_ms` of virtual time.
    pub fn delay(&self, delay_ms: u64) -> impl Future<Output = ()> + use<> {
        let (tx, rx) = oneshot::channel();
        self.set_timeout(delay_ms, move || {
            let _ = tx.send(());
        });
        async move {
            let _ = rx.await;
        }
    }

    /// After `timeout_ms`, run `task` and fire `notifier`, unless
    /// `should_cancel` returns true at that moment.
    pub fn run_task(
        &self,
        notifier: &Notifier,
        timeout_ms: u64,
        task: impl FnOnce() + 'static,
        should_cancel: impl Fn() -> bool + 'static,
    ) {
        let notifier = notifier.clone();
        self.set_timeout(timeout_ms, move || {
            if should_cancel() {
                trace!("deferred task cancelled");
                return;
            }
            task();
            notifier.fire();
        });
    }

    // =========================================================================
    // Futures
    // =========================================================================

    /// Queue `future` on the loop. It first runs on the next pump.
    pub fn spawn(&self, future: impl Future<Output = ()> + 'static) -> bool {
        match self.state.spawner.spawn_local(future) {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "failed to spawn task");
                false
            }
        }
    }

    /// Poll spawned futures until none can make progress. Returns `false`
    /// when called from inside a running pump (nested pumps are skipped).
    pub fn run_until_stalled(&self) -> bool {
        let Ok(mut pool) = self.state.pool.try_borrow_mut() else {
            trace!("nested pump skipped");
            return false;
        };
        pool.run_until_stalled();
        true
    }

    /// Move the clock forward by `ms`, running every timer that falls due
    /// and pumping futures after each.
    pub fn advance(&self, ms: u64) {
        let target = self.now() + ms;
        self.run_until_stalled();

        loop {
            let due = {
                let mut clock = self.state.clock.borrow_mut();
                let ready = clock
                    .timers
                    .first_key_value()
                    .is_some_and(|(&(deadline, _), _)| deadline <= target);
                if ready {
                    clock.timers.pop_first().map(|((deadline, _), timer)| {
                        clock.now = deadline;
                        timer
                    })
                } else {
                    None
                }
            };
            let Some(timer) = due else {
                break;
            };
            timer();
            self.run_until_stalled();
        }

        let mut clock = self.state.clock.borrow_mut();
        clock.now = clock.now.max(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use crate::types::NodeKind;
    use std::cell::Cell;

    #[test]
    fn test_timers_run_in_deadline_order() {
        let scheduler = Scheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for (delay, tag) in [(30, "c"), (10, "a"), (10, "b"), (50, "late")] {
            let order = order.clone();
            scheduler.set_timeout(delay, move || order.borrow_mut().push(tag));
        }

        scheduler.advance(30);
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
        assert_eq!(scheduler.now(), 30);
        assert_eq!(scheduler.pending_timers(), 1);

        scheduler.advance(20);
        assert_eq!(order.borrow().last(), Some(&"late"));
    }

    #[test]
    fn test_timer_scheduled_from_timer() {
        let scheduler = Scheduler::new();
        let hits = Rc::new(Cell::new(0));

        let inner = scheduler.clone();
        let counter = hits.clone();
        scheduler.set_timeout(10, move || {
            counter.set(counter.get() + 1);
            let counter = counter.clone();
            inner.set_timeout(10, move || counter.set(counter.get() + 1));
        });

        scheduler.advance(15);
        assert_eq!(hits.get(), 1);
        scheduler.advance(5);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_spawned_future_waits_for_delay() {
        let scheduler = Scheduler::new();
        let done = Rc::new(Cell::new(false));

        let flag = done.clone();
        let sleep = scheduler.delay(100);
        scheduler.spawn(async move {
            sleep.await;
            flag.set(true);
        });

        scheduler.run_until_stalled();
        assert!(!done.get());
        scheduler.advance(99);
        assert!(!done.get());
        scheduler.advance(1);
        assert!(done.get());
    }

    #[test]
    fn test_delay_outlives_handle() {
        let scheduler = Scheduler::new();
        let done = Rc::new(Cell::new(false));

        let wait = {
            let handle = scheduler.clone();
            handle.delay(10)
        };
        let flag = done.clone();
        scheduler.spawn(async move {
            wait.await;
            flag.set(true);
        });

        scheduler.advance(10);
        assert!(done.get());
    }

    #[test]
    fn test_run_task_fires_notifier() {
        let scheduler = Scheduler::new();
        let notifier = Notifier::new();
        let ran = Rc::new(Cell::new(false));

        let flag = ran.clone();
        scheduler.run_task(&notifier, 50, move || flag.set(true), || false);

        scheduler.advance(50);
        assert!(ran.get());
        assert_eq!(notifier.fire_count(), 1);
    }

    #[test]
    fn test_run_task_cancelled() {
        let scheduler = Scheduler::new();
        let notifier = Notifier::new();
        let doc = Document::new();
        let owner = doc.create_element(NodeKind::Div);
        let cancelled = Rc::new(Cell::new(false));
        let ran = Rc::new(Cell::new(false));

        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        notifier.subscribe(owner, move || counter.set(counter.get() + 1));

        let flag = ran.clone();
        let cancel = cancelled.clone();
        scheduler.run_task(&notifier, 10, move || flag.set(true), move || cancel.get());
        cancelled.set(true);

        scheduler.advance(10);
        assert!(!ran.get());
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_nested_pump_is_skipped() {
        let scheduler = Scheduler::new();
        let nested = Rc::new(Cell::new(None));

        let inner = scheduler.clone();
        let result = nested.clone();
        scheduler.spawn(async move {
            result.set(Some(inner.run_until_stalled()));
        });

        assert!(scheduler.run_until_stalled());
        assert_eq!(nested.get(), Some(false));
    }
}
