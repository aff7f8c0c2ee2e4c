//! Cancellable single-fire watchdog timers.
//!
//! The [`Watchdog`] is the atomic scheduling unit everything above it is
//! built from: round timeouts, host-budget warnings, challenge acceptance
//! windows. All waiting in the scheduler is expressed as a watchdog — no
//! code ever blocks or polls.
//!
//! # Cancellation semantics
//!
//! - `cancel()` guarantees the callback will not subsequently run if it
//!   has not already started. Cancelling a fired or already-cancelled
//!   watchdog is a no-op, never an error.
//! - Re-scheduling is modeled as cancel-then-schedule — see
//!   [`WatchdogSet::schedule`] — never as mutating a live timer.
//! - Dropping a `Watchdog` cancels it, so an owner that is torn down takes
//!   its pending timers with it.
//!
//! A cancellation can still race a callback that is already executing, so
//! consumers keep a last-resort guard (an `ended` flag, a round sequence
//! number) and treat stale callbacks as no-ops.
//!
//! # Integration
//!
//! Timers use the tokio clock, so tests drive them deterministically with
//! `tokio::time::pause()` / `advance()`:
//!
//! ```ignore
//! let dog = Watchdog::notify(Duration::from_secs(30), tx, RoomMsg::RoundTimeout { seq });
//! // ... a correct guess arrives ...
//! dog.cancel(); // the timeout will never be delivered
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

// ---------------------------------------------------------------------------
// Watchdog
// ---------------------------------------------------------------------------

/// A cancellable, single-fire delayed callback.
///
/// Scheduling spawns one tokio task that sleeps for the delay and then
/// runs the callback exactly once. The handle is the only way to cancel.
#[derive(Debug)]
pub struct Watchdog {
    task: JoinHandle<()>,
}

impl Watchdog {
    /// Schedules `f` to run once after `delay`.
    ///
    /// A zero delay fires as soon as the executor is free. (Durations
    /// cannot be negative; zero is the degenerate "fire now" case.)
    pub fn schedule<F>(delay: Duration, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        });
        trace!(delay_ms = delay.as_millis() as u64, "watchdog scheduled");
        Self { task }
    }

    /// Schedules delivery of `msg` on an unbounded channel after `delay`.
    ///
    /// This is how timer events re-enter a room actor's command stream:
    /// the watchdog task does nothing but send, so the event is handled on
    /// the actor's own task in arrival order with every other event for
    /// that room. A closed receiver drops the message silently.
    pub fn notify<M: Send + 'static>(
        delay: Duration,
        tx: mpsc::UnboundedSender<M>,
        msg: M,
    ) -> Self {
        Self::schedule(delay, move || {
            let _ = tx.send(msg);
        })
    }

    /// Cancels the watchdog. No-op if it already fired or was cancelled.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the watchdog has neither fired nor been cancelled yet.
    ///
    /// Advisory only — the answer can be stale by the time it is read.
    pub fn is_pending(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ---------------------------------------------------------------------------
// WatchdogSet
// ---------------------------------------------------------------------------

/// The set of live watchdogs owned by one activity, keyed by timer kind.
///
/// Enforces the cancel-on-supersede rule: scheduling under a key that
/// already holds a live watchdog cancels the old one first. Destroying an
/// activity calls [`cancel_all`](Self::cancel_all) (or just drops the
/// set — drop cancels too).
#[derive(Debug, Default)]
pub struct WatchdogSet<K: Eq + Hash> {
    timers: HashMap<K, Watchdog>,
}

impl<K: Eq + Hash> WatchdogSet<K> {
    pub fn new() -> Self {
        Self {
            timers: HashMap::new(),
        }
    }

    /// Schedules a callback under `key`, cancelling any watchdog already
    /// held under that key.
    pub fn schedule<F>(&mut self, key: K, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // Insert replaces and drops the old watchdog, which aborts it.
        self.timers.insert(key, Watchdog::schedule(delay, f));
    }

    /// Schedules message delivery under `key` (see [`Watchdog::notify`]).
    pub fn notify<M: Send + 'static>(
        &mut self,
        key: K,
        delay: Duration,
        tx: mpsc::UnboundedSender<M>,
        msg: M,
    ) {
        self.timers.insert(key, Watchdog::notify(delay, tx, msg));
    }

    /// Cancels and removes the watchdog under `key`, if any.
    pub fn cancel(&mut self, key: &K) {
        self.timers.remove(key);
    }

    /// Cancels every live watchdog in the set.
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// Whether a watchdog under `key` is still pending.
    pub fn is_pending(&self, key: &K) -> bool {
        self.timers.get(key).is_some_and(Watchdog::is_pending)
    }

    /// Number of keys currently holding a watchdog (fired ones included
    /// until their key is cancelled or superseded).
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
