//! # Scheduler contract.
//!
//! ```text
//! Chain::eval ──► run_soon(step) ──► step ──► run_soon(step) ──► ...
//! Chain::timeout ──► set_timer(d, on_timeout) ──► TimerId
//! terminal cleanup ──► cancel_timer(TimerId)
//! ```
//!
//! ## Rules
//! - `run_soon` must never run the job inside the call itself.
//! - A timer callback receives its own [`TimerId`], so the owner can tell a
//!   current timer from a replaced one.
//! - `cancel_timer` returns `true` only if the timer had not fired yet.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Global counter for timer ids.
static TIMER_SEQ: AtomicU64 = AtomicU64::new(1);

/// A unit of work scheduled on the runtime.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A deferred one-shot callback; receives the id of the timer that fired.
pub type TimerFn = Box<dyn FnOnce(TimerId) + Send + 'static>;

/// Shared handle to a scheduler.
pub type SchedulerRef = Arc<dyn Scheduler>;

/// Handle of a pending one-shot timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Allocates a fresh, process-unique timer id.
    pub fn next() -> Self {
        TimerId(TIMER_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Event-loop capability required by chains.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use taskchain::{Scheduler, TokioScheduler};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let sched = TokioScheduler::current();
///     let (tx, rx) = tokio::sync::oneshot::channel();
///     sched.run_soon(Box::new(move || { let _ = tx.send(42); }));
///     assert_eq!(rx.await.unwrap(), 42);
///
///     let id = sched.set_timer(Duration::from_secs(60), Box::new(|_| {}));
///     assert!(sched.cancel_timer(id));
///     assert!(!sched.cancel_timer(id));
/// }
/// ```
pub trait Scheduler: Send + Sync + 'static {
    /// Schedules `job` to run at the next opportunity, never inline.
    fn run_soon(&self, job: Job);

    /// Schedules `f` to run once after `delay`; returns a cancellable handle.
    fn set_timer(&self, delay: Duration, f: TimerFn) -> TimerId;

    /// Cancels a pending timer. Returns whether it was still pending.
    fn cancel_timer(&self, id: TimerId) -> bool;
}
