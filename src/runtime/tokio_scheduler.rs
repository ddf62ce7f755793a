//! # Tokio-backed scheduler.
//!
//! [`TokioScheduler`] maps the [`Scheduler`] contract onto a tokio runtime:
//! - `run_soon` spawns the job as a task (it runs after the caller yields);
//! - `set_timer` spawns a sleep raced against a [`CancellationToken`];
//! - `cancel_timer` cancels the token if the timer is still registered.
//!
//! ```text
//! set_timer(d, f) ──► timers[id] = token ──► spawn(select! {
//!                                               sleep(d)          → timers.remove(id)? → f(id)
//!                                               token.cancelled() → (dropped)
//!                                            })
//! cancel_timer(id) ──► timers.remove(id)? → token.cancel(), true
//! ```
//!
//! A timer removes itself from the table before its callback runs, so a
//! `cancel_timer` racing with the firing returns `false` and the callback runs
//! exactly once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use super::scheduler::{Job, Scheduler, TimerFn, TimerId};

type TimerTable = Arc<Mutex<HashMap<TimerId, CancellationToken>>>;

/// [`Scheduler`] running jobs and timers on a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    handle: Handle,
    timers: TimerTable,
}

impl TokioScheduler {
    /// Creates a scheduler spawning onto the given runtime.
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates a scheduler bound to the runtime of the calling context.
    ///
    /// # Panics
    /// Panics when called outside of a tokio runtime, like [`tokio::spawn`].
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending_timers(&self) -> usize {
        lock(&self.timers).len()
    }
}

impl Scheduler for TokioScheduler {
    fn run_soon(&self, job: Job) {
        self.handle.spawn(async move { job() });
    }

    fn set_timer(&self, delay: Duration, f: TimerFn) -> TimerId {
        let id = TimerId::next();
        let token = CancellationToken::new();
        lock(&self.timers).insert(id, token.clone());

        let timers = Arc::clone(&self.timers);
        self.handle.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let pending = lock(&timers).remove(&id).is_some();
                    if pending {
                        f(id);
                    }
                }
                _ = token.cancelled() => {}
            }
        });
        id
    }

    fn cancel_timer(&self, id: TimerId) -> bool {
        match lock(&self.timers).remove(&id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

fn lock(timers: &TimerTable) -> MutexGuard<'_, HashMap<TimerId, CancellationToken>> {
    timers.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_run_soon_never_runs_inline() {
        let sched = TokioScheduler::current();
        let ran = Arc::new(AtomicBool::new(false));
        let (tx, rx) = oneshot::channel();

        let r = ran.clone();
        sched.run_soon(Box::new(move || {
            r.store(true, Ordering::SeqCst);
            let _ = tx.send(());
        }));
        assert!(!ran.load(Ordering::SeqCst));

        rx.await.unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_with_its_id() {
        let sched = TokioScheduler::current();
        let (tx, rx) = oneshot::channel();

        let id = sched.set_timer(
            Duration::from_millis(500),
            Box::new(move |fired| {
                let _ = tx.send(fired);
            }),
        );
        assert_eq!(sched.pending_timers(), 1);

        assert_eq!(rx.await.unwrap(), id);
        assert_eq!(sched.pending_timers(), 0);
        assert!(!sched.cancel_timer(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let sched = TokioScheduler::current();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        let id = sched.set_timer(
            Duration::from_millis(100),
            Box::new(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert!(sched.cancel_timer(id));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(sched.pending_timers(), 0);
    }
}
