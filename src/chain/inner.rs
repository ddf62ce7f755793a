//! # Shared chain core and terminal transitions.
//!
//! [`Inner`] is what every handle, result callback, scheduled step and timer of
//! one chain points at. All terminal transitions go through [`Inner::settle`]:
//!
//! ```text
//! lock ─► ChainState::finish(outcome) ─► unlock
//!                 │ (first caller only)
//!                 ▼
//!         cancel pending timer ─► record reason in ctx["failure"]
//!                 ─► publish ChainSucceeded / ChainFailed / ChainCancelled
//!                 ─► run done / except callback
//! ```
//!
//! ## Rules
//! - The state lock is never held while user code (actions, callbacks) runs.
//! - Exactly one caller wins `finish`; losers do nothing.
//! - A timer only fails the chain if it is still the chain's current timer.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::context::{Context, FAILURE_KEY};
use crate::events::{Bus, Event, EventKind};
use crate::runtime::{SchedulerRef, TimerId};

use super::state::{ChainState, Finished, Outcome};

/// Global counter for chain ids.
static CHAIN_SEQ: AtomicU64 = AtomicU64::new(1);

/// How a chain ended; decides the recorded reason and the published event.
pub(crate) enum Terminal {
    Succeeded,
    /// Reason is written to the context unless `keep_existing` and a reason is already there.
    Failed {
        reason: String,
        keep_existing: bool,
    },
    Cancelled {
        reason: String,
    },
}

pub(crate) struct Inner {
    pub(crate) id: u64,
    pub(crate) scheduler: SchedulerRef,
    pub(crate) bus: Bus,
    pub(crate) ctx: Context,
    pub(crate) evaluated: AtomicBool,
    state: Mutex<ChainState>,
}

impl Inner {
    pub fn new(scheduler: SchedulerRef, bus: Bus) -> Self {
        Self {
            id: CHAIN_SEQ.fetch_add(1, Ordering::Relaxed),
            scheduler,
            bus,
            ctx: Context::new(),
            evaluated: AtomicBool::new(false),
            state: Mutex::new(ChainState::new()),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn publish(&self, ev: Event) {
        self.bus.publish(ev.with_chain(self.id));
    }

    /// Queues the next step on the scheduler.
    pub fn schedule_step(self: &Arc<Self>) {
        let chain = Arc::clone(self);
        self.scheduler.run_soon(Box::new(move || chain.run_step()));
    }

    /// Installs a timer, replacing (and cancelling) any previous one.
    ///
    /// Called with the state lock held by the caller.
    pub fn arm_timer(self: &Arc<Self>, st: &mut ChainState, after: Duration) {
        if let Some((old, _)) = st.timer.take() {
            self.scheduler.cancel_timer(old);
        }
        let chain = Arc::clone(self);
        let id = self
            .scheduler
            .set_timer(after, Box::new(move |fired| chain.on_timeout(fired)));
        st.timer = Some((id, after));
    }

    /// Fails the chain if `fired` is still its current timer.
    pub fn on_timeout(&self, fired: TimerId) {
        let (finished, after) = {
            let mut st = self.lock();
            match st.timer {
                Some((current, after)) if current == fired => {
                    st.timer = None;
                    match st.finish(Outcome::Failed) {
                        Some(finished) => (finished, after),
                        None => return,
                    }
                }
                _ => {
                    tracing::debug!(chain = self.id, timer = %fired, "ignoring stale timer");
                    return;
                }
            }
        };

        self.publish(Event::new(EventKind::TimeoutHit).with_timeout(after));
        self.settle(
            finished,
            Terminal::Failed {
                reason: format!("chain timed out after {after:?}"),
                keep_existing: false,
            },
        );
    }

    /// Fails the chain unless it already reached a terminal state.
    pub fn fail(&self, reason: String, keep_existing: bool) {
        let finished = self.lock().finish(Outcome::Failed);
        if let Some(finished) = finished {
            self.settle(
                finished,
                Terminal::Failed {
                    reason,
                    keep_existing,
                },
            );
        }
    }

    /// Post-lock half of a terminal transition.
    pub fn settle(&self, finished: Finished, terminal: Terminal) {
        if let Some(timer) = finished.timer {
            self.scheduler.cancel_timer(timer);
        }

        match terminal {
            Terminal::Succeeded => {
                self.publish(Event::new(EventKind::ChainSucceeded));
            }
            Terminal::Failed {
                reason,
                keep_existing,
            } => {
                let reason = self.record_failure(reason, keep_existing);
                self.publish(Event::new(EventKind::ChainFailed).with_reason(reason));
            }
            Terminal::Cancelled { reason } => {
                let reason = self.record_failure(reason, false);
                self.publish(Event::new(EventKind::ChainCancelled).with_reason(reason));
            }
        }

        if let Some(callback) = finished.callback {
            callback(&self.ctx);
        }
    }

    fn record_failure(&self, reason: String, keep_existing: bool) -> String {
        if keep_existing {
            if let Some(existing) = self.ctx.failure() {
                return existing;
            }
        }
        self.ctx.put(FAILURE_KEY, reason.clone());
        reason
    }
}
