//! # Chain handle.
//!
//! [`Chain`] is the public, cloneable handle to one orchestrated sequence of
//! actions. All clones drive the same chain.
//!
//! ## Lifecycle
//! ```text
//! Chain::new / ChainFactory::create
//!   └─► then / all / all_in_order / timeout / done / except   (any time before terminal)
//!   └─► eval ──► run_soon(step 0) ──► ... ──► Succeeded | Failed
//! ```
//!
//! ## Rules
//! - `eval` runs at most once and never executes an action inline.
//! - Composition stays legal until the chain is terminal, including after `eval`.
//! - Exactly one of `done` / `except` fires, at most once.

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::actions::ActionRef;
use crate::context::Context;
use crate::error::ChainError;
use crate::events::{Bus, Event, EventKind};
use crate::runtime::SchedulerRef;

use super::inner::{Inner, Terminal};
use super::parallel::AllAction;
use super::state::Outcome;

/// Ordered chain of asynchronous actions sharing one [`Context`].
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use taskchain::{ActionFn, ActionRef, Bus, Chain, Context, OnResult, TokioScheduler};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), taskchain::ChainError> {
///     let step = |n: i64| -> ActionRef {
///         ActionFn::arc(format!("push-{n}"), move |ctx: Context, done: OnResult| {
///             ctx.push("seen", n);
///             done.success();
///             Ok(())
///         })
///     };
///
///     let (tx, rx) = tokio::sync::oneshot::channel();
///     let chain = Chain::new(Arc::new(TokioScheduler::current()), Bus::new(16));
///     chain
///         .then(step(1))?
///         .all(vec![step(2), step(3)])?
///         .done(move |ctx| { let _ = tx.send(ctx.get("seen")); })
///         .eval()?;
///
///     let seen = rx.await.unwrap().unwrap();
///     assert_eq!(seen.as_array().unwrap().len(), 3);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Chain {
    inner: Arc<Inner>,
}

impl Chain {
    /// Creates an empty chain running on `scheduler` and publishing to `bus`.
    pub fn new(scheduler: SchedulerRef, bus: Bus) -> Self {
        Self {
            inner: Arc::new(Inner::new(scheduler, bus)),
        }
    }

    /// Appends one action.
    pub fn then(&self, action: ActionRef) -> Result<&Self, ChainError> {
        self.inner.lock().append(action)?;
        Ok(self)
    }

    /// Appends each action as its own serial step.
    pub fn all_in_order<I>(&self, actions: I) -> Result<&Self, ChainError>
    where
        I: IntoIterator<Item = ActionRef>,
    {
        for action in actions {
            self.then(action)?;
        }
        Ok(self)
    }

    /// Appends one step running every action concurrently.
    ///
    /// The step fails on the first member reporting failure and succeeds once
    /// all members succeeded. Members still running after a failure are not
    /// cancelled; their results are ignored.
    pub fn all<I>(&self, actions: I) -> Result<&Self, ChainError>
    where
        I: IntoIterator<Item = ActionRef>,
    {
        let group = AllAction::new(actions.into_iter().collect());
        self.then(Arc::new(group))
    }

    /// Installs (or replaces) the overall timeout.
    ///
    /// When it fires before the chain finishes, the chain fails with a
    /// "timed out" reason under [`FAILURE_KEY`](crate::FAILURE_KEY).
    pub fn timeout(&self, after: Duration) -> Result<&Self, ChainError> {
        let mut st = self.inner.lock();
        st.ensure_running()?;
        self.inner.arm_timer(&mut st, after);
        Ok(self)
    }

    /// Registers the failure callback, replacing any previous one.
    pub fn except<F>(&self, on_failure: F) -> &Self
    where
        F: FnOnce(&Context) + Send + 'static,
    {
        self.inner.lock().on_failure = Some(Box::new(on_failure));
        self
    }

    /// Registers the success callback, replacing any previous one.
    pub fn done<F>(&self, on_complete: F) -> &Self
    where
        F: FnOnce(&Context) + Send + 'static,
    {
        self.inner.lock().on_complete = Some(Box::new(on_complete));
        self
    }

    /// Starts the chain.
    ///
    /// Fails with [`ChainError::Empty`] if no action was ever appended, with
    /// [`ChainError::AlreadyEvaluated`] on every call after the first, and with
    /// [`ChainError::Terminal`] if the chain ended before it was evaluated
    /// (cancelled, or its timeout fired). The first step is scheduled on the
    /// runtime; nothing runs before this call returns.
    pub fn eval(&self) -> Result<&Self, ChainError> {
        {
            let st = self.inner.lock();
            if st.appended() == 0 {
                return Err(ChainError::Empty);
            }
            if self.is_evaluated() {
                return Err(ChainError::AlreadyEvaluated);
            }
            st.ensure_running()?;
            self.inner.evaluated.store(true, Ordering::Release);
        }

        self.inner.publish(Event::new(EventKind::ChainEvaluating));
        self.inner.schedule_step();
        Ok(self)
    }

    /// Aborts the chain: fails it with `reason` and runs the failure callback.
    ///
    /// Returns [`ChainError::Terminal`] if the chain already finished.
    pub fn cancel(&self, reason: impl Into<String>) -> Result<(), ChainError> {
        let finished = self
            .inner
            .lock()
            .finish(Outcome::Failed)
            .ok_or(ChainError::Terminal)?;
        self.inner.settle(
            finished,
            Terminal::Cancelled {
                reason: reason.into(),
            },
        );
        Ok(())
    }

    /// `false` only once the chain has failed; `true` while running.
    pub fn succeeded(&self) -> bool {
        self.outcome() != Outcome::Failed
    }

    /// `true` once the chain succeeded or failed.
    pub fn completed(&self) -> bool {
        self.outcome().is_terminal()
    }

    /// `true` only if no action was ever appended.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().appended() == 0
    }

    /// `true` once `eval` has been accepted.
    pub fn is_evaluated(&self) -> bool {
        self.inner.evaluated.load(Ordering::Acquire)
    }

    /// Current lifecycle position.
    pub fn outcome(&self) -> Outcome {
        self.inner.lock().outcome()
    }

    /// The context shared by every action of this chain.
    pub fn context(&self) -> &Context {
        &self.inner.ctx
    }

    /// Process-unique id, as found in [`Event::chain`](crate::Event::chain).
    pub fn id(&self) -> u64 {
        self.inner.id
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("id", &self.inner.id)
            .field("outcome", &self.outcome())
            .field("evaluated", &self.is_evaluated())
            .finish_non_exhaustive()
    }
}
