//! # Mutable chain state.
//!
//! Everything a chain mutates while it runs lives in one [`ChainState`],
//! guarded by a single mutex in the chain handle. Methods here are pure state
//! transitions; they never call user code, the scheduler, or the bus.
//!
//! ```text
//! Running ──finish(Succeeded)──► Succeeded
//!    └─────finish(Failed)─────► Failed
//! ```
//! `finish` succeeds once; every later call returns `None`.

use std::time::Duration;

use crate::actions::ActionRef;
use crate::context::Context;
use crate::error::ChainError;
use crate::runtime::TimerId;

/// Terminal callback registered with `done` / `except`.
pub(crate) type Callback = Box<dyn FnOnce(&Context) + Send + 'static>;

/// Lifecycle position of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Still accepting actions; may or may not have been evaluated.
    Running,
    /// Every action reported success.
    Succeeded,
    /// An action failed, raised, the timer fired, or the chain was cancelled.
    Failed,
}

impl Outcome {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Running)
    }
}

/// Resources released by the terminal transition, handed back for out-of-lock work.
pub(crate) struct Finished {
    pub timer: Option<TimerId>,
    pub callback: Option<Callback>,
}

pub(crate) struct ChainState {
    actions: Vec<ActionRef>,
    pos: usize,
    appended: usize,
    outcome: Outcome,
    pub(crate) timer: Option<(TimerId, Duration)>,
    pub(crate) on_complete: Option<Callback>,
    pub(crate) on_failure: Option<Callback>,
}

impl ChainState {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            pos: 0,
            appended: 0,
            outcome: Outcome::Running,
            timer: None,
            on_complete: None,
            on_failure: None,
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Number of actions ever appended (survives terminal cleanup).
    pub fn appended(&self) -> usize {
        self.appended
    }

    pub fn ensure_running(&self) -> Result<(), ChainError> {
        if self.outcome.is_terminal() {
            return Err(ChainError::Terminal);
        }
        Ok(())
    }

    pub fn append(&mut self, action: ActionRef) -> Result<(), ChainError> {
        self.ensure_running()?;
        self.actions.push(action);
        self.appended += 1;
        Ok(())
    }

    /// Takes the action at the current position and advances past it.
    pub fn next_step(&mut self) -> Option<(usize, ActionRef)> {
        if self.outcome.is_terminal() {
            return None;
        }
        let action = self.actions.get(self.pos).cloned()?;
        let step = self.pos;
        self.pos += 1;
        Some((step, action))
    }

    /// Whether every appended action has been started.
    pub fn exhausted(&self) -> bool {
        self.pos >= self.actions.len()
    }

    /// Enters a terminal state once; later calls return `None`.
    ///
    /// Clears queued actions and hands back the pending timer and the callback
    /// matching `outcome`; the other callback is dropped.
    pub fn finish(&mut self, outcome: Outcome) -> Option<Finished> {
        if self.outcome.is_terminal() || !outcome.is_terminal() {
            return None;
        }
        self.outcome = outcome;
        self.actions.clear();

        let (callback, other) = match outcome {
            Outcome::Succeeded => (self.on_complete.take(), self.on_failure.take()),
            _ => (self.on_failure.take(), self.on_complete.take()),
        };
        drop(other);

        Some(Finished {
            timer: self.timer.take().map(|(id, _)| id),
            callback,
        })
    }
}
