//! Error types used by chains, latches and actions.
//!
//! This module defines three error enums:
//!
//! - [`ChainError`]: usage errors raised by the chain API itself (evaluating twice,
//!   evaluating an empty chain, composing onto a finished chain).
//! - [`LatchError`]: invalid construction or over-completion of a [`Latch`](crate::Latch).
//! - [`ActionError`]: errors an [`Action`](crate::Action) returns synchronously from `execute`.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logs and events.

use std::any::Any;

use thiserror::Error;

/// # Usage errors produced by the chain API.
///
/// These are programmer defects, not runtime events: they are returned
/// immediately from the offending call and never routed to the failure callback.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// `eval` was called on a chain that never had an action appended.
    #[error("cannot eval an empty chain")]
    Empty,

    /// `eval` was called more than once on the same chain.
    #[error("a chain cannot be evaluated more than once")]
    AlreadyEvaluated,

    /// The chain already succeeded or failed; it accepts no more actions or timers.
    #[error("chain has already completed")]
    Terminal,
}

impl ChainError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use taskchain::ChainError;
    ///
    /// assert_eq!(ChainError::AlreadyEvaluated.as_label(), "chain_already_evaluated");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ChainError::Empty => "chain_empty",
            ChainError::AlreadyEvaluated => "chain_already_evaluated",
            ChainError::Terminal => "chain_terminal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ChainError::Empty => "no actions to evaluate".to_string(),
            ChainError::AlreadyEvaluated => "eval already invoked".to_string(),
            ChainError::Terminal => "chain is terminal".to_string(),
        }
    }
}

/// # Errors produced by a [`Latch`](crate::Latch).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LatchError {
    /// The target count must be at least 1.
    #[error("latch count must be greater than 0, got {count}")]
    InvalidCount {
        /// The rejected count.
        count: usize,
    },

    /// `complete` was called after the target had already been reached.
    #[error("latch has already been completed ({count}/{count})")]
    AlreadyCompleted {
        /// The target count that was reached.
        count: usize,
    },
}

impl LatchError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            LatchError::InvalidCount { .. } => "latch_invalid_count",
            LatchError::AlreadyCompleted { .. } => "latch_already_completed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            LatchError::InvalidCount { count } => format!("invalid count: {count}"),
            LatchError::AlreadyCompleted { count } => format!("already completed: {count}"),
        }
    }
}

/// # Errors returned synchronously by an action.
///
/// Returning one of these from [`Action::execute`](crate::Action::execute) fails the
/// current step immediately; the error's `Display` text is recorded under
/// [`FAILURE_KEY`](crate::FAILURE_KEY) in the chain context.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ActionError {
    /// Action could not run.
    #[error("action failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// A latch used by the action was misused or misconfigured.
    #[error(transparent)]
    Latch(#[from] LatchError),
}

impl ActionError {
    /// Convenience constructor for [`ActionError::Fail`].
    ///
    /// # Example
    /// ```
    /// use taskchain::ActionError;
    ///
    /// let err = ActionError::fail("connection refused");
    /// assert_eq!(err.to_string(), "action failed: connection refused");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        ActionError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            ActionError::Fail { .. } => "action_failed",
            ActionError::Latch(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ActionError::Fail { error } => format!("error: {error}"),
            ActionError::Latch(e) => e.as_message(),
        }
    }
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
