//! # Single-use result handle.
//!
//! Every execution of an [`Action`](crate::Action) receives an [`OnResult`].
//! Resolving it consumes it, so an action cannot report twice.
//!
//! Dropping the handle without resolving it is the same as never calling back:
//! the chain keeps waiting, bounded only by its timeout.
//!
//! A failure can carry a reason ([`OnResult::fail_with`]). The chain records it
//! under [`FAILURE_KEY`](crate::FAILURE_KEY) only if the step is still live, so a
//! straggler reporting after a timeout or cancel leaves the context untouched.

use std::fmt;

type ResultFn = Box<dyn FnOnce(bool, Option<String>) + Send + 'static>;

/// One-shot callback collecting the outcome of one action execution.
pub struct OnResult {
    f: ResultFn,
}

impl OnResult {
    /// Wraps a callback receiving the success flag.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(bool) + Send + 'static,
    {
        Self {
            f: Box::new(move |success, _reason| f(success)),
        }
    }

    /// Wraps a callback receiving the success flag and the failure reason, if any.
    pub(crate) fn with_reason<F>(f: F) -> Self
    where
        F: FnOnce(bool, Option<String>) + Send + 'static,
    {
        Self { f: Box::new(f) }
    }

    /// Reports the outcome: `true` for success, `false` for logical failure.
    pub fn resolve(self, success: bool) {
        (self.f)(success, None)
    }

    /// Shorthand for `resolve(true)`.
    pub fn success(self) {
        self.resolve(true)
    }

    /// Shorthand for `resolve(false)`.
    pub fn failure(self) {
        self.resolve(false)
    }

    /// Reports a failure together with its reason.
    pub fn fail_with(self, reason: impl Into<String>) {
        (self.f)(false, Some(reason.into()))
    }

    /// Forwards an outcome received from another handle.
    pub(crate) fn forward(self, success: bool, reason: Option<String>) {
        (self.f)(success, reason)
    }
}

impl fmt::Debug for OnResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnResult").finish_non_exhaustive()
    }
}
