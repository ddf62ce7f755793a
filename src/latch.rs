//! # Countdown latch.
//!
//! [`Latch`] waits for `count` completion signals and then runs its completion
//! action, exactly once. It is reusable: [`Latch::reset`] (and friends) rearm it,
//! optionally with a new target or a new action.
//!
//! ## Rules
//! - `count >= 1` (enforced at construction and on every reset)
//! - the action fires synchronously inside the `complete` call that reaches the target
//! - completing past the target is an error, never a silent re-fire
//! - `complete` is a single compare-and-increment, safe to call from several threads
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use taskchain::Latch;
//!
//! let fired = Arc::new(AtomicUsize::new(0));
//! let f = fired.clone();
//! let latch = Latch::new(2, move || { f.fetch_add(1, Ordering::SeqCst); }).unwrap();
//!
//! latch.complete().unwrap();
//! assert_eq!(fired.load(Ordering::SeqCst), 0);
//! latch.complete().unwrap();
//! assert_eq!(fired.load(Ordering::SeqCst), 1);
//! assert!(latch.complete().is_err());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::LatchError;

type OnComplete = Box<dyn Fn() + Send + Sync + 'static>;

/// Reusable "wait for N events" primitive.
pub struct Latch {
    count: usize,
    current: AtomicUsize,
    on_complete: OnComplete,
}

impl Latch {
    /// Creates a latch that fires `on_complete` after `count` calls to [`complete`](Self::complete).
    ///
    /// Fails with [`LatchError::InvalidCount`] if `count` is zero.
    pub fn new<F>(count: usize, on_complete: F) -> Result<Self, LatchError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        validate(count)?;
        Ok(Self {
            count,
            current: AtomicUsize::new(0),
            on_complete: Box::new(on_complete),
        })
    }

    /// Signals that one event has completed.
    ///
    /// Runs the completion action when this call brings the counter to the target.
    /// Returns [`LatchError::AlreadyCompleted`] if the target was already reached
    /// since construction or the last reset.
    pub fn complete(&self) -> Result<(), LatchError> {
        let count = self.count;
        let prev = self
            .current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                (cur < count).then_some(cur + 1)
            })
            .map_err(|_| LatchError::AlreadyCompleted { count })?;

        if prev + 1 == count {
            (self.on_complete)();
        }
        Ok(())
    }

    /// Rearms the latch with the current target and action.
    pub fn reset(&mut self) {
        *self.current.get_mut() = 0;
    }

    /// Rearms the latch with a new target, keeping the current action.
    pub fn reset_to(&mut self, count: usize) -> Result<(), LatchError> {
        validate(count)?;
        self.count = count;
        *self.current.get_mut() = 0;
        Ok(())
    }

    /// Rearms the latch with a new target and a new completion action.
    pub fn reset_with<F>(&mut self, count: usize, on_complete: F) -> Result<(), LatchError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        validate(count)?;
        self.count = count;
        self.on_complete = Box::new(on_complete);
        *self.current.get_mut() = 0;
        Ok(())
    }

    /// Target number of completions.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Completions observed since construction or the last reset.
    pub fn current(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    /// Whether the target has been reached.
    pub fn is_completed(&self) -> bool {
        self.current() == self.count
    }
}

impl fmt::Debug for Latch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Latch")
            .field("count", &self.count)
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}

fn validate(count: usize) -> Result<(), LatchError> {
    if count < 1 {
        return Err(LatchError::InvalidCount { count });
    }
    Ok(())
}
