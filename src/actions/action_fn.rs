//! # Function-backed actions (`ActionFn`, `AsyncActionFn`)
//!
//! [`ActionFn`] wraps a closure `F: Fn(Context, OnResult) -> Result<(), ActionError>`
//! and follows the callback contract as is.
//!
//! [`AsyncActionFn`] wraps a closure `F: Fn(Context) -> Fut` producing a fresh
//! future per execution. The future is spawned on the current tokio runtime and
//! its output resolves the step:
//! - `Ok(true)` → success, `Ok(false)` → logical failure;
//! - `Err(e)` → failure, `e` handed over as the failure reason;
//! - panic → failure, panic message handed over as the failure reason.
//!
//! The chain writes that reason under [`FAILURE_KEY`](crate::FAILURE_KEY) only
//! while the step is still live.
//!
//! ## Example
//! ```rust
//! use taskchain::{ActionError, ActionFn, ActionRef, AsyncActionFn, Context, OnResult};
//!
//! let sync_step: ActionRef = ActionFn::arc("count", |ctx: Context, done: OnResult| {
//!     ctx.push("seen", 1);
//!     done.success();
//!     Ok(())
//! });
//!
//! let async_step: ActionRef = AsyncActionFn::arc("fetch", |ctx: Context| async move {
//!     ctx.put("body", "ok");
//!     Ok::<_, ActionError>(true)
//! });
//!
//! assert_eq!(sync_step.name(), "count");
//! assert_eq!(async_step.name(), "fetch");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::context::Context;
use crate::error::{panic_message, ActionError};

use super::action::Action;
use super::result::OnResult;

/// Closure-backed action following the callback contract.
#[derive(Debug)]
pub struct ActionFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ActionFn<F>
where
    F: Fn(Context, OnResult) -> Result<(), ActionError> + Send + Sync + 'static,
{
    /// Creates a new closure-backed action.
    ///
    /// Prefer [`ActionFn::arc`] when you immediately need an [`ActionRef`](crate::ActionRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the action and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> Action for ActionFn<F>
where
    F: Fn(Context, OnResult) -> Result<(), ActionError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, ctx: Context, on_result: OnResult) -> Result<(), ActionError> {
        (self.f)(ctx, on_result)
    }
}

/// Future-backed action; the future's output resolves the step.
#[derive(Debug)]
pub struct AsyncActionFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F, Fut> AsyncActionFn<F>
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, ActionError>> + Send + 'static,
{
    /// Creates a new future-backed action.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the action and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut> Action for AsyncActionFn<F>
where
    F: Fn(Context) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<bool, ActionError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    /// Spawns the future on the current tokio runtime.
    ///
    /// # Panics
    /// Panics when executed outside of a tokio runtime.
    fn execute(&self, ctx: Context, on_result: OnResult) -> Result<(), ActionError> {
        let fut = (self.f)(ctx);
        tokio::spawn(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(success)) => on_result.resolve(success),
                Ok(Err(e)) => on_result.fail_with(e.to_string()),
                Err(panic_err) => on_result.fail_with(panic_message(&*panic_err)),
            }
        });
        Ok(())
    }
}
