//! # Action contract.
//!
//! An [`Action`] is a stateless, reusable unit of work. The same value may be
//! composed into any number of chains, so per-run state belongs in the
//! [`Context`], never in the action.
//!
//! ## Contract
//! ```text
//! execute(ctx, on_result)
//!   ├─ Ok(())  and later on_result.resolve(true)   → step succeeded
//!   ├─ Ok(())  and later on_result.resolve(false)  → chain fails
//!   ├─ Ok(())  and later on_result.fail_with(why)  → chain fails, why recorded in ctx["failure"]
//!   ├─ Err(e)                                      → chain fails, e recorded in ctx["failure"]
//!   └─ panic                                       → chain fails, panic message recorded
//! ```
//! Work may finish synchronously inside `execute`, or the handle may be moved
//! into a spawned future and resolved later.

use std::sync::Arc;

use crate::context::Context;
use crate::error::ActionError;

use super::result::OnResult;

/// Shared handle to an action.
pub type ActionRef = Arc<dyn Action>;

/// # Callback-style unit of work.
///
/// # Example
/// ```
/// use taskchain::{Action, ActionError, Context, OnResult};
///
/// struct Greet;
///
/// impl Action for Greet {
///     fn name(&self) -> &str { "greet" }
///
///     fn execute(&self, ctx: Context, on_result: OnResult) -> Result<(), ActionError> {
///         ctx.put("greeting", "hello");
///         on_result.success();
///         Ok(())
///     }
/// }
/// ```
pub trait Action: Send + Sync + 'static {
    /// Returns a stable, human-readable action name (used in events).
    fn name(&self) -> &str;

    /// Starts the action against the shared context.
    ///
    /// Must eventually resolve `on_result` exactly once, unless it returns `Err`.
    fn execute(&self, ctx: Context, on_result: OnResult) -> Result<(), ActionError>;
}
