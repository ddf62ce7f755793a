//! # Action abstractions.
//!
//! This module provides the unit-of-work types a chain is composed of:
//! - [`Action`] - trait for a callback-style unit of work
//! - [`ActionRef`] - shared reference to an action (`Arc<dyn Action>`)
//! - [`OnResult`] - single-use result handle passed to every execution
//! - [`ActionFn`] - closure-backed action following the callback contract
//! - [`AsyncActionFn`] - future-backed action, resolved from the future's output

mod action;
mod action_fn;
mod result;

pub use action::{Action, ActionRef};
pub use action_fn::{ActionFn, AsyncActionFn};
pub use result::OnResult;
