//! Scheduling runtime the chains run on.
//!
//! A chain needs exactly three capabilities from its event loop, captured by the
//! [`Scheduler`] trait:
//! - run a unit of work "soon" (next tick, never inline);
//! - schedule a one-shot callback after a delay;
//! - cancel such a callback while it is still pending.
//!
//! [`TokioScheduler`] implements it on top of a tokio runtime handle.

mod scheduler;
mod tokio_scheduler;

pub use self::scheduler::{Job, Scheduler, SchedulerRef, TimerFn, TimerId};
pub use self::tokio_scheduler::TokioScheduler;
