//! # taskchain
//!
//! **Taskchain** composes asynchronous, callback-style actions into chains.
//!
//! A chain is an ordered list of steps sharing one mutable [`Context`]. Steps
//! run one at a time; a step can also be a group of actions running
//! concurrently and rejoined through a countdown [`Latch`]. The chain ends in
//! exactly one of two callbacks: `done` when every step succeeded, `except`
//! on the first failure, error, panic or timeout.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌───────────────────────────────────────────────────────────────┐
//!  │  ChainFactory (scheduler + bus + config)                      │
//!  └──────┬──────────────────────┬──────────────────────┬──────────┘
//!         ▼                      ▼                      ▼
//!   create()               create_serial(..)      create_parallel(..)
//!         └──────────────────────┼──────────────────────┘
//!                                ▼
//!  ┌───────────────────────────────────────────────────────────────┐
//!  │  Chain                                                        │
//!  │  - steps: [Action | all(Action..)]                            │
//!  │  - Context (shared map, "failure" key)                        │
//!  │  - timer (overall timeout), done / except                     │
//!  └──────┬────────────────────────────────────────────────────────┘
//!         │ eval() ─► Scheduler::run_soon(step 0) ─► ... ─► done | except
//!         │
//!         │ Publishes: ChainEvaluating, StepStarting, StepSucceeded,
//!         │            StepFailed, TimeoutHit, ChainSucceeded, ChainFailed
//!         ▼
//!  ┌───────────────────────────────────────────────────────────────┐
//!  │                  Bus (broadcast channel)                      │
//!  └────────────────────────────┬──────────────────────────────────┘
//!                               ▼
//!                      subscriber listener
//!                               ▼
//!                         SubscriberSet
//!                     ┌─────────┼─────────┐
//!                     ▼         ▼         ▼
//!                 worker1   worker2   workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! eval ─► run_soon(step i)
//!           ├─► publish StepStarting
//!           ├─► action.execute(ctx, on_result)
//!           │       ├─ Err / panic      ─► ctx["failure"] = message ─► except
//!           │       ├─ on_result(false) ─► except
//!           │       └─ on_result(true)  ─► more steps? run_soon(step i+1) : done
//!           └─► timer fires first       ─► ctx["failure"] = "timed out" ─► except
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Actions**       | Callback-style units of work, from closures or futures.      | [`Action`], [`ActionFn`], [`AsyncActionFn`] |
//! | **Chains**        | Serial and parallel composition, timeout, terminal callbacks.| [`Chain`], [`Outcome`]                      |
//! | **Factory**       | Chains bound to one scheduler, bus and config.               | [`ChainFactory`], [`ChainFactoryBuilder`]   |
//! | **Latch**         | Reusable "wait for N completions" primitive.                 | [`Latch`]                                   |
//! | **Runtime**       | Event-loop capabilities the chains run on.                   | [`Scheduler`], [`TokioScheduler`]           |
//! | **Subscriber API**| Hook into chain lifecycle events.                            | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors for composition, latches and actions.           | [`ChainError`], [`LatchError`], [`ActionError`] |
//! | **Configuration** | Factory-wide settings.                                       | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] rendering events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use taskchain::{ActionFn, ActionRef, AsyncActionFn, ChainFactory, Config, Context, OnResult};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config { timeout: Duration::from_secs(5), ..Config::default() };
//!     let factory = ChainFactory::builder(cfg).build();
//!
//!     let load: ActionRef = ActionFn::arc("load", |ctx: Context, done: OnResult| {
//!         ctx.put("user", "ada");
//!         done.success();
//!         Ok(())
//!     });
//!     let greet: ActionRef = AsyncActionFn::arc("greet", |ctx: Context| async move {
//!         let user = ctx.get_str("user").unwrap_or_default();
//!         ctx.put("greeting", format!("hello {user}"));
//!         Ok::<_, taskchain::ActionError>(true)
//!     });
//!
//!     let (tx, rx) = tokio::sync::oneshot::channel();
//!     let chain = factory.create_serial(vec![load, greet]);
//!     chain
//!         .done(move |ctx| { let _ = tx.send(ctx.get_str("greeting")); })
//!         .eval()?;
//!
//!     assert_eq!(rx.await?.as_deref(), Some("hello ada"));
//!     Ok(())
//! }
//! ```
mod actions;
mod chain;
mod config;
mod context;
mod error;
mod events;
mod factory;
mod latch;
mod runtime;
mod subscribers;

// ---- Public re-exports ----

pub use actions::{Action, ActionFn, ActionRef, AsyncActionFn, OnResult};
pub use chain::{Chain, Outcome};
pub use config::Config;
pub use context::{Context, FAILURE_KEY};
pub use error::{ActionError, ChainError, LatchError};
pub use events::{Bus, Event, EventKind};
pub use factory::{ChainFactory, ChainFactoryBuilder};
pub use latch::Latch;
pub use runtime::{Job, Scheduler, SchedulerRef, TimerFn, TimerId, TokioScheduler};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
