//! # Task chains.
//!
//! A [`Chain`] runs an ordered list of steps against one shared
//! [`Context`](crate::Context). Each step is an [`Action`](crate::Action), or a
//! parallel group of actions appended with [`Chain::all`].
//!
//! ```text
//!        then(a)      all([b, c])        then(d)
//!   ──► [ step 0 ] ──► [ step 1 ] ──────► [ step 2 ] ──► done(ctx)
//!           │          ├─ b ─┐ latch(2)      │
//!           │          └─ c ─┘               │
//!           └──────── any failure / timeout ─┴──────────► except(ctx)
//! ```
//!
//! ## Components
//! - `handle`: the public [`Chain`] API (composition, `eval`, queries)
//! - `state`: step list, position and [`Outcome`] behind the chain mutex
//! - `inner`: shared core, timers and terminal transitions
//! - `runner`: executes one step and routes its result
//! - `parallel`: the synthetic action behind `all`

mod handle;
mod inner;
mod parallel;
mod runner;
mod state;

pub use handle::Chain;
pub use state::Outcome;
