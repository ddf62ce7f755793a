//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by chains and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Chain` (eval, steps, timeout, terminal transitions),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the listener spawned by `ChainFactoryBuilder::build`
//!   (fans out to `SubscriberSet`), or any receiver from [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
