//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for reacting to chain events
//! (logging, metrics, audit trails) without touching the chains themselves.
//!
//! Each subscriber registered with a [`ChainFactory`](crate::ChainFactory) gets its
//! own bounded queue and worker task inside [`SubscriberSet`](crate::SubscriberSet):
//! ```text
//! SubscriberSet ──► [bounded queue] ──► worker task ──► subscriber.on_event()
//!                                    └─► panic caught → EventKind::SubscriberPanicked
//! ```
//!
//! ## Rules
//! - Events are handled one at a time, in queue order, per subscriber.
//! - A full queue drops the event for that subscriber only and publishes
//!   `EventKind::SubscriberOverflow`.
//! - Chains never wait for subscribers.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use taskchain::{Subscribe, Event, EventKind};
//!
//! struct Metrics;
//!
//! #[async_trait]
//! impl Subscribe for Metrics {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::StepFailed) {
//!             // export a metric, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "metrics" }
//!     fn queue_capacity(&self) -> usize { 2048 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for chain observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; a panic is caught but the event is lost.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event on the subscriber's worker task.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`; override it with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity (clamped to a minimum of 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
