//! # LogWriter: events rendered through `tracing`
//!
//! A minimal subscriber that turns every [`Event`] into a structured `tracing`
//! record. Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO  taskchain: evaluating chain=4
//! DEBUG taskchain: step starting chain=4 step=0 action="load-user"
//! WARN  taskchain: step failed chain=4 step=1 action="charge" reason="card declined"
//! WARN  taskchain: chain failed chain=4 reason="card declined"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let chain = e.chain.unwrap_or_default();
        let action = e.action.as_deref().unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::ChainEvaluating => {
                tracing::info!(target: "taskchain", chain, "evaluating");
            }
            EventKind::StepStarting => {
                tracing::debug!(target: "taskchain", chain, step = e.step, action, "step starting");
            }
            EventKind::StepSucceeded => {
                tracing::debug!(target: "taskchain", chain, step = e.step, action, "step succeeded");
            }
            EventKind::StepFailed => {
                tracing::warn!(target: "taskchain", chain, step = e.step, action, reason, "step failed");
            }
            EventKind::TimeoutHit => {
                tracing::warn!(target: "taskchain", chain, timeout_ms = e.timeout_ms, "timeout hit");
            }
            EventKind::ChainSucceeded => {
                tracing::info!(target: "taskchain", chain, "chain succeeded");
            }
            EventKind::ChainFailed => {
                tracing::warn!(target: "taskchain", chain, reason, "chain failed");
            }
            EventKind::ChainCancelled => {
                tracing::warn!(target: "taskchain", chain, reason, "chain cancelled");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "taskchain", subscriber = e.subscriber.as_deref(), reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "taskchain", subscriber = e.subscriber.as_deref(), reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
