//! # Lifecycle events emitted by chains.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Chain events**: evaluation start and terminal outcomes (succeeded, failed, cancelled)
//! - **Step events**: per-action flow (starting, succeeded, failed, timeout)
//! - **Subscriber events**: fan-out health (overflow, panic)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, chain id,
//! step index, action name and failure reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskchain::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::StepFailed)
//!     .with_chain(3)
//!     .with_step(1)
//!     .with_action("fetch-user")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::StepFailed);
//! assert_eq!(ev.action.as_deref(), Some("fetch-user"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Chain events ===
    /// `eval` accepted; the first step is scheduled.
    ///
    /// Sets:
    /// - `chain`: chain id
    ChainEvaluating,

    /// Every action reported success; `done` callback about to run.
    ///
    /// Sets:
    /// - `chain`: chain id
    ChainSucceeded,

    /// Chain failed (false result, error, panic or timeout); `except` callback about to run.
    ///
    /// Sets:
    /// - `chain`: chain id
    /// - `reason`: recorded failure reason
    ChainFailed,

    /// Chain was aborted by its caller.
    ///
    /// Sets:
    /// - `chain`: chain id
    /// - `reason`: caller-supplied reason
    ChainCancelled,

    // === Step events ===
    /// A step is about to execute its action.
    ///
    /// Sets:
    /// - `chain`: chain id
    /// - `step`: step index (0-based)
    /// - `action`: action name
    StepStarting,

    /// A step's action reported success.
    ///
    /// Sets:
    /// - `chain`, `step`, `action`
    StepSucceeded,

    /// A step's action reported failure, returned an error or panicked.
    ///
    /// Sets:
    /// - `chain`, `step`, `action`
    /// - `reason`: error or panic message (absent for a plain `false` result)
    StepFailed,

    /// The chain timer fired before the chain finished.
    ///
    /// Sets:
    /// - `chain`: chain id
    /// - `timeout_ms`: configured timeout (ms)
    TimeoutHit,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Id of the chain that emitted the event.
    pub chain: Option<u64>,
    /// Step index within the chain (0-based).
    pub step: Option<u32>,
    /// Name of the action executing in the step.
    pub action: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Chain timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Name of the subscriber, for subscriber events.
    pub subscriber: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            chain: None,
            step: None,
            action: None,
            reason: None,
            timeout_ms: None,
            subscriber: None,
        }
    }

    /// Attaches a chain id.
    #[inline]
    pub fn with_chain(mut self, id: u64) -> Self {
        self.chain = Some(id);
        self
    }

    /// Attaches a step index.
    #[inline]
    pub fn with_step(mut self, step: usize) -> Self {
        self.step = Some(step.min(u32::MAX as usize) as u32);
        self
    }

    /// Attaches an action name.
    #[inline]
    pub fn with_action(mut self, action: impl Into<Arc<str>>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"));
        ev.subscriber = Some(subscriber.into());
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber.into());
        ev
    }

    /// Whether this event marks the end of a chain.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ChainSucceeded | EventKind::ChainFailed | EventKind::ChainCancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::StepStarting);
        let b = Event::new(EventKind::StepSucceeded);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_timeout_is_clamped() {
        let ev = Event::new(EventKind::TimeoutHit).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }

    #[test]
    fn test_subscriber_constructors() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert_eq!(ev.subscriber.as_deref(), Some("audit"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));
        assert!(!ev.is_terminal());
        assert!(Event::new(EventKind::ChainCancelled).is_terminal());
    }
}
