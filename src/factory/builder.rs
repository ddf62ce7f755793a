use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use crate::{
    config::Config,
    events::Bus,
    runtime::{SchedulerRef, TokioScheduler},
    subscribers::{Subscribe, SubscriberSet},
};

use super::chain_factory::ChainFactory;

/// Builder for a [`ChainFactory`] with optional subscribers and scheduler.
pub struct ChainFactoryBuilder {
    config: Config,
    scheduler: Option<SchedulerRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ChainFactoryBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            scheduler: None,
            subscribers: Vec::new(),
        }
    }

    /// Sets the scheduler chains run on.
    ///
    /// Defaults to a [`TokioScheduler`] on the runtime calling [`build`](Self::build).
    pub fn with_scheduler(mut self, scheduler: SchedulerRef) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive chain events (evaluation, steps, timeouts, outcomes)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the factory.
    ///
    /// Creates the event bus and, when subscribers were given, the subscriber
    /// workers plus a listener task forwarding bus events to them. The listener
    /// runs until the runtime shuts down.
    ///
    /// Must be called within a tokio runtime unless a scheduler was set and
    /// there are no subscribers.
    pub fn build(self) -> ChainFactory {
        let bus = Bus::new(self.config.bus_capacity_clamped());

        if !self.subscribers.is_empty() {
            let subs = SubscriberSet::new(self.subscribers, bus.clone());
            subscriber_listener(&bus, subs);
        }

        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Arc::new(TokioScheduler::current()));
        ChainFactory::from_parts(scheduler, self.config, Some(bus))
    }
}

/// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
fn subscriber_listener(bus: &Bus, set: SubscriberSet) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    });
}
