//! # ChainFactory: chains bound to one scheduler, bus and config.
//!
//! ```text
//! ChainFactory { scheduler, bus, config }
//!   ├─ create()                 → Chain (+ config.timeout when non-zero)
//!   ├─ create_serial(actions)   → create().all_in_order(actions)
//!   └─ create_parallel(actions) → create().all(actions)
//! ```
//!
//! Chains created by the same factory publish to the same [`Bus`], so one
//! subscriber observes all of them; [`Event::chain`](crate::Event::chain) tells
//! them apart.

use std::sync::Arc;

use crate::actions::ActionRef;
use crate::chain::Chain;
use crate::config::Config;
use crate::events::Bus;
use crate::runtime::SchedulerRef;

use super::builder::ChainFactoryBuilder;

/// Creates chains sharing a scheduler, an event bus and a [`Config`].
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use taskchain::{ActionFn, ActionRef, ChainFactory, Context, OnResult, TokioScheduler};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let factory = ChainFactory::new(Arc::new(TokioScheduler::current()));
///     let noop: ActionRef = ActionFn::arc("noop", |_ctx: Context, done: OnResult| {
///         done.success();
///         Ok(())
///     });
///
///     let chain = factory.create_serial(vec![noop.clone(), noop]);
///     assert!(!chain.is_empty());
///     assert!(!chain.is_evaluated());
/// }
/// ```
#[derive(Clone)]
pub struct ChainFactory {
    scheduler: SchedulerRef,
    bus: Bus,
    config: Config,
}

impl ChainFactory {
    /// Creates a factory over `scheduler` with the default [`Config`] and no subscribers.
    pub fn new(scheduler: SchedulerRef) -> Self {
        Self::from_parts(scheduler, Config::default(), None)
    }

    /// Starts a builder; see [`ChainFactoryBuilder`].
    pub fn builder(config: Config) -> ChainFactoryBuilder {
        ChainFactoryBuilder::new(config)
    }

    pub(crate) fn from_parts(scheduler: SchedulerRef, config: Config, bus: Option<Bus>) -> Self {
        let bus = bus.unwrap_or_else(|| Bus::new(config.bus_capacity_clamped()));
        Self {
            scheduler,
            bus,
            config,
        }
    }

    /// Creates an empty chain, with the configured default timeout installed.
    pub fn create(&self) -> Chain {
        self.armed(self.unarmed())
    }

    /// Creates a chain running `actions` one after another.
    pub fn create_serial<I>(&self, actions: I) -> Chain
    where
        I: IntoIterator<Item = ActionRef>,
    {
        let chain = self.unarmed();
        // no timer yet and no other handle: cannot be terminal
        let _ = chain.all_in_order(actions);
        self.armed(chain)
    }

    /// Creates a chain whose single step runs `actions` concurrently.
    pub fn create_parallel<I>(&self, actions: I) -> Chain
    where
        I: IntoIterator<Item = ActionRef>,
    {
        let chain = self.unarmed();
        let _ = chain.all(actions);
        self.armed(chain)
    }

    fn unarmed(&self) -> Chain {
        Chain::new(Arc::clone(&self.scheduler), self.bus.clone())
    }

    /// Installs the default timeout, once every initial action is in place.
    fn armed(&self, chain: Chain) -> Chain {
        if let Some(after) = self.config.default_timeout() {
            let _ = chain.timeout(after);
        }
        chain
    }

    /// Bus every chain of this factory publishes to.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Settings applied to every created chain.
    pub fn config(&self) -> &Config {
        &self.config
    }
}
