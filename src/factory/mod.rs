//! # Chain factory.
//!
//! [`ChainFactory`] creates [`Chain`](crate::Chain)s that share one scheduler,
//! one event [`Bus`](crate::Bus) and one [`Config`](crate::Config).
//! [`ChainFactoryBuilder`] wires optional subscribers onto that bus.

mod builder;
mod chain_factory;

pub use builder::ChainFactoryBuilder;
pub use chain_factory::ChainFactory;
