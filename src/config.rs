//! # Factory configuration.
//!
//! Provides [`Config`], the settings shared by every chain a
//! [`ChainFactory`](crate::ChainFactory) creates.
//!
//! ## Sentinel values
//! - `timeout = 0s` → chains get no default timeout (treated as `None`)

use std::time::Duration;

/// Settings applied by a [`ChainFactory`](crate::ChainFactory).
///
/// ## Field semantics
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `timeout`: default overall timeout installed on each new chain (`0s` = none)
///
/// A chain can still replace the default with its own
/// [`Chain::timeout`](crate::Chain::timeout).
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` events observe
    /// `Lagged` and skip older items.
    pub bus_capacity: usize,

    /// Default chain timeout.
    ///
    /// - `Duration::ZERO` = no timeout
    /// - `> 0` = installed on every chain from `create`, `create_serial`, `create_parallel`
    pub timeout: Duration,
}

impl Config {
    /// Returns the default chain timeout as an `Option`.
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `timeout = 0s` (no timeout)
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            timeout: Duration::ZERO,
        }
    }
}
