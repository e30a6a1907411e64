//! # Runtime configuration.
//!
//! Provides [`Config`] centralized settings for groups and the process driver.
//!
//! Config is used in two ways:
//! 1. **Group creation**: `Group::builder(config)`, where the drain timeout and
//!    bus capacity are taken from it;
//! 2. **Process driver**: `run_until_signal(&group, &config)`, which bounds
//!    `Group::stop` by `grace`.
//!
//! ## Drain timeout
//! `drain_timeout = None` waits for workers without a cap (what a plain
//! `Group::new` does). `Some(Duration::ZERO)` only checks the worker count
//! once, it never waits.

use std::time::Duration;

/// Global configuration for groups and the process driver.
///
/// ## Field semantics
/// - `drain_timeout`: how long rollback waits for each module's workers (`None` = no cap)
/// - `grace`: maximum time the process driver waits for `Group::stop`
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct Config {
    /// Per-module bound on waiting for workers after the module was cancelled.
    ///
    /// A module whose workers are still running when this elapses is reported
    /// as a teardown failure and the group ends up invalid.
    pub drain_timeout: Option<Duration>,

    /// Maximum time to wait for a graceful stop before the driver gives up.
    ///
    /// The framework itself never enforces a global deadline; only
    /// [`run_until_signal`](crate::run_until_signal) applies this bound.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a copy with the given drain timeout.
    pub fn with_drain_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Returns a copy with the given grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `drain_timeout = None` (wait for workers without a cap)
    /// - `grace = 3m` (driver gives up on a stop that takes longer)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            drain_timeout: None,
            grace: Duration::from_secs(180),
            bus_capacity: 1024,
        }
    }
}
