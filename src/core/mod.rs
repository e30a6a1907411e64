//! Runtime core: module groups and their lifecycle.
//!
//! The public API from this module is [`Group`] (with [`GroupBuilder`] and
//! [`GroupState`]), the per-module [`Manager`], [`Config`] and the process
//! drivers.
//!
//! Internal modules:
//! - [`group`]: ordered start, reverse stop, rollback and the state machine;
//! - [`manager`]: per-module scope, worker tracking and logging;
//! - [`workers`]: counter of running workers with a bounded wait;
//! - [`builder`]: group construction with an event bus and subscribers;
//! - [`driver`]: start, wait for shutdown, stop within a grace period;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod driver;
mod group;
mod manager;
mod shutdown;
mod workers;

pub use builder::GroupBuilder;
pub use config::Config;
pub use driver::{run_modules, run_until, run_until_signal};
pub use group::{Group, GroupState};
pub use manager::Manager;

pub(crate) use manager::panic_message;
