//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by groups, managers,
//! the process driver and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Group` (state and module progress), `Manager` (worker
//!   failures), `run_until_signal` (shutdown progress), `SubscriberSet` workers
//!   (overflow/panic).
//! - **Consumers**: the listener spawned by `GroupBuilder::with_subscribers`
//!   (fans out to `SubscriberSet`) and any receiver from [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
