//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and (with the `logging` feature) the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Group / Manager / driver ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                                                         │
//!                                                         ┌───────────────┼───────────────┐
//!                                                         ▼               ▼               ▼
//!                                                    [queue S1]      [queue S2]  ...  [queue SN]
//!                                                         ▼               ▼               ▼
//!                                                    on_event()      on_event()      on_event()
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use modvisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct Alerts;
//!
//! #[async_trait]
//! impl Subscribe for Alerts {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::GroupInvalid {
//!             // page someone
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "alerts"
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
