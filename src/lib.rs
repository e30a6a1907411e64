//! # modvisor
//!
//! **Modvisor** supervises the lifecycle of a fixed, ordered set of long-lived
//! modules inside one process.
//!
//! Modules are started in registration order and stopped in exact reverse
//! order. If one fails to start, everything already started (the failing
//! module included) is stopped again. Each module gets a [`Manager`] that
//! scopes its background workers to a cancellation token and waits for them
//! on the way down.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Module A   │   │   Module B   │   │   Module C   │
//!     │  (start #1)  │   │  (start #2)  │   │  (start #3)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Group (lifecycle state machine)                                  │
//! │  - members in start order, one Manager each                       │
//! │  - shared CancellationToken, recreated on every start             │
//! │  - AtomicU8 state: Off/Starting/Running/Stopping/Invalid          │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │   Manager    │   │   Manager    │   │   Manager    │   │
//!     │ child token  │   │ child token  │   │ child token  │   │
//!     │ worker count │   │ worker count │   │ worker count │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ Publishes:       │                  │                 │
//!      │ - ModuleStarting │ - ModuleStopped  │ - WorkerFailed  │
//!      │ - ModuleStarted  │ - DrainTimedOut  │ - ...           │
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                 Bus (optional broadcast channel)                  │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                            SubscriberSet
//!                          (per-sub queues)
//!                        ┌─────────┼─────────┐
//!                        ▼         ▼         ▼
//!                     sub1.on   sub2.on   subN.on
//!                     _event()  _event()  _event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! Group::start():  Off ─► Starting
//!   for module in members:
//!     module.start(mgr)
//!       └─ Err ─► rollback(0..=i) ─► Off (clean) | Invalid (unclean), return StartFailed
//!   Starting ─► Running
//!
//! Group::stop():   Running ─► Stopping
//!   rollback(all) ─► Off (clean) | Invalid (unclean)
//!
//! rollback(n):
//!   for module in members[..n].rev():
//!     module.stop(mgr); mgr.cancel(); mgr.wait_for_workers(drain_timeout)
//!   group token.cancel()  ─► Group::done() resolves
//! ```
//!
//! ## Features
//! | Area              | Description                                                        | Key types / traits                         |
//! |-------------------|--------------------------------------------------------------------|--------------------------------------------|
//! | **Modules**       | Define modules as trait impls or closure pairs.                    | [`Module`], [`ModuleFn`], [`ModuleRef`]    |
//! | **Supervision**   | Ordered start, reverse stop, rollback, terminal invalid state.     | [`Group`], [`GroupState`]                  |
//! | **Workers**       | Scoped background tasks counted and drained on stop.               | [`Manager`]                                |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom subscribers). | [`Subscribe`], [`Event`]                   |
//! | **Errors**        | Typed errors for modules, groups and the process driver.           | [`ModuleError`], [`GroupError`], [`RuntimeError`] |
//! | **Configuration** | Drain timeout, shutdown grace, bus capacity.                       | [`Config`]                                 |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use modvisor::{Config, Group, Manager, ModuleError, ModuleFn, ModuleRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default().with_drain_timeout(Some(Duration::from_secs(5)));
//!
//!     let ticker: ModuleRef = ModuleFn::arc(
//!         "ticker",
//!         |mgr: Manager| async move {
//!             mgr.start_worker("tick", |scope| async move {
//!                 scope.cancelled().await;
//!                 Ok::<_, ModuleError>(())
//!             });
//!             Ok::<_, ModuleError>(())
//!         },
//!         |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
//!     );
//!
//!     let group = Group::builder(cfg).with_module(ticker).build();
//!     group.start().await?;
//!     // ... serve ...
//!     group.stop().await?;
//!     assert!(group.is_done());
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod modules;
mod subscribers;

// ---- Public re-exports ----

pub use core::{
    Config, Group, GroupBuilder, GroupState, Manager, run_modules, run_until, run_until_signal,
};
pub use error::{BoxError, GroupError, ModuleError, RuntimeError, StopFailure, StopFailureKind};
pub use events::{Bus, Event, EventKind};
pub use modules::{InstanceClaim, InstanceGuard, Module, ModuleFn, ModuleRef};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
