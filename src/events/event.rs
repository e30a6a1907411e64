//! # Lifecycle events emitted by groups, managers and the process driver.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Group events**: state machine transitions of a [`Group`](crate::Group)
//! - **Module events**: per-module start/stop progress
//! - **Worker events**: failures of background workers
//! - **Driver/subscriber events**: shutdown progress and fan-out health
//!
//! The [`Event`] struct carries additional metadata such as timestamps, module
//! name, reasons and worker counts.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use modvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ModuleStopFailed)
//!     .with_module("Resolver")
//!     .with_reason("disk busy");
//!
//! assert_eq!(ev.kind, EventKind::ModuleStopFailed);
//! assert_eq!(ev.module.as_deref(), Some("Resolver"));
//! assert_eq!(ev.reason.as_deref(), Some("disk busy"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::GroupState;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `module`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `module`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Driver events ===
    /// Shutdown requested (OS signal observed).
    ShutdownRequested,

    /// The group stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; the stop did not return in time.
    ///
    /// Sets:
    /// - `timeout_ms`: configured grace (ms)
    GraceExceeded,

    // === Group events ===
    /// Group left `Off` and is starting its modules.
    ///
    /// Sets:
    /// - `state`: [`GroupState::Starting`]
    GroupStarting,

    /// Every module started.
    ///
    /// Sets:
    /// - `state`: [`GroupState::Running`]
    GroupRunning,

    /// Group left `Running` and is stopping its modules.
    ///
    /// Sets:
    /// - `state`: [`GroupState::Stopping`]
    GroupStopping,

    /// Group is back in `Off` after a clean stop or a clean rollback.
    ///
    /// Sets:
    /// - `state`: [`GroupState::Off`]
    GroupStopped,

    /// Teardown could not be verified; the group is unusable.
    ///
    /// Sets:
    /// - `state`: [`GroupState::Invalid`]
    GroupInvalid,

    // === Module events ===
    /// Module `start` is about to be called.
    ///
    /// Sets:
    /// - `module`: module name
    ModuleStarting,

    /// Module `start` returned successfully.
    ///
    /// Sets:
    /// - `module`: module name
    ModuleStarted,

    /// Module `start` returned an error; rollback follows.
    ///
    /// Sets:
    /// - `module`: module name
    /// - `reason`: error message
    ModuleStartFailed,

    /// Module stopped and all of its workers drained.
    ///
    /// Sets:
    /// - `module`: module name
    ModuleStopped,

    /// Module `stop` returned an error.
    ///
    /// Sets:
    /// - `module`: module name
    /// - `reason`: error message
    ModuleStopFailed,

    /// Module workers did not drain in time.
    ///
    /// Sets:
    /// - `module`: module name
    /// - `workers`: workers still registered
    /// - `timeout_ms`: drain timeout (ms), if one was configured
    DrainTimedOut,

    // === Worker events ===
    /// A worker returned an error or panicked.
    ///
    /// Sets:
    /// - `module`: owning module name
    /// - `worker`: worker name
    /// - `reason`: error message or panic info
    WorkerFailed,
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

    /// Name of the module (or subscriber), if applicable.
    pub module: Option<Arc<str>>,
    /// Name of the worker, if applicable.
    pub worker: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Group state entered, for group events.
    pub state: Option<GroupState>,
    /// Worker count, for drain events.
    pub workers: Option<usize>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            module: None,
            worker: None,
            reason: None,
            state: None,
            workers: None,
            timeout_ms: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a module name.
    #[inline]
    pub fn with_module(mut self, module: impl Into<Arc<str>>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Attaches a worker name.
    #[inline]
    pub fn with_worker(mut self, worker: impl Into<Arc<str>>) -> Self {
        self.worker = Some(worker.into());
        self
    }

    /// Attaches the group state this event reports.
    #[inline]
    pub fn with_state(mut self, state: GroupState) -> Self {
        self.state = Some(state);
        self
    }

    /// Attaches a worker count.
    #[inline]
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = Some(n);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Creates the event reporting a group state transition.
    pub fn group_state(state: GroupState) -> Self {
        let kind = match state {
            GroupState::Off => EventKind::GroupStopped,
            GroupState::Starting => EventKind::GroupStarting,
            GroupState::Running => EventKind::GroupRunning,
            GroupState::Stopping => EventKind::GroupStopping,
            GroupState::Invalid => EventKind::GroupInvalid,
        };
        Event::new(kind).with_state(state)
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_module(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_module(subscriber)
            .with_reason(info)
    }

    /// Returns `true` for overflow reports, which are never re-reported on overflow.
    #[inline]
    pub(crate) fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
