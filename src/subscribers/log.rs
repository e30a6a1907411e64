//! # LogWriter: renders lifecycle events through `tracing`.
//!
//! Managers already log their own lifecycle lines; this subscriber is for
//! callers that want one flat, event-ordered log of a group (demos, debugging).
//!
//! ## Example output
//! ```text
//! INFO modvisor: [group] state=starting seq=0
//! INFO modvisor: [module-starting] module=Netenv seq=1
//! ERROR modvisor: [worker-failed] module=Netenv worker=probe err=connection refused seq=7
//! WARN modvisor: [drain-timed-out] module=Netenv workers=1 timeout_ms=500 seq=9
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let module = e.module.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        let state = e.state.map_or("-", |s| s.as_str());
        match e.kind {
            EventKind::GroupStarting
            | EventKind::GroupRunning
            | EventKind::GroupStopping
            | EventKind::GroupStopped => {
                tracing::info!("[group] state={state} seq={}", e.seq);
            }
            EventKind::GroupInvalid => {
                tracing::error!("[group] state={state} seq={}", e.seq);
            }
            EventKind::ModuleStarting => tracing::info!("[module-starting] module={module} seq={}", e.seq),
            EventKind::ModuleStarted => tracing::info!("[module-started] module={module} seq={}", e.seq),
            EventKind::ModuleStopped => tracing::info!("[module-stopped] module={module} seq={}", e.seq),
            EventKind::ModuleStartFailed => {
                tracing::error!("[module-start-failed] module={module} err={reason} seq={}", e.seq);
            }
            EventKind::ModuleStopFailed => {
                tracing::error!("[module-stop-failed] module={module} err={reason} seq={}", e.seq);
            }
            EventKind::DrainTimedOut => {
                tracing::warn!(
                    "[drain-timed-out] module={module} workers={:?} timeout_ms={:?} seq={}",
                    e.workers,
                    e.timeout_ms,
                    e.seq
                );
            }
            EventKind::WorkerFailed => {
                tracing::error!(
                    "[worker-failed] module={module} worker={} err={reason} seq={}",
                    e.worker.as_deref().unwrap_or("-"),
                    e.seq
                );
            }
            EventKind::ShutdownRequested => tracing::warn!("[shutdown-requested] seq={}", e.seq),
            EventKind::AllStoppedWithin => tracing::info!("[all-stopped-within-grace] seq={}", e.seq),
            EventKind::GraceExceeded => {
                tracing::error!("[grace-exceeded] grace_ms={:?} seq={}", e.timeout_ms, e.seq);
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                tracing::warn!("[subscriber] subscriber={module} info={reason} seq={}", e.seq);
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
