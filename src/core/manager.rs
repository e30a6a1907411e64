//! # Manager: the per-module handle.
//!
//! A [`Manager`] is what a [`Module`](crate::Module) receives and interacts with.
//! It bundles:
//! - a cancellable scope ([`CancellationToken`]), child of the group's shared scope;
//! - a worker registry counting background tasks started with [`Manager::start_worker`];
//! - a logging span tagged with the module name and the `module` role.
//!
//! ## Scope tree
//! ```text
//! group token (recreated on every Group::start)
//!   ├── manager A token ── worker tokens (clones)
//!   ├── manager B token
//!   └── manager C token
//! ```
//! Cancelling a manager token never affects siblings or the group token.
//! Cancelling the group token cancels every manager token.
//!
//! ## Rules
//! - A manager is created once per module and lives as long as its group.
//! - Its token is re-derived from the group's fresh token before each `start`.
//! - Worker failures and panics are logged and published, never propagated.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::core::workers::WorkerRegistry;
use crate::error::ModuleError;
use crate::events::{Bus, Event, EventKind};

const MODULE_ROLE: &str = "module";

/// Per-module handle providing a cancellation scope, worker tracking and logging.
///
/// Cheap to clone; clones share the same scope, registry and span.
#[derive(Clone)]
pub struct Manager {
    inner: Arc<Inner>,
}

struct Inner {
    name: Arc<str>,
    role: &'static str,
    token: Mutex<CancellationToken>,
    workers: WorkerRegistry,
    span: Span,
    bus: Option<Bus>,
}

impl Manager {
    /// Creates a standalone manager that is not part of any group.
    ///
    /// Its scope is a root token: only [`Manager::cancel`] cancels it.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self::build(name.into(), CancellationToken::new(), None)
    }

    /// Creates a manager whose scope is a child of `parent`.
    pub(crate) fn with_parent(name: Arc<str>, parent: &CancellationToken, bus: Option<Bus>) -> Self {
        Self::build(name, parent.child_token(), bus)
    }

    fn build(name: Arc<str>, token: CancellationToken, bus: Option<Bus>) -> Self {
        let span = tracing::info_span!("module", name = %name, role = MODULE_ROLE);
        Self {
            inner: Arc::new(Inner {
                name,
                role: MODULE_ROLE,
                token: Mutex::new(token),
                workers: WorkerRegistry::new(),
                span,
                bus,
            }),
        }
    }

    /// Module name this manager logs under.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Role tag this manager logs under.
    pub fn role(&self) -> &'static str {
        self.inner.role
    }

    /// Returns the current cancellation scope.
    ///
    /// Cancellation of this token is the only shutdown signal a module receives;
    /// long-running loops must select on [`CancellationToken::cancelled`].
    pub fn scope(&self) -> CancellationToken {
        self.token().clone()
    }

    /// Returns `true` once this manager's scope was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token().is_cancelled()
    }

    /// Cancels this manager's scope only (not siblings, not the group).
    pub fn cancel(&self) {
        self.token().cancel();
    }

    /// Replaces the scope with a fresh child of `parent`.
    pub(crate) fn rebind(&self, parent: &CancellationToken) {
        *self.token() = parent.child_token();
    }

    fn token(&self) -> MutexGuard<'_, CancellationToken> {
        self.inner.token.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers and spawns a background worker.
    ///
    /// `f` receives a clone of the current scope. The worker is counted before
    /// it is spawned and uncounted once its future returns or panics. An error
    /// (other than [`ModuleError::Canceled`]) or a panic is logged and published
    /// as [`EventKind::WorkerFailed`]; it never reaches the caller.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Example
    /// ```no_run
    /// # async fn demo(mgr: &modvisor::Manager) {
    /// mgr.start_worker("ticker", |scope| async move {
    ///     while !scope.is_cancelled() {
    ///         tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    ///     }
    ///     Ok::<_, modvisor::ModuleError>(())
    /// });
    /// # }
    /// ```
    pub fn start_worker<F, Fut>(&self, name: impl Into<Arc<str>>, f: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<(), ModuleError>> + Send + 'static,
    {
        let guard = self.inner.workers.register();
        let worker: Arc<str> = name.into();
        let fut = f(self.scope());
        let mgr = self.clone();

        tokio::spawn(async move {
            let _guard = guard;
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(ModuleError::Canceled)) => {
                    tracing::debug!(parent: &mgr.inner.span, worker = %worker, "worker canceled");
                }
                Ok(Err(err)) => mgr.worker_failed(&worker, err.to_string()),
                Err(panic) => mgr.worker_failed(&worker, format!("panic: {}", panic_message(&*panic))),
            }
        });
    }

    fn worker_failed(&self, worker: &Arc<str>, reason: String) {
        tracing::error!(parent: &self.inner.span, worker = %worker, err = %reason, "worker failed");
        self.publish(
            Event::new(EventKind::WorkerFailed)
                .with_worker(Arc::clone(worker))
                .with_reason(reason),
        );
    }

    /// Number of workers currently running.
    pub fn worker_count(&self) -> usize {
        self.inner.workers.len()
    }

    /// Waits until every worker returned.
    ///
    /// - `None` waits without a cap;
    /// - `Some(Duration::ZERO)` only checks the current count;
    /// - `Some(d)` waits at most `d`.
    ///
    /// Returns `true` if the workers drained, `false` on timeout. Returns `true`
    /// immediately when no worker is running.
    pub async fn wait_for_workers(&self, timeout: Option<Duration>) -> bool {
        self.inner.workers.wait(timeout).await
    }

    /// Span tagged with this manager's name and role.
    ///
    /// Use it as `parent:` for structured events:
    /// `tracing::info!(parent: mgr.span(), peers = 3, "connected")`.
    pub fn span(&self) -> &Span {
        &self.inner.span
    }

    /// Logs `msg` at DEBUG within this manager's span.
    pub fn debug(&self, msg: &str) {
        tracing::debug!(parent: &self.inner.span, "{msg}");
    }

    /// Logs `msg` at INFO within this manager's span.
    pub fn info(&self, msg: &str) {
        tracing::info!(parent: &self.inner.span, "{msg}");
    }

    /// Logs `msg` at WARN within this manager's span.
    pub fn warn(&self, msg: &str) {
        tracing::warn!(parent: &self.inner.span, "{msg}");
    }

    /// Logs `msg` at ERROR within this manager's span.
    pub fn error(&self, msg: &str) {
        tracing::error!(parent: &self.inner.span, "{msg}");
    }

    /// Publishes `ev` tagged with this manager's name, if a bus is attached.
    pub(crate) fn publish(&self, ev: Event) {
        if let Some(bus) = &self.inner.bus {
            bus.publish(ev.with_module(Arc::clone(&self.inner.name)));
        }
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("name", &self.inner.name)
            .field("role", &self.inner.role)
            .field("workers", &self.worker_count())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
