//! # Worker registry: in-flight counter with a bounded drain.
//!
//! Each [`Manager`](crate::Manager) owns one registry. A worker is counted from
//! the moment [`WorkerRegistry::register`] returns (before its future is spawned)
//! until its [`WorkerGuard`] is dropped, so a drain can never observe zero while
//! a worker is between being spawned and being counted.
//!
//! ```text
//! start_worker() ──► register() ──► count += 1 ──► tokio::spawn(fut + guard)
//!                                                        │
//!                                          fut returns / panics
//!                                                        ▼
//!                                          guard dropped ──► count -= 1 ──► notify waiters
//! ```
//!
//! ## Drain semantics
//! - `wait(None)`: wait until the count is zero, no cap
//! - `wait(Some(Duration::ZERO))`: single poll of the current count
//! - `wait(Some(d))`: wait at most `d`

use std::sync::Arc;
use std::time::Duration;

use tokio::{sync::watch, time};

/// Shared counter of running workers.
#[derive(Clone, Debug)]
pub(crate) struct WorkerRegistry {
    count: Arc<watch::Sender<usize>>,
}

/// Keeps one worker registered until dropped.
#[derive(Debug)]
pub(crate) struct WorkerGuard {
    count: Arc<watch::Sender<usize>>,
}

impl WorkerRegistry {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(0usize);
        Self {
            count: Arc::new(tx),
        }
    }

    /// Counts one more worker. The count drops again when the guard is dropped.
    pub(crate) fn register(&self) -> WorkerGuard {
        self.count.send_modify(|n| *n += 1);
        WorkerGuard {
            count: Arc::clone(&self.count),
        }
    }

    /// Current number of registered workers.
    pub(crate) fn len(&self) -> usize {
        *self.count.borrow()
    }

    /// Waits until no worker is registered; returns `false` if `timeout` elapsed first.
    pub(crate) async fn wait(&self, timeout: Option<Duration>) -> bool {
        if timeout.is_some_and(|d| d.is_zero()) {
            return self.len() == 0;
        }

        let mut rx = self.count.subscribe();
        let drained = async move { rx.wait_for(|n| *n == 0).await.is_ok() };
        match timeout {
            None => drained.await,
            Some(d) => time::timeout(d, drained).await.unwrap_or(false),
        }
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.count.send_modify(|n| *n = n.saturating_sub(1));
    }
}
