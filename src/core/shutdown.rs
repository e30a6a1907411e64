//! # Cross-platform OS signal handling.
//!
//! Provides [`shutdown_signal`], which installs termination signal listeners
//! immediately and returns a future that completes on the first signal.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal)
//!
//! **Other platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use std::future::Future;

/// Installs signal listeners and returns a future resolving on the first termination signal.
///
/// Listeners are registered before this returns, so a signal arriving before
/// the future is first polled is not lost. Must be called within a tokio runtime.
#[cfg(unix)]
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = ()> + Send> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    Ok(async move {
        tokio::select! {
            _ = sigint.recv()  => {},
            _ = sigterm.recv() => {},
            _ = sigquit.recv() => {},
        }
    })
}

/// Installs signal listeners and returns a future resolving on the first termination signal.
#[cfg(not(unix))]
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = ()> + Send> {
    Ok(async {
        let _ = tokio::signal::ctrl_c().await;
    })
}
