//! # Example: modules
//!
//! Three modules started in order, each with background workers, stopped in
//! reverse order on Ctrl-C / SIGTERM.
//!
//! Demonstrates how to:
//! - Implement [`Module`] on a type and use [`ModuleFn`] for glue.
//! - Spawn scoped workers with [`Manager::start_worker`].
//! - Guard a single-instance module with an owned [`InstanceGuard`].
//! - Render lifecycle events with [`LogWriter`].
//! - Drive the process with [`run_until_signal`].
//!
//! ## Flow
//! ```text
//! run_until_signal()
//!     ├─► Group::start()
//!     │     ├─► Config.start()   (no workers)
//!     │     ├─► Netenv.start()   ─► worker "probe"
//!     │     └─► api.start()      ─► worker "accept"
//!     ├─► wait for SIGINT/SIGTERM/SIGQUIT
//!     └─► Group::stop() within grace
//!           ├─► api.stop()      ─► cancel ─► drain
//!           ├─► Netenv.stop()   ─► cancel ─► drain
//!           └─► Config.stop()
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example modules --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

use modvisor::{
    Config, Group, GroupError, InstanceClaim, InstanceGuard, LogWriter, Manager, Module,
    ModuleError, ModuleFn, ModuleRef, Subscribe, run_until_signal,
};

/// Owns the single-instance slots of this process's modules.
struct App {
    netenv_slot: InstanceGuard,
}

impl App {
    fn new() -> Self {
        Self {
            netenv_slot: InstanceGuard::new(),
        }
    }
}

/// Loads settings; has no workers.
struct Settings;

#[async_trait]
impl Module for Settings {
    async fn start(&self, mgr: &Manager) -> Result<(), ModuleError> {
        mgr.info("settings loaded");
        Ok(())
    }

    async fn stop(&self, _mgr: &Manager) -> Result<(), ModuleError> {
        Ok(())
    }
}

/// Probes the network every few hundred milliseconds.
struct Netenv {
    probes: Arc<AtomicU64>,
    _claim: InstanceClaim,
}

impl Netenv {
    /// Builds the module; fails if `app` already built one.
    fn new(app: &App) -> Result<Self, GroupError> {
        let claim = app.netenv_slot.claim("Netenv")?;
        Ok(Self {
            probes: Arc::new(AtomicU64::new(0)),
            _claim: claim,
        })
    }
}

#[async_trait]
impl Module for Netenv {
    async fn start(&self, mgr: &Manager) -> Result<(), ModuleError> {
        let probes = self.probes.clone();
        let log = mgr.clone();
        mgr.start_worker("probe", move |scope| async move {
            let mut tick = tokio::time::interval(Duration::from_millis(500));
            loop {
                tokio::select! {
                    _ = scope.cancelled() => return Ok(()),
                    _ = tick.tick() => {
                        let n = probes.fetch_add(1, Ordering::Relaxed) + 1;
                        if n % 10 == 0 {
                            log.info(&format!("{n} probes sent"));
                        }
                    }
                }
            }
        });
        Ok(())
    }

    async fn stop(&self, mgr: &Manager) -> Result<(), ModuleError> {
        mgr.info(&format!("stopping after {} probes", self.probes.load(Ordering::Relaxed)));
        Ok(())
    }
}

fn api() -> ModuleRef {
    ModuleFn::arc(
        "api",
        |mgr: Manager| async move {
            mgr.start_worker("accept", |scope| async move {
                scope.cancelled().await;
                Err::<(), _>(ModuleError::Canceled)
            });
            Ok::<_, ModuleError>(())
        },
        |mgr: Manager| async move {
            mgr.info("closing listeners");
            Ok::<_, ModuleError>(())
        },
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app = App::new();
    let netenv = Netenv::new(&app)?;
    if let Err(err) = Netenv::new(&app) {
        println!("second Netenv refused: {err}");
    }

    let cfg = Config::default()
        .with_drain_timeout(Some(Duration::from_secs(2)))
        .with_grace(Duration::from_secs(10));

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let group = Group::builder(cfg.clone())
        .with_module(Arc::new(Settings))
        .with_module(Arc::new(netenv))
        .with_optional(Some(api()))
        .with_subscribers(subs)
        .build();

    println!("running {} modules, press Ctrl-C to stop", group.len());
    run_until_signal(&group, &cfg).await?;
    println!("all modules stopped, state: {}", group.state());
    Ok(())
}
