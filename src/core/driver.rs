//! # Process driver: start, wait for shutdown, stop within a grace period.
//!
//! The framework itself never bounds a stop; a process entry point does. These
//! helpers tie [`Group::start`], a shutdown trigger and [`Group::stop`] together.
//!
//! ```text
//! run_modules(cancel, modules):      start ──► cancel.cancelled() ──► stop
//!
//! run_until(group, cfg, shutdown):   start ──► shutdown | group.done() ──► ShutdownRequested
//!                                                  │
//!                                  timeout(cfg.grace, stop):
//!                                    ├─ Ok(Ok)   → AllStoppedWithin
//!                                    ├─ Ok(Err)  → RuntimeError::Stop
//!                                    └─ elapsed  → GraceExceeded (busy modules listed)
//!
//! run_until_signal(group, cfg):      run_until(group, cfg, SIGINT|SIGTERM|SIGQUIT)
//! ```
//!
//! After [`RuntimeError::GraceExceeded`] the abandoned stop leaves teardown
//! unverified, so the group is marked [`GroupState::Invalid`](crate::GroupState::Invalid);
//! the caller is expected to exit the process.

use std::future::Future;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::{config::Config, group::Group, shutdown};
use crate::error::{GroupError, RuntimeError};
use crate::events::{Event, EventKind};
use crate::modules::ModuleRef;

/// Builds a group from `modules`, starts it, waits for `cancel`, then stops it.
///
/// A start error is returned unchanged (the group already rolled back). After
/// `cancel` fires, the result of [`Group::stop`] is returned unchanged.
///
/// # Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use modvisor::{run_modules, Manager, ModuleError, ModuleFn, ModuleRef};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cancel = CancellationToken::new();
/// let m: ModuleRef = ModuleFn::arc(
///     "once",
///     |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
///     |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
/// );
///
/// cancel.cancel();
/// assert!(run_modules(&cancel, [Some(m)]).await.is_ok());
/// # }
/// ```
pub async fn run_modules<I>(cancel: &CancellationToken, modules: I) -> Result<(), GroupError>
where
    I: IntoIterator<Item = Option<ModuleRef>>,
{
    let group = Group::new(modules);
    group.start().await?;
    cancel.cancelled().await;
    group.stop().await
}

/// Starts `group`, waits for `shutdown` or for its shared scope to be
/// cancelled, then stops it bounded by `cfg.grace`.
pub async fn run_until<F>(group: &Group, cfg: &Config, shutdown: F) -> Result<(), RuntimeError>
where
    F: Future<Output = ()>,
{
    group.start().await.map_err(RuntimeError::Start)?;

    tokio::select! {
        _ = shutdown => tracing::warn!("shutdown requested, stopping"),
        _ = group.done() => tracing::warn!("group scope cancelled, stopping"),
    }
    group.publish(Event::new(EventKind::ShutdownRequested));

    stop_within_grace(group, cfg).await
}

/// Like [`run_until`], with termination signals as the shutdown trigger.
///
/// # Errors
/// [`RuntimeError::Signal`] if signal listeners cannot be installed; the group
/// is not started in that case.
pub async fn run_until_signal(group: &Group, cfg: &Config) -> Result<(), RuntimeError> {
    let signal = shutdown::shutdown_signal()?;
    run_until(group, cfg, signal).await
}

async fn stop_within_grace(group: &Group, cfg: &Config) -> Result<(), RuntimeError> {
    match time::timeout(cfg.grace, group.stop()).await {
        Ok(Ok(())) => {
            group.publish(Event::new(EventKind::AllStoppedWithin));
            Ok(())
        }
        Ok(Err(err)) => {
            tracing::error!(err = %err, "group stopped with failures");
            Err(RuntimeError::Stop(err))
        }
        Err(_elapsed) => {
            let stuck = group.busy_modules();
            tracing::error!(grace = ?cfg.grace, stuck = ?stuck, "taking too long to shut down");
            group.invalidate();
            group.publish(Event::new(EventKind::GraceExceeded).with_timeout(cfg.grace));
            Err(RuntimeError::GraceExceeded {
                grace: cfg.grace,
                stuck,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GroupState, Manager};
    use crate::error::ModuleError;
    use crate::modules::ModuleFn;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn noop(name: &'static str) -> Option<ModuleRef> {
        Some(ModuleFn::arc(
            name,
            |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
            |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
        ))
    }

    #[tokio::test]
    async fn test_run_modules_propagates_start_error_unchanged() {
        let failing: ModuleRef = ModuleFn::arc(
            "broken",
            |_mgr: Manager| async { Err::<(), _>(ModuleError::fail("no config")) },
            |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
        );
        let cancel = CancellationToken::new();

        let err = run_modules(&cancel, [noop("a"), Some(failing)]).await.unwrap_err();
        assert!(matches!(err, GroupError::StartFailed { ref module, .. } if module == "broken"));
    }

    #[tokio::test]
    async fn test_run_modules_stops_after_cancel_and_returns_stop_error() {
        let stopped = Arc::new(Mutex::new(false));
        let flag = stopped.clone();
        let failing_stop: ModuleRef = ModuleFn::arc(
            "sticky",
            |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
            move |_mgr: Manager| {
                let flag = flag.clone();
                async move {
                    *flag.lock().unwrap() = true;
                    Err::<(), _>(ModuleError::fail("still bound"))
                }
            },
        );
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let res = tokio::time::timeout(Duration::from_secs(5), run_modules(&cancel, [Some(failing_stop)]))
            .await
            .expect("run_modules returns once cancelled");

        assert!(*stopped.lock().unwrap());
        match res {
            Err(GroupError::StopFailed { failures }) => assert_eq!(failures[0].module, "sticky"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_until_clean_shutdown() {
        let group = Group::builder(Config::default())
            .with_optional(noop("a"))
            .with_optional(noop("b"))
            .build();

        run_until(&group, &Config::default(), async {}).await.unwrap();
        assert_eq!(group.state(), GroupState::Off);
        assert!(group.is_done());
    }

    #[tokio::test]
    async fn test_run_until_reports_start_failure() {
        let failing: ModuleRef = ModuleFn::arc(
            "broken",
            |_mgr: Manager| async { Err::<(), _>(ModuleError::fail("nope")) },
            |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
        );
        let group = Group::new([Some(failing)]);

        let err = run_until(&group, &Config::default(), async {}).await.unwrap_err();
        assert_eq!(err.as_label(), "runtime_start_failed");
    }

    #[tokio::test]
    async fn test_run_until_stops_when_group_scope_is_cancelled() {
        let group = Group::new([noop("a")]);
        let cfg = Config::default();

        let res = tokio::time::timeout(Duration::from_secs(5), async {
            let run = run_until(&group, &cfg, std::future::pending());
            tokio::pin!(run);
            loop {
                tokio::select! {
                    res = &mut run => break res,
                    _ = tokio::time::sleep(Duration::from_millis(5)) => {
                        if group.state() == GroupState::Running {
                            group.scope().cancel();
                        }
                    }
                }
            }
        })
        .await
        .expect("driver returns once the scope is cancelled");

        assert!(res.is_ok());
        assert_eq!(group.state(), GroupState::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_exceeded_names_stuck_modules() {
        let slow: ModuleRef = ModuleFn::arc(
            "slow",
            |mgr: Manager| async move {
                mgr.start_worker("deaf", |_scope| async {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok::<_, ModuleError>(())
                });
                Ok::<_, ModuleError>(())
            },
            |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
        );
        let group = Group::new([noop("fast"), Some(slow)]);
        let cfg = Config::default().with_grace(Duration::from_secs(1));

        let err = run_until(&group, &cfg, async {}).await.unwrap_err();
        match err {
            RuntimeError::GraceExceeded { grace, stuck } => {
                assert_eq!(grace, Duration::from_secs(1));
                assert_eq!(stuck, ["slow"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(group.state(), GroupState::Invalid);
        assert!(matches!(group.stop().await, Err(GroupError::Invalid { op: "stop" })));
        assert!(matches!(group.start().await, Err(GroupError::Invalid { op: "start" })));
    }
}
