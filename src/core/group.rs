//! # Group: ordered start, reverse stop, rollback on partial failure.
//!
//! A [`Group`] owns an ordered list of modules, one [`Manager`] per module, a
//! shared cancellation scope and a lifecycle state word.
//!
//! ## State machine
//! ```text
//!            start()                       all started
//!   Off ─────────────► Starting ──────────────────────► Running
//!    ▲                    │                                │
//!    │  rollback clean    │ module i failed                │ stop()
//!    ├────────────────────┤ rollback(0..=i)                ▼
//!    │                    │                             Stopping
//!    │                    │ rollback unclean               │
//!    │                    ▼                                │
//!    │                 Invalid ◄───────────────────────────┤ rollback unclean
//!    └─────────────────────────────────────────────────────┘ rollback clean
//! ```
//! Every transition out of `Off` and `Running` goes through a single
//! compare-and-swap; that is the only serialization point between concurrent
//! `start`/`stop` callers. A refused transition has no side effects.
//!
//! ## Rollback
//! ```text
//! for i in (0..count).rev():
//!   module[i].stop(mgr[i])        error recorded, sweep continues
//!   mgr[i].cancel()
//!   mgr[i].wait_for_workers(drain_timeout)   timeout recorded, sweep continues
//! group token.cancel()
//! ```
//!
//! ## Rules
//! - Module order never changes after construction; module `i` may rely on `0..i` being up.
//! - Stop order is always the exact reverse of start order.
//! - Modules are never started or stopped concurrently with each other.
//! - The shared scope is cancelled only after every member was stopped.
//! - `Invalid` is terminal: further `start`/`stop` fail fast without calling modules.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::builder::GroupBuilder;
use crate::core::config::Config;
use crate::core::manager::{Manager, panic_message};
use crate::error::{GroupError, ModuleError, StopFailure, StopFailureKind};
use crate::events::{Bus, Event, EventKind};
use crate::modules::ModuleRef;

/// Lifecycle state of a [`Group`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupState {
    /// Nothing started; `start` is allowed.
    Off = 0,
    /// `start` is in progress.
    Starting = 1,
    /// Every module started; `stop` is allowed.
    Running = 2,
    /// `stop` is in progress.
    Stopping = 3,
    /// Teardown could not be verified. Terminal.
    Invalid = 4,
}

impl GroupState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => GroupState::Off,
            1 => GroupState::Starting,
            2 => GroupState::Running,
            3 => GroupState::Stopping,
            _ => GroupState::Invalid,
        }
    }

    /// Lowercase name used in logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupState::Off => "off",
            GroupState::Starting => "starting",
            GroupState::Running => "running",
            GroupState::Stopping => "stopping",
            GroupState::Invalid => "invalid",
        }
    }
}

impl fmt::Display for GroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A module paired with its manager.
struct Member {
    module: ModuleRef,
    mgr: Manager,
}

/// Ordered supervisor of modules with one lifecycle state machine.
pub struct Group {
    members: Vec<Member>,
    token: Mutex<CancellationToken>,
    state: AtomicU8,
    drain_timeout: Option<Duration>,
    bus: Option<Bus>,
    listener: Option<JoinHandle<()>>,
}

impl Group {
    /// Creates a group with the default [`Config`] and no event bus.
    ///
    /// `None` entries are dropped: they get no manager and are never called.
    ///
    /// # Example
    /// ```rust
    /// use modvisor::{Group, GroupState, Manager, ModuleError, ModuleFn, ModuleRef};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let db: ModuleRef = ModuleFn::arc(
    ///     "db",
    ///     |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
    ///     |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
    /// );
    /// let optional_api: Option<ModuleRef> = None;
    ///
    /// let group = Group::new([Some(db), optional_api]);
    /// assert_eq!(group.len(), 1);
    ///
    /// group.start().await?;
    /// assert_eq!(group.state(), GroupState::Running);
    /// group.stop().await?;
    /// assert!(group.is_done());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<I>(modules: I) -> Self
    where
        I: IntoIterator<Item = Option<ModuleRef>>,
    {
        Self::from_parts(modules.into_iter().flatten().collect(), &Config::default(), None, None)
    }

    /// Returns a builder for a group with the given configuration.
    pub fn builder(cfg: Config) -> GroupBuilder {
        GroupBuilder::new(cfg)
    }

    pub(crate) fn from_parts(
        modules: Vec<ModuleRef>,
        cfg: &Config,
        bus: Option<Bus>,
        listener: Option<JoinHandle<()>>,
    ) -> Self {
        let token = CancellationToken::new();
        let members = modules
            .into_iter()
            .map(|module| {
                let name: Arc<str> = Arc::from(module.name());
                let mgr = Manager::with_parent(name, &token, bus.clone());
                Member { module, mgr }
            })
            .collect();

        Self {
            members,
            token: Mutex::new(token),
            state: AtomicU8::new(GroupState::Off as u8),
            drain_timeout: cfg.drain_timeout,
            bus,
            listener,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GroupState {
        GroupState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Number of modules in the group.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the group has no modules.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Module managers in start order.
    pub fn managers(&self) -> impl Iterator<Item = &Manager> {
        self.members.iter().map(|m| &m.mgr)
    }

    /// Names of modules that still have running workers, in start order.
    pub fn busy_modules(&self) -> Vec<String> {
        self.members
            .iter()
            .filter(|m| m.mgr.worker_count() > 0)
            .map(|m| m.mgr.name().to_string())
            .collect()
    }

    /// Starts every module in order.
    ///
    /// If module `i` fails, modules `i..=0` are stopped in reverse order (the
    /// failing module included) and modules after `i` are never called. The
    /// group ends `Off` if that rollback was clean and `Invalid` otherwise.
    ///
    /// # Errors
    /// - [`GroupError::StateConflict`] / [`GroupError::Invalid`] if the group is not `Off`;
    /// - [`GroupError::StartFailed`] wrapping the first module error.
    pub async fn start(&self) -> Result<(), GroupError> {
        self.transition(GroupState::Off, GroupState::Starting, "start")?;

        let token = CancellationToken::new();
        *self.token() = token.clone();
        for member in &self.members {
            member.mgr.rebind(&token);
        }

        for (i, member) in self.members.iter().enumerate() {
            let mgr = &member.mgr;
            mgr.info("starting");
            mgr.publish(Event::new(EventKind::ModuleStarting));

            if let Err(err) = guarded(member.module.start(mgr)).await {
                tracing::error!(parent: mgr.span(), err = %err, "failed to start");
                mgr.publish(Event::new(EventKind::ModuleStartFailed).with_reason(err.to_string()));

                let rollback = self.rollback(i + 1).await;
                self.set_state(if rollback.is_empty() {
                    GroupState::Off
                } else {
                    GroupState::Invalid
                });
                return Err(GroupError::StartFailed {
                    module: mgr.name().to_string(),
                    source: err,
                    rollback,
                });
            }

            mgr.info("started");
            mgr.publish(Event::new(EventKind::ModuleStarted));
        }

        self.set_state(GroupState::Running);
        Ok(())
    }

    /// Stops every module in reverse order.
    ///
    /// The sweep continues past failing modules. The group ends `Off` if every
    /// module stopped and drained, `Invalid` otherwise.
    ///
    /// # Errors
    /// - [`GroupError::StateConflict`] / [`GroupError::Invalid`] if the group is not `Running`;
    /// - [`GroupError::StopFailed`] listing every module that failed to stop or drain.
    pub async fn stop(&self) -> Result<(), GroupError> {
        self.transition(GroupState::Running, GroupState::Stopping, "stop")?;

        let failures = self.rollback(self.members.len()).await;
        if failures.is_empty() {
            self.set_state(GroupState::Off);
            Ok(())
        } else {
            self.set_state(GroupState::Invalid);
            Err(GroupError::StopFailed { failures })
        }
    }

    /// Stops the first `count` members in reverse order, then cancels the shared scope.
    ///
    /// Returns the failures; empty means every member stopped and drained in time.
    async fn rollback(&self, count: usize) -> Vec<StopFailure> {
        let mut failures = Vec::new();

        for member in self.members[..count].iter().rev() {
            let mgr = &member.mgr;
            let mut clean = true;

            if let Err(err) = guarded(member.module.stop(mgr)).await {
                tracing::error!(parent: mgr.span(), err = %err, "failed to stop");
                mgr.publish(Event::new(EventKind::ModuleStopFailed).with_reason(err.to_string()));
                failures.push(StopFailure {
                    module: mgr.name().to_string(),
                    kind: StopFailureKind::Stop(err),
                });
                clean = false;
            }

            mgr.cancel();
            if mgr.wait_for_workers(self.drain_timeout).await {
                if clean {
                    mgr.info("stopped");
                    mgr.publish(Event::new(EventKind::ModuleStopped));
                }
            } else {
                let workers = mgr.worker_count();
                tracing::error!(parent: mgr.span(), err = "timed out", workers, "failed to stop");
                let mut ev = Event::new(EventKind::DrainTimedOut).with_workers(workers);
                if let Some(timeout) = self.drain_timeout {
                    ev = ev.with_timeout(timeout);
                }
                mgr.publish(ev);
                failures.push(StopFailure {
                    module: mgr.name().to_string(),
                    kind: StopFailureKind::DrainTimeout { workers },
                });
            }
        }

        self.token().cancel();
        failures
    }

    /// Completes once the current shared scope is cancelled.
    ///
    /// The scope is replaced on every `start` and the previous one is not
    /// cancelled. A future taken before `start` therefore never resolves; take
    /// it after `start` returns to observe that run's teardown.
    pub fn done(&self) -> impl Future<Output = ()> + Send + 'static {
        let token = self.scope();
        async move { token.cancelled().await }
    }

    /// Returns `true` if the current shared scope is cancelled.
    pub fn is_done(&self) -> bool {
        self.token().is_cancelled()
    }

    /// Clone of the current shared scope.
    pub fn scope(&self) -> CancellationToken {
        self.token().clone()
    }

    fn token(&self) -> MutexGuard<'_, CancellationToken> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, from: GroupState, to: GroupState, op: &'static str) -> Result<(), GroupError> {
        match self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                self.publish(Event::group_state(to));
                Ok(())
            }
            Err(raw) => match GroupState::from_u8(raw) {
                GroupState::Invalid => Err(GroupError::Invalid { op }),
                state => Err(GroupError::StateConflict { op, state }),
            },
        }
    }

    fn set_state(&self, state: GroupState) {
        self.state.store(state as u8, Ordering::Release);
        if state == GroupState::Invalid {
            tracing::error!(state = %state, "group teardown could not be verified");
        }
        self.publish(Event::group_state(state));
    }

    /// Marks the group invalid after a stop was abandoned mid-sweep.
    pub(crate) fn invalidate(&self) {
        self.set_state(GroupState::Invalid);
    }

    pub(crate) fn publish(&self, ev: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(ev);
        }
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("state", &self.state())
            .field("modules", &self.members.iter().map(|m| m.mgr.name()).collect::<Vec<_>>())
            .field("drain_timeout", &self.drain_timeout)
            .finish()
    }
}

impl Drop for Group {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

/// Runs a module operation, turning a panic into a [`ModuleError`].
async fn guarded<F>(op: F) -> Result<(), ModuleError>
where
    F: Future<Output = Result<(), ModuleError>>,
{
    AssertUnwindSafe(op)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(ModuleError::fail(format!("panic: {}", panic_message(&*panic)))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{Module, ModuleFn};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    type Trace = Arc<Mutex<Vec<String>>>;

    /// Module that records every call and fails on demand.
    struct Recorder {
        name: &'static str,
        trace: Trace,
        fail_start: bool,
        fail_stop: bool,
    }

    impl Recorder {
        fn new(name: &'static str, trace: &Trace) -> Self {
            Self {
                name,
                trace: Arc::clone(trace),
                fail_start: false,
                fail_stop: false,
            }
        }

        fn failing_start(mut self) -> Self {
            self.fail_start = true;
            self
        }

        fn failing_stop(mut self) -> Self {
            self.fail_stop = true;
            self
        }

        fn arc(self) -> Option<ModuleRef> {
            Some(Arc::new(self))
        }

        fn record(&self, op: &str) {
            self.trace.lock().unwrap().push(format!("{}.{op}", self.name));
        }
    }

    #[async_trait]
    impl Module for Recorder {
        async fn start(&self, _mgr: &Manager) -> Result<(), ModuleError> {
            self.record("start");
            if self.fail_start {
                return Err(ModuleError::fail(format!("{} cannot start", self.name)));
            }
            Ok(())
        }

        async fn stop(&self, _mgr: &Manager) -> Result<(), ModuleError> {
            self.record("stop");
            if self.fail_stop {
                return Err(ModuleError::fail(format!("{} cannot stop", self.name)));
            }
            Ok(())
        }

        fn name(&self) -> std::borrow::Cow<'_, str> {
            self.name.into()
        }
    }

    fn new_trace() -> Trace {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn calls(trace: &Trace) -> Vec<String> {
        trace.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_start_then_stop_reverses_order() {
        let trace = new_trace();
        let group = Group::new([
            Recorder::new("A", &trace).arc(),
            Recorder::new("B", &trace).arc(),
            Recorder::new("C", &trace).arc(),
        ]);

        group.start().await.unwrap();
        assert_eq!(group.state(), GroupState::Running);
        assert!(!group.is_done());

        group.stop().await.unwrap();
        assert_eq!(group.state(), GroupState::Off);
        assert!(group.is_done());
        assert_eq!(
            calls(&trace),
            ["A.start", "B.start", "C.start", "C.stop", "B.stop", "A.stop"]
        );
    }

    #[tokio::test]
    async fn test_start_failure_rolls_back_prefix_including_failed_module() {
        let trace = new_trace();
        let group = Group::new([
            Recorder::new("A", &trace).arc(),
            Recorder::new("B", &trace).failing_start().arc(),
            Recorder::new("C", &trace).arc(),
        ]);

        let err = group.start().await.unwrap_err();
        match &err {
            GroupError::StartFailed { module, source, rollback } => {
                assert_eq!(module, "B");
                assert_eq!(source.to_string(), "execution failed: B cannot start");
                assert!(rollback.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(calls(&trace), ["A.start", "B.start", "B.stop", "A.stop"]);
        assert_eq!(group.state(), GroupState::Off);
        assert!(group.is_done());
    }

    #[tokio::test]
    async fn test_first_module_failure_stops_only_itself() {
        let trace = new_trace();
        let group = Group::new([
            Recorder::new("A", &trace).failing_start().arc(),
            Recorder::new("B", &trace).arc(),
        ]);

        assert!(group.start().await.is_err());
        assert_eq!(calls(&trace), ["A.start", "A.stop"]);
        assert_eq!(group.state(), GroupState::Off);
    }

    #[tokio::test]
    async fn test_unclean_rollback_leaves_group_invalid() {
        let trace = new_trace();
        let group = Group::new([
            Recorder::new("A", &trace).failing_stop().arc(),
            Recorder::new("B", &trace).failing_start().arc(),
        ]);

        let err = group.start().await.unwrap_err();
        assert_eq!(err.stop_failures().len(), 1);
        assert_eq!(err.stop_failures()[0].module, "A");
        assert_eq!(group.state(), GroupState::Invalid);
    }

    #[tokio::test]
    async fn test_second_start_conflicts_without_calls() {
        let trace = new_trace();
        let group = Group::new([Recorder::new("A", &trace).arc()]);

        group.start().await.unwrap();
        let err = group.start().await.unwrap_err();
        assert!(matches!(
            err,
            GroupError::StateConflict { op: "start", state: GroupState::Running }
        ));
        assert_eq!(calls(&trace), ["A.start"]);
    }

    #[tokio::test]
    async fn test_stop_when_off_conflicts() {
        let group = Group::new(Vec::<Option<ModuleRef>>::new());
        let err = group.stop().await.unwrap_err();
        assert!(matches!(
            err,
            GroupError::StateConflict { op: "stop", state: GroupState::Off }
        ));
    }

    #[tokio::test]
    async fn test_stop_continues_past_failure_and_invalidates() {
        let trace = new_trace();
        let group = Group::new([
            Recorder::new("A", &trace).arc(),
            Recorder::new("B", &trace).failing_stop().arc(),
        ]);

        group.start().await.unwrap();
        let err = group.stop().await.unwrap_err();

        assert_eq!(calls(&trace), ["A.start", "B.start", "B.stop", "A.stop"]);
        assert_eq!(group.state(), GroupState::Invalid);
        match &err {
            GroupError::StopFailed { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].module, "B");
                assert!(matches!(failures[0].kind, StopFailureKind::Stop(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_group_fails_fast() {
        let trace = new_trace();
        let group = Group::new([Recorder::new("A", &trace).failing_stop().arc()]);

        group.start().await.unwrap();
        assert!(group.stop().await.is_err());
        let before = calls(&trace).len();

        assert!(matches!(group.start().await, Err(GroupError::Invalid { op: "start" })));
        assert!(matches!(group.stop().await, Err(GroupError::Invalid { op: "stop" })));
        assert_eq!(calls(&trace).len(), before);
    }

    #[tokio::test]
    async fn test_none_entries_are_skipped() {
        let trace = new_trace();
        let group = Group::new([
            None,
            Recorder::new("A", &trace).arc(),
            None,
            Recorder::new("B", &trace).arc(),
        ]);
        assert_eq!(group.len(), 2);

        group.start().await.unwrap();
        group.stop().await.unwrap();
        assert_eq!(calls(&trace), ["A.start", "B.start", "B.stop", "A.stop"]);
    }

    #[tokio::test]
    async fn test_restart_cycle_gets_fresh_scopes() {
        let trace = new_trace();
        let group = Group::new([Recorder::new("A", &trace).arc()]);

        group.start().await.unwrap();
        group.stop().await.unwrap();
        assert!(group.is_done());
        assert!(group.managers().all(|m| m.is_cancelled()));

        group.start().await.unwrap();
        assert!(!group.is_done());
        assert!(group.managers().all(|m| !m.is_cancelled()));
        group.stop().await.unwrap();

        assert_eq!(calls(&trace), ["A.start", "A.stop", "A.start", "A.stop"]);
    }

    #[tokio::test]
    async fn test_module_scope_is_live_during_its_own_stop() {
        let observed = Arc::new(Mutex::new(Vec::new()));
        let seen = observed.clone();
        let first: ModuleRef = ModuleFn::arc(
            "first",
            |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
            move |mgr: Manager| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(mgr.is_cancelled());
                    Ok::<_, ModuleError>(())
                }
            },
        );
        let second: ModuleRef = ModuleFn::arc(
            "second",
            |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
            |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
        );

        let group = Group::new([Some(first), Some(second)]);
        group.start().await.unwrap();
        group.stop().await.unwrap();

        // "first" is stopped after "second" was cancelled; its own scope is still live.
        assert_eq!(*observed.lock().unwrap(), [false]);
        assert!(group.managers().all(|m| m.is_cancelled()));
        assert!(group.is_done());
    }

    #[tokio::test]
    async fn test_stop_cancels_and_drains_workers() {
        let finished = Arc::new(AtomicUsize::new(0));
        let done = finished.clone();
        let module: ModuleRef = ModuleFn::arc(
            "pump",
            move |mgr: Manager| {
                let done = done.clone();
                async move {
                    for _ in 0..3 {
                        let done = done.clone();
                        mgr.start_worker("loop", move |scope| async move {
                            scope.cancelled().await;
                            done.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, ModuleError>(())
                        });
                    }
                    Ok::<_, ModuleError>(())
                }
            },
            |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
        );

        let group = Group::new([Some(module)]);
        group.start().await.unwrap();
        assert_eq!(group.busy_modules(), ["pump"]);

        group.stop().await.unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), 3);
        assert!(group.busy_modules().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_timeout_invalidates_group() {
        let module: ModuleRef = ModuleFn::arc(
            "stubborn",
            |mgr: Manager| async move {
                mgr.start_worker("ignores-cancel", |_scope| async {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok::<_, ModuleError>(())
                });
                Ok::<_, ModuleError>(())
            },
            |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
        );

        let cfg = Config::default().with_drain_timeout(Some(Duration::from_millis(100)));
        let group = Group::builder(cfg).with_module(module).build();
        group.start().await.unwrap();

        let err = group.stop().await.unwrap_err();
        assert_eq!(group.state(), GroupState::Invalid);
        assert!(matches!(
            err.stop_failures()[0].kind,
            StopFailureKind::DrainTimeout { workers: 1 }
        ));
    }

    #[tokio::test]
    async fn test_panicking_stop_is_reported_and_sweep_continues() {
        let trace = new_trace();
        let bomb: ModuleRef = ModuleFn::arc(
            "bomb",
            |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
            |_mgr: Manager| async {
                let nothing: Option<()> = None;
                nothing.expect("stop exploded");
                Ok::<_, ModuleError>(())
            },
        );
        let group = Group::new([Recorder::new("A", &trace).arc(), Some(bomb)]);

        group.start().await.unwrap();
        let err = group.stop().await.unwrap_err();

        assert_eq!(calls(&trace), ["A.start", "A.stop"]);
        assert_eq!(err.stop_failures()[0].module, "bomb");
        assert!(err.to_string().contains("panic: stop exploded"));
    }

    #[tokio::test]
    async fn test_concurrent_starts_have_one_winner() {
        let trace = new_trace();
        let group = Arc::new(Group::new([Recorder::new("A", &trace).arc()]));

        let a = tokio::spawn({
            let g = group.clone();
            async move { g.start().await.is_ok() }
        });
        let b = tokio::spawn({
            let g = group.clone();
            async move { g.start().await.is_ok() }
        });
        let wins = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(wins.iter().filter(|w| **w).count(), 1);
        assert_eq!(calls(&trace), ["A.start"]);
    }

    #[tokio::test]
    async fn test_events_follow_lifecycle() {
        let trace = new_trace();
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let group = Group::builder(Config::default())
            .with_bus(bus)
            .with_optional(Recorder::new("A", &trace).arc())
            .build();

        group.start().await.unwrap();
        group.stop().await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            [
                EventKind::GroupStarting,
                EventKind::ModuleStarting,
                EventKind::ModuleStarted,
                EventKind::GroupRunning,
                EventKind::GroupStopping,
                EventKind::ModuleStopped,
                EventKind::GroupStopped,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_taken_before_start_tracks_the_replaced_scope() {
        let group = Group::new(Vec::<Option<ModuleRef>>::new());
        let early = group.done();

        group.start().await.unwrap();
        group.stop().await.unwrap();

        assert!(group.is_done());
        assert!(tokio::time::timeout(Duration::from_millis(50), early).await.is_err());
        tokio::time::timeout(Duration::from_millis(50), group.done()).await.unwrap();
    }

    #[tokio::test]
    async fn test_done_resolves_after_stop() {
        let group = Group::new(Vec::<Option<ModuleRef>>::new());
        group.start().await.unwrap();
        let done = group.done();
        group.stop().await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), done).await.unwrap();
    }
}
