//! Error types used by the modvisor runtime and its modules.
//!
//! This module defines three error enums:
//!
//! - [`ModuleError`] - errors raised by modules and their workers.
//! - [`GroupError`] - errors raised by a [`Group`](crate::Group) lifecycle transition.
//! - [`RuntimeError`] - errors raised by the process driver around a group.
//!
//! All of them provide `as_label` (stable snake_case label for logs/metrics).
//! Teardown failures are collected as [`StopFailure`] records so that a single
//! error can report every module that did not release its resources.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::core::GroupState;

/// Boxed error type accepted from module code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by module code.
///
/// Returned from [`Module::start`](crate::Module::start),
/// [`Module::stop`](crate::Module::stop) and from worker tasks spawned with
/// [`Manager::start_worker`](crate::Manager::start_worker).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ModuleError {
    /// Operation failed with a plain message.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Operation gave up because its cancellation scope was cancelled.
    #[error("context cancelled")]
    Canceled,

    /// Operation failed with an arbitrary error value.
    #[error(transparent)]
    Other(#[from] BoxError),
}

impl ModuleError {
    /// Shorthand for [`ModuleError::Fail`].
    pub fn fail(error: impl fmt::Display) -> Self {
        ModuleError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use modvisor::ModuleError;
    ///
    /// assert_eq!(ModuleError::fail("boom").as_label(), "module_failed");
    /// assert_eq!(ModuleError::Canceled.as_label(), "module_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ModuleError::Fail { .. } => "module_failed",
            ModuleError::Canceled => "module_canceled",
            ModuleError::Other(_) => "module_error",
        }
    }
}

/// Why a single module could not be verified as torn down.
#[derive(Debug)]
pub enum StopFailureKind {
    /// [`Module::stop`](crate::Module::stop) returned an error.
    Stop(ModuleError),
    /// Workers were still running when the drain timeout elapsed.
    DrainTimeout {
        /// Workers still registered when the wait gave up.
        workers: usize,
    },
}

/// One module's teardown failure, recorded during a rollback sweep.
#[derive(Debug)]
pub struct StopFailure {
    /// Name of the module.
    pub module: String,
    /// What went wrong.
    pub kind: StopFailureKind,
}

impl fmt::Display for StopFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StopFailureKind::Stop(err) => write!(f, "{}: {err}", self.module),
            StopFailureKind::DrainTimeout { workers } => {
                write!(f, "{}: timed out waiting for {workers} worker(s)", self.module)
            }
        }
    }
}

struct FailureList<'a>(&'a [StopFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

/// # Errors produced by group lifecycle transitions.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum GroupError {
    /// The transition is not legal from the current state. Nothing was touched.
    #[error("cannot {op} group, state: {state}")]
    StateConflict {
        /// Attempted operation (`"start"` or `"stop"`).
        op: &'static str,
        /// State observed when the transition was refused.
        state: GroupState,
    },

    /// The group is invalid: an earlier teardown could not be verified.
    #[error("cannot {op} group: teardown of a previous run could not be verified")]
    Invalid {
        /// Attempted operation (`"start"` or `"stop"`).
        op: &'static str,
    },

    /// A module failed to start; the started prefix was rolled back.
    #[error("failed to start {module}: {source}")]
    StartFailed {
        /// Name of the module whose start failed.
        module: String,
        /// The module's own error.
        #[source]
        source: ModuleError,
        /// Teardown failures hit while rolling back (empty if rollback was clean).
        rollback: Vec<StopFailure>,
    },

    /// One or more modules failed to stop or to drain their workers.
    #[error("failed to stop: {}", FailureList(.failures))]
    StopFailed {
        /// Every module that could not be verified as stopped, in stop order.
        failures: Vec<StopFailure>,
    },

    /// A single-instance factory was asked for a second instance.
    #[error("only one instance of {name} allowed")]
    AlreadyConstructed {
        /// Name of the guarded component.
        name: String,
    },
}

impl GroupError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            GroupError::StateConflict { .. } => "group_state_conflict",
            GroupError::Invalid { .. } => "group_invalid",
            GroupError::StartFailed { .. } => "group_start_failed",
            GroupError::StopFailed { .. } => "group_stop_failed",
            GroupError::AlreadyConstructed { .. } => "group_already_constructed",
        }
    }

    /// Teardown failures carried by this error, if any.
    pub fn stop_failures(&self) -> &[StopFailure] {
        match self {
            GroupError::StartFailed { rollback, .. } => rollback,
            GroupError::StopFailed { failures } => failures,
            _ => &[],
        }
    }
}

/// # Errors produced by the process driver.
///
/// See [`run_until_signal`](crate::run_until_signal).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The group failed to start.
    #[error(transparent)]
    Start(GroupError),

    /// The group was stopped but teardown reported failures.
    #[error(transparent)]
    Stop(GroupError),

    /// Stopping the group took longer than the configured grace period.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Modules that still had running workers.
        stuck: Vec<String>,
    },

    /// OS signal handlers could not be installed.
    #[error("failed to listen for shutdown signals: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use modvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Start(_) => "runtime_start_failed",
            RuntimeError::Stop(_) => "runtime_stop_failed",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal_failed",
        }
    }
}
