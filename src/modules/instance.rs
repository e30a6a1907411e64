//! # Single-instance construction guard.
//!
//! Some components must exist at most once per owning instance (for example a
//! module that installs process-wide hooks). [`InstanceGuard`] is an owned
//! one-shot claim: the first [`claim`](InstanceGuard::claim) succeeds, every
//! later one fails with [`GroupError::AlreadyConstructed`]. The guard lives in
//! whatever owns the factory, never in a process-global.
//!
//! ## Example
//! ```rust
//! use modvisor::{GroupError, InstanceGuard};
//!
//! struct Instance {
//!     status_slot: InstanceGuard,
//! }
//!
//! struct Status;
//!
//! impl Status {
//!     fn new(inst: &Instance) -> Result<Self, GroupError> {
//!         let _claim = inst.status_slot.claim("Status")?;
//!         Ok(Status)
//!     }
//! }
//!
//! let inst = Instance { status_slot: InstanceGuard::new() };
//! assert!(Status::new(&inst).is_ok());
//! assert!(matches!(Status::new(&inst), Err(GroupError::AlreadyConstructed { .. })));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::GroupError;

/// One-shot construction slot.
#[derive(Debug, Default)]
pub struct InstanceGuard {
    taken: AtomicBool,
}

/// Proof that a slot was claimed by this caller.
#[derive(Debug)]
#[must_use]
pub struct InstanceClaim {
    name: String,
}

impl InstanceGuard {
    /// Creates an unclaimed slot.
    pub const fn new() -> Self {
        Self {
            taken: AtomicBool::new(false),
        }
    }

    /// Claims the slot for `name`; fails if it was claimed before.
    pub fn claim(&self, name: impl Into<String>) -> Result<InstanceClaim, GroupError> {
        let name = name.into();
        if self
            .taken
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(GroupError::AlreadyConstructed { name });
        }
        Ok(InstanceClaim { name })
    }

    /// Returns `true` once the slot was claimed.
    pub fn is_claimed(&self) -> bool {
        self.taken.load(Ordering::Acquire)
    }
}

impl InstanceClaim {
    /// Name the slot was claimed for.
    pub fn name(&self) -> &str {
        &self.name
    }
}
