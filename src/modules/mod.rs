//! # Module abstractions.
//!
//! This module provides the module-related types:
//! - [`Module`] - trait every supervised component implements (`start`/`stop`)
//! - [`ModuleFn`] - closure-backed module implementation
//! - [`ModuleRef`] - shared reference to a module (`Arc<dyn Module>`)
//! - [`InstanceGuard`] - owned one-shot claim for single-instance factories

mod instance;
mod module;
mod module_fn;

pub use instance::{InstanceClaim, InstanceGuard};
pub use module::{Module, ModuleRef};
pub use module_fn::ModuleFn;
