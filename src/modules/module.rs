//! # Module contract.
//!
//! A [`Module`] is a pluggable component with two operations, [`start`](Module::start)
//! and [`stop`](Module::stop). Both receive the module's own [`Manager`], which
//! carries its cancellation scope, worker registry and logging span.
//!
//! ## Contract
//! - `start` is called at most once before a matching `stop`.
//! - `stop` is called even if `start` failed, so a module can release whatever
//!   it acquired before failing. It must not assume its setup completed.
//! - Long-running work belongs in workers ([`Manager::start_worker`]); `start`
//!   should return once the module is up.

use std::any::type_name;
use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::Manager;
use crate::error::ModuleError;

/// Shared handle to a module.
pub type ModuleRef = Arc<dyn Module>;

/// # Startable, stoppable component.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use modvisor::{Manager, Module, ModuleError};
///
/// struct Status;
///
/// #[async_trait]
/// impl Module for Status {
///     async fn start(&self, mgr: &Manager) -> Result<(), ModuleError> {
///         mgr.start_worker("push", |scope| async move {
///             scope.cancelled().await;
///             Ok::<_, ModuleError>(())
///         });
///         Ok(())
///     }
///
///     async fn stop(&self, _mgr: &Manager) -> Result<(), ModuleError> {
///         Ok(())
///     }
/// }
///
/// assert_eq!(Status.name(), "Status");
/// ```
#[async_trait]
pub trait Module: Send + Sync + 'static {
    /// Brings the module up.
    async fn start(&self, mgr: &Manager) -> Result<(), ModuleError>;

    /// Releases everything the module holds.
    ///
    /// The group cancels the manager's scope and drains its workers right after this returns.
    async fn stop(&self, mgr: &Manager) -> Result<(), ModuleError>;

    /// Name used in logs and errors. Defaults to the concrete type name without its path.
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(short_type_name(type_name::<Self>()))
    }
}

/// Strips the module path from a type name, keeping generic arguments.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let head_end = full.find('<').unwrap_or(full.len());
    match full[..head_end].rfind("::") {
        Some(i) => &full[i + 2..],
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Resolver;

    #[async_trait]
    impl Module for Resolver {
        async fn start(&self, _mgr: &Manager) -> Result<(), ModuleError> {
            Ok(())
        }
        async fn stop(&self, _mgr: &Manager) -> Result<(), ModuleError> {
            Ok(())
        }
    }

    #[test]
    fn test_default_name_is_type_name() {
        assert_eq!(Resolver.name(), "Resolver");
        let shared: ModuleRef = Arc::new(Resolver);
        assert_eq!(shared.name(), "Resolver");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::Netenv"), "Netenv");
        assert_eq!(short_type_name("Plain"), "Plain");
        assert_eq!(short_type_name("a::Wrap<b::Inner>"), "Wrap<b::Inner>");
    }
}
