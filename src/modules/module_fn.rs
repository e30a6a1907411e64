//! # Closure-backed module (`ModuleFn`)
//!
//! [`ModuleFn`] wraps two closures `Fn(Manager) -> Fut`, one for `start` and one
//! for `stop`, producing a fresh future per call. Handy for small glue modules,
//! demos and tests where a dedicated type would be noise.
//!
//! ## Example
//! ```rust
//! use modvisor::{Manager, Module, ModuleError, ModuleFn, ModuleRef};
//!
//! let m: ModuleRef = ModuleFn::arc(
//!     "listener",
//!     |mgr: Manager| async move {
//!         mgr.info("binding");
//!         Ok::<_, ModuleError>(())
//!     },
//!     |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
//! );
//!
//! assert_eq!(m.name(), "listener");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::Manager;
use crate::error::ModuleError;
use crate::modules::module::Module;

/// Function-backed module implementation.
#[derive(Debug)]
pub struct ModuleFn<S, T> {
    name: Cow<'static, str>,
    start: S,
    stop: T,
}

impl<S, T> ModuleFn<S, T> {
    /// Creates a new function-backed module.
    ///
    /// Prefer [`ModuleFn::arc`] when you immediately need a [`ModuleRef`](crate::ModuleRef).
    pub fn new(name: impl Into<Cow<'static, str>>, start: S, stop: T) -> Self {
        Self {
            name: name.into(),
            start,
            stop,
        }
    }

    /// Creates the module and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, start: S, stop: T) -> Arc<Self> {
        Arc::new(Self::new(name, start, stop))
    }
}

#[async_trait]
impl<S, SFut, T, TFut> Module for ModuleFn<S, T>
where
    S: Fn(Manager) -> SFut + Send + Sync + 'static,
    SFut: Future<Output = Result<(), ModuleError>> + Send + 'static,
    T: Fn(Manager) -> TFut + Send + Sync + 'static,
    TFut: Future<Output = Result<(), ModuleError>> + Send + 'static,
{
    async fn start(&self, mgr: &Manager) -> Result<(), ModuleError> {
        (self.start)(mgr.clone()).await
    }

    async fn stop(&self, mgr: &Manager) -> Result<(), ModuleError> {
        (self.stop)(mgr.clone()).await
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }
}
