use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::{config::Config, group::Group};
use crate::{
    events::Bus,
    modules::ModuleRef,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Group`] with optional event wiring.
///
/// ```rust
/// use std::time::Duration;
/// use modvisor::{Config, Group, Manager, ModuleError, ModuleFn, ModuleRef};
///
/// let cfg = Config::default().with_drain_timeout(Some(Duration::from_secs(10)));
/// let netenv: ModuleRef = ModuleFn::arc(
///     "netenv",
///     |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
///     |_mgr: Manager| async { Ok::<_, ModuleError>(()) },
/// );
///
/// let group = Group::builder(cfg)
///     .with_module(netenv)
///     .with_optional(None)
///     .build();
/// assert_eq!(group.len(), 1);
/// ```
pub struct GroupBuilder {
    cfg: Config,
    modules: Vec<ModuleRef>,
    bus: Option<Bus>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl GroupBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            modules: Vec::new(),
            bus: None,
            subscribers: Vec::new(),
        }
    }

    /// Appends a module; modules start in the order they are added.
    pub fn with_module(mut self, module: ModuleRef) -> Self {
        self.modules.push(module);
        self
    }

    /// Appends a module if present; `None` leaves the group unchanged.
    pub fn with_optional(mut self, module: Option<ModuleRef>) -> Self {
        self.modules.extend(module);
        self
    }

    /// Appends every present module in iteration order.
    pub fn with_modules<I>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = Option<ModuleRef>>,
    {
        self.modules.extend(modules.into_iter().flatten());
        self
    }

    /// Publishes lifecycle events on `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Delivers lifecycle events to `subscribers`.
    ///
    /// A bus is created from `Config::bus_capacity` if none was set.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the group.
    ///
    /// With subscribers configured, this spawns the fan-out listener and must be
    /// called from within a tokio runtime. The listener ends when the group is dropped.
    pub fn build(self) -> Group {
        let mut bus = self.bus;
        let mut listener = None;

        if !self.subscribers.is_empty() {
            let bus = bus.get_or_insert_with(|| Bus::new(self.cfg.bus_capacity_clamped()));
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            listener = Some(spawn_listener(bus, set));
        }

        Group::from_parts(self.modules, &self.cfg, bus, listener)
    }
}

/// Forwards every bus event to the subscriber set.
fn spawn_listener(bus: &Bus, set: SubscriberSet) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(ev),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    })
}
