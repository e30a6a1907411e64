//! # Event bus for broadcasting lifecycle events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that lets a
//! group, its managers and the process driver publish without blocking.
//!
//! ```text
//! Publishers (many):                    Receivers (any):
//!   Group    ──┐
//!   Manager  ──┼──────► Bus ───────► subscriber listener ────► SubscriberSet
//!   Driver   ──┘  (broadcast chan)   Bus::subscribe() in tests / callers
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks, lifecycle code never waits on observers.
//! - **Bounded capacity**: one ring buffer stores recent events for all receivers;
//!   slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active receivers at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for lifecycle events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_publish_reaches_every_receiver() {
        let bus = Bus::new(0);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(Event::new(EventKind::ShutdownRequested));

        assert_eq!(a.recv().await.map(|e| e.kind).ok(), Some(EventKind::ShutdownRequested));
        assert_eq!(b.recv().await.map(|e| e.kind).ok(), Some(EventKind::ShutdownRequested));
    }

    #[test]
    fn test_publish_without_receivers_is_noop() {
        let bus = Bus::new(4);
        bus.publish(Event::new(EventKind::GroupRunning));
    }
}
