//! Change notification bus.
//!
//! When a write succeeds, the originating store publishes a signal naming
//! the collection that changed. Other live instances of the application
//! ("tabs") treat the signal as a trigger to re-fetch; it never carries the
//! new state itself.
//!
//! Signals from an instance's own [`BusHandle`] are filtered out on the
//! subscriber side: the writer already holds current state, so self-notifying
//! would only cause a redundant fetch.
//!
//! The in-process backend here is a `tokio::sync::broadcast` channel. Other
//! transports (a storage-event listener, a server-sent-event stream, a
//! WebSocket) can participate by forwarding their notifications through
//! [`SignalBus::inject`].

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

const BUS_CAPACITY: usize = 64;

/// What changed. Signals carry "something changed", never the new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// The user's cart changed.
    CartUpdated,
    /// The user's wishlist changed.
    WishlistUpdated,
}

/// Identifies the application instance a signal came from.
pub type OriginId = Uuid;

/// A change notification.
#[derive(Debug, Clone)]
pub struct Signal {
    pub topic: Topic,
    pub origin: OriginId,
    pub at: DateTime<Utc>,
}

/// The shared bus connecting every live instance of the application.
#[derive(Clone)]
pub struct SignalBus {
    tx: broadcast::Sender<Signal>,
}

impl SignalBus {
    /// Create a new bus.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Create a handle for one application instance. Each handle gets its
    /// own origin id so its subscribers never see its own writes.
    #[must_use]
    pub fn handle(&self) -> BusHandle {
        BusHandle {
            tx: self.tx.clone(),
            origin: Uuid::new_v4(),
        }
    }

    /// Forward a signal produced by an external transport onto the bus.
    pub fn inject(&self, signal: Signal) {
        // No subscribers is fine; nothing to notify.
        let _ = self.tx.send(signal);
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One application instance's connection to the bus.
#[derive(Clone)]
pub struct BusHandle {
    tx: broadcast::Sender<Signal>,
    origin: OriginId,
}

impl BusHandle {
    /// This handle's origin id.
    #[must_use]
    pub const fn origin(&self) -> OriginId {
        self.origin
    }

    /// Publish a change signal to every other instance.
    pub fn publish(&self, topic: Topic) {
        let signal = Signal {
            topic,
            origin: self.origin,
            at: Utc::now(),
        };
        debug!(?topic, origin = %self.origin, "publishing change signal");
        let _ = self.tx.send(signal);
    }

    /// Subscribe to signals from *other* instances.
    #[must_use]
    pub fn subscribe(&self) -> SignalStream {
        SignalStream {
            rx: self.tx.subscribe(),
            origin: self.origin,
        }
    }
}

/// Stream of foreign change signals.
pub struct SignalStream {
    rx: broadcast::Receiver<Signal>,
    origin: OriginId,
}

impl SignalStream {
    /// Receive the next signal from another instance, or `None` once the
    /// bus is gone.
    ///
    /// Signals are advisory: if this subscriber lags behind and the channel
    /// drops some, that is fine — the next received signal still triggers
    /// the same re-fetch.
    pub async fn recv(&mut self) -> Option<Signal> {
        loop {
            match self.rx.recv().await {
                Ok(signal) if signal.origin == self.origin => {}
                Ok(signal) => return Some(signal),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "signal stream lagged, continuing");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Drain any already-delivered signals without waiting and return how
    /// many were discarded. Used to coalesce a flurry of signals into a
    /// single re-fetch after the settle delay.
    pub fn drain(&mut self) -> usize {
        let mut discarded = 0;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_reaches_other_instances() {
        let bus = SignalBus::new();
        let tab_a = bus.handle();
        let tab_b = bus.handle();

        let mut signals = tab_b.subscribe();
        tab_a.publish(Topic::CartUpdated);

        let signal = signals.recv().await.expect("signal delivered");
        assert_eq!(signal.topic, Topic::CartUpdated);
        assert_eq!(signal.origin, tab_a.origin());
    }

    #[tokio::test]
    async fn test_own_signals_are_filtered() {
        let bus = SignalBus::new();
        let tab_a = bus.handle();
        let tab_b = bus.handle();

        let mut signals = tab_a.subscribe();
        tab_a.publish(Topic::WishlistUpdated); // self: must not surface
        tab_b.publish(Topic::CartUpdated);

        let signal = signals.recv().await.expect("signal delivered");
        assert_eq!(signal.topic, Topic::CartUpdated);
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_bus_closes() {
        let bus = SignalBus::new();
        let handle = bus.handle();
        let mut signals = handle.subscribe();

        drop(bus);
        drop(handle);

        assert!(signals.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_injected_signals_are_delivered() {
        let bus = SignalBus::new();
        let tab = bus.handle();
        let mut signals = tab.subscribe();

        // As if a storage-event listener forwarded a foreign write.
        bus.inject(Signal {
            topic: Topic::CartUpdated,
            origin: Uuid::new_v4(),
            at: Utc::now(),
        });

        assert!(signals.recv().await.is_some());
    }
}
