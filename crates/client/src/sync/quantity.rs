//! Debounced per-line quantity updates.
//!
//! Rapid +/- clicks move the displayed quantity immediately; the network
//! only sees the value the user settles on. Each click restarts a debounce
//! window, and a scheduled send that has been superseded by a later click
//! simply returns. In-flight requests are never cancelled: the server's
//! response to the final send is adopted as the authoritative snapshot.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, instrument};

use clover_core::ProductId;

use crate::api::CartApi;
use crate::config::ClientConfig;
use crate::models::CartLine;
use crate::notify::Notifier;
use crate::sync::{CartStore, InFlight};

/// Lifecycle of the line's pending send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendState {
    Idle,
    /// A send is scheduled but its debounce window has not elapsed.
    Pending { value: u32 },
    /// The request is on the wire.
    Sending { value: u32 },
}

struct SendSlot {
    /// Bumped on every click. A scheduled send only fires if its sequence
    /// number is still the latest when it wakes.
    seq: u64,
    state: SendState,
}

/// Per-cart-line quantity controller.
///
/// One of these lives next to each rendered cart line. It is rebuilt along
/// with the line whenever the store installs a fresh snapshot, so the stock
/// ceiling it enforces is the one the snapshot carried.
pub struct LineQuantityUpdater<A> {
    inner: Arc<LineInner<A>>,
}

impl<A> Clone for LineQuantityUpdater<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct LineInner<A> {
    api: Arc<A>,
    cart: CartStore<A>,
    notices: Notifier,
    product_id: ProductId,
    /// Stock ceiling from the snapshot this updater was built from.
    ceiling: u32,
    debounce: Duration,
    displayed: watch::Sender<u32>,
    increment_in_flight: InFlight,
    decrement_in_flight: InFlight,
    slot: Mutex<SendSlot>,
}

impl<A: CartApi> LineQuantityUpdater<A> {
    #[must_use]
    pub fn new(cart: &CartStore<A>, line: &CartLine, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(LineInner {
                api: cart.api(),
                cart: cart.clone(),
                notices: cart.notices(),
                product_id: line.product.id.clone(),
                ceiling: line.max_quantity,
                debounce,
                displayed: watch::Sender::new(line.quantity),
                increment_in_flight: InFlight::new(),
                decrement_in_flight: InFlight::new(),
                slot: Mutex::new(SendSlot {
                    seq: 0,
                    state: SendState::Idle,
                }),
            }),
        }
    }

    /// Like [`LineQuantityUpdater::new`] with the debounce window read from
    /// configuration.
    #[must_use]
    pub fn from_config(cart: &CartStore<A>, line: &CartLine, config: &ClientConfig) -> Self {
        Self::new(cart, line, config.quantity_debounce)
    }

    /// The quantity the UI shows right now. Moves on every click, ahead of
    /// the server.
    #[must_use]
    pub fn displayed(&self) -> u32 {
        *self.inner.displayed.borrow()
    }

    /// Subscribe to displayed-quantity changes.
    #[must_use]
    pub fn watch_displayed(&self) -> watch::Receiver<u32> {
        self.inner.displayed.subscribe()
    }

    /// Whether a decrement send is outstanding. Drives the minus button's
    /// spinner independently of the plus button's.
    #[must_use]
    pub fn decrement_in_flight(&self) -> &InFlight {
        &self.inner.decrement_in_flight
    }

    /// Whether an increment send is outstanding.
    #[must_use]
    pub fn increment_in_flight(&self) -> &InFlight {
        &self.inner.increment_in_flight
    }

    /// A line never goes below one unit; removal is a separate operation.
    #[must_use]
    pub fn can_decrement(&self) -> bool {
        self.displayed() > 1
    }

    /// Cannot exceed the product's stock ceiling.
    #[must_use]
    pub fn can_increment(&self) -> bool {
        self.displayed() < self.inner.ceiling
    }

    /// Raise the displayed quantity by one and (re)schedule the send.
    /// At the stock ceiling this is a no-op.
    #[instrument(skip(self), fields(product_id = %self.inner.product_id))]
    pub fn increment(&self) {
        if !self.can_increment() {
            return;
        }
        let next = self.displayed() + 1;
        self.inner.displayed.send_replace(next);
        self.inner.increment_in_flight.set(true);
        self.schedule(next);
    }

    /// Lower the displayed quantity by one and (re)schedule the send.
    /// At one unit this is a no-op.
    #[instrument(skip(self), fields(product_id = %self.inner.product_id))]
    pub fn decrement(&self) {
        if !self.can_decrement() {
            return;
        }
        let next = self.displayed() - 1;
        self.inner.displayed.send_replace(next);
        self.inner.decrement_in_flight.set(true);
        self.schedule(next);
    }

    fn schedule(&self, value: u32) {
        let seq = {
            let mut slot = self.lock_slot();
            slot.seq += 1;
            slot.state = SendState::Pending { value };
            slot.seq
        };
        let updater = self.clone();
        tokio::spawn(async move { updater.run_send(seq).await });
    }

    async fn run_send(self, seq: u64) {
        tokio::time::sleep(self.inner.debounce).await;

        let value = {
            let mut slot = self.lock_slot();
            if slot.seq != seq {
                // A later click restarted the window; this send is dead.
                return;
            }
            let SendState::Pending { value } = slot.state else {
                return;
            };
            slot.state = SendState::Sending { value };
            value
        };

        let result = self
            .inner
            .api
            .update_cart_product_count(&self.inner.product_id, value)
            .await;

        match result {
            Ok(envelope) => self.inner.cart.apply_mutation(envelope),
            Err(error) => {
                error!(
                    error = %error,
                    product_id = %self.inner.product_id,
                    "quantity update failed",
                );
                self.inner.notices.error("Failed to update the quantity");
            }
        }

        // Both spinners stop once the response resolves, whatever the
        // outcome and whichever button started this send.
        self.inner.increment_in_flight.set(false);
        self.inner.decrement_in_flight.set(false);

        let mut slot = self.lock_slot();
        if slot.seq == seq {
            slot.state = SendState::Idle;
        }
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, SendSlot> {
        self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
