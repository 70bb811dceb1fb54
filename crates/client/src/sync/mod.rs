//! Client-side synchronization stores.
//!
//! Each store is the single owner of one server-backed collection's
//! client-side view: it refreshes from the server on session transitions and
//! foreign change signals, applies optimistic local writes, and exposes its
//! state through a watch channel. UI layers get read access and a narrow set
//! of operations; they never mutate the state directly.

pub mod cart;
pub mod quantity;
pub mod wishlist;

pub use cart::{CartStore, CartView};
pub use quantity::LineQuantityUpdater;
pub use wishlist::{WishlistStore, WishlistView};

use tokio::sync::watch;

/// Lifecycle of a store's view of its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    /// No fetch has happened yet (session still resolving).
    #[default]
    Uninitialized,
    /// A fetch is outstanding.
    Loading,
    /// The view reflects the last successful fetch.
    Ready,
    /// Signed out, or the last fetch failed; the view is a safe default.
    Empty,
}

/// An observable in-flight flag.
///
/// Callers hand one to an operation (or read the ones a component owns) to
/// drive per-button loading states. The flag is cleared on every exit path,
/// including cancellation, so the UI can never get stuck in a loading state.
#[derive(Debug, Clone)]
pub struct InFlight {
    tx: watch::Sender<bool>,
}

impl InFlight {
    /// Create a cleared flag.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(false),
        }
    }

    /// Whether the operation is currently in flight.
    #[must_use]
    pub fn get(&self) -> bool {
        *self.tx.borrow()
    }

    /// Subscribe to flag changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub(crate) fn set(&self, value: bool) {
        self.tx.send_replace(value);
    }

    /// Raise the flag and return a guard that lowers it on drop.
    pub(crate) fn raise(&self) -> InFlightGuard {
        self.set(true);
        InFlightGuard {
            tx: self.tx.clone(),
        }
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct InFlightGuard {
    tx: watch::Sender<bool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.tx.send_replace(false);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testutil {
    //! In-memory API double shared by the store tests.

    use std::pin::pin;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

    use serde_json::json;
    use tokio::sync::Notify;

    use clover_core::ProductId;

    use crate::api::types::{
        AddToCartEnvelope, CartEnvelope, ClearCartEnvelope, RawProduct, WishlistEnvelope,
        WishlistMutationEnvelope,
    };
    use crate::api::{ApiError, CartApi, WishlistApi};

    /// Scripted backend: returns canned envelopes and records every call.
    #[derive(Default)]
    pub struct MockApi {
        /// `numOfCartItems` the next cart read or add reports.
        pub cart_count: AtomicU32,
        /// Stock ceiling reported for the single scripted cart line.
        pub stock_ceiling: AtomicU32,
        /// When set, every call fails with a 500.
        pub fail: AtomicBool,
        pub get_cart_calls: AtomicUsize,
        pub add_cart_calls: AtomicUsize,
        pub update_calls: Mutex<Vec<(ProductId, u32)>>,
        pub get_wishlist_calls: AtomicUsize,
        /// Raw records the next wishlist read returns.
        pub wishlist_items: Mutex<Vec<RawProduct>>,
        /// When set, reads capture their response and then park until
        /// released, simulating a slow wire.
        hold_reads: AtomicBool,
        read_gate: Notify,
    }

    impl MockApi {
        pub fn with_cart_count(count: u32) -> Self {
            let mock = Self::default();
            mock.cart_count.store(count, Ordering::SeqCst);
            mock.stock_ceiling.store(10, Ordering::SeqCst);
            mock
        }

        pub fn wishlist_of(items: Vec<RawProduct>) -> Self {
            let mock = Self::default();
            *mock.wishlist_items.lock().unwrap() = items;
            mock
        }

        /// Park subsequent reads on the wire until [`MockApi::release_reads`].
        /// A parked read's response reflects the state at request time.
        pub fn hold_reads(&self) {
            self.hold_reads.store(true, Ordering::SeqCst);
        }

        /// Deliver every parked read's response.
        pub fn release_reads(&self) {
            self.hold_reads.store(false, Ordering::SeqCst);
            self.read_gate.notify_waiters();
        }

        async fn wait_if_held(&self) {
            loop {
                let mut notified = pin!(self.read_gate.notified());
                notified.as_mut().enable();
                if !self.hold_reads.load(Ordering::SeqCst) {
                    return;
                }
                notified.await;
            }
        }

        fn check_failure(&self) -> Result<(), ApiError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ApiError::Status {
                    status: 500,
                    message: "scripted failure".to_owned(),
                });
            }
            Ok(())
        }

        pub fn cart_envelope(&self, line_count: u32) -> CartEnvelope {
            serde_json::from_value(json!({
                "status": "success",
                "numOfCartItems": self.cart_count.load(Ordering::SeqCst),
                "cartId": "cart1",
                "data": {
                    "_id": "cart1",
                    "cartOwner": "u1",
                    "totalCartPrice": 100.0,
                    "products": [{
                        "_id": "l1",
                        "count": line_count,
                        "price": 25.0,
                        "product": {
                            "_id": "p1",
                            "title": "Desk Lamp",
                            "quantity": self.stock_ceiling.load(Ordering::SeqCst),
                        },
                    }],
                },
            }))
            .unwrap()
        }
    }

    impl CartApi for MockApi {
        async fn get_user_cart(&self) -> Result<CartEnvelope, ApiError> {
            self.get_cart_calls.fetch_add(1, Ordering::SeqCst);
            let envelope = self.cart_envelope(1);
            self.wait_if_held().await;
            self.check_failure()?;
            Ok(envelope)
        }

        async fn add_product_to_cart(
            &self,
            _product_id: &ProductId,
        ) -> Result<AddToCartEnvelope, ApiError> {
            self.add_cart_calls.fetch_add(1, Ordering::SeqCst);
            self.check_failure()?;
            Ok(serde_json::from_value(json!({
                "status": "success",
                "message": "Product added successfully to your cart",
                "numOfCartItems": self.cart_count.load(Ordering::SeqCst),
                "cartId": "cart1",
                "data": {
                    "_id": "cart1",
                    "cartOwner": "u1",
                    "products": [{ "_id": "l1", "count": 1, "product": "p1" }],
                },
            }))
            .unwrap())
        }

        async fn update_cart_product_count(
            &self,
            product_id: &ProductId,
            count: u32,
        ) -> Result<CartEnvelope, ApiError> {
            self.update_calls
                .lock()
                .unwrap()
                .push((product_id.clone(), count));
            self.check_failure()?;
            self.cart_count.store(count, Ordering::SeqCst);
            Ok(self.cart_envelope(count))
        }

        async fn remove_cart_item(
            &self,
            _product_id: &ProductId,
        ) -> Result<CartEnvelope, ApiError> {
            self.check_failure()?;
            self.cart_count.store(0, Ordering::SeqCst);
            Ok(serde_json::from_value(json!({
                "status": "success",
                "numOfCartItems": 0,
                "cartId": "cart1",
                "data": { "_id": "cart1", "cartOwner": "u1", "products": [] },
            }))
            .unwrap())
        }

        async fn clear_cart(&self) -> Result<ClearCartEnvelope, ApiError> {
            self.check_failure()?;
            self.cart_count.store(0, Ordering::SeqCst);
            Ok(serde_json::from_value(json!({ "message": "success" })).unwrap())
        }
    }

    impl WishlistApi for MockApi {
        async fn get_wishlist(&self) -> Result<WishlistEnvelope, ApiError> {
            self.get_wishlist_calls.fetch_add(1, Ordering::SeqCst);
            let items = self.wishlist_items.lock().unwrap().clone();
            self.wait_if_held().await;
            self.check_failure()?;
            Ok(WishlistEnvelope {
                status: Some("success".to_owned()),
                count: u32::try_from(items.len()).unwrap_or(0),
                data: items,
            })
        }

        async fn add_wishlist_item(
            &self,
            product_id: &ProductId,
        ) -> Result<WishlistMutationEnvelope, ApiError> {
            self.check_failure()?;
            self.wishlist_items.lock().unwrap().push(
                serde_json::from_value(json!({ "_id": product_id.as_str() })).unwrap(),
            );
            Ok(WishlistMutationEnvelope {
                status: Some("success".to_owned()),
                message: Some("Product added successfully to your wishlist".to_owned()),
                data: vec![product_id.clone()],
            })
        }

        async fn remove_wishlist_item(
            &self,
            product_id: &ProductId,
        ) -> Result<WishlistMutationEnvelope, ApiError> {
            self.check_failure()?;
            self.wishlist_items
                .lock()
                .unwrap()
                .retain(|item| item.id.as_ref() != Some(product_id));
            Ok(WishlistMutationEnvelope {
                status: Some("success".to_owned()),
                message: Some("Product removed successfully from your wishlist".to_owned()),
                data: vec![],
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_guard_clears_on_drop() {
        let flag = InFlight::new();
        let watcher = flag.watch();
        assert!(!flag.get());
        {
            let _guard = flag.raise();
            assert!(flag.get());
            assert!(*watcher.borrow());
        }
        assert!(!flag.get());
        assert!(!*watcher.borrow());
    }
}
