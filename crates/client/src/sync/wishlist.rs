//! Wishlist synchronization store.
//!
//! Keeps the set of wished products keyed by product id so membership checks
//! from product grids stay O(1). Toggling is asymmetric on purpose: removal
//! envelopes carry enough to update locally, but addition envelopes carry
//! ids only, so an add always forces a full re-fetch.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use clover_core::ProductId;

use crate::api::WishlistApi;
use crate::bus::{BusHandle, Topic};
use crate::config::ClientConfig;
use crate::models::{ProductSummary, normalize};
use crate::notify::Notifier;
use crate::session::SessionState;
use crate::sync::SyncPhase;

/// Snapshot of the wishlist as the UI should render it.
#[derive(Debug, Clone, Default)]
pub struct WishlistView {
    pub phase: SyncPhase,
    pub items: HashMap<ProductId, ProductSummary>,
}

impl WishlistView {
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.contains_key(product_id)
    }
}

/// Cheaply cloneable handle to the wishlist store.
pub struct WishlistStore<A> {
    inner: Arc<WishlistStoreInner<A>>,
}

impl<A> Clone for WishlistStore<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct WishlistStoreInner<A> {
    api: Arc<A>,
    bus: BusHandle,
    notices: Notifier,
    session: watch::Receiver<SessionState>,
    state: watch::Sender<WishlistView>,
    generation: AtomicU64,
    settle: Duration,
}

impl<A: WishlistApi> WishlistStore<A> {
    pub fn new(
        api: Arc<A>,
        session: watch::Receiver<SessionState>,
        bus: BusHandle,
        notices: Notifier,
        settle: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(WishlistStoreInner {
                api,
                bus,
                notices,
                session,
                state: watch::Sender::new(WishlistView::default()),
                generation: AtomicU64::new(0),
                settle,
            }),
        }
    }

    /// Like [`WishlistStore::new`] with the settle window read from
    /// configuration.
    pub fn from_config(
        api: Arc<A>,
        session: watch::Receiver<SessionState>,
        bus: BusHandle,
        notices: Notifier,
        config: &ClientConfig,
    ) -> Self {
        Self::new(api, session, bus, notices, config.signal_settle)
    }

    /// Subscribe to view changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<WishlistView> {
        self.inner.state.subscribe()
    }

    /// Current view snapshot.
    #[must_use]
    pub fn view(&self) -> WishlistView {
        self.inner.state.borrow().clone()
    }

    /// O(1) membership check against the current snapshot.
    #[must_use]
    pub fn is_in_wishlist(&self, product_id: &ProductId) -> bool {
        self.inner.state.borrow().contains(product_id)
    }

    /// Spawn the reconciler task mirroring the cart store's: re-fetch on
    /// session transitions and on foreign `WishlistUpdated` signals.
    pub fn spawn_reconciler(&self) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move { store.reconcile().await })
    }

    async fn reconcile(self) {
        let mut session = self.inner.session.clone();
        let mut signals = self.inner.bus.subscribe();

        let state = session.borrow_and_update().clone();
        self.on_session(&state).await;

        loop {
            tokio::select! {
                changed = session.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = session.borrow_and_update().clone();
                    self.on_session(&state).await;
                }
                signal = signals.recv() => {
                    match signal {
                        Some(signal) if signal.topic == Topic::WishlistUpdated => {
                            tokio::time::sleep(self.inner.settle).await;
                            let drained = signals.drain();
                            debug!(drained, "wishlist change signal settled, refreshing");
                            self.load_wishlist().await;
                        }
                        Some(_) => {}
                        None => break,
                    }
                }
            }
        }
    }

    async fn on_session(&self, state: &SessionState) {
        match state {
            SessionState::Loading => {}
            SessionState::Authenticated { .. } => self.load_wishlist().await,
            SessionState::Unauthenticated => self.force_empty(),
        }
    }

    /// Fetch the wishlist and install the result, unless a newer write moved
    /// the store on while the request was in flight.
    #[instrument(skip(self))]
    pub async fn load_wishlist(&self) {
        let generation = self.begin_write();

        if !self.is_authenticated() {
            self.settle_empty(generation);
            return;
        }

        self.inner
            .state
            .send_modify(|view| view.phase = SyncPhase::Loading);

        match self.inner.api.get_wishlist().await {
            Ok(envelope) => {
                if !self.is_current(generation) {
                    return;
                }
                let items = envelope
                    .data
                    .into_iter()
                    .map(normalize::product_from_raw)
                    .map(|product| (product.id.clone(), product))
                    .collect();
                self.inner.state.send_replace(WishlistView {
                    phase: SyncPhase::Ready,
                    items,
                });
            }
            Err(error) => {
                error!(error = %error, "wishlist fetch failed");
                self.inner.notices.error("Failed to load your wishlist");
                self.settle_empty(generation);
            }
        }
    }

    /// Add the product if it is not wished, remove it if it is.
    ///
    /// Removal updates the snapshot locally from the id alone. Addition
    /// cannot: the mutation envelope carries ids only, so a successful add
    /// is followed by a full re-fetch to pick up the product record.
    #[instrument(skip(self))]
    pub async fn toggle_wishlist_item(&self, product_id: &ProductId) {
        if self.is_in_wishlist(product_id) {
            match self.inner.api.remove_wishlist_item(product_id).await {
                Ok(envelope) => {
                    self.begin_write();
                    self.inner.state.send_modify(|view| {
                        view.items.remove(product_id);
                    });
                    self.inner.bus.publish(Topic::WishlistUpdated);
                    let message = envelope
                        .message
                        .unwrap_or_else(|| "Removed from your wishlist".to_owned());
                    self.inner.notices.success(message);
                }
                Err(error) => {
                    error!(error = %error, "wishlist removal failed");
                    self.inner.notices.error("Failed to update your wishlist");
                }
            }
        } else {
            match self.inner.api.add_wishlist_item(product_id).await {
                Ok(envelope) => {
                    let message = envelope
                        .message
                        .unwrap_or_else(|| "Added to your wishlist".to_owned());
                    self.inner.notices.success(message);
                    self.load_wishlist().await;
                    self.inner.bus.publish(Topic::WishlistUpdated);
                }
                Err(error) => {
                    error!(error = %error, "wishlist addition failed");
                    self.inner.notices.error("Failed to update your wishlist");
                }
            }
        }
    }

    fn force_empty(&self) {
        self.begin_write();
        self.inner.state.send_replace(WishlistView {
            phase: SyncPhase::Empty,
            items: HashMap::new(),
        });
    }

    fn settle_empty(&self, generation: u64) {
        if self.is_current(generation) {
            self.inner.state.send_replace(WishlistView {
                phase: SyncPhase::Empty,
                items: HashMap::new(),
            });
        }
    }

    fn begin_write(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.generation.load(Ordering::SeqCst) == generation
    }

    fn is_authenticated(&self) -> bool {
        self.inner.session.borrow().is_authenticated()
    }
}
