//! Cart synchronization store.
//!
//! Owns the client-side cart view: badge count, line snapshot, and sync
//! phase. All cart mutations go through here so that every change adopts the
//! server's envelope verbatim and announces itself on the signal bus.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use clover_core::ProductId;

use crate::api::CartApi;
use crate::api::types::CartEnvelope;
use crate::bus::{BusHandle, Topic};
use crate::config::ClientConfig;
use crate::models::{Cart, normalize};
use crate::notify::Notifier;
use crate::session::SessionState;
use crate::sync::{InFlight, SyncPhase};

/// Snapshot of the cart as the UI should render it.
#[derive(Debug, Clone, Default)]
pub struct CartView {
    pub phase: SyncPhase,
    /// Badge count, adopted verbatim from the server's `numOfCartItems`.
    pub item_count: u32,
    /// Full cart snapshot from the last fetch or mutation that returned one.
    pub cart: Option<Cart>,
}

/// Cheaply cloneable handle to the cart store.
pub struct CartStore<A> {
    inner: Arc<CartStoreInner<A>>,
}

impl<A> Clone for CartStore<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CartStoreInner<A> {
    api: Arc<A>,
    bus: BusHandle,
    notices: Notifier,
    session: watch::Receiver<SessionState>,
    state: watch::Sender<CartView>,
    /// Monotone refresh generation. A fetch only installs its result if no
    /// newer write started while it was on the wire, so a stale response can
    /// never overwrite a newer one.
    generation: AtomicU64,
    /// How long a foreign change signal is allowed to settle before the
    /// store re-fetches. A burst of signals inside this window costs one
    /// fetch, not one per signal.
    settle: Duration,
}

impl<A: CartApi> CartStore<A> {
    pub fn new(
        api: Arc<A>,
        session: watch::Receiver<SessionState>,
        bus: BusHandle,
        notices: Notifier,
        settle: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                api,
                bus,
                notices,
                session,
                state: watch::Sender::new(CartView::default()),
                generation: AtomicU64::new(0),
                settle,
            }),
        }
    }

    /// Like [`CartStore::new`] with the settle window read from configuration.
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
    pub fn watch(&self) -> watch::Receiver<CartView> {
        self.inner.state.subscribe()
    }

    /// Current view snapshot.
    #[must_use]
    pub fn view(&self) -> CartView {
        self.inner.state.borrow().clone()
    }

    /// Spawn the reconciler task: it re-fetches on session transitions and
    /// on foreign `CartUpdated` signals, and exits when the session or the
    /// bus goes away.
    pub fn spawn_reconciler(&self) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move { store.reconcile().await })
    }

    async fn reconcile(self) {
        let mut session = self.inner.session.clone();
        let mut signals = self.inner.bus.subscribe();

        // Apply whatever state the session is already in.
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
                        Some(signal) if signal.topic == Topic::CartUpdated => {
                            tokio::time::sleep(self.inner.settle).await;
                            let drained = signals.drain();
                            debug!(drained, "cart change signal settled, refreshing");
                            self.refresh().await;
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
            // Still resolving; do not flash an empty cart at the user.
            SessionState::Loading => {}
            SessionState::Authenticated { .. } => self.refresh().await,
            SessionState::Unauthenticated => self.force_empty(),
        }
    }

    /// Fetch the cart and install the result, unless a newer write moved the
    /// store on while the request was in flight.
    #[instrument(skip(self))]
    pub async fn refresh(&self) {
        let generation = self.begin_write();

        if !self.is_authenticated() {
            // Signed-out users have no server cart; skip the network entirely.
            self.settle_empty(generation);
            return;
        }

        self.inner
            .state
            .send_modify(|view| view.phase = SyncPhase::Loading);

        match self.inner.api.get_user_cart().await {
            Ok(envelope) => {
                if self.is_current(generation) {
                    self.install(envelope);
                }
            }
            Err(error) => {
                error!(error = %error, "cart fetch failed");
                self.inner.notices.error("Failed to load your cart");
                self.settle_empty(generation);
            }
        }
    }

    /// Add one unit of a product. The flag is raised for the duration of the
    /// request and lowered on every exit path.
    #[instrument(skip(self, in_flight))]
    pub async fn add_to_cart(&self, product_id: &ProductId, in_flight: &InFlight) {
        let _guard = in_flight.raise();

        match self.inner.api.add_product_to_cart(product_id).await {
            Ok(envelope) => {
                self.begin_write();
                self.inner.state.send_modify(|view| {
                    view.phase = SyncPhase::Ready;
                    // The add envelope carries ids-only lines, so only the
                    // count is adopted; the line snapshot stays until the
                    // next full fetch.
                    view.item_count = envelope.num_of_cart_items;
                });
                self.inner.bus.publish(Topic::CartUpdated);
                let message = envelope
                    .message
                    .unwrap_or_else(|| "Added to your cart".to_owned());
                self.inner.notices.success(message);
            }
            Err(error) => {
                error!(error = %error, "add to cart failed");
                self.inner.notices.error("Failed to add to your cart");
            }
        }
    }

    /// Remove a product's line entirely.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, product_id: &ProductId) {
        match self.inner.api.remove_cart_item(product_id).await {
            Ok(envelope) => {
                self.apply_mutation(envelope);
                self.inner.notices.success("Removed from your cart");
            }
            Err(error) => {
                error!(error = %error, "remove cart item failed");
                self.inner.notices.error("Failed to remove from your cart");
            }
        }
    }

    /// Delete the whole cart.
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        match self.inner.api.clear_cart().await {
            Ok(_) => {
                self.begin_write();
                self.inner.state.send_modify(|view| {
                    view.phase = SyncPhase::Ready;
                    view.item_count = 0;
                    view.cart = view.cart.take().map(|cart| Cart::empty(cart.id));
                });
                self.inner.bus.publish(Topic::CartUpdated);
                self.inner.notices.success("Cart cleared");
            }
            Err(error) => {
                error!(error = %error, "clear cart failed");
                self.inner.notices.error("Failed to clear your cart");
            }
        }
    }

    /// Install a mutation envelope that carries a full cart snapshot, and
    /// announce the change on the bus.
    pub(crate) fn apply_mutation(&self, envelope: CartEnvelope) {
        self.begin_write();
        self.install(envelope);
        self.inner.bus.publish(Topic::CartUpdated);
    }

    pub(crate) fn api(&self) -> Arc<A> {
        Arc::clone(&self.inner.api)
    }

    pub(crate) fn notices(&self) -> Notifier {
        self.inner.notices.clone()
    }

    fn install(&self, envelope: CartEnvelope) {
        let item_count = envelope.num_of_cart_items;
        let cart = normalize::cart_from_envelope(envelope);
        self.inner.state.send_replace(CartView {
            phase: SyncPhase::Ready,
            item_count,
            cart: Some(cart),
        });
    }

    fn force_empty(&self) {
        self.begin_write();
        self.inner.state.send_replace(CartView {
            phase: SyncPhase::Empty,
            item_count: 0,
            cart: None,
        });
    }

    fn settle_empty(&self, generation: u64) {
        if self.is_current(generation) {
            self.inner.state.send_replace(CartView {
                phase: SyncPhase::Empty,
                item_count: 0,
                cart: None,
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use secrecy::SecretString;
    use tokio::sync::mpsc;
    use tokio::task::yield_now;

    use clover_core::ProductId;

    use crate::bus::SignalBus;
    use crate::notify::{Notice, NoticeLevel, Notifier};
    use crate::session::{Session, UserProfile};
    use crate::sync::testutil::MockApi;

    use super::*;

    fn signed_in_session() -> Session {
        let session = Session::new();
        session.restore(
            UserProfile {
                name: "Test".to_owned(),
                email: "t@example.com".to_owned(),
                role: None,
            },
            SecretString::from("token"),
        );
        session
    }

    fn store_with(
        api: Arc<MockApi>,
        session: &Session,
    ) -> (CartStore<MockApi>, mpsc::UnboundedReceiver<Notice>) {
        let bus = SignalBus::new();
        let (notices, rx) = Notifier::channel();
        let store = CartStore::new(
            api,
            session.subscribe(),
            bus.handle(),
            notices,
            Duration::from_millis(10),
        );
        (store, rx)
    }

    #[tokio::test]
    async fn test_refresh_installs_server_cart() {
        let api = Arc::new(MockApi::with_cart_count(3));
        let session = signed_in_session();
        let (store, _rx) = store_with(Arc::clone(&api), &session);

        store.refresh().await;

        let view = store.view();
        assert_eq!(view.phase, SyncPhase::Ready);
        assert_eq!(view.item_count, 3);
        let cart = view.cart.unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(api.get_cart_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_while_signed_out_skips_network() {
        let api = Arc::new(MockApi::with_cart_count(3));
        let session = Session::new();
        session.sign_out();
        let (store, _rx) = store_with(Arc::clone(&api), &session);

        store.refresh().await;

        assert_eq!(store.view().phase, SyncPhase::Empty);
        assert_eq!(api.get_cart_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refresh_failure_yields_empty_view_and_notice() {
        let api = Arc::new(MockApi::with_cart_count(3));
        api.fail.store(true, Ordering::SeqCst);
        let session = signed_in_session();
        let (store, mut rx) = store_with(api, &session);

        store.refresh().await;

        let view = store.view();
        assert_eq!(view.phase, SyncPhase::Empty);
        assert_eq!(view.item_count, 0);
        assert!(view.cart.is_none());
        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_add_to_cart_adopts_server_count_verbatim() {
        // The server reports a count far from local-count-plus-one; the
        // store must show the server's number, not do arithmetic.
        let api = Arc::new(MockApi::with_cart_count(42));
        let session = signed_in_session();
        let (store, mut rx) = store_with(api, &session);

        let flag = InFlight::new();
        store
            .add_to_cart(&ProductId::from("p9"), &flag)
            .await;

        assert_eq!(store.view().item_count, 42);
        assert!(!flag.get());
        assert_eq!(rx.recv().await.unwrap().level, NoticeLevel::Success);
    }

    #[tokio::test]
    async fn test_add_to_cart_failure_clears_flag_and_keeps_view() {
        let api = Arc::new(MockApi::with_cart_count(5));
        api.fail.store(true, Ordering::SeqCst);
        let session = signed_in_session();
        let (store, mut rx) = store_with(api, &session);

        let flag = InFlight::new();
        store
            .add_to_cart(&ProductId::from("p9"), &flag)
            .await;

        assert!(!flag.get());
        assert_eq!(store.view().item_count, 0);
        assert_eq!(rx.recv().await.unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_remove_item_installs_returned_snapshot() {
        let api = Arc::new(MockApi::with_cart_count(2));
        let session = signed_in_session();
        let (store, _rx) = store_with(api, &session);
        store.refresh().await;

        store.remove_item(&ProductId::from("p1")).await;

        let view = store.view();
        assert_eq!(view.item_count, 0);
        assert!(view.cart.unwrap().lines.is_empty());
    }

    #[tokio::test]
    async fn test_clear_empties_lines_but_keeps_cart_id() {
        let api = Arc::new(MockApi::with_cart_count(2));
        let session = signed_in_session();
        let (store, _rx) = store_with(api, &session);
        store.refresh().await;

        store.clear().await;

        let view = store.view();
        assert_eq!(view.phase, SyncPhase::Ready);
        assert_eq!(view.item_count, 0);
        let cart = view.cart.unwrap();
        assert!(cart.lines.is_empty());
        assert_eq!(cart.id.as_str(), "cart1");
    }

    #[tokio::test]
    async fn test_reconciler_follows_sign_out() {
        let api = Arc::new(MockApi::with_cart_count(2));
        let session = signed_in_session();
        let (store, _rx) = store_with(api, &session);
        let task = store.spawn_reconciler();

        let mut view_rx = store.watch();
        while view_rx.borrow().phase != SyncPhase::Ready {
            view_rx.changed().await.unwrap();
        }

        session.sign_out();
        while view_rx.borrow().phase != SyncPhase::Empty {
            view_rx.changed().await.unwrap();
        }
        assert_eq!(store.view().item_count, 0);

        drop(session);
        for _ in 0..20 {
            yield_now().await;
        }
        task.abort();
    }

    #[tokio::test]
    async fn test_stale_fetch_is_discarded_after_newer_mutation() {
        let api = Arc::new(MockApi::with_cart_count(3));
        let session = signed_in_session();
        let (store, _rx) = store_with(Arc::clone(&api), &session);

        // Park the fetch on the wire with the count-3 response captured.
        api.hold_reads();
        let slow = tokio::spawn({
            let store = store.clone();
            async move { store.refresh().await }
        });
        while api.get_cart_calls.load(Ordering::SeqCst) == 0 {
            yield_now().await;
        }

        // A newer write lands while the fetch is still in flight.
        api.cart_count.store(9, Ordering::SeqCst);
        store.apply_mutation(api.cart_envelope(9));
        assert_eq!(store.view().item_count, 9);

        // The stale response arrives; the store must not move backwards.
        api.release_reads();
        slow.await.unwrap();

        let view = store.view();
        assert_eq!(view.item_count, 9);
        assert_eq!(view.cart.unwrap().lines[0].quantity, 9);
    }

    #[tokio::test]
    async fn test_foreign_signal_triggers_refetch_after_settle() {
        let api = Arc::new(MockApi::with_cart_count(2));
        let session = signed_in_session();
        let bus = SignalBus::new();
        let (notices, _rx) = Notifier::channel();
        let mut config = ClientConfig::for_base_url("http://backend.test").unwrap();
        config.signal_settle = Duration::from_millis(10);
        let store = CartStore::from_config(
            Arc::clone(&api),
            session.subscribe(),
            bus.handle(),
            notices,
            &config,
        );
        let task = store.spawn_reconciler();

        let mut view_rx = store.watch();
        while view_rx.borrow().phase != SyncPhase::Ready {
            view_rx.changed().await.unwrap();
        }
        let reads_before = api.get_cart_calls.load(Ordering::SeqCst);

        // Another instance announces a cart change.
        bus.handle().publish(Topic::CartUpdated);
        while api.get_cart_calls.load(Ordering::SeqCst) == reads_before {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        task.abort();
    }
}
