//! Store-level scenarios over real HTTP: two concurrent instances of the
//! same account converging through the signal bus, debounced quantity
//! updates, and the signed-out short circuit.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::watch;
use tokio::time::timeout;

use clover_client::{
    ApiClient, BusHandle, CartStore, ClientConfig, InFlight, LineQuantityUpdater, Notifier,
    Session, SyncPhase, UserProfile, WishlistStore, spawn_token_bridge,
};
use clover_core::ProductId;
use clover_integration_tests::{TEST_EMAIL, TEST_PASSWORD, TestBackend};

const SETTLE: Duration = Duration::from_millis(25);
const DEBOUNCE: Duration = Duration::from_millis(50);
const WAIT: Duration = Duration::from_secs(5);

/// Client configuration with the sync windows shrunk to test scale.
fn test_config(backend: &TestBackend) -> ClientConfig {
    let mut config = ClientConfig::for_base_url(&backend.base_url).expect("test base url");
    config.signal_settle = SETTLE;
    config.quantity_debounce = DEBOUNCE;
    config
}

/// One "browser tab": its own client, session, and token bridge, sharing
/// the backend and (optionally) the signal bus with other tabs.
struct Tab {
    api: Arc<ApiClient>,
    session: Session,
    cart: CartStore<ApiClient>,
}

impl Tab {
    async fn open(backend: &TestBackend, bus: BusHandle) -> Self {
        let api = backend.client();
        let auth = api
            .sign_in(TEST_EMAIL, TEST_PASSWORD)
            .await
            .expect("sign in");

        let session = Session::new();
        spawn_token_bridge(api.clone(), session.subscribe());
        session.restore(
            UserProfile {
                name: auth.user.name,
                email: auth.user.email,
                role: auth.user.role,
            },
            SecretString::from(auth.token),
        );
        // The store's first refresh must not race the bridge installing
        // the token.
        while !api.has_token() {
            tokio::task::yield_now().await;
        }

        let api = Arc::new(api);
        let cart = CartStore::from_config(
            Arc::clone(&api),
            session.subscribe(),
            bus,
            Notifier::disabled(),
            &test_config(backend),
        );
        cart.spawn_reconciler();

        Self { api, session, cart }
    }
}

async fn wait_for<T: Clone>(rx: &mut watch::Receiver<T>, pred: impl Fn(&T) -> bool) {
    timeout(WAIT, async {
        while !pred(&rx.borrow_and_update().clone()) {
            rx.changed().await.expect("store channel open");
        }
    })
    .await
    .expect("condition reached in time");
}

#[tokio::test]
async fn test_add_in_one_tab_updates_the_badge_in_the_other() {
    let backend = TestBackend::spawn().await;
    let bus = clover_client::SignalBus::new();

    let tab_a = Tab::open(&backend, bus.handle()).await;
    let tab_b = Tab::open(&backend, bus.handle()).await;

    let mut view_a = tab_a.cart.watch();
    let mut view_b = tab_b.cart.watch();
    wait_for(&mut view_a, |view| view.phase == SyncPhase::Ready).await;
    wait_for(&mut view_b, |view| view.phase == SyncPhase::Ready).await;

    let flag = InFlight::new();
    tab_a
        .cart
        .add_to_cart(&ProductId::from("p1"), &flag)
        .await;
    assert_eq!(tab_a.cart.view().item_count, 1);

    // Tab B hears the signal, waits out the settle window, re-fetches.
    wait_for(&mut view_b, |view| view.item_count == 1).await;
    let cart_b = tab_b.cart.view().cart.expect("tab B has a snapshot");
    assert_eq!(cart_b.lines.len(), 1);
    assert_eq!(cart_b.lines[0].product.id, ProductId::from("p1"));
}

#[tokio::test]
async fn test_click_burst_reaches_the_server_as_one_update() {
    let backend = TestBackend::spawn().await;
    let bus = clover_client::SignalBus::new();
    let tab = Tab::open(&backend, bus.handle()).await;

    // Seed a line at quantity 3 and let the store pick it up.
    tab.api
        .add_product_to_cart(&ProductId::from("p1"))
        .await
        .expect("seed line");
    tab.api
        .update_cart_product_count(&ProductId::from("p1"), 3)
        .await
        .expect("seed count");
    tab.cart.refresh().await;
    let line = tab.cart.view().cart.expect("cart snapshot").lines[0].clone();
    assert_eq!(line.quantity, 3);

    backend.state.count_updates.lock().unwrap().clear();

    let updater = LineQuantityUpdater::from_config(&tab.cart, &line, &test_config(&backend));
    updater.increment();
    updater.increment();
    assert_eq!(updater.displayed(), 5);

    // Well past the debounce window plus the round trip.
    tokio::time::sleep(Duration::from_millis(400)).await;

    let updates = backend.state.count_updates.lock().unwrap().clone();
    assert_eq!(updates, vec![("p1".to_owned(), 5)]);
    assert!(!updater.increment_in_flight().get());

    // The response snapshot became the store's view.
    assert_eq!(tab.cart.view().cart.expect("snapshot").lines[0].quantity, 5);
}

#[tokio::test]
async fn test_signed_out_refresh_never_touches_the_network() {
    let backend = TestBackend::spawn().await;
    let bus = clover_client::SignalBus::new();
    let tab = Tab::open(&backend, bus.handle()).await;

    let mut view = tab.cart.watch();
    wait_for(&mut view, |view| view.phase == SyncPhase::Ready).await;
    let reads_before = backend.state.cart_reads.load(Ordering::SeqCst);

    tab.session.sign_out();
    wait_for(&mut view, |view| view.phase == SyncPhase::Empty).await;

    tab.cart.refresh().await;
    assert_eq!(tab.cart.view().phase, SyncPhase::Empty);
    assert_eq!(
        backend.state.cart_reads.load(Ordering::SeqCst),
        reads_before
    );
}

#[tokio::test]
async fn test_wishlist_toggle_converges_across_tabs() {
    let backend = TestBackend::spawn().await;
    let bus = clover_client::SignalBus::new();

    let tab_a = Tab::open(&backend, bus.handle()).await;
    let tab_b = Tab::open(&backend, bus.handle()).await;

    let wishlist_a = WishlistStore::from_config(
        Arc::clone(&tab_a.api),
        tab_a.session.subscribe(),
        bus.handle(),
        Notifier::disabled(),
        &test_config(&backend),
    );
    let wishlist_b = WishlistStore::from_config(
        Arc::clone(&tab_b.api),
        tab_b.session.subscribe(),
        bus.handle(),
        Notifier::disabled(),
        &test_config(&backend),
    );
    wishlist_a.spawn_reconciler();
    wishlist_b.spawn_reconciler();

    let mut view_a = wishlist_a.watch();
    let mut view_b = wishlist_b.watch();
    wait_for(&mut view_a, |view| view.phase == SyncPhase::Ready).await;
    wait_for(&mut view_b, |view| view.phase == SyncPhase::Ready).await;

    wishlist_a
        .toggle_wishlist_item(&ProductId::from("p9"))
        .await;
    assert!(wishlist_a.is_in_wishlist(&ProductId::from("p9")));

    wait_for(&mut view_b, |view| view.contains(&ProductId::from("p9"))).await;

    // And back off again, from the other tab this time.
    wishlist_b
        .toggle_wishlist_item(&ProductId::from("p9"))
        .await;
    wait_for(&mut view_a, |view| !view.contains(&ProductId::from("p9"))).await;
}
