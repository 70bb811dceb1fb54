//! Integration tests for Clover.
//!
//! The tests in `tests/` run the real [`clover_client::ApiClient`] against an
//! in-process stub of the storefront backend, so the full request path -
//! token header, envelope parsing, normalization, store reconciliation -
//! gets exercised over actual HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p clover-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
// Test scaffolding: panicking on a malformed fixture is the right failure.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{delete, get, post};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use clover_client::{ApiClient, ClientConfig};

/// The only token the stub accepts.
pub const TEST_TOKEN: &str = "integration-test-token";
/// Token re-issued after a successful password change.
pub const FRESH_TOKEN: &str = "integration-test-token-reissued";
pub const TEST_EMAIL: &str = "shopper@example.com";
pub const TEST_PASSWORD: &str = "hunter22!";

const UNIT_PRICE: f64 = 25.0;
const STOCK_CEILING: u32 = 10;

/// Server-side state shared with the tests so they can assert on traffic.
#[derive(Default)]
pub struct BackendState {
    /// product id -> quantity in the cart.
    pub cart: Mutex<BTreeMap<String, u32>>,
    /// product ids in the wishlist, in insertion order.
    pub wishlist: Mutex<Vec<String>>,
    pub cart_reads: AtomicUsize,
    pub wishlist_reads: AtomicUsize,
    /// Every `PUT /cart/{id}` body, in arrival order.
    pub count_updates: Mutex<Vec<(String, u32)>>,
    /// Every `PUT /users/updateMe` body as `(name, email, phone)`.
    pub profile_updates: Mutex<Vec<(String, String, String)>>,
}

/// An in-process storefront backend bound to an ephemeral port.
pub struct TestBackend {
    pub base_url: String,
    pub state: Arc<BackendState>,
    task: JoinHandle<()>,
}

impl TestBackend {
    /// Bind to `127.0.0.1:0` and start serving.
    pub async fn spawn() -> Self {
        let state = Arc::new(BackendState::default());
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test backend");
        let addr = listener.local_addr().expect("local addr");
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test backend");
        });

        Self {
            base_url: format!("http://{addr}/"),
            state,
            task,
        }
    }

    /// A fresh anonymous client pointed at this backend.
    pub fn client(&self) -> ApiClient {
        let config = ClientConfig::for_base_url(&self.base_url).expect("test base url");
        ApiClient::new(&config).expect("build test client")
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn router(state: Arc<BackendState>) -> Router {
    Router::new()
        .route("/api/v1/auth/signin", post(sign_in))
        .route("/api/v1/auth/signup", post(sign_up))
        .route("/api/v1/categories", get(get_categories))
        .route("/api/v1/brands", get(get_brands))
        .route("/api/v1/users/updateMe", axum::routing::put(update_me))
        .route(
            "/api/v1/users/changeMyPassword",
            axum::routing::put(change_password),
        )
        .route(
            "/api/v1/cart",
            get(get_cart).post(add_to_cart).delete(clear_cart),
        )
        .route(
            "/api/v1/cart/{product_id}",
            axum::routing::put(update_count).delete(remove_item),
        )
        .route("/api/v1/wishlist", get(get_wishlist).post(add_wishlist))
        .route("/api/v1/wishlist/{product_id}", delete(remove_wishlist))
        .with_state(state)
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("token")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|token| token == TEST_TOKEN)
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Invalid token. Please login again" })),
    )
}

fn product_record(product_id: &str) -> Value {
    json!({
        "_id": product_id,
        "title": format!("Product {product_id}"),
        "quantity": STOCK_CEILING,
        "price": UNIT_PRICE,
        "imageCover": format!("https://img.test/{product_id}.jpg"),
    })
}

fn cart_envelope(state: &BackendState) -> Value {
    let cart = state.cart.lock().unwrap();
    let products: Vec<Value> = cart
        .iter()
        .map(|(product_id, count)| {
            json!({
                "_id": format!("line-{product_id}"),
                "count": count,
                "price": UNIT_PRICE,
                "product": product_record(product_id),
            })
        })
        .collect();
    let total: f64 = cart.values().map(|count| f64::from(*count) * UNIT_PRICE).sum();

    json!({
        "status": "success",
        "numOfCartItems": cart.len(),
        "cartId": "cart-1",
        "data": {
            "_id": "cart-1",
            "cartOwner": "user-1",
            "products": products,
            "totalCartPrice": total,
        },
    })
}

async fn sign_in(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let email = body.get("email").and_then(Value::as_str);
    let password = body.get("password").and_then(Value::as_str);
    if email != Some(TEST_EMAIL) || password != Some(TEST_PASSWORD) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Incorrect email or password" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "message": "success",
            "token": TEST_TOKEN,
            "user": { "name": "Shopper", "email": TEST_EMAIL, "role": "user" },
        })),
    )
}

async fn sign_up(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let name = body.get("name").and_then(Value::as_str);
    let email = body.get("email").and_then(Value::as_str);
    let password = body.get("password").and_then(Value::as_str);
    let re_password = body.get("rePassword").and_then(Value::as_str);

    let (Some(name), Some(email), Some(password)) = (name, email, password) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "name, email and password are required" })),
        );
    };
    if re_password != Some(password) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Passwords do not match" })),
        );
    }
    if email == TEST_EMAIL {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "Account Already Exists" })),
        );
    }

    (
        StatusCode::CREATED,
        Json(json!({
            "message": "success",
            "token": TEST_TOKEN,
            "user": { "name": name, "email": email, "role": "user" },
        })),
    )
}

// Taxonomy listings are public; no token required.
async fn get_categories() -> Json<Value> {
    let data = json!([
        { "_id": "cat-1", "name": "Electronics", "slug": "electronics", "image": "https://img.test/electronics.jpg" },
        { "_id": "cat-2", "name": "Music", "slug": "music", "image": "https://img.test/music.jpg" },
    ]);
    Json(json!({ "results": 2, "data": data }))
}

async fn get_brands() -> Json<Value> {
    let data = json!([
        { "_id": "brand-1", "name": "Canon", "slug": "canon", "image": "https://img.test/canon.jpg" },
    ]);
    Json(json!({ "results": 1, "data": data }))
}

async fn update_me(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let name = body.get("name").and_then(Value::as_str).unwrap_or_default();
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let phone = body.get("phone").and_then(Value::as_str).unwrap_or_default();
    state
        .profile_updates
        .lock()
        .unwrap()
        .push((name.to_owned(), email.to_owned(), phone.to_owned()));

    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "user": { "name": name, "email": email, "role": "user" },
        })),
    )
}

async fn change_password(
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let current = body.get("currentPassword").and_then(Value::as_str);
    if current != Some(TEST_PASSWORD) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Incorrect current password" })),
        );
    }
    let password = body.get("password").and_then(Value::as_str);
    if password != body.get("rePassword").and_then(Value::as_str) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Passwords do not match" })),
        );
    }

    // A password change re-issues the bearer token.
    (
        StatusCode::OK,
        Json(json!({
            "message": "success",
            "token": FRESH_TOKEN,
            "user": { "name": "Shopper", "email": TEST_EMAIL, "role": "user" },
        })),
    )
}

async fn get_cart(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    state.cart_reads.fetch_add(1, Ordering::SeqCst);
    (StatusCode::OK, Json(cart_envelope(&state)))
}

async fn add_to_cart(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let Some(product_id) = body.get("productId").and_then(Value::as_str) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "productId is required" })),
        );
    };

    let num_of_cart_items = {
        let mut cart = state.cart.lock().unwrap();
        *cart.entry(product_id.to_owned()).or_insert(0) += 1;
        cart.len()
    };

    // The add endpoint returns ids-only lines, never populated products.
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "message": "Product added successfully to your cart",
            "numOfCartItems": num_of_cart_items,
            "cartId": "cart-1",
            "data": {
                "_id": "cart-1",
                "cartOwner": "user-1",
                "products": [{ "_id": format!("line-{product_id}"), "count": 1, "product": product_id }],
            },
        })),
    )
}

async fn update_count(
    State(state): State<Arc<BackendState>>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let count = body
        .get("count")
        .and_then(Value::as_u64)
        .and_then(|count| u32::try_from(count).ok())
        .unwrap_or(0);

    state
        .count_updates
        .lock()
        .unwrap()
        .push((product_id.clone(), count));
    state.cart.lock().unwrap().insert(product_id, count);

    (StatusCode::OK, Json(cart_envelope(&state)))
}

async fn remove_item(
    State(state): State<Arc<BackendState>>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    state.cart.lock().unwrap().remove(&product_id);
    (StatusCode::OK, Json(cart_envelope(&state)))
}

async fn clear_cart(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    state.cart.lock().unwrap().clear();
    (StatusCode::OK, Json(json!({ "message": "success" })))
}

async fn get_wishlist(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    state.wishlist_reads.fetch_add(1, Ordering::SeqCst);
    let wishlist = state.wishlist.lock().unwrap();
    let data: Vec<Value> = wishlist.iter().map(|id| product_record(id)).collect();
    (
        StatusCode::OK,
        Json(json!({ "status": "success", "count": data.len(), "data": data })),
    )
}

async fn add_wishlist(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let Some(product_id) = body.get("productId").and_then(Value::as_str) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "productId is required" })),
        );
    };

    let mut wishlist = state.wishlist.lock().unwrap();
    if !wishlist.iter().any(|id| id == product_id) {
        wishlist.push(product_id.to_owned());
    }

    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "message": "Product added successfully to your wishlist",
            "data": wishlist.clone(),
        })),
    )
}

async fn remove_wishlist(
    State(state): State<Arc<BackendState>>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut wishlist = state.wishlist.lock().unwrap();
    wishlist.retain(|id| id != &product_id);
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "message": "Product removed successfully from your wishlist",
            "data": wishlist.clone(),
        })),
    )
}
