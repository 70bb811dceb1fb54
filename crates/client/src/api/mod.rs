//! Typed REST client for the storefront backend.
//!
//! The [`ApiClient`] is the single point of contact with the backend: it
//! attaches `Content-Type: application/json` plus the bearer token (in a
//! custom `token` header, not `Authorization`) on every call and returns the
//! decoded envelope. It never retries, never caches, and never touches
//! shared state beyond its own token slot, so the synchronization stores in
//! [`crate::sync`] remain the only source of client-side truth.
//!
//! Every non-2xx status becomes a typed [`ApiError::Status`]; the backend's
//! error-shaped JSON body is folded into the message when present.

pub mod types;

use std::sync::{Arc, RwLock};

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use clover_core::{AddressId, CartId, ProductId, UserId};

use crate::config::ClientConfig;
use types::{
    AddToCartEnvelope, AddressEnvelope, AddressListEnvelope, AuthEnvelope, BrandsEnvelope,
    CartEnvelope, CategoriesEnvelope, CheckoutSessionEnvelope, ClearCartEnvelope, ErrorBody,
    NewAddress, OrderEnvelope, OrderRequest, ProductEnvelope, ProductIdBody, ProductsEnvelope,
    ProfileEnvelope, RawOrder, RemoveAddressEnvelope, SignInBody, SignUpBody, UpdateCountBody,
    UpdatePasswordBody, UpdateProfileBody, WishlistEnvelope, WishlistMutationEnvelope,
};

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend answered with a non-success status.
    #[error("server rejected request ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error-shaped body, if any.
        message: String,
    },

    /// A request URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the backend rejected the call for want of a valid token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }
}

// =============================================================================
// API seams for the synchronization stores
// =============================================================================

/// Cart operations the cart store and quantity updater depend on.
///
/// [`ApiClient`] is the real implementation; tests substitute an in-memory
/// one.
pub trait CartApi: Send + Sync + 'static {
    /// `GET /cart`.
    fn get_user_cart(&self) -> impl Future<Output = Result<CartEnvelope, ApiError>> + Send;

    /// `POST /cart`.
    fn add_product_to_cart(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<AddToCartEnvelope, ApiError>> + Send;

    /// `PUT /cart/{productId}`.
    fn update_cart_product_count(
        &self,
        product_id: &ProductId,
        count: u32,
    ) -> impl Future<Output = Result<CartEnvelope, ApiError>> + Send;

    /// `DELETE /cart/{productId}`.
    fn remove_cart_item(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<CartEnvelope, ApiError>> + Send;

    /// `DELETE /cart`.
    fn clear_cart(&self) -> impl Future<Output = Result<ClearCartEnvelope, ApiError>> + Send;
}

/// Wishlist operations the wishlist store depends on.
pub trait WishlistApi: Send + Sync + 'static {
    /// `GET /wishlist`.
    fn get_wishlist(&self) -> impl Future<Output = Result<WishlistEnvelope, ApiError>> + Send;

    /// `POST /wishlist`.
    fn add_wishlist_item(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<WishlistMutationEnvelope, ApiError>> + Send;

    /// `DELETE /wishlist/{productId}`.
    fn remove_wishlist_item(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<WishlistMutationEnvelope, ApiError>> + Send;
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheaply cloneable; the bearer token is shared across clones so the auth
/// token bridge can swap it without threading it through callers.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    // Written only by the auth token bridge; read on every request.
    token: RwLock<Option<SecretString>>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_base_url.clone(),
                token: RwLock::new(None),
            }),
        })
    }

    /// Replace the stored bearer token. `None` means subsequent calls
    /// proceed unauthenticated (public endpoints only).
    ///
    /// Only the auth token bridge should call this.
    pub fn set_token(&self, token: Option<SecretString>) {
        if let Ok(mut slot) = self.inner.token.write() {
            *slot = token;
        }
    }

    /// Whether a bearer token is currently set.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner
            .token
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Issue one request and decode the body.
    ///
    /// Non-2xx statuses always become [`ApiError::Status`]; the backend's
    /// error-shaped body supplies the message where it parses.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&impl Serialize>,
    ) -> Result<T, ApiError> {
        let mut request = self
            .inner
            .http
            .request(method, url)
            .header("Content-Type", "application/json");

        {
            let token = self
                .inner
                .token
                .read()
                .map_err(|_| ApiError::Status {
                    status: 0,
                    message: "token slot poisoned".to_owned(),
                })?;
            if let Some(token) = token.as_ref() {
                request = request.header("token", token.expose_secret());
            }
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Self::status_error(status, &text));
        }

        match serde_json::from_str(&text) {
            Ok(decoded) => Ok(decoded),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %text.chars().take(500).collect::<String>(),
                    "failed to parse backend response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    fn status_error(status: StatusCode, body: &str) -> ApiError {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| body.chars().take(200).collect());

        tracing::error!(status = %status, message = %message, "backend returned non-success status");

        ApiError::Status {
            status: status.as_u16(),
            message,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(Method::GET, self.url(path)?, None::<&()>)
            .await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(Method::DELETE, self.url(path)?, None::<&()>)
            .await
    }

    // =========================================================================
    // Products (public)
    // =========================================================================

    /// List all products.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn get_all_products(&self) -> Result<ProductsEnvelope, ApiError> {
        self.get("api/v1/products").await
    }

    /// Get a single product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the product does not exist.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product_details(
        &self,
        product_id: &ProductId,
    ) -> Result<ProductEnvelope, ApiError> {
        self.get(&format!("api/v1/products/{product_id}")).await
    }

    /// List all product categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<CategoriesEnvelope, ApiError> {
        self.get("api/v1/categories").await
    }

    /// List all brands.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn get_brands(&self) -> Result<BrandsEnvelope, ApiError> {
        self.get("api/v1/brands").await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the signed-in user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn get_user_cart(&self) -> Result<CartEnvelope, ApiError> {
        self.get("api/v1/cart").await
    }

    /// Add one unit of a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product_to_cart(
        &self,
        product_id: &ProductId,
    ) -> Result<AddToCartEnvelope, ApiError> {
        let body = ProductIdBody {
            product_id: product_id.clone(),
        };
        self.execute(Method::POST, self.url("api/v1/cart")?, Some(&body))
            .await
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self), fields(product_id = %product_id, count))]
    pub async fn update_cart_product_count(
        &self,
        product_id: &ProductId,
        count: u32,
    ) -> Result<CartEnvelope, ApiError> {
        let body = UpdateCountBody { count };
        self.execute(
            Method::PUT,
            self.url(&format!("api/v1/cart/{product_id}"))?,
            Some(&body),
        )
        .await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_cart_item(
        &self,
        product_id: &ProductId,
    ) -> Result<CartEnvelope, ApiError> {
        self.delete(&format!("api/v1/cart/{product_id}")).await
    }

    /// Remove every line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<ClearCartEnvelope, ApiError> {
        self.delete("api/v1/cart").await
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Fetch the signed-in user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn get_wishlist(&self) -> Result<WishlistEnvelope, ApiError> {
        self.get("api/v1/wishlist").await
    }

    /// Add a product to the wishlist. The response carries member ids only,
    /// not product data.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_wishlist_item(
        &self,
        product_id: &ProductId,
    ) -> Result<WishlistMutationEnvelope, ApiError> {
        let body = ProductIdBody {
            product_id: product_id.clone(),
        };
        self.execute(Method::POST, self.url("api/v1/wishlist")?, Some(&body))
            .await
    }

    /// Remove a product from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_wishlist_item(
        &self,
        product_id: &ProductId,
    ) -> Result<WishlistMutationEnvelope, ApiError> {
        self.delete(&format!("api/v1/wishlist/{product_id}")).await
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Fetch the signed-in user's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn get_user_addresses(&self) -> Result<AddressListEnvelope, ApiError> {
        self.get("api/v1/addresses").await
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, address))]
    pub async fn create_address(&self, address: &NewAddress) -> Result<AddressEnvelope, ApiError> {
        self.execute(Method::POST, self.url("api/v1/addresses")?, Some(address))
            .await
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self), fields(address_id = %address_id))]
    pub async fn remove_address(
        &self,
        address_id: &AddressId,
    ) -> Result<RemoveAddressEnvelope, ApiError> {
        self.delete(&format!("api/v1/addresses/{address_id}")).await
    }

    // =========================================================================
    // Orders & checkout
    // =========================================================================

    /// Place a cash-on-delivery order for a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, order), fields(cart_id = %cart_id))]
    pub async fn create_cash_order(
        &self,
        order: &OrderRequest,
        cart_id: &CartId,
    ) -> Result<OrderEnvelope, ApiError> {
        self.execute(
            Method::POST,
            self.url(&format!("api/v1/orders/{cart_id}"))?,
            Some(order),
        )
        .await
    }

    /// Start a hosted checkout session for a cart. The returned URL is an
    /// opaque payment redirect; all payment logic lives behind it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, order), fields(cart_id = %cart_id))]
    pub async fn create_checkout_session(
        &self,
        order: &OrderRequest,
        cart_id: &CartId,
        return_url: &str,
    ) -> Result<CheckoutSessionEnvelope, ApiError> {
        let mut url = self.url(&format!("api/v1/orders/checkout-session/{cart_id}"))?;
        url.query_pairs_mut().append_pair("url", return_url);
        self.execute(Method::POST, url, Some(order)).await
    }

    /// Fetch a user's order history.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_user_orders(&self, user_id: &UserId) -> Result<Vec<RawOrder>, ApiError> {
        self.get(&format!("api/v1/orders/user/{user_id}")).await
    }

    // =========================================================================
    // Auth (public)
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the credentials are rejected.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthEnvelope, ApiError> {
        let body = SignInBody {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        self.execute(Method::POST, self.url("api/v1/auth/signin")?, Some(&body))
            .await
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, signup), fields(email = %signup.email))]
    pub async fn sign_up(&self, signup: &SignUpBody) -> Result<AuthEnvelope, ApiError> {
        self.execute(Method::POST, self.url("api/v1/auth/signup")?, Some(signup))
            .await
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Update the signed-in user's name, email, and phone.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, profile), fields(email = %profile.email))]
    pub async fn update_user_profile(
        &self,
        profile: &UpdateProfileBody,
    ) -> Result<ProfileEnvelope, ApiError> {
        self.execute(Method::PUT, self.url("api/v1/users/updateMe")?, Some(profile))
            .await
    }

    /// Change the signed-in user's password. The backend re-issues the
    /// bearer token; the old one stops working.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the current password is
    /// rejected.
    #[instrument(skip_all)]
    pub async fn update_password(
        &self,
        change: &UpdatePasswordBody,
    ) -> Result<AuthEnvelope, ApiError> {
        self.execute(
            Method::PUT,
            self.url("api/v1/users/changeMyPassword")?,
            Some(change),
        )
        .await
    }
}

impl CartApi for ApiClient {
    async fn get_user_cart(&self) -> Result<CartEnvelope, ApiError> {
        Self::get_user_cart(self).await
    }

    async fn add_product_to_cart(
        &self,
        product_id: &ProductId,
    ) -> Result<AddToCartEnvelope, ApiError> {
        Self::add_product_to_cart(self, product_id).await
    }

    async fn update_cart_product_count(
        &self,
        product_id: &ProductId,
        count: u32,
    ) -> Result<CartEnvelope, ApiError> {
        Self::update_cart_product_count(self, product_id, count).await
    }

    async fn remove_cart_item(&self, product_id: &ProductId) -> Result<CartEnvelope, ApiError> {
        Self::remove_cart_item(self, product_id).await
    }

    async fn clear_cart(&self) -> Result<ClearCartEnvelope, ApiError> {
        Self::clear_cart(self).await
    }
}

impl WishlistApi for ApiClient {
    async fn get_wishlist(&self) -> Result<WishlistEnvelope, ApiError> {
        Self::get_wishlist(self).await
    }

    async fn add_wishlist_item(
        &self,
        product_id: &ProductId,
    ) -> Result<WishlistMutationEnvelope, ApiError> {
        Self::add_wishlist_item(self, product_id).await
    }

    async fn remove_wishlist_item(
        &self,
        product_id: &ProductId,
    ) -> Result<WishlistMutationEnvelope, ApiError> {
        Self::remove_wishlist_item(self, product_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: 404,
            message: "No cart exists for this user".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "server rejected request (404): No cart exists for this user"
        );
    }

    #[test]
    fn test_is_unauthorized() {
        let unauthorized = ApiError::Status {
            status: 401,
            message: String::new(),
        };
        let not_found = ApiError::Status {
            status: 404,
            message: String::new(),
        };
        assert!(unauthorized.is_unauthorized());
        assert!(!not_found.is_unauthorized());
    }

    #[test]
    fn test_status_error_extracts_backend_message() {
        let err = ApiClient::status_error(
            StatusCode::UNAUTHORIZED,
            r#"{"statusMsg":"fail","message":"invalid token"}"#,
        );
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid token");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_status_error_falls_back_to_body() {
        let err = ApiClient::status_error(StatusCode::BAD_GATEWAY, "upstream exploded");
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_set_token_round_trip() {
        let config = ClientConfig::for_base_url("https://shop.example.com/")
            .expect("static URL parses");
        let client = ApiClient::new(&config).expect("client builds");

        assert!(!client.has_token());
        client.set_token(Some(SecretString::from("opaque-bearer")));
        assert!(client.has_token());
        client.set_token(None);
        assert!(!client.has_token());
    }
}
