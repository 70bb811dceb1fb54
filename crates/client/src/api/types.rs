//! Wire types for the backend REST API.
//!
//! These mirror the JSON the backend actually sends. Fields the backend
//! populates inconsistently are `Option` or defaulted *here and nowhere
//! else*: the mapping functions in [`crate::models::normalize`] convert
//! these raw shapes into fully-populated domain records before anything
//! downstream sees them.

use serde::{Deserialize, Serialize};

use clover_core::{AddressId, CartId, CartLineId, OrderId, Price, ProductId, UserId};

// =============================================================================
// Cart
// =============================================================================

/// Envelope returned by cart reads and line mutations (`GET /cart`,
/// `PUT /cart/{id}`, `DELETE /cart/{id}`), with products populated.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEnvelope {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    pub num_of_cart_items: u32,
    pub cart_id: CartId,
    pub data: CartPayload<RawCartProduct>,
}

/// Envelope returned by `POST /cart`. The backend does not populate product
/// data on this path; each line's `product` is a bare id string.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartEnvelope {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    pub num_of_cart_items: u32,
    pub cart_id: CartId,
    pub data: CartPayload<ProductId>,
}

/// Envelope returned by `DELETE /cart`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClearCartEnvelope {
    #[serde(default)]
    pub message: Option<String>,
}

/// The cart document itself, generic over the product representation
/// (populated record or bare id, depending on the endpoint).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "P: Deserialize<'de>"))]
pub struct CartPayload<P> {
    #[serde(rename = "_id")]
    pub id: CartId,
    pub cart_owner: UserId,
    #[serde(default)]
    pub products: Vec<RawCartLine<P>>,
    #[serde(default)]
    pub total_cart_price: Price,
}

/// One line of the cart document. `count` is the quantity in the cart;
/// the stock ceiling lives on the populated product as `quantity`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCartLine<P> {
    #[serde(rename = "_id")]
    pub id: CartLineId,
    pub count: u32,
    #[serde(default)]
    pub price: Price,
    pub product: P,
}

/// Product record as embedded in a populated cart line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartProduct {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub title: Option<String>,
    /// Available stock for this product (the purchase ceiling).
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub image_cover: Option<String>,
    #[serde(default)]
    pub brand: Option<RawBrand>,
    #[serde(default)]
    pub category: Option<RawCategory>,
    #[serde(default)]
    pub ratings_average: Option<f64>,
}

/// Request body for `POST /cart` and `POST /wishlist`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductIdBody {
    pub product_id: ProductId,
}

/// Request body for `PUT /cart/{productId}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateCountBody {
    pub count: u32,
}

// =============================================================================
// Products & wishlist
// =============================================================================

/// Envelope returned by `GET /products`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductsEnvelope {
    #[serde(default)]
    pub results: u32,
    #[serde(default)]
    pub data: Vec<RawProduct>,
}

/// Envelope returned by `GET /products/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductEnvelope {
    pub data: RawProduct,
}

/// Envelope returned by `GET /categories`.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesEnvelope {
    #[serde(default)]
    pub results: u32,
    #[serde(default)]
    pub data: Vec<RawCategory>,
}

/// Envelope returned by `GET /brands`.
#[derive(Debug, Clone, Deserialize)]
pub struct BrandsEnvelope {
    #[serde(default)]
    pub results: u32,
    #[serde(default)]
    pub data: Vec<RawBrand>,
}

/// Envelope returned by `GET /wishlist`.
#[derive(Debug, Clone, Deserialize)]
pub struct WishlistEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub data: Vec<RawProduct>,
}

/// Envelope returned by wishlist mutations (`POST /wishlist`,
/// `DELETE /wishlist/{id}`). `data` carries the member product ids only,
/// never product records, which is why adding to the wishlist forces a
/// follow-up `GET /wishlist`.
#[derive(Debug, Clone, Deserialize)]
pub struct WishlistMutationEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Vec<ProductId>,
}

/// A product record as the backend sends it: only `_id` is reliable,
/// everything else shows up or not depending on the endpoint and on how the
/// record was seeded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    #[serde(rename = "_id", default)]
    pub id: Option<ProductId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub sold: Option<u32>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub image_cover: Option<String>,
    #[serde(default)]
    pub ratings_average: Option<f64>,
    #[serde(default)]
    pub ratings_quantity: Option<u32>,
    #[serde(default)]
    pub brand: Option<RawBrand>,
    #[serde(default)]
    pub category: Option<RawCategory>,
    #[serde(default)]
    pub subcategory: Option<Vec<RawSubcategory>>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBrand {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSubcategory {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

// =============================================================================
// Addresses
// =============================================================================

/// Envelope returned by `GET /addresses`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressListEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub results: u32,
    #[serde(default)]
    pub data: Vec<RawAddress>,
}

/// Envelope returned by `POST /addresses`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    pub data: RawAddress,
}

/// Envelope returned by `DELETE /addresses/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoveAddressEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAddress {
    #[serde(rename = "_id")]
    pub id: AddressId,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

/// Request body for `POST /addresses`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    pub alias: String,
    pub details: String,
    pub phone: String,
    pub city: String,
    pub postal_code: String,
}

// =============================================================================
// Orders & checkout
// =============================================================================

/// Shipping details sent with both cash orders and checkout sessions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub alias: String,
    pub details: String,
    pub phone: String,
    pub city: String,
    pub postal_code: String,
}

/// Request body for `POST /orders/{cartId}` and
/// `POST /orders/checkout-session/{cartId}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub shipping_address: ShippingAddress,
}

/// Envelope returned by `POST /orders/{cartId}`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    pub data: RawOrder,
}

/// Envelope returned by `POST /orders/checkout-session/{cartId}`. The
/// session URL is an opaque payment redirect; the client never looks inside.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    pub session: CheckoutSession,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub user: UserId,
    #[serde(default)]
    pub cart_items: Vec<RawOrderLine>,
    #[serde(default)]
    pub total_order_price: Price,
    #[serde(default)]
    pub payment_method_type: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub paid_at: Option<String>,
    #[serde(default)]
    pub is_delivered: bool,
    #[serde(default)]
    pub delivered_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOrderLine {
    #[serde(rename = "_id")]
    pub id: String,
    pub product: ProductId,
    pub count: u32,
    #[serde(default)]
    pub price: Price,
}

// =============================================================================
// Auth
// =============================================================================

/// Request body for `POST /auth/signin`.
#[derive(Debug, Clone, Serialize)]
pub struct SignInBody {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/signup`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpBody {
    pub name: String,
    pub email: String,
    pub password: String,
    pub re_password: String,
    pub phone: String,
}

/// Envelope returned by sign-in and sign-up.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    pub token: String,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

// =============================================================================
// Account
// =============================================================================

/// Request body for `PUT /users/updateMe`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateProfileBody {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Request body for `PUT /users/changeMyPassword`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordBody {
    pub current_password: String,
    pub password: String,
    pub re_password: String,
}

/// Envelope returned by `PUT /users/updateMe`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

/// Error-shaped body the backend returns alongside non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub status_msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
