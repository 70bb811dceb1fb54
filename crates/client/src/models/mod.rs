//! Domain models.
//!
//! Fully-populated records the rest of the client works with. Optional wire
//! fields never leak past [`normalize`]: by the time a record is one of
//! these types, every field holds a real (possibly defaulted) value.

pub mod normalize;

use clover_core::{AddressId, CartId, CartLineId, OrderId, Price, ProductId, UserId};

/// The full, server-confirmed state of the cart, replaced wholesale on every
/// successful round-trip. The client never merges partial updates.
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    pub id: CartId,
    /// Total units across all lines, as reported by the server.
    pub item_count: u32,
    pub lines: Vec<CartLine>,
    pub total_price: Price,
}

impl Cart {
    /// An empty cart placeholder for the signed-out / cleared state.
    #[must_use]
    pub fn empty(id: CartId) -> Self {
        Self {
            id,
            item_count: 0,
            lines: Vec::new(),
            total_price: Price::ZERO,
        }
    }
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub id: CartLineId,
    pub product: LineProduct,
    pub unit_price: Price,
    /// Units of this product in the cart. Always >= 1; a line at zero is
    /// removed server-side.
    pub quantity: u32,
    /// Stock ceiling: the most of this product the user may purchase.
    pub max_quantity: u32,
}

/// The product data a cart line carries - just enough to render the line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineProduct {
    pub id: ProductId,
    pub title: String,
    pub image_cover: String,
    pub brand_name: String,
}

/// A fully-populated product record, as shown in listings and the wishlist.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: Price,
    /// Available stock.
    pub stock: u32,
    pub sold: u32,
    pub image_cover: String,
    pub images: Vec<String>,
    pub ratings_average: f64,
    pub ratings_quantity: u32,
    pub brand: Brand,
    pub category: Category,
    pub subcategories: Vec<Subcategory>,
}

/// Brand record. Defaults to an empty-but-well-shaped value when the wire
/// record omits it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subcategory {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Id of the parent category, when known.
    pub category: String,
}

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub id: AddressId,
    pub alias: String,
    pub details: String,
    pub phone: String,
    pub city: String,
    pub postal_code: String,
}

/// How an order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub user: UserId,
    pub lines: Vec<OrderLine>,
    pub total_price: Price,
    pub payment_method: PaymentMethod,
    pub is_paid: bool,
    pub paid_at: Option<String>,
    pub is_delivered: bool,
    pub delivered_at: Option<String>,
    pub created_at: Option<String>,
}

/// One line of a placed order. The product is referenced by id only.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub product: ProductId,
    pub quantity: u32,
    pub unit_price: Price,
}
