//! Wire-to-domain mapping with defensive defaults.
//!
//! The backend populates records unevenly: a wishlist item seeded by an old
//! import may lack a title, images, or its whole brand object. These
//! functions absorb that variance once, at the boundary - they must never
//! panic on a partially-populated record. Defaults:
//!
//! - `title` falls back to `name`, then to `"Untitled"`
//! - `image_cover` falls back to the first of `images`, then to `""`
//! - numeric fields default to 0
//! - nested brand/category/subcategory default to empty-but-well-shaped
//!   records

use clover_core::ProductId;

use crate::api::types::{
    CartEnvelope, RawAddress, RawBrand, RawCartProduct, RawCategory, RawOrder, RawProduct,
    RawSubcategory,
};
use crate::models::{
    Address, Brand, Cart, CartLine, Category, LineProduct, Order, OrderLine, PaymentMethod,
    ProductSummary, Subcategory,
};

const UNTITLED: &str = "Untitled";

/// Map a raw product record into a fully-populated summary.
#[must_use]
pub fn product_from_raw(raw: RawProduct) -> ProductSummary {
    let images = raw.images.unwrap_or_default();
    let image_cover = raw
        .image_cover
        .or_else(|| images.first().cloned())
        .unwrap_or_default();
    let category = raw.category.map_or_else(Category::default, category_from_raw);
    let subcategories = raw
        .subcategory
        .unwrap_or_default()
        .into_iter()
        .map(|sub| subcategory_from_raw(sub, &category.id))
        .collect();

    ProductSummary {
        id: raw.id.unwrap_or_else(|| ProductId::new("")),
        title: raw
            .title
            .or(raw.name)
            .unwrap_or_else(|| UNTITLED.to_owned()),
        slug: raw.slug.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        price: raw.price.unwrap_or_default(),
        stock: raw.quantity.unwrap_or(0),
        sold: raw.sold.unwrap_or(0),
        image_cover,
        images,
        ratings_average: raw.ratings_average.unwrap_or(0.0),
        ratings_quantity: raw.ratings_quantity.unwrap_or(0),
        brand: raw.brand.map_or_else(Brand::default, brand_from_raw),
        category,
        subcategories,
    }
}

/// Map a raw brand record, defaulting absent fields to empty strings.
#[must_use]
pub fn brand_from_raw(raw: RawBrand) -> Brand {
    Brand {
        id: raw.id.unwrap_or_default(),
        name: raw.name.unwrap_or_default(),
        slug: raw.slug.unwrap_or_default(),
        image: raw.image.unwrap_or_default(),
    }
}

/// Map a raw category record, defaulting absent fields to empty strings.
#[must_use]
pub fn category_from_raw(raw: RawCategory) -> Category {
    Category {
        id: raw.id.unwrap_or_default(),
        name: raw.name.unwrap_or_default(),
        slug: raw.slug.unwrap_or_default(),
        image: raw.image.unwrap_or_default(),
    }
}

fn subcategory_from_raw(raw: RawSubcategory, category_id: &str) -> Subcategory {
    Subcategory {
        id: raw.id.unwrap_or_default(),
        name: raw.name.unwrap_or_default(),
        slug: raw.slug.unwrap_or_default(),
        category: category_id.to_owned(),
    }
}

/// Map a populated cart envelope into the domain cart snapshot.
///
/// `item_count` is taken verbatim from the server's `numOfCartItems`; the
/// client never recomputes it.
#[must_use]
pub fn cart_from_envelope(envelope: CartEnvelope) -> Cart {
    let lines = envelope
        .data
        .products
        .into_iter()
        .map(|line| CartLine {
            id: line.id,
            unit_price: line.price,
            quantity: line.count,
            // A missing ceiling clamps the line to its current quantity, so
            // increments stay disabled rather than overselling.
            max_quantity: line.product.quantity.unwrap_or(line.count),
            product: line_product_from_raw(line.product),
        })
        .collect();

    Cart {
        id: envelope.cart_id,
        item_count: envelope.num_of_cart_items,
        lines,
        total_price: envelope.data.total_cart_price,
    }
}

fn line_product_from_raw(raw: RawCartProduct) -> LineProduct {
    LineProduct {
        id: raw.id,
        title: raw.title.unwrap_or_else(|| UNTITLED.to_owned()),
        image_cover: raw.image_cover.unwrap_or_default(),
        brand_name: raw.brand.and_then(|b| b.name).unwrap_or_default(),
    }
}

/// Map a raw address, defaulting absent fields to empty strings.
#[must_use]
pub fn address_from_raw(raw: RawAddress) -> Address {
    Address {
        id: raw.id,
        alias: raw.alias.unwrap_or_default(),
        details: raw.details.unwrap_or_default(),
        phone: raw.phone.unwrap_or_default(),
        city: raw.city.unwrap_or_default(),
        postal_code: raw.postal_code.unwrap_or_default(),
    }
}

/// Map a raw order record.
#[must_use]
pub fn order_from_raw(raw: RawOrder) -> Order {
    Order {
        id: raw.id,
        user: raw.user,
        lines: raw
            .cart_items
            .into_iter()
            .map(|line| OrderLine {
                product: line.product,
                quantity: line.count,
                unit_price: line.price,
            })
            .collect(),
        total_price: raw.total_order_price,
        payment_method: match raw.payment_method_type.as_deref() {
            Some("card") => PaymentMethod::Card,
            _ => PaymentMethod::Cash,
        },
        is_paid: raw.is_paid,
        paid_at: raw.paid_at,
        is_delivered: raw.is_delivered,
        delivered_at: raw.delivered_at,
        created_at: raw.created_at,
    }
}
