//! Cart commands. All of these sign in first.

use clover_client::models::normalize;
use clover_core::ProductId;

use super::{CliError, signed_in_client};

/// Show the cart with line details.
pub async fn show() -> Result<(), CliError> {
    let api = signed_in_client().await?;
    let envelope = api.get_user_cart().await?;
    let count = envelope.num_of_cart_items;
    let cart = normalize::cart_from_envelope(envelope);

    tracing::info!("Cart {} ({} items)", cart.id, count);
    for line in &cart.lines {
        tracing::info!(
            "  {} x{}  {}  ({} each, max {})",
            line.product.title,
            line.quantity,
            line.unit_price * line.quantity,
            line.unit_price,
            line.max_quantity,
        );
    }
    tracing::info!("Total: {}", cart.total_price);
    Ok(())
}

/// Add one unit of a product.
pub async fn add(id: &str) -> Result<(), CliError> {
    let api = signed_in_client().await?;
    let envelope = api.add_product_to_cart(&ProductId::from(id)).await?;
    tracing::info!(
        "{} ({} items in cart)",
        envelope.message.unwrap_or_else(|| "Added".to_owned()),
        envelope.num_of_cart_items,
    );
    Ok(())
}

/// Set a line's quantity outright.
pub async fn set_count(id: &str, count: u32) -> Result<(), CliError> {
    let api = signed_in_client().await?;
    let envelope = api
        .update_cart_product_count(&ProductId::from(id), count)
        .await?;
    tracing::info!("Updated ({} items in cart)", envelope.num_of_cart_items);
    Ok(())
}

/// Remove a product's line entirely.
pub async fn remove(id: &str) -> Result<(), CliError> {
    let api = signed_in_client().await?;
    let envelope = api.remove_cart_item(&ProductId::from(id)).await?;
    tracing::info!("Removed ({} items in cart)", envelope.num_of_cart_items);
    Ok(())
}

/// Delete the whole cart.
pub async fn clear() -> Result<(), CliError> {
    let api = signed_in_client().await?;
    api.clear_cart().await?;
    tracing::info!("Cart cleared");
    Ok(())
}
