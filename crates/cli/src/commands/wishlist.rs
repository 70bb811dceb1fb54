//! Wishlist commands.

use clover_client::models::normalize;
use clover_core::ProductId;

use super::{CliError, signed_in_client};

/// Show the wishlist.
pub async fn show() -> Result<(), CliError> {
    let api = signed_in_client().await?;
    let envelope = api.get_wishlist().await?;

    tracing::info!("{} wished products", envelope.count);
    for raw in envelope.data {
        let product = normalize::product_from_raw(raw);
        tracing::info!("  {}  {}  {}", product.id, product.title, product.price);
    }
    Ok(())
}

/// Add the product if absent, remove it if present. Mirrors the heart
/// button: one gesture, two meanings.
pub async fn toggle(id: &str) -> Result<(), CliError> {
    let api = signed_in_client().await?;
    let product_id = ProductId::from(id);

    let wished = api
        .get_wishlist()
        .await?
        .data
        .into_iter()
        .any(|raw| raw.id.as_ref() == Some(&product_id));

    let envelope = if wished {
        api.remove_wishlist_item(&product_id).await?
    } else {
        api.add_wishlist_item(&product_id).await?
    };

    tracing::info!(
        "{}",
        envelope.message.unwrap_or_else(|| "Updated".to_owned())
    );
    Ok(())
}
