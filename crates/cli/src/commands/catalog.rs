//! Catalog browsing commands. No account required.

use clover_client::models::normalize;
use clover_core::ProductId;

use super::{CliError, anonymous_client};

/// List the catalog, one line per product.
pub async fn list() -> Result<(), CliError> {
    let api = anonymous_client()?;
    let envelope = api.get_all_products().await?;

    tracing::info!("{} products", envelope.results);
    for raw in envelope.data {
        let product = normalize::product_from_raw(raw);
        tracing::info!(
            "  {}  {}  {} (stock {})",
            product.id,
            product.title,
            product.price,
            product.stock,
        );
    }
    Ok(())
}

/// List product categories, one line each.
pub async fn list_categories() -> Result<(), CliError> {
    let api = anonymous_client()?;
    let envelope = api.get_categories().await?;

    tracing::info!("{} categories", envelope.results);
    for raw in envelope.data {
        let category = normalize::category_from_raw(raw);
        tracing::info!("  {}  {} ({})", category.id, category.name, category.slug);
    }
    Ok(())
}

/// List brands, one line each.
pub async fn list_brands() -> Result<(), CliError> {
    let api = anonymous_client()?;
    let envelope = api.get_brands().await?;

    tracing::info!("{} brands", envelope.results);
    for raw in envelope.data {
        let brand = normalize::brand_from_raw(raw);
        tracing::info!("  {}  {} ({})", brand.id, brand.name, brand.slug);
    }
    Ok(())
}

/// Show one product in full.
pub async fn show(id: &str) -> Result<(), CliError> {
    let api = anonymous_client()?;
    let envelope = api.get_product_details(&ProductId::from(id)).await?;
    let product = normalize::product_from_raw(envelope.data);

    tracing::info!("Title:    {}", product.title);
    tracing::info!("Price:    {}", product.price);
    tracing::info!("Brand:    {}", product.brand.name);
    tracing::info!("Category: {}", product.category.name);
    tracing::info!("Stock:    {} ({} sold)", product.stock, product.sold);
    tracing::info!(
        "Rating:   {} ({} ratings)",
        product.ratings_average,
        product.ratings_quantity,
    );
    tracing::info!("{}", product.description);
    Ok(())
}
