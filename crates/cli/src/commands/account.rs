//! Account, address, and order commands.

use clover_client::api::types::{
    NewAddress, OrderRequest, ShippingAddress, SignUpBody, UpdatePasswordBody, UpdateProfileBody,
};
use clover_client::models::normalize;
use clover_core::AddressId;

use super::{CliError, anonymous_client, signed_in_client};

/// Verify credentials. The other commands sign in from the environment;
/// this one exists to check an account from the terminal.
pub async fn sign_in(email: &str, password: &str) -> Result<(), CliError> {
    let api = anonymous_client()?;
    let auth = api.sign_in(email, password).await?;
    tracing::info!("Signed in as {} <{}>", auth.user.name, auth.user.email);
    Ok(())
}

/// Create an account. The password doubles as the confirmation field since
/// a CLI flag cannot be mistyped twice.
pub async fn sign_up(name: &str, email: &str, password: &str, phone: &str) -> Result<(), CliError> {
    let api = anonymous_client()?;
    let auth = api
        .sign_up(&SignUpBody {
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            re_password: password.to_owned(),
            phone: phone.to_owned(),
        })
        .await?;
    tracing::info!("Account created for {}", auth.user.email);
    Ok(())
}

/// Update the signed-in user's profile fields.
pub async fn update_profile(name: &str, email: &str, phone: &str) -> Result<(), CliError> {
    let api = signed_in_client().await?;
    let envelope = api
        .update_user_profile(&UpdateProfileBody {
            name: name.to_owned(),
            email: email.to_owned(),
            phone: phone.to_owned(),
        })
        .await?;
    let confirmed = envelope
        .user
        .map_or_else(|| email.to_owned(), |user| user.email);
    tracing::info!("Profile updated for {confirmed}");
    Ok(())
}

/// Change the account password. The backend re-issues the token, but each
/// command signs in fresh anyway, so the new token is dropped.
pub async fn update_password(current: &str, new: &str) -> Result<(), CliError> {
    let api = signed_in_client().await?;
    api.update_password(&UpdatePasswordBody {
        current_password: current.to_owned(),
        password: new.to_owned(),
        re_password: new.to_owned(),
    })
    .await?;
    tracing::info!("Password updated");
    Ok(())
}

/// List saved addresses.
pub async fn list_addresses() -> Result<(), CliError> {
    let api = signed_in_client().await?;
    let envelope = api.get_user_addresses().await?;

    tracing::info!("{} addresses", envelope.results);
    for raw in envelope.data {
        let address = normalize::address_from_raw(raw);
        tracing::info!(
            "  {}  {}: {}, {} ({})",
            address.id,
            address.alias,
            address.details,
            address.city,
            address.phone,
        );
    }
    Ok(())
}

/// Save a new address.
pub async fn add_address(
    alias: &str,
    details: &str,
    phone: &str,
    city: &str,
    postal_code: &str,
) -> Result<(), CliError> {
    let api = signed_in_client().await?;
    api.create_address(&NewAddress {
        alias: alias.to_owned(),
        details: details.to_owned(),
        phone: phone.to_owned(),
        city: city.to_owned(),
        postal_code: postal_code.to_owned(),
    })
    .await?;
    tracing::info!("Address saved");
    Ok(())
}

/// Delete a saved address.
pub async fn remove_address(id: &str) -> Result<(), CliError> {
    let api = signed_in_client().await?;
    api.remove_address(&AddressId::from(id)).await?;
    tracing::info!("Address removed");
    Ok(())
}

/// List past orders. The user id comes off the cart document rather than a
/// separate profile call.
pub async fn list_orders() -> Result<(), CliError> {
    let api = signed_in_client().await?;
    let user_id = api.get_user_cart().await?.data.cart_owner;
    let orders = api.get_user_orders(&user_id).await?;

    tracing::info!("{} orders", orders.len());
    for raw in orders {
        let order = normalize::order_from_raw(raw);
        tracing::info!(
            "  {}  {}  {:?}{}{}",
            order.id,
            order.total_price,
            order.payment_method,
            if order.is_paid { ", paid" } else { "" },
            if order.is_delivered { ", delivered" } else { "" },
        );
    }
    Ok(())
}

/// Place a cash-on-delivery order for the current cart.
pub async fn place_order(address_alias: &str) -> Result<(), CliError> {
    let api = signed_in_client().await?;
    let shipping = shipping_address(&api, address_alias).await?;
    let cart_id = api.get_user_cart().await?.data.id;

    let envelope = api
        .create_cash_order(
            &OrderRequest {
                shipping_address: shipping,
            },
            &cart_id,
        )
        .await?;
    let order = normalize::order_from_raw(envelope.data);
    tracing::info!("Order {} placed (total {})", order.id, order.total_price);
    Ok(())
}

/// Start a card checkout session and print its redirect URL.
pub async fn checkout(address_alias: &str) -> Result<(), CliError> {
    let api = signed_in_client().await?;
    let shipping = shipping_address(&api, address_alias).await?;
    let cart_id = api.get_user_cart().await?.data.id;

    let return_url =
        std::env::var("CLOVER_RETURN_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

    let envelope = api
        .create_checkout_session(
            &OrderRequest {
                shipping_address: shipping,
            },
            &cart_id,
            &return_url,
        )
        .await?;
    tracing::info!("Complete payment at: {}", envelope.session.url);
    Ok(())
}

async fn shipping_address(
    api: &clover_client::ApiClient,
    alias: &str,
) -> Result<ShippingAddress, CliError> {
    let envelope = api.get_user_addresses().await?;
    let address = envelope
        .data
        .into_iter()
        .map(normalize::address_from_raw)
        .find(|address| address.alias.eq_ignore_ascii_case(alias))
        .ok_or_else(|| CliError::NotFound(format!("No saved address with alias '{alias}'")))?;

    Ok(ShippingAddress {
        alias: address.alias,
        details: address.details,
        phone: address.phone,
        city: address.city,
        postal_code: address.postal_code,
    })
}
