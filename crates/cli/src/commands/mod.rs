//! Command implementations.
//!
//! Catalog commands hit the API anonymously; everything else signs in first
//! with `CLOVER_EMAIL` / `CLOVER_PASSWORD` so the token rides along in the
//! `token` header.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod wishlist;

use thiserror::Error;

use clover_client::{ApiClient, ApiError, ClientConfig, ConfigError, Session, spawn_token_bridge};
use clover_core::{Email, EmailError};

/// Errors surfaced by any CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Client configuration is missing or malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backend rejected a request.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// `CLOVER_EMAIL` does not parse as an email address.
    #[error("Invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Lookup by name or alias found nothing.
    #[error("{0}")]
    NotFound(String),
}

/// Build an anonymous client from the environment.
pub fn anonymous_client() -> Result<ApiClient, CliError> {
    dotenvy::dotenv().ok();
    let config = ClientConfig::from_env()?;
    Ok(ApiClient::new(&config)?)
}

/// Build a client and sign it in with the credentials from the environment.
///
/// The token travels the same way it does in the client library: the
/// session transitions to `Authenticated` and the bridge task installs the
/// token, so this function never touches the token slot itself.
pub async fn signed_in_client() -> Result<ApiClient, CliError> {
    let api = anonymous_client()?;

    let email =
        std::env::var("CLOVER_EMAIL").map_err(|_| CliError::MissingEnvVar("CLOVER_EMAIL"))?;
    let email = Email::parse(&email)?;
    let password =
        std::env::var("CLOVER_PASSWORD").map_err(|_| CliError::MissingEnvVar("CLOVER_PASSWORD"))?;

    let session = Session::new();
    spawn_token_bridge(api.clone(), session.subscribe());
    let profile = session.sign_in(&api, &email, &password).await?;
    tracing::debug!(user = %profile.name, "signed in");

    // Commands fire their first request straight after this returns; wait
    // for the bridge to observe the transition.
    while !api.has_token() {
        tokio::task::yield_now().await;
    }

    Ok(api)
}
