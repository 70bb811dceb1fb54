//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CLOVER_API_BASE_URL` - Base URL of the backend REST API
//!
//! ## Optional
//! - `CLOVER_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `CLOVER_QUANTITY_DEBOUNCE_MS` - Idle window before a quantity burst is
//!   sent (default: 500)
//! - `CLOVER_SIGNAL_SETTLE_MS` - Delay before re-fetching after a change
//!   signal, letting the originating writer's request settle (default: 200)

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_QUANTITY_DEBOUNCE_MS: u64 = 500;
const DEFAULT_SIGNAL_SETTLE_MS: u64 = 200;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend REST API. Always ends with a slash so that
    /// relative endpoint paths join onto it cleanly.
    pub api_base_url: Url,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Idle window the quantity updater waits before sending a burst.
    pub quantity_debounce: Duration,
    /// Delay between receiving a change signal and re-fetching.
    pub signal_settle: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = get_required_env("CLOVER_API_BASE_URL")?;
        let mut config = Self::for_base_url(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("CLOVER_API_BASE_URL".to_owned(), e))?;

        config.request_timeout = Duration::from_secs(get_parsed_or_default(
            "CLOVER_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        config.quantity_debounce = Duration::from_millis(get_parsed_or_default(
            "CLOVER_QUANTITY_DEBOUNCE_MS",
            DEFAULT_QUANTITY_DEBOUNCE_MS,
        )?);
        config.signal_settle = Duration::from_millis(get_parsed_or_default(
            "CLOVER_SIGNAL_SETTLE_MS",
            DEFAULT_SIGNAL_SETTLE_MS,
        )?);

        Ok(config)
    }

    /// Build a configuration with defaults for everything but the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error message if the URL does not parse.
    pub fn for_base_url(base_url: &str) -> Result<Self, String> {
        // A missing trailing slash would make Url::join drop the last path
        // segment of the base.
        let normalized = if base_url.ends_with('/') {
            base_url.to_owned()
        } else {
            format!("{base_url}/")
        };

        let api_base_url = Url::parse(&normalized).map_err(|e| e.to_string())?;

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            quantity_debounce: Duration::from_millis(DEFAULT_QUANTITY_DEBOUNCE_MS),
            signal_settle: Duration::from_millis(DEFAULT_SIGNAL_SETTLE_MS),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an environment variable parsed as `u64`, or a default when unset.
fn get_parsed_or_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_for_base_url_appends_trailing_slash() {
        let config = ClientConfig::for_base_url("https://shop.example.com/api").unwrap();
        assert_eq!(config.api_base_url.as_str(), "https://shop.example.com/api/");

        // Joining must preserve the full base path.
        let joined = config.api_base_url.join("api/v1/cart").unwrap();
        assert_eq!(joined.as_str(), "https://shop.example.com/api/api/v1/cart");
    }

    #[test]
    fn test_for_base_url_rejects_garbage() {
        assert!(ClientConfig::for_base_url("not a url").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::for_base_url("https://shop.example.com").unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.quantity_debounce, Duration::from_millis(500));
        assert_eq!(config.signal_settle, Duration::from_millis(200));
    }
}
