//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `DSNH_API_BASE_URL` - Product/order API base URL (default: `https://api.dsnutritional.com`)
//! - `DSNH_CHECKOUT_ENDPOINT` - Order placement endpoint
//!   (default: `https://apiv2.hayzeeonline.com/api/health-supplements/orders`)
//! - `DSNH_PRODUCT_ROWS` - Listing page size (default: 20)
//! - `DSNH_PRICE_UNITS` - `heuristic`, `major` or `minor` (default: heuristic)
//! - `DSNH_DATA_DIR` - Directory for persisted documents (default: `.dsnh`)
//! - `DSNH_SOURCE_URL` - Source recorded on order payloads (default: `dsnh-cli://checkout`)
//! - `DSNH_HTTP_TIMEOUT_SECS` - Request timeout (default: 15)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use dsnh_core::PriceUnitPolicy;
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://api.dsnutritional.com";
pub const DEFAULT_CHECKOUT_ENDPOINT: &str =
    "https://apiv2.hayzeeonline.com/api/health-supplements/orders";
pub const DEFAULT_PRODUCT_ROWS: u32 = 20;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct StorefrontConfig {
    /// API base URL, without a trailing slash
    pub api_base_url: String,
    /// Full URL orders are posted to
    pub checkout_endpoint: String,
    /// Number of products requested per listing
    pub product_rows: u32,
    /// How raw API prices map to display prices
    pub price_units: PriceUnitPolicy,
    /// Directory holding persisted documents
    pub data_dir: PathBuf,
    /// Source marker recorded on order payloads
    pub source_url: String,
    /// Per-request timeout
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            checkout_endpoint: DEFAULT_CHECKOUT_ENDPOINT.to_string(),
            product_rows: DEFAULT_PRODUCT_ROWS,
            price_units: PriceUnitPolicy::default(),
            data_dir: PathBuf::from(".dsnh"),
            source_url: "dsnh-cli://checkout".to_string(),
            http_timeout: Duration::from_secs(15),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_base_url = get("DSNH_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        validate_url("DSNH_API_BASE_URL", &api_base_url)?;

        let checkout_endpoint =
            get("DSNH_CHECKOUT_ENDPOINT").unwrap_or_else(|| DEFAULT_CHECKOUT_ENDPOINT.to_string());
        validate_url("DSNH_CHECKOUT_ENDPOINT", &checkout_endpoint)?;

        let product_rows = get_or_default(&get, "DSNH_PRODUCT_ROWS", "20")
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidEnvVar("DSNH_PRODUCT_ROWS".to_string(), e.to_string()))?;

        let price_units = get_or_default(&get, "DSNH_PRICE_UNITS", "heuristic")
            .parse::<PriceUnitPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("DSNH_PRICE_UNITS".to_string(), e))?;

        let timeout_secs = get_or_default(&get, "DSNH_HTTP_TIMEOUT_SECS", "15")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("DSNH_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            api_base_url,
            checkout_endpoint,
            product_rows,
            price_units,
            data_dir: PathBuf::from(get_or_default(&get, "DSNH_DATA_DIR", ".dsnh")),
            source_url: get_or_default(&get, "DSNH_SOURCE_URL", "dsnh-cli://checkout"),
            http_timeout: Duration::from_secs(timeout_secs),
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a variable with a default value.
fn get_or_default(get: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get(key).unwrap_or_else(|| default.to_string())
}

/// Check that a variable holds an absolute http(s) URL.
fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, StorefrontConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DSNH_API_BASE_URL", "http://127.0.0.1:8080/"),
            ("DSNH_PRODUCT_ROWS", "5"),
            ("DSNH_PRICE_UNITS", "major"),
            ("DSNH_HTTP_TIMEOUT_SECS", "3"),
            ("SENTRY_DSN", "  "),
        ])
        .unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:8080");
        assert_eq!(config.product_rows, 5);
        assert_eq!(config.price_units, PriceUnitPolicy::Major);
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_values() {
        for vars in [
            [("DSNH_PRODUCT_ROWS", "many")],
            [("DSNH_PRICE_UNITS", "cents")],
            [("DSNH_API_BASE_URL", "ftp://example.com")],
            [("DSNH_CHECKOUT_ENDPOINT", "not a url")],
        ] {
            let err = load(&vars).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == vars[0].0));
        }
    }
}
