//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for front ends driving the storefront.
//! Operational failures are captured to Sentry by [`AppError::report`]; user
//! mistakes are not.

use thiserror::Error;

use crate::admin::AdminError;
use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Persisted documents could not be written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Remote API call failed.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Order placement failed.
    #[error("{0}")]
    Checkout(#[from] CheckoutError),

    /// Admin action failed.
    #[error("{0}")]
    Admin(#[from] AdminError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether the error points at the system rather than the user's input.
    #[must_use]
    pub const fn is_operational(&self) -> bool {
        match self {
            Self::Config(_) | Self::Storage(_) | Self::Api(_) => true,
            Self::Checkout(e) => matches!(e, CheckoutError::Api(_)),
            Self::Admin(e) => matches!(e, AdminError::Api(_)),
            Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }

    /// Log the error, capturing operational failures to Sentry.
    pub fn report(&self) {
        if self.is_operational() {
            let event_id = sentry::capture_error(self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Command failed");
        } else {
            tracing::warn!(error = %self, "Command rejected");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
