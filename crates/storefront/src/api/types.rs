//! Request types for the product/order API.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::config::StorefrontConfig;

/// Listing query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductQuery {
    pub rows: u32,
    /// Free-text filter; empty means no filter.
    pub search: String,
}

impl ProductQuery {
    #[must_use]
    pub fn new(rows: u32) -> Self {
        Self {
            rows,
            search: String::new(),
        }
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }
}

/// An image file attached to a product form.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageUpload {
    /// Guess a content type from the file extension.
    #[must_use]
    pub fn guess_content_type(file_name: &str) -> &'static str {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            _ => "application/octet-stream",
        }
    }
}

/// Fields sent when creating or updating a product.
///
/// Only non-empty text fields are sent; the image is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    /// Raw price as the API expects it (no unit conversion).
    pub price: String,
    /// `"1"` (available) or `"0"` (hidden).
    pub availability: String,
    pub image: Option<ImageUpload>,
}

impl ProductFields {
    /// Non-empty text fields in wire order.
    #[must_use]
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        [
            ("name", &self.name),
            ("description", &self.description),
            ("price", &self.price),
            ("availability", &self.availability),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key, value.clone()))
        .collect()
    }
}

/// Which API operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiOperation {
    ListProducts,
    CreateProduct,
    UpdateProduct,
    PlaceOrder,
    GetOrder,
}

impl ApiOperation {
    /// User-facing prefix of a failure message.
    #[must_use]
    pub const fn failure_label(self) -> &'static str {
        match self {
            Self::ListProducts => "Failed to load products",
            Self::CreateProduct => "Create failed",
            Self::UpdateProduct => "Update failed",
            Self::PlaceOrder => "Request failed",
            Self::GetOrder => "Get order failed",
        }
    }
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.failure_label())
    }
}

/// Settings the client is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// Base URL of the product/order API, without a trailing slash.
    pub base_url: String,
    /// Full URL orders are posted to.
    pub checkout_endpoint: String,
    pub timeout: Duration,
}

impl ApiSettings {
    /// Settings pointing every endpoint, checkout included, at `base_url`.
    #[must_use]
    pub fn for_base_url(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            checkout_endpoint: format!("{base_url}/api/health-supplements/orders"),
            base_url,
            timeout: Duration::from_secs(15),
        }
    }
}

impl From<&StorefrontConfig> for ApiSettings {
    fn from(config: &StorefrontConfig) -> Self {
        Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            checkout_endpoint: config.checkout_endpoint.clone(),
            timeout: config.http_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_fields_skip_empty() {
        let fields = ProductFields {
            name: "Zinc".to_string(),
            price: "4500".to_string(),
            ..ProductFields::default()
        };
        assert_eq!(
            fields.text_fields(),
            vec![("name", "Zinc".to_string()), ("price", "4500".to_string())]
        );
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(ImageUpload::guess_content_type("a.PNG"), "image/png");
        assert_eq!(ImageUpload::guess_content_type("photo.jpeg"), "image/jpeg");
        assert_eq!(ImageUpload::guess_content_type("noext"), "application/octet-stream");
    }
}
