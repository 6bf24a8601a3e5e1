//! HTTP client for the health-supplements product/order API.
//!
//! # Endpoints
//!
//! - `GET  {base}/api/health-supplements/products?rows=N&search=S`
//! - `POST {base}/api/health-supplements/products` (multipart)
//! - `POST {base}/api/health-supplements/products/{id}` (multipart)
//! - `POST {checkout_endpoint}` (JSON order payload)
//! - `GET  {base}/api/health-supplements/orders/{id}`
//!
//! Response bodies are returned as raw JSON; decoding the loosely shaped
//! responses is left to the domain layer. A successful response whose body
//! isn't JSON is reported as `None` rather than an error.

mod types;

pub use types::{ApiOperation, ApiSettings, ImageUpload, ProductFields, ProductQuery};

use std::sync::Arc;

use dsnh_core::OrderPayload;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;
use url::Url;

const API_PREFIX: [&str; 2] = ["api", "health-supplements"];

/// Errors that can occur when calling the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status.
    #[error("{}", status_message(*.operation, *.status, .body))]
    Status {
        operation: ApiOperation,
        status: u16,
        body: String,
    },

    /// Response body was not the JSON that was required.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configured URL is unusable.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

fn status_message(operation: ApiOperation, status: u16, body: &str) -> String {
    let body = body.trim();
    if operation == ApiOperation::ListProducts || body.is_empty() {
        format!("{operation} ({status})")
    } else {
        format!("{operation} ({status}) {body}")
    }
}

/// Client for the product/order API.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    checkout_endpoint: Url,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if a URL is invalid or the HTTP client fails to build.
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let base_url = parse_url(settings.base_url.trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(settings.base_url.clone()));
        }
        let checkout_endpoint = parse_url(&settings.checkout_endpoint)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url,
                checkout_endpoint,
            }),
        })
    }

    /// `{base}/api/health-supplements/{segments...}`, each segment
    /// percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    /// Fetch a product listing.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status, or a body that
    /// is not JSON.
    #[instrument(skip(self), fields(rows = query.rows))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Value, ApiError> {
        let mut url = self.endpoint(&["products"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("rows", &query.rows.to_string());
            if !query.search.is_empty() {
                pairs.append_pair("search", &query.search);
            }
        }

        let response = self.inner.client.get(url).send().await?;
        let response = check_status(response, ApiOperation::ListProducts).await?;

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or non-success status.
    #[instrument(skip(self, fields))]
    pub async fn create_product(&self, fields: &ProductFields) -> Result<Option<Value>, ApiError> {
        let url = self.endpoint(&["products"])?;
        self.post_multipart(url, fields, ApiOperation::CreateProduct)
            .await
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or non-success status.
    #[instrument(skip(self, fields))]
    pub async fn update_product(
        &self,
        id: &str,
        fields: &ProductFields,
    ) -> Result<Option<Value>, ApiError> {
        let url = self.endpoint(&["products", id])?;
        self.post_multipart(url, fields, ApiOperation::UpdateProduct)
            .await
    }

    async fn post_multipart(
        &self,
        url: Url,
        fields: &ProductFields,
        operation: ApiOperation,
    ) -> Result<Option<Value>, ApiError> {
        let response = self
            .inner
            .client
            .post(url)
            .multipart(build_form(fields)?)
            .send()
            .await?;
        let response = check_status(response, operation).await?;
        read_optional_json(response).await
    }

    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or non-success status.
    #[instrument(skip_all, fields(items = payload.items.len()))]
    pub async fn place_order(&self, payload: &OrderPayload) -> Result<Option<Value>, ApiError> {
        let response = self
            .inner
            .client
            .post(self.inner.checkout_endpoint.clone())
            .json(payload)
            .send()
            .await?;
        let response = check_status(response, ApiOperation::PlaceOrder).await?;
        read_optional_json(response).await
    }

    /// Fetch an order by id.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or non-success status.
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: &str) -> Result<Option<Value>, ApiError> {
        let url = self.endpoint(&["orders", id])?;
        let response = self.inner.client.get(url).send().await?;
        let response = check_status(response, ApiOperation::GetOrder).await?;
        read_optional_json(response).await
    }
}

fn parse_url(raw: &str) -> Result<Url, ApiError> {
    Url::parse(raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))
}

async fn check_status(
    response: reqwest::Response,
    operation: ApiOperation,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(%operation, status = status.as_u16(), "API request failed");
    Err(ApiError::Status {
        operation,
        status: status.as_u16(),
        body,
    })
}

/// Parse a body as JSON, treating an empty, non-JSON or `null` body as absent.
async fn read_optional_json(response: reqwest::Response) -> Result<Option<Value>, ApiError> {
    let text = response.text().await?;
    Ok(serde_json::from_str::<Value>(&text)
        .ok()
        .filter(|v| !v.is_null()))
}

fn build_form(fields: &ProductFields) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for (name, value) in fields.text_fields() {
        form = form.text(name, value);
    }
    if let Some(image) = &fields.image {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        form = form.part("image", part);
    }
    Ok(form)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ApiSettings::for_base_url(base)).unwrap()
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let api = client("https://api.example.com/");
        let url = api.endpoint(&["products", "a b/c"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/api/health-supplements/products/a%20b%2Fc"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = client("https://example.com/proxy");
        let url = api.endpoint(&["orders", "ORD-1"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/proxy/api/health-supplements/orders/ORD-1"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ApiClient::new(&ApiSettings::for_base_url("not a url")).err().unwrap();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn test_status_messages() {
        let err = ApiError::Status {
            operation: ApiOperation::ListProducts,
            status: 503,
            body: "down".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to load products (503)");

        let err = ApiError::Status {
            operation: ApiOperation::CreateProduct,
            status: 422,
            body: "{\"error\":\"name required\"}\n".to_string(),
        };
        assert_eq!(err.to_string(), "Create failed (422) {\"error\":\"name required\"}");

        let err = ApiError::Status {
            operation: ApiOperation::PlaceOrder,
            status: 500,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "Request failed (500)");
    }
}
