//! Integration tests for the DS Nutritional Health storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p dsnh-integration-tests
//! ```
//!
//! Tests drive a [`Storefront`] against [`StubApi`], an in-process axum
//! server bound to an ephemeral localhost port that imitates the product/order
//! API and records every request it receives.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Multipart, Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dsnh_storefront::config::StorefrontConfig;
use dsnh_storefront::state::Storefront;
use dsnh_storefront::storage::{KeyValueStorage, MemoryStorage};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// A request received by the stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub query: Option<String>,
    /// JSON body, for JSON requests.
    pub json: Option<Value>,
    /// Multipart text fields in arrival order.
    pub fields: Vec<(String, String)>,
    /// Multipart file parts as `(field, file name)`.
    pub files: Vec<(String, String)>,
}

impl RecordedRequest {
    fn new(method: &'static str, path: String) -> Self {
        Self {
            method,
            path,
            query: None,
            json: None,
            fields: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Value of a multipart text field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Canned reply: status plus an optional JSON body (`None` sends an empty body).
#[derive(Debug, Clone)]
struct Reply {
    status: StatusCode,
    body: Option<Value>,
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}

struct StubInner {
    requests: Vec<RecordedRequest>,
    products: Reply,
    place_order: Reply,
    orders: HashMap<String, Value>,
    next_product_id: u64,
}

#[derive(Clone)]
struct StubState {
    inner: Arc<Mutex<StubInner>>,
}

impl StubState {
    fn with<T>(&self, f: impl FnOnce(&mut StubInner) -> T) -> T {
        f(&mut self.inner.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// In-process stand-in for the product/order API.
pub struct StubApi {
    addr: SocketAddr,
    state: StubState,
    server: JoinHandle<()>,
}

impl StubApi {
    /// Start the stub on an ephemeral port.
    ///
    /// Serves the two-product sample listing and acknowledges orders with
    /// `{"id": "ORD-1"}` until told otherwise.
    ///
    /// # Panics
    ///
    /// Panics if the port cannot be bound.
    pub async fn start() -> Self {
        let state = StubState {
            inner: Arc::new(Mutex::new(StubInner {
                requests: Vec::new(),
                products: Reply {
                    status: StatusCode::OK,
                    body: Some(dsnh_core::sample_products_response()),
                },
                place_order: Reply {
                    status: StatusCode::CREATED,
                    body: Some(json!({"id": "ORD-1"})),
                },
                orders: HashMap::new(),
                next_product_id: 100,
            })),
        };

        let app = Router::new()
            .route(
                "/api/health-supplements/products",
                get(list_products).post(create_product),
            )
            .route("/api/health-supplements/products/{id}", post(update_product))
            .route("/api/health-supplements/orders", post(place_order))
            .route("/api/health-supplements/orders/{id}", get(get_order))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("failed to bind stub API: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("stub API has no local address: {e}"));
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Configuration pointing every endpoint at the stub.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        let base = self.base_url();
        StorefrontConfig {
            checkout_endpoint: format!("{base}/api/health-supplements/orders"),
            api_base_url: base,
            source_url: "test://checkout".to_string(),
            ..StorefrontConfig::default()
        }
    }

    /// A storefront over fresh in-memory storage.
    ///
    /// # Panics
    ///
    /// Panics if the stub's URL is rejected.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        self.storefront_over(Arc::new(MemoryStorage::new()))
    }

    /// A storefront over the given storage.
    ///
    /// # Panics
    ///
    /// Panics if the stub's URL is rejected.
    #[must_use]
    pub fn storefront_over(&self, storage: Arc<dyn KeyValueStorage>) -> Storefront {
        Storefront::with_storage(self.config(), storage)
            .unwrap_or_else(|e| panic!("stub config rejected: {e}"))
    }

    /// Replace the product listing response.
    pub fn set_products(&self, status: StatusCode, body: Option<Value>) {
        self.state.with(|s| s.products = Reply { status, body });
    }

    /// Replace the order placement response.
    pub fn set_place_order(&self, status: StatusCode, body: Option<Value>) {
        self.state.with(|s| s.place_order = Reply { status, body });
    }

    /// Serve `body` for `GET /orders/{id}`.
    pub fn insert_order(&self, id: &str, body: Value) {
        self.state.with(|s| s.orders.insert(id.to_string(), body));
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.with(|s| s.requests.clone())
    }

    /// Requests to `path` with `method`.
    #[must_use]
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

impl Drop for StubApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_products(State(state): State<StubState>, RawQuery(query): RawQuery) -> Reply {
    state.with(|s| {
        let mut request = RecordedRequest::new("GET", "/api/health-supplements/products".into());
        request.query = query;
        s.requests.push(request);
        s.products.clone()
    })
}

async fn create_product(State(state): State<StubState>, multipart: Multipart) -> Reply {
    let request = read_multipart(
        RecordedRequest::new("POST", "/api/health-supplements/products".into()),
        multipart,
    )
    .await;
    state.with(|s| {
        s.requests.push(request);
        s.next_product_id += 1;
        Reply {
            status: StatusCode::CREATED,
            body: Some(json!({"id": s.next_product_id})),
        }
    })
}

async fn update_product(
    State(state): State<StubState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Reply {
    let request = read_multipart(
        RecordedRequest::new("POST", format!("/api/health-supplements/products/{id}")),
        multipart,
    )
    .await;
    state.with(|s| s.requests.push(request));
    Reply {
        status: StatusCode::OK,
        body: Some(json!({"data": {"id": id}})),
    }
}

async fn place_order(State(state): State<StubState>, Json(body): Json<Value>) -> Reply {
    state.with(|s| {
        let mut request = RecordedRequest::new("POST", "/api/health-supplements/orders".into());
        request.json = Some(body);
        s.requests.push(request);
        s.place_order.clone()
    })
}

async fn get_order(State(state): State<StubState>, Path(id): Path<String>) -> Reply {
    state.with(|s| {
        s.requests.push(RecordedRequest::new(
            "GET",
            format!("/api/health-supplements/orders/{id}"),
        ));
        s.orders.get(&id).cloned().map_or(
            Reply {
                status: StatusCode::NOT_FOUND,
                body: Some(json!({"error": "order not found"})),
            },
            |body| Reply {
                status: StatusCode::OK,
                body: Some(body),
            },
        )
    })
}

async fn read_multipart(mut request: RecordedRequest, mut multipart: Multipart) -> RecordedRequest {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(str::to_string) {
            request.files.push((name, file_name));
        } else if let Ok(text) = field.text().await {
            request.fields.push((name, text));
        }
    }
    request
}
