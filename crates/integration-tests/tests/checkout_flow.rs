//! End-to-end checkout against the stub API.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::StatusCode;
use dsnh_core::{Cart, Quantity};
use dsnh_integration_tests::StubApi;
use dsnh_storefront::api::ProductQuery;
use dsnh_storefront::checkout::{CheckoutError, CheckoutForm};
use dsnh_storefront::notice::{Notice, NoticeKind};
use dsnh_storefront::storage::{CART_KEY, KeyValueStorage, MemoryStorage, StorageError};
use serde_json::json;

const ORDERS_PATH: &str = "/api/health-supplements/orders";

fn form() -> CheckoutForm {
    CheckoutForm {
        first_name: "Ada".to_string(),
        last_name: "Obi".to_string(),
        email: "ada@example.com".to_string(),
        phone: "08030000000".to_string(),
        street_address: "12 Marina Rd".to_string(),
        town: "Lagos".to_string(),
        country: "Nigeria".to_string(),
        ..CheckoutForm::default()
    }
}

#[tokio::test]
async fn test_two_item_checkout_records_order_and_clears_cart() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();

    storefront.catalog().refresh(&ProductQuery::new(20)).await;
    let vitamin = storefront.catalog().find(Some("1")).unwrap();
    let omega = storefront.catalog().find(Some("2")).unwrap();
    storefront.cart().add_product(&vitamin, Quantity::new(2));
    storefront.cart().add_product(&omega, Quantity::ONE);
    assert_eq!(storefront.cart().get_count(), 3);

    let mut status = storefront.checkout().subscribe_status();
    let mut orders_changed = storefront.orders().subscribe();
    let receipt = storefront.checkout().submit(&form()).await.unwrap();

    assert_eq!(receipt.order_id.as_str(), "ORD-1");
    assert_eq!(status.try_recv().unwrap(), Notice::info("Placing order..."));
    assert_eq!(
        status.try_recv().unwrap(),
        Notice::success("Order placed successfully.")
    );
    assert!(orders_changed.try_recv().is_ok());

    let log = storefront.orders().read_all();
    assert_eq!(log.orders[0].id.as_str(), "ORD-1");
    assert_eq!(log.orders[0].items.len(), 2);
    assert_eq!(log.orders[0].customer.as_ref().unwrap().name, "Ada Obi");
    assert!(storefront.cart().get_cart().is_empty());
    assert_eq!(storefront.cart().get_count(), 0);

    let posted = stub.requests_to("POST", ORDERS_PATH);
    assert_eq!(posted.len(), 1);
    let body = posted[0].json.as_ref().unwrap();
    assert_eq!(body["items"][0]["id"], "1");
    assert_eq!(body["items"][0]["qty"], 2);
    assert_eq!(body["items"][1]["price"], json!(145.0));
    assert_eq!(body["totals"]["total"], json!(341.0));
    assert_eq!(body["customer"]["address"], "12 Marina Rd, Lagos, Nigeria");
    assert_eq!(body["payment"]["provider"], "web");
    assert_eq!(body["payment"]["status"], "pending");
    assert_eq!(body["source"], "test://checkout");
}

#[tokio::test]
async fn test_rejected_order_keeps_cart() {
    let stub = StubApi::start().await;
    stub.set_place_order(
        StatusCode::UNPROCESSABLE_ENTITY,
        Some(json!({"error": "out of stock"})),
    );
    let storefront = stub.storefront();
    storefront
        .cart()
        .add_item(&json!({"id": "1", "name": "Zinc", "price": 45}), Quantity::ONE);

    let mut status = storefront.checkout().subscribe_status();
    let err = storefront.checkout().submit(&form()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::Api(_)));
    assert!(err.to_string().starts_with("Request failed (422)"));
    assert!(err.to_string().contains("out of stock"));
    assert_eq!(status.try_recv().unwrap().kind, NoticeKind::Info);
    assert_eq!(status.try_recv().unwrap().kind, NoticeKind::Error);

    assert_eq!(storefront.cart().get_count(), 1);
    assert!(storefront.orders().read_all().orders.is_empty());
}

#[tokio::test]
async fn test_empty_acknowledgment_records_order_without_id() {
    let stub = StubApi::start().await;
    stub.set_place_order(StatusCode::NO_CONTENT, None);
    let storefront = stub.storefront();
    storefront
        .cart()
        .add_item(&json!({"id": "1", "price": 10}), Quantity::ONE);

    let receipt = storefront.checkout().submit(&form()).await.unwrap();

    assert!(receipt.order_id.is_empty());
    assert!(receipt.response.is_none());
    let entry = &storefront.orders().read_all().orders[0];
    assert!(entry.id.is_empty());
    assert!(entry.response.is_none());
    assert!(storefront.cart().get_cart().is_empty());
}

#[tokio::test]
async fn test_invalid_form_never_reaches_api() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();
    storefront
        .cart()
        .add_item(&json!({"id": "1", "price": 10}), Quantity::ONE);

    let bad = CheckoutForm {
        email: "not-an-email".to_string(),
        ..form()
    };
    let err = storefront.checkout().submit(&bad).await.unwrap_err();

    assert!(matches!(err, CheckoutError::Invalid("email address")));
    assert!(stub.requests_to("POST", ORDERS_PATH).is_empty());
    assert_eq!(storefront.cart().get_count(), 1);
}

/// Storage where another tab empties the cart right after the next cart read.
struct ClearedByOtherTab {
    inner: MemoryStorage,
    armed: AtomicBool,
}

impl KeyValueStorage for ClearedByOtherTab {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self.inner.get(key)?;
        if key == CART_KEY && self.armed.swap(false, Ordering::SeqCst) {
            let empty = serde_json::to_string(&Cart::default())?;
            self.inner.set(CART_KEY, &empty)?;
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }
}

#[tokio::test]
async fn test_submit_posts_the_cart_it_checked() {
    let stub = StubApi::start().await;
    let storage = Arc::new(ClearedByOtherTab {
        inner: MemoryStorage::new(),
        armed: AtomicBool::new(false),
    });
    let storefront = stub.storefront_over(storage.clone());
    storefront
        .cart()
        .add_item(&json!({"id": "7", "name": "Zinc", "price": 12}), Quantity::new(2));

    storage.armed.store(true, Ordering::SeqCst);
    let receipt = storefront.checkout().submit(&form()).await.unwrap();

    assert_eq!(receipt.payload.items.len(), 1);
    let posted = stub.requests_to("POST", ORDERS_PATH);
    let body = posted[0].json.as_ref().unwrap();
    assert_eq!(body["items"][0]["id"], "7");
    assert_eq!(body["totals"]["total"], json!(24.0));
}
