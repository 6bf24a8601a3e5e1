//! Back-office product and order actions against the stub API.

#![allow(clippy::unwrap_used)]

use dsnh_core::Quantity;
use dsnh_integration_tests::StubApi;
use dsnh_storefront::admin::{AdminError, ProductForm};
use dsnh_storefront::api::{ApiError, ImageUpload, ProductQuery};
use dsnh_storefront::views::{OrderDetailView, OrderSource};
use serde_json::json;

#[tokio::test]
async fn test_create_product_sends_multipart_and_refreshes() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();
    let admin = storefront.admin();

    let form = ProductForm {
        name: "Zinc 50mg".to_string(),
        price: "4500".to_string(),
        image: Some(ImageUpload {
            file_name: "zinc.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }),
        ..ProductForm::blank()
    };
    let response = admin.products.save(&form).await.unwrap();
    assert_eq!(response, Some(json!({"id": 101})));

    let created = stub.requests_to("POST", "/api/health-supplements/products");
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].field("name"), Some("Zinc 50mg"));
    assert_eq!(created[0].field("price"), Some("4500"));
    assert_eq!(created[0].field("availability"), Some("1"));
    assert_eq!(created[0].field("description"), None);
    assert_eq!(
        created[0].files,
        vec![("image".to_string(), "zinc.png".to_string())]
    );

    // Saving reloads the listing.
    assert_eq!(
        stub.requests_to("GET", "/api/health-supplements/products").len(),
        1
    );
}

#[tokio::test]
async fn test_update_product_from_catalog_entry() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();
    storefront.catalog().refresh(&ProductQuery::new(20)).await;

    let product = storefront.catalog().find(Some("2")).unwrap();
    let mut form = ProductForm::from_product(&product);
    assert_eq!(form.title(), "Update product #2");
    form.availability = "0".to_string();

    storefront.admin().products.save(&form).await.unwrap();

    let updated = stub.requests_to("POST", "/api/health-supplements/products/2");
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].field("price"), Some("14500"));
    assert_eq!(updated[0].field("availability"), Some("0"));
}

#[tokio::test]
async fn test_delete_is_reported_unsupported() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();
    let mut status = storefront.admin().subscribe_status();

    let err = storefront.admin().products.delete("2").unwrap_err();

    assert!(matches!(err, AdminError::DeleteUnsupported));
    assert_eq!(
        status.try_recv().unwrap().message,
        "Delete endpoint not in collection (UI-only)."
    );
    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn test_fetch_live_order() {
    let stub = StubApi::start().await;
    stub.insert_order(
        "ORD-7",
        json!({
            "order": {
                "id": "ORD-7",
                "created_at": "2026-02-23T10:00:00Z",
                "currency": "NGN",
                "customer_details": {"name": "Ada Obi", "email": "ada@example.com"},
                "payment_details": {"reference": "WEB_1", "provider": "web", "status": "paid"},
                "order_items": [
                    {"product_id": 1, "product_name": "Vitamin D3", "quantity": 2, "price": 9800}
                ]
            }
        }),
    );
    let storefront = stub.storefront();

    let OrderDetailView::Found(detail) =
        storefront.admin().orders.fetch_live(" ORD-7 ").await.unwrap()
    else {
        panic!("order should be found");
    };
    assert_eq!(detail.source, OrderSource::Live);
    assert_eq!(detail.id, "ORD-7");
    assert_eq!(detail.customer_name, "Ada Obi");
    assert_eq!(detail.payment_status, "paid");
    assert_eq!(detail.lines[0].name, "Vitamin D3");
    assert_eq!(detail.total, "₦19,600");
}

#[tokio::test]
async fn test_fetch_missing_live_order() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();

    let err = storefront.admin().orders.fetch_live("ORD-404").await.unwrap_err();

    assert!(matches!(
        err,
        AdminError::Api(ApiError::Status { status: 404, .. })
    ));
    assert!(err.to_string().starts_with("Get order failed (404)"));
}

#[tokio::test]
async fn test_stored_order_after_checkout() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();
    storefront
        .cart()
        .add_item(&json!({"id": "3", "name": "Iron", "price": 12}), Quantity::new(2));
    storefront
        .checkout()
        .submit(&dsnh_storefront::checkout::CheckoutForm {
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            email: "ada@example.com".to_string(),
            phone: "0803".to_string(),
            street_address: "12 Marina Rd".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let rows = storefront.admin().orders.rows();
    assert_eq!(rows[0].id, "ORD-1");

    let OrderDetailView::Found(detail) = storefront.admin().orders.stored_detail("ORD-1") else {
        panic!("order should be found");
    };
    assert_eq!(detail.source.label(), "Stored (checkout)");
    assert_eq!(detail.payment_provider, "web");
    assert_eq!(detail.total, "$24");
}
