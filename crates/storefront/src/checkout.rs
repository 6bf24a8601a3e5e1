//! Checkout: turns the cart and a customer form into a placed order.
//!
//! A successful submission records the order in the local history and empties
//! the cart. A failed submission leaves both untouched so the customer can
//! retry.

use std::sync::Arc;

use chrono::Utc;
use dsnh_core::{Customer, OrderId, OrderPayload, PaymentInfo, calc_subtotal};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::instrument;

use crate::api::{ApiClient, ApiError};
use crate::cart::CartStore;
use crate::notice::Notice;
use crate::orders::OrderHistory;
use crate::signal::Signal;

/// Errors that can occur when placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    /// A required field is missing or malformed.
    #[error("Please enter a valid {0}")]
    Invalid(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The customer details form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub street_address: String,
    pub street_address_two: String,
    pub town: String,
    pub district: String,
    pub zip: String,
    pub country: String,
}

impl CheckoutForm {
    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns the first missing or malformed field.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let required = [
            ("first name", &self.first_name),
            ("last name", &self.last_name),
            ("email address", &self.email),
            ("phone number", &self.phone),
            ("street address", &self.street_address),
        ];
        if let Some((field, _)) = required.into_iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(CheckoutError::Invalid(field));
        }
        if !looks_like_email(self.email.trim()) {
            return Err(CheckoutError::Invalid("email address"));
        }
        Ok(())
    }

    /// The customer record sent with the order.
    #[must_use]
    pub fn to_customer(&self) -> Customer {
        let address = [
            &self.street_address,
            &self.street_address_two,
            &self.town,
            &self.district,
            &self.zip,
            &self.country,
        ]
        .into_iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

        Customer {
            name: format!("{} {}", self.first_name.trim(), self.last_name.trim())
                .trim()
                .to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address,
        }
    }
}

/// `local@domain.tld` with no whitespace.
fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !email.chars().any(char::is_whitespace)
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReceipt {
    /// Id assigned by the API; empty when the response carried none.
    pub order_id: OrderId,
    pub response: Option<Value>,
    pub payload: OrderPayload,
}

/// One line of the order summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine {
    /// `"name × qty"`.
    pub label: String,
    pub line_total: f64,
}

/// Order summary shown beside the checkout form.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSummary {
    pub lines: Vec<SummaryLine>,
    pub subtotal: f64,
    pub total: f64,
    pub can_place_order: bool,
}

/// Checkout service.
#[derive(Clone)]
pub struct Checkout {
    api: ApiClient,
    cart: CartStore,
    history: OrderHistory,
    status: Arc<Signal<Notice>>,
}

impl Checkout {
    /// Create the flow. Placed orders are recorded in `history` and `cart`
    /// is cleared after a successful submission.
    #[must_use]
    pub fn new(api: ApiClient, cart: CartStore, history: OrderHistory) -> Self {
        Self {
            api,
            cart,
            history,
            status: Arc::new(Signal::new()),
        }
    }

    /// Summary of the current cart.
    #[must_use]
    pub fn summary(&self) -> CheckoutSummary {
        let cart = self.cart.get_cart();
        let subtotal = calc_subtotal(&cart);
        let lines = cart
            .items
            .iter()
            .map(|item| {
                let name = if item.name.is_empty() {
                    "Product"
                } else {
                    item.name.as_str()
                };
                SummaryLine {
                    label: format!("{name} × {}", item.qty),
                    line_total: item.line_total(),
                }
            })
            .collect();

        CheckoutSummary {
            lines,
            subtotal,
            total: subtotal,
            can_place_order: !cart.is_empty(),
        }
    }

    /// Place an order for the current cart.
    ///
    /// # Errors
    ///
    /// Returns error if the cart is empty, the form is invalid, or the API
    /// rejects the order. The cart is left untouched on error.
    #[instrument(skip_all)]
    pub async fn submit(&self, form: &CheckoutForm) -> Result<CheckoutReceipt, CheckoutError> {
        let cart = self.cart.get_cart();
        if cart.is_empty() {
            return Err(self.fail(CheckoutError::EmptyCart));
        }
        form.validate().map_err(|e| self.fail(e))?;

        let payload = self
            .cart
            .order_payload_for(&cart, form.to_customer())
            .with_payment(PaymentInfo::web_pending(Utc::now()));

        self.status.emit(Notice::info("Placing order..."));
        let response = match self.api.place_order(&payload).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Order placement failed");
                return Err(self.fail(e.into()));
            }
        };

        self.status.emit(Notice::success("Order placed successfully."));
        let entry = self.history.append(&payload, response.as_ref());
        self.cart.clear();

        tracing::info!(order_id = %entry.id, "Checkout complete");
        Ok(CheckoutReceipt {
            order_id: entry.id,
            response,
            payload,
        })
    }

    fn fail(&self, error: CheckoutError) -> CheckoutError {
        self.status.emit(Notice::error(error.to_string()));
        error
    }

    /// Subscribe to status-line updates.
    #[must_use]
    pub fn subscribe_status(&self) -> broadcast::Receiver<Notice> {
        self.status.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dsnh_core::Quantity;
    use serde_json::json;

    use super::*;
    use crate::api::ApiSettings;
    use crate::notice::NoticeKind;
    use crate::storage::MemoryStorage;

    fn form() -> CheckoutForm {
        CheckoutForm {
            first_name: " Ada ".to_string(),
            last_name: "Obi".to_string(),
            email: "ada@example.com".to_string(),
            phone: "08030000000".to_string(),
            street_address: "12 Marina Rd".to_string(),
            town: "Lagos".to_string(),
            country: "Nigeria".to_string(),
            ..CheckoutForm::default()
        }
    }

    fn offline_checkout() -> Checkout {
        let storage = Arc::new(MemoryStorage::new());
        let mut settings = ApiSettings::for_base_url("http://127.0.0.1:9");
        settings.timeout = std::time::Duration::from_secs(2);
        Checkout::new(
            ApiClient::new(&settings).unwrap(),
            CartStore::new(storage.clone(), "test"),
            OrderHistory::new(storage),
        )
    }

    #[test]
    fn test_to_customer() {
        let customer = form().to_customer();
        assert_eq!(customer.name, "Ada Obi");
        assert_eq!(customer.address, "12 Marina Rd, Lagos, Nigeria");

        let customer = CheckoutForm {
            first_name: "Ada".to_string(),
            ..CheckoutForm::default()
        }
        .to_customer();
        assert_eq!(customer.name, "Ada");
        assert_eq!(customer.address, "");
    }

    #[test]
    fn test_validate() {
        assert!(form().validate().is_ok());

        let missing_phone = CheckoutForm {
            phone: "  ".to_string(),
            ..form()
        };
        assert!(matches!(
            missing_phone.validate(),
            Err(CheckoutError::Invalid("phone number"))
        ));

        for email in ["ada", "ada@", "@example.com", "ada@example", "a da@example.com"] {
            let bad = CheckoutForm {
                email: email.to_string(),
                ..form()
            };
            assert!(
                matches!(bad.validate(), Err(CheckoutError::Invalid("email address"))),
                "{email}"
            );
        }
    }

    #[test]
    fn test_summary() {
        let checkout = offline_checkout();
        assert!(!checkout.summary().can_place_order);

        checkout
            .cart
            .add_item(&json!({"id": "1", "name": "Zinc", "price": 4.5}), Quantity::new(2));
        checkout
            .cart
            .add_item(&json!({"id": "2", "price": 1.0}), Quantity::ONE);

        let summary = checkout.summary();
        assert!(summary.can_place_order);
        assert_eq!(summary.lines[0].label, "Zinc × 2");
        assert_eq!(summary.lines[1].label, "Product × 1");
        assert!((summary.subtotal - 10.0).abs() < f64::EPSILON);
        assert!((summary.total - summary.subtotal).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_submit_empty_cart() {
        let checkout = offline_checkout();
        let mut status = checkout.subscribe_status();
        let err = checkout.submit(&form()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
        assert_eq!(status.try_recv().unwrap().kind, NoticeKind::Error);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_cart() {
        let checkout = offline_checkout();
        checkout
            .cart
            .add_item(&json!({"id": "1", "price": 4.5}), Quantity::ONE);
        let mut status = checkout.subscribe_status();

        let err = checkout.submit(&form()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Api(_)));
        assert_eq!(status.try_recv().unwrap(), Notice::info("Placing order..."));
        assert_eq!(status.try_recv().unwrap().kind, NoticeKind::Error);

        assert_eq!(checkout.cart.get_count(), 1);
        assert!(checkout.history.read_all().orders.is_empty());
    }
}
