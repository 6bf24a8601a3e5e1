//! Customer and payment records attached to orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce::scalar_string;

/// Field of a loosely typed object rendered as text, empty when absent.
fn text_field(raw: &Value, key: &str) -> String {
    scalar_string(raw.get(key)).unwrap_or_default()
}

/// Contact details submitted with an order.
///
/// All fields are free text; missing fields deserialize as empty strings so
/// records written by older clients still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    /// Full name ("first last").
    pub name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Postal address on a single line.
    pub address: String,
}

impl Customer {
    /// Read contact details from an API object, accepting numbers and
    /// booleans wherever text is expected.
    #[must_use]
    pub fn from_loose(raw: &Value) -> Self {
        Self {
            name: text_field(raw, "name"),
            email: text_field(raw, "email"),
            phone: text_field(raw, "phone"),
            address: text_field(raw, "address"),
        }
    }
}

/// Payment record sent with an order.
///
/// Payment itself is out of scope; the storefront only tags the order so the
/// back office can reconcile it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentInfo {
    /// Client-generated payment reference.
    pub reference: String,
    /// Payment provider name.
    pub provider: String,
    /// Payment status.
    pub status: String,
}

impl PaymentInfo {
    /// Payment record for an order placed from the web checkout.
    #[must_use]
    pub fn web_pending(now: DateTime<Utc>) -> Self {
        Self {
            reference: format!("WEB_{}", now.timestamp_millis()),
            provider: "web".to_string(),
            status: "pending".to_string(),
        }
    }

    /// Read a payment record from an API object, coercing scalars to text.
    #[must_use]
    pub fn from_loose(raw: &Value) -> Self {
        Self {
            reference: text_field(raw, "reference"),
            provider: text_field(raw, "provider"),
            status: text_field(raw, "status"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_web_pending_reference() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).single();
        let payment = PaymentInfo::web_pending(now.unwrap_or_default());
        assert_eq!(payment.reference, "WEB_1700000000123");
        assert_eq!(payment.provider, "web");
        assert_eq!(payment.status, "pending");
    }

    #[test]
    fn test_from_loose_coerces_scalars() {
        let customer = Customer::from_loose(&serde_json::json!({
            "name": "Ada Obi",
            "phone": 8_030_000_000_u64,
            "email": null,
            "address": ["not", "text"],
        }));
        assert_eq!(customer.name, "Ada Obi");
        assert_eq!(customer.phone, "8030000000");
        assert!(customer.email.is_empty());
        assert!(customer.address.is_empty());

        let payment = PaymentInfo::from_loose(&serde_json::json!({"reference": 991, "status": "paid"}));
        assert_eq!(payment.reference, "991");
        assert_eq!(payment.status, "paid");
        assert!(payment.provider.is_empty());
    }
}
