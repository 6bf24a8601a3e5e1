//! Order history records and order API response decoding.
//!
//! The order API has never committed to a response shape. Instead of probing
//! ad hoc at every call site, responses go through one decode step per use
//! with a fixed priority list of candidate locations. Anything unrecognised
//! decodes as absent rather than failing.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce::{
    self, Path, finite_or, first_array, first_defined, first_truthy, scalar_string,
};
use crate::types::cart::{OrderLine, OrderPayload};
use crate::types::customer::{Customer, PaymentInfo};
use crate::types::id::OrderId;
use crate::types::price::HISTORY_FALLBACK_CURRENCY;

/// Version tag written into the persisted order history document.
pub const ORDER_HISTORY_VERSION: u32 = 1;

/// Maximum number of entries kept in the order history.
pub const ORDER_HISTORY_LIMIT: usize = 50;

// =============================================================================
// History Records
// =============================================================================

/// One placed order, as recorded locally after a successful checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistoryEntry {
    /// Order id returned by the API, empty when the response carried none.
    #[serde(default)]
    pub id: OrderId,
    /// When the entry was recorded (ISO-8601).
    #[serde(default)]
    pub created_at: String,
    /// ISO 4217 currency code.
    #[serde(default)]
    pub currency: String,
    /// Customer details as submitted.
    #[serde(default)]
    pub customer: Option<Customer>,
    /// Lines as submitted.
    #[serde(default)]
    pub items: Vec<OrderLine>,
    /// Payment tag as submitted.
    #[serde(default)]
    pub payment: Option<PaymentInfo>,
    /// Raw API response.
    #[serde(default)]
    pub response: Option<Value>,
}

impl OrderHistoryEntry {
    /// Record a submitted payload together with the API's response.
    #[must_use]
    pub fn record(payload: &OrderPayload, response: Option<&Value>, now: DateTime<Utc>) -> Self {
        let id = response
            .and_then(OrderAck::decode)
            .map(|ack| ack.id)
            .unwrap_or_default();

        let currency = if payload.currency.is_empty() {
            HISTORY_FALLBACK_CURRENCY.to_string()
        } else {
            payload.currency.clone()
        };

        Self {
            id,
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            currency,
            customer: Some(payload.customer.clone()),
            items: payload.items.clone(),
            payment: payload.payment.clone(),
            response: response.filter(|v| !v.is_null()).cloned(),
        }
    }
}

/// The locally persisted order history, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHistoryLog {
    /// Document version ([`ORDER_HISTORY_VERSION`]).
    pub version: u32,
    /// Entries, newest first, at most [`ORDER_HISTORY_LIMIT`].
    pub orders: Vec<OrderHistoryEntry>,
}

impl Default for OrderHistoryLog {
    fn default() -> Self {
        Self {
            version: ORDER_HISTORY_VERSION,
            orders: Vec::new(),
        }
    }
}

impl OrderHistoryLog {
    /// Decode a persisted history document leniently.
    ///
    /// Returns `None` when the root is not an object. A non-array `orders`
    /// field yields an empty history; entries that are not objects are dropped.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let orders = object
            .get("orders")
            .and_then(Value::as_array)
            .map(|orders| {
                orders
                    .iter()
                    .filter_map(|o| serde_json::from_value(o.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            version: ORDER_HISTORY_VERSION,
            orders,
        })
    }

    /// Prepend `entry`, evicting the oldest entries beyond the limit.
    pub fn push_newest(&mut self, entry: OrderHistoryEntry) {
        self.orders.insert(0, entry);
        self.orders.truncate(ORDER_HISTORY_LIMIT);
    }

    /// Find an entry by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&OrderHistoryEntry> {
        self.orders.iter().find(|o| o.id == *id)
    }
}

// =============================================================================
// Order Placement Response
// =============================================================================

/// Where in a placement response the order id was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdLocation {
    /// `{ "id": ... }`
    Root,
    /// `{ "order": { "id": ... } }`
    Order,
    /// `{ "data": { "id": ... } }`
    Data,
}

/// Acknowledgment decoded from an order placement response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    /// Order id assigned by the API.
    pub id: OrderId,
    /// Location it was read from.
    pub location: IdLocation,
}

impl OrderAck {
    /// Candidate id locations, in priority order.
    pub const CANDIDATES: [(IdLocation, Path<'static>); 3] = [
        (IdLocation::Root, &["id"]),
        (IdLocation::Order, &["order", "id"]),
        (IdLocation::Data, &["data", "id"]),
    ];

    /// Decode the order id from a placement response.
    ///
    /// The first candidate holding a non-null value wins. String and numeric
    /// ids are accepted; any other value there means no id.
    #[must_use]
    pub fn decode(response: &Value) -> Option<Self> {
        let (location, value) = Self::CANDIDATES
            .iter()
            .find_map(|(location, path)| {
                coerce::lookup(response, path)
                    .filter(|v| !v.is_null())
                    .map(|v| (*location, v))
            })?;

        let id = match value {
            Value::String(_) | Value::Number(_) => scalar_string(Some(value))?,
            _ => return None,
        };

        Some(Self {
            id: OrderId::new(id),
            location,
        })
    }
}

// =============================================================================
// Order Snapshot (GET /orders/{id} or a history entry)
// =============================================================================

/// A line of an order as shown in the order detail view.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotLine {
    /// Product id (`product_id` or `id`), `"—"` when absent.
    pub product_id: String,
    /// Product name (`product_name` or `name`), `"Product #<id>"` when absent.
    pub name: String,
    /// Quantity (`quantity` or `qty`) as sent, `0` when absent or not a number.
    pub quantity: f64,
    /// Unit price.
    pub price: f64,
    /// Image URL (`image`, `thumbnail`, `photo_url`, `image_url`).
    pub image: Option<String>,
}

impl SnapshotLine {
    /// Decode a loosely shaped order line.
    #[must_use]
    pub fn decode(raw: &Value) -> Self {
        let product_id = scalar_string(first_defined(raw, &[&["product_id"], &["id"]]))
            .unwrap_or_else(|| "—".to_string());
        let name = first_truthy(raw, &[&["product_name"], &["name"]])
            .and_then(|v| scalar_string(Some(v)))
            .unwrap_or_else(|| format!("Product #{product_id}"));
        let quantity = finite_or(first_defined(raw, &[&["quantity"], &["qty"]]), 0.0);
        let image = first_truthy(
            raw,
            &[&["image"], &["thumbnail"], &["photo_url"], &["image_url"]],
        )
        .and_then(|v| scalar_string(Some(v)));

        Self {
            product_id,
            name,
            quantity,
            price: finite_or(raw.get("price"), 0.0),
            image,
        }
    }

    /// Quantity shown on the line; a missing quantity displays as 1.
    #[must_use]
    pub fn display_quantity(&self) -> f64 {
        if self.quantity == 0.0 { 1.0 } else { self.quantity }
    }

    /// Line total as displayed (`display_quantity * price`).
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.display_quantity() * self.price
    }
}

impl From<&OrderLine> for SnapshotLine {
    fn from(line: &OrderLine) -> Self {
        Self {
            product_id: if line.id.is_empty() {
                "—".to_string()
            } else {
                line.id.to_string()
            },
            name: if line.name.is_empty() {
                format!("Product #{}", line.id)
            } else {
                line.name.clone()
            },
            quantity: f64::from(line.qty.get()),
            price: line.price,
            image: Some(line.image.clone()).filter(|s| !s.is_empty()),
        }
    }
}

/// An order as shown by the admin order detail view.
///
/// Built either from a stored history entry or from a `GET /orders/{id}`
/// response decoded from whichever shape it came in.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSnapshot {
    /// Order id (falls back to the requested id).
    pub id: String,
    /// Creation timestamp as sent by the API, possibly empty.
    pub created_at: String,
    /// Currency code (defaults to `"NGN"`).
    pub currency: String,
    /// Customer details, when any candidate location held an object.
    pub customer: Option<Customer>,
    /// Payment details, when any candidate location held an object.
    pub payment: Option<PaymentInfo>,
    /// Order lines.
    pub items: Vec<SnapshotLine>,
}

impl OrderSnapshot {
    /// Candidate roots for the order object, in priority order.
    pub const ROOTS: [Path<'static>; 3] = [&["order"], &["data"], &[]];
    /// Candidate item list locations relative to the order root.
    pub const ITEMS: [Path<'static>; 3] = [&["items"], &["data", "items"], &["order_items"]];
    /// Candidate customer locations relative to the order root.
    pub const CUSTOMER: [Path<'static>; 3] =
        [&["customer"], &["data", "customer"], &["customer_details"]];
    /// Candidate payment locations relative to the order root.
    pub const PAYMENT: [Path<'static>; 3] =
        [&["payment"], &["data", "payment"], &["payment_details"]];

    /// Decode a `GET /orders/{id}` response.
    #[must_use]
    pub fn decode(response: &Value, requested_id: &str) -> Self {
        let root = first_truthy(response, &Self::ROOTS).unwrap_or(response);

        let items = first_array(root, &Self::ITEMS)
            .map(|items| items.iter().map(SnapshotLine::decode).collect())
            .unwrap_or_default();

        let customer = first_truthy(root, &Self::CUSTOMER)
            .filter(|v| v.is_object())
            .map(Customer::from_loose);
        let payment = first_truthy(root, &Self::PAYMENT)
            .filter(|v| v.is_object())
            .map(PaymentInfo::from_loose);

        let id = scalar_string(first_defined(root, &[&["id"]]))
            .unwrap_or_else(|| requested_id.to_string());
        let created_at =
            scalar_string(first_defined(root, &[&["created_at"], &["createdAt"]])).unwrap_or_default();
        let currency = first_truthy(root, &[&["currency"]])
            .and_then(|v| scalar_string(Some(v)))
            .unwrap_or_else(|| HISTORY_FALLBACK_CURRENCY.to_string());

        Self {
            id,
            created_at,
            currency,
            customer,
            payment,
            items,
        }
    }

    /// Sum of `quantity * price`; lines without a quantity count as zero.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.items.iter().map(|l| l.quantity * l.price).sum()
    }
}

impl From<&OrderHistoryEntry> for OrderSnapshot {
    fn from(entry: &OrderHistoryEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            created_at: entry.created_at.clone(),
            currency: if entry.currency.is_empty() {
                HISTORY_FALLBACK_CURRENCY.to_string()
            } else {
                entry.currency.clone()
            },
            customer: entry.customer.clone(),
            payment: entry.payment.clone(),
            items: entry.items.iter().map(SnapshotLine::from).collect(),
        }
    }
}
