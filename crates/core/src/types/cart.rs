//! Cart domain model.
//!
//! The cart is a small versioned document: a currency and an ordered list of
//! line items keyed by product id. Everything here is pure; the stateful store
//! that persists and broadcasts changes lives in the storefront crate.
//!
//! ## Invariants
//!
//! - No two items share an id (duplicate additions merge quantities)
//! - Every quantity is an integer `>= 1` (enforced by [`Quantity`])
//! - Prices are finite and non-negative
//! - Item order is insertion order

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce::{finite_or, is_truthy, scalar_string, string_or_empty};
use crate::types::customer::{Customer, PaymentInfo};
use crate::types::id::ProductId;
use crate::types::price::{DEFAULT_CURRENCY, round_money};
use crate::types::quantity::Quantity;

/// Version tag written into every persisted cart document.
pub const CART_VERSION: u32 = 1;

/// One product entry in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product id (non-empty).
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price in display units.
    pub price: f64,
    /// Image URL or path, possibly empty.
    pub image: String,
    /// Quantity (`>= 1`).
    pub qty: Quantity,
}

impl CartItem {
    /// `price * qty`, unrounded.
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.qty.get())
    }
}

/// Build a [`CartItem`] from untrusted input.
///
/// Returns `None` when the id is missing, `null`, not a scalar, or renders as
/// the empty string. All other fields are coerced: `name` and `image` to
/// strings, `price` to a finite non-negative number (else `0`), `qty` through
/// [`Quantity::coerce`] (missing means `1`).
#[must_use]
pub fn normalize_item(raw: &Value) -> Option<CartItem> {
    let id = scalar_string(raw.get("id")).filter(|id| !id.is_empty())?;
    let price = finite_or(raw.get("price"), 0.0).max(0.0);
    let qty = raw
        .get("qty")
        .filter(|v| !v.is_null())
        .map_or(Quantity::ONE, Quantity::coerce);

    Some(CartItem {
        id: ProductId::new(id),
        name: string_or_empty(raw.get("name")),
        price,
        image: string_or_empty(raw.get("image")),
        qty,
    })
}

/// The shopper's cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// Document version ([`CART_VERSION`]).
    pub version: u32,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Line items in insertion order.
    pub items: Vec<CartItem>,
}

impl Default for Cart {
    fn default() -> Self {
        Self {
            version: CART_VERSION,
            currency: DEFAULT_CURRENCY.to_string(),
            items: Vec::new(),
        }
    }
}

impl Cart {
    /// Decode a persisted cart document leniently.
    ///
    /// Returns `None` when the root is not a JSON object. A missing or
    /// non-array `items` field yields no items; individual items that fail
    /// [`normalize_item`] are dropped; duplicate ids are merged so the
    /// uniqueness invariant holds even for hand-edited documents.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let currency = object
            .get("currency")
            .filter(|v| is_truthy(v))
            .and_then(|v| scalar_string(Some(v)))
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let mut cart = Self {
            version: CART_VERSION,
            currency,
            items: Vec::new(),
        };

        if let Some(items) = object.get("items").and_then(Value::as_array) {
            for item in items.iter().filter_map(normalize_item) {
                cart.merge(item);
            }
        }

        Some(cart)
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find an item by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|it| it.id == *id)
    }

    /// Insert `item`, or add its quantity to the existing row with the same id.
    pub fn merge(&mut self, item: CartItem) {
        match self.items.iter_mut().find(|it| it.id == item.id) {
            Some(existing) => existing.qty = existing.qty.saturating_add(item.qty),
            None => self.items.push(item),
        }
    }

    /// Remove every item with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|it| it.id != *id);
        self.items.len() != before
    }

    /// Overwrite the quantity of the item with `id`, if present.
    pub fn set_qty(&mut self, id: &str, qty: Quantity) -> bool {
        self.items
            .iter_mut()
            .find(|it| it.id == *id)
            .map(|it| it.qty = qty)
            .is_some()
    }
}

/// Total number of units in the cart.
#[must_use]
pub fn count_items(cart: &Cart) -> u64 {
    cart.items.iter().map(|it| u64::from(it.qty.get())).sum()
}

/// Sum of `price * qty` over all items, without intermediate rounding.
#[must_use]
pub fn calc_subtotal(cart: &Cart) -> f64 {
    cart.items.iter().map(CartItem::line_total).sum()
}

/// A line of an order payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Product id.
    #[serde(default)]
    pub id: ProductId,
    /// Product name.
    #[serde(default)]
    pub name: String,
    /// Unit price.
    #[serde(default)]
    pub price: f64,
    /// Quantity.
    #[serde(default)]
    pub qty: Quantity,
    /// Image URL or path.
    #[serde(default)]
    pub image: String,
    /// `price * qty` rounded to cents.
    #[serde(default)]
    pub line_total: f64,
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            qty: item.qty,
            image: item.image.clone(),
            line_total: round_money(item.line_total()),
        }
    }
}

/// Order totals, rounded to cents.
///
/// Tax and shipping are not modeled, so `total` always equals `subtotal`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of line totals.
    pub subtotal: f64,
    /// Amount due.
    pub total: f64,
}

/// Checkout-ready projection of a cart, shaped for the order API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    /// ISO 4217 currency code.
    pub currency: String,
    /// Order lines.
    pub items: Vec<OrderLine>,
    /// Rounded totals.
    pub totals: OrderTotals,
    /// Customer contact details.
    pub customer: Customer,
    /// Payment tag, when the checkout attaches one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentInfo>,
    /// Creation timestamp (ISO-8601, millisecond precision).
    pub created_at: String,
    /// Address of the page (or tool) that produced the order.
    pub source: String,
}

impl OrderPayload {
    /// Attach a payment tag.
    #[must_use]
    pub fn with_payment(mut self, payment: PaymentInfo) -> Self {
        self.payment = Some(payment);
        self
    }
}

/// Project a cart into an order payload.
#[must_use]
pub fn to_order_payload(
    cart: &Cart,
    customer: Customer,
    source: &str,
    now: DateTime<Utc>,
) -> OrderPayload {
    let subtotal = round_money(calc_subtotal(cart));
    OrderPayload {
        currency: cart.currency.clone(),
        items: cart.items.iter().map(OrderLine::from).collect(),
        totals: OrderTotals {
            subtotal,
            total: subtotal,
        },
        customer,
        payment: None,
        created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        source: source.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn item(id: &str, price: f64, qty: u32) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price,
            image: String::new(),
            qty: Quantity::new(qty),
        }
    }

    #[test]
    fn test_normalize_rejects_missing_id() {
        assert!(normalize_item(&json!({"name": "x", "price": 1})).is_none());
        assert!(normalize_item(&json!({"id": "", "price": 1})).is_none());
        assert!(normalize_item(&json!({"id": null})).is_none());
        assert!(normalize_item(&json!("p1")).is_none());
    }

    #[test]
    fn test_normalize_coerces_fields() {
        let it = normalize_item(&json!({"id": 7, "price": "12.5", "qty": "2.7"})).unwrap();
        assert_eq!(it.id.as_str(), "7");
        assert_eq!(it.name, "");
        assert!((it.price - 12.5).abs() < f64::EPSILON);
        assert_eq!(it.qty.get(), 2);

        let it = normalize_item(&json!({"id": "p", "price": "free", "qty": 0})).unwrap();
        assert!((it.price - 0.0).abs() < f64::EPSILON);
        assert_eq!(it.qty.get(), 1);

        let it = normalize_item(&json!({"id": "p", "price": -5})).unwrap();
        assert!((it.price - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_merge_sums_quantities() {
        let mut cart = Cart::default();
        cart.merge(item("p1", 10.0, 1));
        cart.merge(item("p1", 10.0, 3));
        cart.merge(item("p2", 5.0, 2));
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.find("p1").unwrap().qty.get(), 4);
        assert_eq!(count_items(&cart), 6);
        assert!((calc_subtotal(&cart) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_subtotal_has_no_intermediate_rounding() {
        let mut cart = Cart::default();
        cart.merge(item("a", 0.105, 3));
        cart.merge(item("b", 0.333, 3));
        let expected = 0.105 * 3.0 + 0.333 * 3.0;
        assert!((calc_subtotal(&cart) - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remove_and_set_qty() {
        let mut cart = Cart::default();
        cart.merge(item("p1", 1.0, 1));
        assert!(cart.set_qty("p1", Quantity::new(5)));
        assert!(!cart.set_qty("missing", Quantity::new(5)));
        assert_eq!(count_items(&cart), 5);
        assert!(cart.remove("p1"));
        assert!(!cart.remove("p1"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_from_json_tolerates_bad_shapes() {
        assert!(Cart::from_json(&json!([1, 2])).is_none());
        assert!(Cart::from_json(&json!("cart")).is_none());

        let cart = Cart::from_json(&json!({"items": "nope"})).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.currency, "USD");

        let cart = Cart::from_json(&json!({
            "currency": "",
            "items": [{"id": "a", "qty": 1}, {"name": "no id"}, {"id": "a", "qty": 2}]
        }))
        .unwrap();
        assert_eq!(cart.currency, "USD");
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].qty.get(), 3);
    }

    #[test]
    fn test_serialized_shape() {
        let mut cart = Cart::default();
        cart.merge(item("p1", 9.8, 2));
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            json,
            json!({
                "version": 1,
                "currency": "USD",
                "items": [{"id": "p1", "name": "Product p1", "price": 9.8, "image": "", "qty": 2}]
            })
        );
        assert_eq!(Cart::from_json(&json).unwrap(), cart);
    }

    #[test]
    fn test_order_payload() {
        let mut cart = Cart::default();
        cart.merge(item("p1", 0.125, 1));
        cart.merge(item("p2", 10.0, 2));
        let now = Utc.with_ymd_and_hms(2026, 2, 23, 10, 0, 0).unwrap();
        let payload = to_order_payload(&cart, Customer::default(), "https://shop/checkout", now);

        assert_eq!(payload.currency, "USD");
        assert!((payload.items[0].line_total - 0.13).abs() < f64::EPSILON);
        assert!((payload.items[1].line_total - 20.0).abs() < f64::EPSILON);
        assert!((payload.totals.subtotal - 20.13).abs() < f64::EPSILON);
        assert!((payload.totals.total - payload.totals.subtotal).abs() < f64::EPSILON);
        assert_eq!(payload.created_at, "2026-02-23T10:00:00.000Z");
        assert_eq!(payload.source, "https://shop/checkout");

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["items"][0].get("lineTotal").is_some());
        assert!(json.get("payment").is_none());
    }
}
