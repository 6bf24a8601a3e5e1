//! Render-ready projections.
//!
//! Views hold no state. Callers rebuild them from the stores after every
//! change signal and print or template them however they like.

use std::fmt;

use chrono::DateTime;
use dsnh_core::{
    Cart, OrderHistoryEntry, OrderSnapshot, Product, calc_subtotal, count_items,
    format_money_compact, format_price,
};

/// Shown wherever a value is missing.
pub const MISSING: &str = "—";

fn or_missing(value: &str) -> String {
    if value.trim().is_empty() {
        MISSING.to_string()
    } else {
        value.to_string()
    }
}

/// Local date and time of an RFC 3339 timestamp, `"—"` if unparseable.
#[must_use]
pub fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw.trim()).map_or_else(
        |_| MISSING.to_string(),
        |dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

// =============================================================================
// Storefront
// =============================================================================

/// One cart line, with prices already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRow {
    /// Product id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Image URL.
    pub image: String,
    /// Formatted unit price.
    pub unit_price: String,
    /// Units in the cart.
    pub qty: u32,
    /// Formatted `unit_price * qty`.
    pub line_total: String,
}

/// The cart drawer / cart page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub rows: Vec<CartRow>,
    pub subtotal: String,
    pub count: u64,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart) -> Self {
        let rows = cart
            .items
            .iter()
            .map(|item| CartRow {
                id: item.id.to_string(),
                name: if item.name.is_empty() {
                    "Product".to_string()
                } else {
                    item.name.clone()
                },
                image: item.image.clone(),
                unit_price: format_price(item.price),
                qty: item.qty.get(),
                line_total: format_price(item.line_total()),
            })
            .collect();

        Self {
            rows,
            subtotal: format_price(calc_subtotal(cart)),
            count: count_items(cart),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for CartView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Your cart is empty");
        }
        for row in &self.rows {
            writeln!(
                f,
                "{} × {} @ {} = {}",
                row.name, row.qty, row.unit_price, row.line_total
            )?;
        }
        write!(f, "Subtotal: {} ({} items)", self.subtotal, self.count)
    }
}

/// Item count shown on the header cart icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderBadge {
    pub count: u64,
}

impl HeaderBadge {
    #[must_use]
    pub fn new(cart: &Cart) -> Self {
        Self {
            count: count_items(cart),
        }
    }
}

impl fmt::Display for HeaderBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count)
    }
}

// =============================================================================
// Admin
// =============================================================================

/// A row of the admin product table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    /// Short description, else the full description.
    pub summary: String,
    pub image: String,
    /// Raw API price, thousands-grouped, no currency.
    pub price: String,
    pub available: bool,
}

impl ProductRow {
    #[must_use]
    pub fn new(product: &Product) -> Self {
        let summary = if product.short_description.is_empty() {
            product.description.clone()
        } else {
            product.short_description.clone()
        };
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            summary,
            image: product.primary_image().to_string(),
            price: format_money_compact(product.api.price_raw, ""),
            available: product.is_available(),
        }
    }

    #[must_use]
    pub const fn availability_label(&self) -> &'static str {
        if self.available { "Available" } else { "Hidden" }
    }
}

/// A row of the admin order table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub id: String,
    pub customer_name: String,
    /// Empty when unknown.
    pub customer_email: String,
    pub item_count: usize,
    pub created: String,
}

impl OrderRow {
    #[must_use]
    pub fn new(entry: &OrderHistoryEntry) -> Self {
        let customer = entry.customer.as_ref();
        Self {
            id: or_missing(entry.id.as_str()),
            customer_name: or_missing(customer.map_or("", |c| c.name.as_str())),
            customer_email: customer.map(|c| c.email.clone()).unwrap_or_default(),
            item_count: entry.items.len(),
            created: format_timestamp(&entry.created_at),
        }
    }
}

/// Where an order detail came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSource {
    /// The local order history.
    Stored,
    /// A `GET /orders/{id}` response.
    Live,
}

impl OrderSource {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stored => "Stored (checkout)",
            Self::Live => "Live (API)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetailLine {
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub quantity: String,
    pub unit_price: String,
    pub line_total: String,
}

/// The admin order detail panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetail {
    pub source: OrderSource,
    pub id: String,
    pub created: String,
    pub currency: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub payment_reference: String,
    pub payment_provider: String,
    pub payment_status: String,
    pub lines: Vec<OrderDetailLine>,
    pub total: String,
}

impl OrderDetail {
    #[must_use]
    pub fn new(order: &OrderSnapshot, source: OrderSource) -> Self {
        let currency = order.currency.as_str();
        let customer = order.customer.clone().unwrap_or_default();
        let payment = order.payment.clone().unwrap_or_default();

        let lines = order
            .items
            .iter()
            .map(|line| OrderDetailLine {
                product_id: line.product_id.clone(),
                name: line.name.clone(),
                image: line
                    .image
                    .clone()
                    .unwrap_or_else(|| dsnh_core::PLACEHOLDER_IMAGE.to_string()),
                quantity: line.display_quantity().to_string(),
                unit_price: format_money_compact(line.price, currency),
                line_total: format_money_compact(line.line_total(), currency),
            })
            .collect();

        Self {
            source,
            id: or_missing(&order.id),
            created: format_timestamp(&order.created_at),
            currency: order.currency.clone(),
            customer_name: or_missing(&customer.name),
            customer_email: or_missing(&customer.email),
            customer_phone: or_missing(&customer.phone),
            customer_address: or_missing(&customer.address),
            payment_reference: or_missing(&payment.reference),
            payment_provider: or_missing(&payment.provider),
            payment_status: or_missing(&payment.status),
            lines,
            total: format_money_compact(order.total(), currency),
        }
    }
}

/// Outcome of an order detail lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderDetailView {
    Found(Box<OrderDetail>),
    NotFound,
}

impl fmt::Display for OrderDetailView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self::Found(d) = self else {
            return write!(f, "Order not found.");
        };
        writeln!(f, "Order {} [{}]", d.id, d.source.label())?;
        writeln!(f, "Created:  {}", d.created)?;
        writeln!(f, "Customer: {} <{}> {}", d.customer_name, d.customer_email, d.customer_phone)?;
        writeln!(f, "Address:  {}", d.customer_address)?;
        writeln!(
            f,
            "Payment:  {} via {} ({})",
            d.payment_reference, d.payment_provider, d.payment_status
        )?;
        for line in &d.lines {
            writeln!(
                f,
                "  #{} {} × {} @ {} = {}",
                line.product_id, line.name, line.quantity, line.unit_price, line.line_total
            )?;
        }
        write!(f, "Total:    {}", d.total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dsnh_core::{Cart, PriceUnitPolicy, normalize_product};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_cart_view() {
        let cart = Cart::from_json(&json!({
            "items": [
                {"id": "1", "name": "Zinc", "price": 4.5, "qty": 2},
                {"id": "2", "price": "10", "qty": 1}
            ]
        }))
        .unwrap();

        let view = CartView::new(&cart);
        assert_eq!(view.count, 3);
        assert_eq!(view.subtotal, "$19.00");
        assert_eq!(view.rows[0].line_total, "$9.00");
        assert_eq!(view.rows[1].name, "Product");
        assert_eq!(HeaderBadge::new(&cart).to_string(), "3");

        let empty = CartView::new(&Cart::default());
        assert!(empty.is_empty());
        assert_eq!(empty.subtotal, "$0.00");
        assert_eq!(empty.to_string(), "Your cart is empty");
    }

    #[test]
    fn test_product_row() {
        let product = normalize_product(
            &json!({"id": 7, "name": "Magnesium", "price": 12500, "availability": 0}),
            PriceUnitPolicy::default(),
        );
        let row = ProductRow::new(&product);
        assert_eq!(row.price, "12,500");
        assert!(!row.available);
        assert_eq!(row.availability_label(), "Hidden");
    }

    #[test]
    fn test_order_row_placeholders() {
        let entry: OrderHistoryEntry = serde_json::from_value(json!({
            "id": "",
            "createdAt": "not a date",
            "items": []
        }))
        .unwrap();
        let row = OrderRow::new(&entry);
        assert_eq!(row.id, MISSING);
        assert_eq!(row.customer_name, MISSING);
        assert_eq!(row.customer_email, "");
        assert_eq!(row.created, MISSING);
    }

    #[test]
    fn test_live_order_detail() {
        let snapshot = OrderSnapshot::decode(
            &json!({
                "data": {
                    "currency": "NGN",
                    "customer": {"name": "Ada", "email": "ada@example.com"},
                    "items": [
                        {"product_id": 1, "name": "Vitamin D3", "quantity": 2, "price": 9800},
                        {"id": 2, "price": 14500}
                    ]
                }
            }),
            "ORD-9",
        );
        let detail = OrderDetail::new(&snapshot, OrderSource::Live);
        assert_eq!(detail.id, "ORD-9");
        assert_eq!(detail.customer_phone, MISSING);
        assert_eq!(detail.payment_status, MISSING);
        assert_eq!(detail.lines[0].line_total, "₦19,600");
        assert_eq!(detail.lines[1].name, "Product #2");
        assert_eq!(detail.lines[1].quantity, "1");
        // A line without a quantity displays as 1 but adds nothing to the total.
        assert_eq!(detail.total, "₦19,600");

        let view = OrderDetailView::Found(Box::new(detail));
        assert!(view.to_string().starts_with("Order ORD-9 [Live (API)]"));
        assert_eq!(OrderDetailView::NotFound.to_string(), "Order not found.");
    }
}
