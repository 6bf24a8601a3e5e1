//! Core types for the DS Nutritional Health storefront.
//!
//! Carts, orders and products all arrive from storage or the network as
//! loosely shaped JSON; these modules give them typed, always-valid shapes.

pub mod cart;
pub mod customer;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod quantity;

pub use cart::{
    CART_VERSION, Cart, CartItem, OrderLine, OrderPayload, OrderTotals, calc_subtotal,
    count_items, normalize_item, to_order_payload,
};
pub use customer::{Customer, PaymentInfo};
pub use id::*;
pub use order::{
    IdLocation, ORDER_HISTORY_LIMIT, ORDER_HISTORY_VERSION, OrderAck, OrderHistoryEntry,
    OrderHistoryLog, OrderSnapshot, SnapshotLine,
};
pub use price::{
    DEFAULT_CURRENCY, HISTORY_FALLBACK_CURRENCY, PriceUnitPolicy, currency_symbol,
    format_money_compact, format_price, round_money, to_fixed,
};
pub use product::{
    PLACEHOLDER_IMAGE, Product, ProductApiInfo, ProductDetails, normalize_product, normalize_products,
    sample_products_response, unwrap_list,
};
pub use quantity::Quantity;
