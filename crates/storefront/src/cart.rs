//! The cart store: single owner of the persisted cart.
//!
//! Every operation re-reads the persisted document first, so a handle always
//! works on the latest state written by any tab sharing the medium. Mutations
//! persist the whole cart, then emit one [`CartChanged`]; subscribers re-read
//! through the accessors rather than receiving diffs.
//!
//! # Cross-tab behavior
//!
//! When the medium can report foreign writes, [`CartStore::sync_external_changes`]
//! (or the task started by [`CartStore::watch_external_changes`]) re-broadcasts
//! them as [`CartChanged`] with [`ChangeOrigin::External`]. Conflicts are
//! last-write-wins: a tab that mutates before noticing another tab's write
//! re-reads first, but two tabs writing at the same moment simply overwrite
//! each other.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use dsnh_core::{
    Cart, Customer, OrderPayload, Product, Quantity, calc_subtotal, count_items, normalize_item,
    to_order_payload,
};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::notice::Notice;
use crate::signal::{CartChanged, ChangeOrigin, Signal};
use crate::storage::{CART_KEY, DocumentSlot, ExternalChanges, KeyValueStorage};

/// Stateful cart service.
///
/// Cheaply cloneable; clones share signals and storage.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    slot: DocumentSlot<Cart>,
    changed: Signal<CartChanged>,
    notices: Signal<Notice>,
    external: Mutex<Option<ExternalChanges>>,
    source: String,
}

impl CartStore {
    /// Create a store over `storage`.
    ///
    /// `source` is recorded on order payloads as the address of the page (or
    /// tool) that produced them.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>, source: impl Into<String>) -> Self {
        let external = storage.subscribe_external_change();
        Self {
            inner: Arc::new(CartStoreInner {
                slot: DocumentSlot::new(storage),
                changed: Signal::new(),
                notices: Signal::new(),
                external: Mutex::new(external),
                source: source.into(),
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The current cart, freshly read from storage.
    #[must_use]
    pub fn get_cart(&self) -> Cart {
        self.inner.slot.read()
    }

    /// Total number of units in the cart.
    #[must_use]
    pub fn get_count(&self) -> u64 {
        count_items(&self.get_cart())
    }

    /// Unrounded sum of `price * qty`.
    #[must_use]
    pub fn get_subtotal(&self) -> f64 {
        calc_subtotal(&self.get_cart())
    }

    /// Checkout-ready projection of the current cart.
    #[must_use]
    pub fn to_order_payload(&self, customer: Customer) -> OrderPayload {
        self.order_payload_for(&self.get_cart(), customer)
    }

    /// Checkout-ready projection of a cart already read from this store.
    #[must_use]
    pub fn order_payload_for(&self, cart: &Cart, customer: Customer) -> OrderPayload {
        to_order_payload(cart, customer, &self.inner.source, Utc::now())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `qty` units of an untrusted item.
    ///
    /// An existing row with the same id has its quantity increased; otherwise
    /// the item is appended. Emits a success notice naming the item. An item
    /// without a usable id is ignored and the unchanged cart is returned
    /// without persisting or notifying.
    #[instrument(skip(self, raw))]
    pub fn add_item(&self, raw: &Value, qty: Quantity) -> Cart {
        let mut cart = self.get_cart();
        let Some(mut item) = normalize_item(raw) else {
            tracing::debug!("Ignoring cart item without an id");
            return cart;
        };
        item.qty = qty;

        let label = if item.name.is_empty() {
            "Item".to_string()
        } else {
            item.name.clone()
        };

        tracing::debug!(product_id = %item.id, "Adding item to cart");
        cart.merge(item);
        self.commit(&cart);
        self.inner
            .notices
            .emit(Notice::success(format!("{label} added to cart")));
        cart
    }

    /// Add `qty` units of a catalog product.
    pub fn add_product(&self, product: &Product, qty: Quantity) -> Cart {
        let raw = serde_json::json!({
            "id": product.id.as_str(),
            "name": product.name,
            "price": product.price,
            "image": product.primary_image(),
        });
        self.add_item(&raw, qty)
    }

    /// Remove every row with `id`. Persists and notifies even when nothing
    /// matched.
    #[instrument(skip(self))]
    pub fn remove_item(&self, id: &str) -> Cart {
        let mut cart = self.get_cart();
        if !cart.remove(id) {
            tracing::debug!("No cart row to remove");
        }
        self.commit(&cart);
        cart
    }

    /// Overwrite the quantity of the row with `id`.
    ///
    /// Never creates a row; an unknown id still persists and notifies.
    #[instrument(skip(self))]
    pub fn set_qty(&self, id: &str, qty: Quantity) -> Cart {
        let mut cart = self.get_cart();
        if !cart.set_qty(id, qty) {
            tracing::debug!("No cart row to update");
        }
        self.commit(&cart);
        cart
    }

    /// Reset to an empty cart with the default currency.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Cart {
        let cart = Cart::default();
        self.commit(&cart);
        cart
    }

    fn commit(&self, cart: &Cart) {
        if let Err(e) = self.inner.slot.write(cart) {
            tracing::error!(error = %e, "Failed to persist cart");
        }
        self.inner.changed.emit(CartChanged {
            origin: ChangeOrigin::Local,
        });
    }

    // =========================================================================
    // Signals
    // =========================================================================

    /// Subscribe to cart changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
        self.inner.changed.subscribe()
    }

    /// Subscribe to acknowledgment notices ("... added to cart").
    #[must_use]
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    /// Re-broadcast cart writes made by other tabs since the last call.
    ///
    /// Returns the number of foreign cart writes seen. Always `0` when the
    /// medium can't observe foreign writes or a watcher task owns the feed.
    pub fn sync_external_changes(&self) -> usize {
        let mut guard = self
            .inner
            .external
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(external) = guard.as_mut() else {
            return 0;
        };

        let mut seen = 0;
        while let Some(event) = external.try_next() {
            if event.key == CART_KEY {
                seen += 1;
                self.inner.changed.emit(CartChanged {
                    origin: ChangeOrigin::External,
                });
            }
        }
        seen
    }

    /// Continuously re-broadcast cart writes made by other tabs.
    ///
    /// Spawns a task on the current tokio runtime and hands it the external
    /// change feed. Returns `None` when there is no feed to watch (no
    /// capability, or already being watched).
    #[must_use]
    pub fn watch_external_changes(&self) -> Option<JoinHandle<()>> {
        let mut external = self
            .inner
            .external
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        let store = self.clone();

        Some(tokio::spawn(async move {
            while let Some(event) = external.recv().await {
                if event.key == CART_KEY {
                    tracing::debug!(origin = ?event.origin, "Cart written by another tab");
                    store.inner.changed.emit(CartChanged {
                        origin: ChangeOrigin::External,
                    });
                }
            }
        }))
    }
}
