//! Local order history.
//!
//! A bounded, newest-first log of placed orders written by checkout and read
//! by the admin order viewer. Independent of the cart document.

use std::sync::Arc;

use chrono::Utc;
use dsnh_core::{OrderHistoryEntry, OrderHistoryLog, OrderPayload};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::instrument;

use crate::signal::{OrdersChanged, Signal};
use crate::storage::{DocumentSlot, KeyValueStorage};

/// Stateful order history service.
#[derive(Clone)]
pub struct OrderHistory {
    inner: Arc<OrderHistoryInner>,
}

struct OrderHistoryInner {
    slot: DocumentSlot<OrderHistoryLog>,
    changed: Signal<OrdersChanged>,
}

impl OrderHistory {
    /// Create a history over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            inner: Arc::new(OrderHistoryInner {
                slot: DocumentSlot::new(storage),
                changed: Signal::new(),
            }),
        }
    }

    /// Record a placed order.
    ///
    /// The order id is taken from the response (`id`, then `order.id`, then
    /// `data.id`), empty when none is found. The entry is prepended and the
    /// log trimmed to its limit before persisting.
    #[instrument(skip_all)]
    pub fn append(&self, payload: &OrderPayload, response: Option<&Value>) -> OrderHistoryEntry {
        let entry = OrderHistoryEntry::record(payload, response, Utc::now());
        let mut log = self.inner.slot.read();
        log.push_newest(entry.clone());

        if let Err(e) = self.inner.slot.write(&log) {
            tracing::error!(error = %e, order_id = %entry.id, "Failed to persist order history");
        }
        tracing::info!(order_id = %entry.id, items = entry.items.len(), "Order recorded");
        self.inner.changed.emit(OrdersChanged);
        entry
    }

    /// The full log, newest first.
    #[must_use]
    pub fn read_all(&self) -> OrderHistoryLog {
        self.inner.slot.read()
    }

    /// Find an entry by id.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<OrderHistoryEntry> {
        self.read_all().find(id).cloned()
    }

    /// Subscribe to history changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OrdersChanged> {
        self.inner.changed.subscribe()
    }
}
