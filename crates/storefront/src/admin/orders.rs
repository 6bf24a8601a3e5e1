//! Order viewer.

use std::sync::Arc;

use dsnh_core::OrderSnapshot;
use serde_json::Value;
use tracing::instrument;

use super::AdminError;
use crate::api::ApiClient;
use crate::notice::Notice;
use crate::orders::OrderHistory;
use crate::signal::Signal;
use crate::views::{OrderDetail, OrderDetailView, OrderRow, OrderSource};

/// Order side of the admin console.
#[derive(Clone)]
pub struct OrderAdmin {
    api: ApiClient,
    history: OrderHistory,
    status: Arc<Signal<Notice>>,
}

impl OrderAdmin {
    pub(crate) const fn new(
        api: ApiClient,
        history: OrderHistory,
        status: Arc<Signal<Notice>>,
    ) -> Self {
        Self {
            api,
            history,
            status,
        }
    }

    /// One row per locally recorded order, newest first.
    #[must_use]
    pub fn rows(&self) -> Vec<OrderRow> {
        self.history
            .read_all()
            .orders
            .iter()
            .map(OrderRow::new)
            .collect()
    }

    /// Detail of a locally recorded order.
    #[must_use]
    pub fn stored_detail(&self, id: &str) -> OrderDetailView {
        self.history.find_by_id(id).map_or(OrderDetailView::NotFound, |entry| {
            let snapshot = OrderSnapshot::from(&entry);
            OrderDetailView::Found(Box::new(OrderDetail::new(&snapshot, OrderSource::Stored)))
        })
    }

    /// Fetch an order from the API.
    ///
    /// An empty response still renders, using the requested id.
    ///
    /// # Errors
    ///
    /// Returns error if `id` is blank or the request fails.
    #[instrument(skip(self))]
    pub async fn fetch_live(&self, id: &str) -> Result<OrderDetailView, AdminError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(self.fail(AdminError::MissingOrderId));
        }

        self.status.emit(Notice::info("Fetching order…"));
        let response = self.api.get_order(id).await.map_err(|e| {
            tracing::error!(error = %e, "Order fetch failed");
            self.fail(e.into())
        })?;

        let snapshot = OrderSnapshot::decode(response.as_ref().unwrap_or(&Value::Null), id);
        self.status.emit(Notice::success("Fetched."));
        Ok(OrderDetailView::Found(Box::new(OrderDetail::new(
            &snapshot,
            OrderSource::Live,
        ))))
    }

    fn fail(&self, error: AdminError) -> AdminError {
        self.status.emit(Notice::error(error.to_string()));
        error
    }
}
