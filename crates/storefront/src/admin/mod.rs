//! Back-office console: product management and order lookup.
//!
//! Both halves report progress on one shared status signal, mirroring the
//! single status line an operator watches.

mod orders;
mod products;

pub use orders::OrderAdmin;
pub use products::{ProductAdmin, ProductForm};

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::api::{ApiClient, ApiError};
use crate::catalog::Catalog;
use crate::notice::Notice;
use crate::orders::OrderHistory;
use crate::signal::Signal;

/// Errors surfaced by admin actions.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Enter an order ID.")]
    MissingOrderId,

    #[error("Delete endpoint not in collection (UI-only).")]
    DeleteUnsupported,

    /// A required form field is empty.
    #[error("Product {0} is required")]
    Invalid(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The admin console.
#[derive(Clone)]
pub struct AdminConsole {
    pub products: ProductAdmin,
    pub orders: OrderAdmin,
    status: Arc<Signal<Notice>>,
}

impl AdminConsole {
    #[must_use]
    pub fn new(api: ApiClient, catalog: Catalog, history: OrderHistory, rows: u32) -> Self {
        let status = Arc::new(Signal::new());
        Self {
            products: ProductAdmin::new(api.clone(), catalog, rows, Arc::clone(&status)),
            orders: OrderAdmin::new(api, history, Arc::clone(&status)),
            status,
        }
    }

    /// Subscribe to status-line updates from either half.
    #[must_use]
    pub fn subscribe_status(&self) -> broadcast::Receiver<Notice> {
        self.status.subscribe()
    }
}
