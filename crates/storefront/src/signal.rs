//! Typed change signals.
//!
//! Each entity gets its own signal type so a subscriber can never mistake one
//! entity's change for another's. Cart and order signals carry no data beyond
//! "re-read now"; the products signal carries the refreshed list.

use dsnh_core::Product;
use tokio::sync::broadcast;

const SIGNAL_CAPACITY: usize = 64;

/// Where a change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A mutation made through this handle.
    Local,
    /// A write made through another handle onto the same storage medium.
    External,
}

/// The cart changed; re-read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartChanged {
    pub origin: ChangeOrigin,
}

/// The order history changed; re-read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrdersChanged;

/// The product list was refreshed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductsChanged {
    pub products: Vec<Product>,
}

/// A broadcast signal with any number of subscribers.
///
/// Emitting with no subscribers is not an error.
#[derive(Debug)]
pub struct Signal<E> {
    tx: broadcast::Sender<E>,
}

impl<E: Clone> Signal<E> {
    /// Create a signal.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self { tx }
    }

    /// Notify every current subscriber.
    pub fn emit(&self, event: E) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to future emissions.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.tx.subscribe()
    }
}

impl<E: Clone> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}
