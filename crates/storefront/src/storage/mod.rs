//! Durable key-value storage for the cart and order history documents.
//!
//! # Architecture
//!
//! - [`KeyValueStorage`] - string-keyed medium (`get` / `set`), optionally able
//!   to report writes made through *other* handles to the same medium
//! - [`MemoryMedium`] / [`MemoryStorage`] - in-process medium; each handle
//!   behaves like one browser tab
//! - [`FileStorage`] - one JSON file per key, written atomically
//! - [`DocumentSlot`] - typed, never-failing read / full-overwrite write of
//!   one versioned document
//!
//! The cross-tab capability is optional: a medium that can't observe foreign
//! writes returns `None` from [`KeyValueStorage::subscribe_external_change`]
//! and the stores simply never re-broadcast.

mod document;
mod file;
mod memory;

pub use document::{DocumentSlot, StoredDocument};
pub use file::FileStorage;
pub use memory::{MemoryMedium, MemoryStorage};

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Storage key of the cart document.
pub const CART_KEY: &str = "tomi_cart_v1";

/// Storage key of the order history document.
pub const ORDER_HISTORY_KEY: &str = "tomi_orders_v1";

/// Errors raised by a storage medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key can't be mapped onto the medium.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Identifies one handle ("tab") onto a shared medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(pub u64);

/// A write observed on the shared medium.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Key that was written.
    pub key: String,
    /// Handle that performed the write.
    pub origin: TabId,
}

/// A string-keyed durable medium.
///
/// Implementations use interior locking so one handle can be shared behind an
/// `Arc` by several stores.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium can't be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium can't be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Subscribe to writes made through other handles onto the same medium.
    ///
    /// Returns `None` when the medium has no way of observing them.
    fn subscribe_external_change(&self) -> Option<ExternalChanges> {
        None
    }
}

/// Stream of [`StorageEvent`]s caused by other handles.
///
/// Events originating from the subscribing handle are skipped, mirroring how
/// a browser only fires `storage` events in the tabs that did *not* write.
#[derive(Debug)]
pub struct ExternalChanges {
    rx: broadcast::Receiver<StorageEvent>,
    own: TabId,
}

impl ExternalChanges {
    pub(crate) const fn new(rx: broadcast::Receiver<StorageEvent>, own: TabId) -> Self {
        Self { rx, own }
    }

    /// Take the next pending foreign event without waiting.
    ///
    /// Returns `None` once no event is pending (or the medium is gone).
    pub fn try_next(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.origin == self.own => {}
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Storage event receiver lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next foreign event.
    ///
    /// Returns `None` once the medium is dropped.
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.origin == self.own => {}
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Storage event receiver lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
