//! Typed documents stored under a fixed key.

use std::marker::PhantomData;
use std::sync::Arc;

use dsnh_core::{Cart, OrderHistoryLog};
use serde::Serialize;
use serde_json::Value;

use super::{CART_KEY, KeyValueStorage, ORDER_HISTORY_KEY, StorageError};

/// A versioned JSON document with a fixed storage key.
pub trait StoredDocument: Serialize + Default {
    /// Storage key.
    const KEY: &'static str;

    /// Decode a parsed document leniently, `None` when the shape is unusable.
    fn decode(value: &Value) -> Option<Self>;
}

impl StoredDocument for Cart {
    const KEY: &'static str = CART_KEY;

    fn decode(value: &Value) -> Option<Self> {
        Self::from_json(value)
    }
}

impl StoredDocument for OrderHistoryLog {
    const KEY: &'static str = ORDER_HISTORY_KEY;

    fn decode(value: &Value) -> Option<Self> {
        Self::from_json(value)
    }
}

/// Read/write access to one [`StoredDocument`] on a storage medium.
pub struct DocumentSlot<D> {
    storage: Arc<dyn KeyValueStorage>,
    _document: PhantomData<fn() -> D>,
}

impl<D> Clone for DocumentSlot<D> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            _document: PhantomData,
        }
    }
}

impl<D: StoredDocument> DocumentSlot<D> {
    /// Bind the document type to a storage medium.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            _document: PhantomData,
        }
    }

    /// Storage key of the document.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        D::KEY
    }

    /// Read the document.
    ///
    /// Never fails: a missing value, unparseable JSON or an unusable shape
    /// yields the default document, as does a storage read error (logged).
    pub fn read(&self) -> D {
        let raw = match self.storage.get(D::KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return D::default(),
            Err(e) => {
                tracing::warn!(key = D::KEY, error = %e, "Storage read failed, using default");
                return D::default();
            }
        };

        let decoded = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|value| D::decode(&value));

        decoded.unwrap_or_else(|| {
            tracing::debug!(key = D::KEY, "Stored document unusable, using default");
            D::default()
        })
    }

    /// Serialize and overwrite the whole document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the storage write fails.
    pub fn write(&self, document: &D) -> Result<(), StorageError> {
        let json = serde_json::to_string(document)?;
        self.storage.set(D::KEY, &json)
    }
}
