//! In-process storage medium shared by several handles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;

use super::{ExternalChanges, KeyValueStorage, StorageError, StorageEvent, TabId};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A shared in-memory key-value medium.
///
/// Plays the role of a browser's origin-scoped storage: every handle opened
/// with [`MemoryMedium::open_tab`] sees the same values, and a write through
/// one handle is reported to the others.
#[derive(Clone)]
pub struct MemoryMedium {
    inner: Arc<MemoryMediumInner>,
}

struct MemoryMediumInner {
    values: RwLock<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
    next_tab: AtomicU64,
}

impl MemoryMedium {
    /// Create an empty medium.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(MemoryMediumInner {
                values: RwLock::new(HashMap::new()),
                events,
                next_tab: AtomicU64::new(1),
            }),
        }
    }

    /// Open a new handle onto this medium.
    #[must_use]
    pub fn open_tab(&self) -> MemoryStorage {
        let tab = TabId(self.inner.next_tab.fetch_add(1, Ordering::Relaxed));
        MemoryStorage {
            medium: self.clone(),
            tab,
        }
    }

    /// Write a raw value without notifying any handle.
    ///
    /// Useful for seeding a medium with legacy or corrupted documents.
    pub fn seed(&self, key: &str, value: &str) {
        self.inner
            .values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }
}

impl Default for MemoryMedium {
    fn default() -> Self {
        Self::new()
    }
}

/// One handle ("tab") onto a [`MemoryMedium`].
#[derive(Clone)]
pub struct MemoryStorage {
    medium: MemoryMedium,
    tab: TabId,
}

impl MemoryStorage {
    /// Open a handle onto a fresh private medium.
    #[must_use]
    pub fn new() -> Self {
        MemoryMedium::new().open_tab()
    }

    /// This handle's id.
    #[must_use]
    pub const fn tab(&self) -> TabId {
        self.tab
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self
            .medium
            .inner
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let previous = self
            .medium
            .inner
            .values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());

        // Unchanged values don't fire storage events.
        if previous.as_deref() != Some(value) {
            let _ = self.medium.inner.events.send(StorageEvent {
                key: key.to_string(),
                origin: self.tab,
            });
        }
        Ok(())
    }

    fn subscribe_external_change(&self) -> Option<ExternalChanges> {
        Some(ExternalChanges::new(
            self.medium.inner.events.subscribe(),
            self.tab,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tabs_share_values() {
        let medium = MemoryMedium::new();
        let a = medium.open_tab();
        let b = medium.open_tab();
        assert_ne!(a.tab(), b.tab());

        a.set("k", "v1").unwrap();
        assert_eq!(b.get("k").unwrap().as_deref(), Some("v1"));
        assert!(b.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_events_reach_other_tabs_only() {
        let medium = MemoryMedium::new();
        let a = medium.open_tab();
        let b = medium.open_tab();
        let mut a_events = a.subscribe_external_change().unwrap();
        let mut b_events = b.subscribe_external_change().unwrap();

        a.set("k", "v1").unwrap();

        assert!(a_events.try_next().is_none());
        let event = b_events.try_next().unwrap();
        assert_eq!(event.key, "k");
        assert_eq!(event.origin, a.tab());
        assert!(b_events.try_next().is_none());
    }

    #[test]
    fn test_unchanged_value_fires_nothing() {
        let medium = MemoryMedium::new();
        let a = medium.open_tab();
        let b = medium.open_tab();
        a.set("k", "same").unwrap();
        let mut b_events = b.subscribe_external_change().unwrap();

        a.set("k", "same").unwrap();
        assert!(b_events.try_next().is_none());
    }

    #[test]
    fn test_seed_is_silent() {
        let medium = MemoryMedium::new();
        let a = medium.open_tab();
        let mut events = a.subscribe_external_change().unwrap();
        medium.seed("k", "{broken");
        assert_eq!(a.get("k").unwrap().as_deref(), Some("{broken"));
        assert!(events.try_next().is_none());
    }
}
