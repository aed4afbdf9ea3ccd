//! In-memory local store using `DashMap`.
//!
//! Data is lost on process restart. An optional byte quota emulates the
//! storage limit of a browser origin.

use super::LocalStore;
use crate::{Error, Result};
use dashmap::DashMap;

/// In-memory local store.
///
/// Quota accounting counts the bytes of every key and value.
///
/// # Example
///
/// ```rust
/// use study_tracker::local::{LocalStore, MemoryLocalStore};
///
/// # fn example() -> study_tracker::Result<()> {
/// let store = MemoryLocalStore::with_quota(1024);
/// store.set("hello", "world".to_string())?;
/// assert_eq!(store.get("hello")?, Some("world".to_string()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    store: DashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryLocalStore {
    /// Create an unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes beyond `limit` bytes.
    #[must_use]
    pub fn with_quota(limit: usize) -> Self {
        Self {
            store: DashMap::new(),
            quota: Some(limit),
        }
    }

    /// Get the number of keys in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Bytes currently held, keys included.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.store
            .iter()
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.store.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        if let Some(limit) = self.quota {
            let replaced = self
                .store
                .get(key)
                .map_or(0, |v| key.len() + v.value().len());
            let needed = self.used_bytes().saturating_sub(replaced) + key.len() + value.len();
            if needed > limit {
                return Err(Error::QuotaExceeded { needed, limit });
            }
        }
        self.store.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        Ok(())
    }
}
