//! In-memory remote store using `DashMap`.
//!
//! Stands in for a network document database in tests and demos. Failures
//! and latency can be switched on to exercise the best-effort paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;

use super::{Collection, RemoteStore};
use crate::{Error, Result};

/// In-memory remote store.
///
/// Insertion keys are opaque, strictly increasing strings.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    collections: DashMap<Collection, BTreeMap<String, Value>>,
    next_key: AtomicU64,
    failing: AtomicBool,
    latency: Option<Duration>,
}

impl MemoryRemoteStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that delays every operation.
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of documents in a collection.
    #[must_use]
    pub fn len(&self, collection: Collection) -> usize {
        self.collections.get(&collection).map_or(0, |docs| docs.len())
    }

    /// Check if a collection is empty.
    #[must_use]
    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    async fn enter(&self, op: &str, collection: Collection) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::RemoteOperation(format!(
                "{op} on {collection} rejected"
            )));
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemoteStore {
    async fn push(&self, collection: Collection, doc: Value) -> Result<()> {
        self.enter("push", collection).await?;
        let seq = self.next_key.fetch_add(1, Ordering::SeqCst);
        self.collections
            .entry(collection)
            .or_default()
            .insert(format!("-{seq:019}"), doc);
        Ok(())
    }

    async fn read_all(&self, collection: Collection) -> Result<BTreeMap<String, Value>> {
        self.enter("read", collection).await?;
        Ok(self
            .collections
            .get(&collection)
            .map(|docs| docs.value().clone())
            .unwrap_or_default())
    }

    async fn remove_all(&self, collection: Collection) -> Result<()> {
        self.enter("remove", collection).await?;
        self.collections.remove(&collection);
        Ok(())
    }
}
