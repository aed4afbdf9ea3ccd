//! Local Durable Log
//!
//! The local store is the source of truth for every synchronous read and the
//! only store whose failures a caller ever sees. It is a plain synchronous
//! key-value interface; [`LocalLog`] layers the two study logs on top of it:
//!
//! ```text
//! "hci_study_results" -> JSON array of TrialResult
//! "hci_study_events"  -> JSON array of Event
//! ```
//!
//! Each append rewrites the whole array under its key.
//!
//! # Example
//!
//! ```rust
//! use study_tracker::local::{LocalLog, MemoryLocalStore};
//! use study_tracker::record::{TrialResult, UiVersion};
//!
//! # fn example() -> study_tracker::Result<()> {
//! let log = LocalLog::new(MemoryLocalStore::new());
//! log.append_result(&TrialResult::new("p1", UiVersion::A))?;
//! assert_eq!(log.results().len(), 1);
//!
//! log.clear()?;
//! assert!(log.results().is_empty());
//! # Ok(())
//! # }
//! ```

mod file;
mod memory;

pub use file::FileLocalStore;
pub use memory::MemoryLocalStore;

use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::record::{Event, TrialResult};
use crate::Result;

/// Storage key of the results log.
pub const RESULTS_KEY: &str = "hci_study_results";

/// Storage key of the events log.
pub const EVENTS_KEY: &str = "hci_study_events";

/// Synchronous string key-value store.
///
/// Mirrors the browser `localStorage` contract: every call completes before
/// returning, and values are opaque strings.
pub trait LocalStore: Send + Sync {
    /// Get a value by key.
    ///
    /// Returns `None` if the key doesn't exist.
    ///
    /// # Errors
    /// Returns error if the backing medium cannot be read
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value for a key, overwriting any existing value.
    ///
    /// # Errors
    /// Returns error if the write would exceed the store's quota or the
    /// backing medium rejects it
    fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove a key. No-op if the key doesn't exist.
    ///
    /// # Errors
    /// Returns error if the backing medium rejects the removal
    fn remove(&self, key: &str) -> Result<()>;
}

impl<S: LocalStore + ?Sized> LocalStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<S: LocalStore + ?Sized> LocalStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// The results and events logs kept in a [`LocalStore`].
///
/// Reads never fail: a missing key is an empty log, and a value that is not
/// a JSON array is treated as an empty log. Individual entries that do not
/// decode are skipped.
pub struct LocalLog<S: LocalStore> {
    store: S,
    // Serialises read-modify-write appends.
    write_lock: Mutex<()>,
}

impl<S: LocalStore> LocalLog<S> {
    /// Wrap a store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Get the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Append a result. Returns the new length of the results log.
    ///
    /// # Errors
    /// Returns error if the result cannot be serialized or the store rejects
    /// the write; the log is left unchanged in that case
    pub fn append_result(&self, result: &TrialResult) -> Result<usize> {
        self.append(RESULTS_KEY, result)
    }

    /// Append an event. Returns the new length of the events log.
    ///
    /// # Errors
    /// Same as [`append_result`](Self::append_result)
    pub fn append_event(&self, event: &Event) -> Result<usize> {
        self.append(EVENTS_KEY, event)
    }

    /// All results in insertion order.
    #[must_use]
    pub fn results(&self) -> Vec<TrialResult> {
        self.read(RESULTS_KEY)
    }

    /// All events in insertion order.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.read(EVENTS_KEY)
    }

    /// Remove both logs.
    ///
    /// Both keys are attempted even if the first removal fails.
    ///
    /// # Errors
    /// Returns the first removal error
    pub fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let results = self.store.remove(RESULTS_KEY);
        let events = self.store.remove(EVENTS_KEY);
        debug!("local logs cleared");
        results.and(events)
    }

    fn append<T: Serialize>(&self, key: &str, entry: &T) -> Result<usize> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entries = self.load_raw(key)?;
        entries.push(serde_json::to_value(entry)?);
        let serialized = serde_json::to_string(&entries)?;
        self.store.set(key, serialized)?;

        debug!(key, len = entries.len(), "appended to local log");
        Ok(entries.len())
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let entries = match self.load_raw(key) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(key, error = %e, "local log unreadable, treating as empty");
                return Vec::new();
            }
        };
        entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value(raw) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(key, index, error = %e, "skipping undecodable local log entry");
                    None
                }
            })
            .collect()
    }

    // A store error propagates so an append never overwrites a log it could
    // not read. Only unparseable contents count as an empty log.
    fn load_raw(&self, key: &str) -> Result<Vec<Value>> {
        let Some(stored) = self.store.get(key)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Value>>(&stored) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(key, error = %e, "local log corrupted, treating as empty");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::UiVersion;
    use crate::Error;
    use chrono::{TimeZone, Utc};
    use serde_json::Map;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory store whose reads can be made to fail.
    #[derive(Default)]
    struct FlakyReads {
        inner: MemoryLocalStore,
        failing: AtomicBool,
    }

    impl LocalStore for FlakyReads {
        fn get(&self, key: &str) -> Result<Option<String>> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(Error::LocalStorage("transient EIO".to_string()));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: String) -> Result<()> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    fn result(participant: &str, version: UiVersion) -> TrialResult {
        TrialResult::builder(participant, version)
            .reading_time_sec(10.0)
            .build()
    }

    #[test]
    fn test_memory_store_set_get_remove() {
        let store = MemoryLocalStore::new();

        store.set("key", "value".to_string()).unwrap();
        assert_eq!(store.get("key").unwrap(), Some("value".to_string()));

        store.remove("key").unwrap();
        assert_eq!(store.get("key").unwrap(), None);

        // Should not error
        store.remove("nonexistent").unwrap();
    }

    #[test]
    fn test_memory_store_quota() {
        let store = MemoryLocalStore::with_quota(16);

        store.set("k", "0123456789".to_string()).unwrap();
        let err = store.set("k2", "0123456789".to_string()).unwrap_err();

        assert!(matches!(err, Error::QuotaExceeded { limit: 16, .. }));
        assert_eq!(store.get("k2").unwrap(), None);

        // Overwriting an existing key only counts the new value
        store.set("k", "abcdefghijklmn".to_string()).unwrap();
    }

    #[test]
    fn test_log_preserves_insertion_order() {
        let log = LocalLog::new(MemoryLocalStore::new());

        for i in 0..5 {
            let len = log.append_result(&result(&format!("p{i}"), UiVersion::A)).unwrap();
            assert_eq!(len, i + 1);
        }

        let ids: Vec<_> = log
            .results()
            .iter()
            .map(|r| r.participant_id().to_string())
            .collect();
        assert_eq!(ids, vec!["p0", "p1", "p2", "p3", "p4"]);
    }

    #[test]
    fn test_log_stores_json_array_under_fixed_key() {
        let log = LocalLog::new(MemoryLocalStore::new());
        log.append_result(&TrialResult::new("p1", UiVersion::B)).unwrap();

        let raw = log.store().get(RESULTS_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"[{"participantId":"p1","uiVersion":"B"}]"#);
        assert_eq!(log.store().get(EVENTS_KEY).unwrap(), None);
    }

    #[test]
    fn test_corrupted_log_reads_empty() {
        let log = LocalLog::new(MemoryLocalStore::new());
        log.store().set(RESULTS_KEY, "{not json".to_string()).unwrap();
        log.store().set(EVENTS_KEY, "42".to_string()).unwrap();

        assert!(log.results().is_empty());
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_append_over_corrupted_log_starts_fresh() {
        let log = LocalLog::new(MemoryLocalStore::new());
        log.store().set(RESULTS_KEY, "garbage".to_string()).unwrap();

        assert_eq!(log.append_result(&result("p1", UiVersion::A)).unwrap(), 1);
        assert_eq!(log.results().len(), 1);
    }

    #[test]
    fn test_undecodable_entries_are_skipped() {
        let log = LocalLog::new(MemoryLocalStore::new());
        log.store()
            .set(
                RESULTS_KEY,
                r#"[{"participantId":"p1","uiVersion":"A"},{"nope":true}]"#.to_string(),
            )
            .unwrap();

        let results = log.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].participant_id(), "p1");
    }

    #[test]
    fn test_failed_append_leaves_log_unchanged() {
        let log = LocalLog::new(MemoryLocalStore::with_quota(80));
        log.append_result(&TrialResult::new("p1", UiVersion::A)).unwrap();

        let big = TrialResult::builder("p2", UiVersion::A)
            .article("a", "x".repeat(200))
            .build();
        assert!(log.append_result(&big).is_err());

        assert_eq!(log.results().len(), 1);
    }

    #[test]
    fn test_clear_removes_both_logs() {
        let log = LocalLog::new(MemoryLocalStore::new());
        log.append_result(&result("p1", UiVersion::A)).unwrap();
        let at = Utc.timestamp_millis_opt(0).unwrap();
        log.append_event(&Event::stamped("start", Map::new(), at)).unwrap();

        log.clear().unwrap();

        assert!(log.results().is_empty());
        assert!(log.events().is_empty());
        assert!(log.store().is_empty());
    }

    #[test]
    fn test_append_during_read_failure_keeps_log() {
        let log = LocalLog::new(FlakyReads::default());
        for i in 0..3 {
            log.append_result(&result(&format!("p{i}"), UiVersion::A)).unwrap();
        }

        log.store().failing.store(true, Ordering::SeqCst);
        let err = log.append_result(&result("p3", UiVersion::A)).unwrap_err();
        assert!(matches!(err, Error::LocalStorage(_)));
        assert!(log.results().is_empty());

        log.store().failing.store(false, Ordering::SeqCst);
        let ids: Vec<_> = log
            .results()
            .iter()
            .map(|r| r.participant_id().to_string())
            .collect();
        assert_eq!(ids, vec!["p0", "p1", "p2"]);
        assert_eq!(log.append_result(&result("p3", UiVersion::A)).unwrap(), 4);
    }

    #[test]
    fn test_extra_fields_cannot_shadow_schema_fields() {
        let log = LocalLog::new(MemoryLocalStore::new());
        let slow = TrialResult::builder("p1", UiVersion::B)
            .reading_time_sec(30.0)
            .extra("readingTimeSec", "slow")
            .build();
        let flipped = TrialResult::builder("p2", UiVersion::A)
            .extra("uiVersion", "B")
            .extra("sessionId", "s-1")
            .build();
        log.append_result(&slow).unwrap();
        log.append_result(&flipped).unwrap();

        let results = log.results();
        assert_eq!(results, vec![slow, flipped]);
        assert_eq!(results[0].reading_time_sec(), Some(30.0));
        assert_eq!(results[1].ui_version(), &UiVersion::A);
        assert_eq!(results[1].extra().len(), 1);
    }
}
