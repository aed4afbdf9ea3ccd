//! Remote Store Adapter
//!
//! The remote store is a best-effort mirror. It may be missing for the whole
//! session, may fail to initialize, and may reject any individual operation.
//! None of that is ever visible to callers of the tracker.
//!
//! Availability is probed once, when a [`RemoteConnection`] is built, and the
//! connection value is then injected into the tracker.
//!
//! # Example
//!
//! ```rust
//! use study_tracker::config::RemoteConfig;
//! use study_tracker::remote::{MemoryRemoteStore, RemoteConnection, RemoteStatus};
//!
//! let config = RemoteConfig::new("https://study.example.firebaseio.com");
//! let connection = RemoteConnection::connect(Some(&config), |_| Ok(MemoryRemoteStore::new()));
//! assert_eq!(connection.status(), RemoteStatus::Ready);
//!
//! let offline = RemoteConnection::<MemoryRemoteStore>::connect(None, |_| unreachable!());
//! assert_eq!(offline.status(), RemoteStatus::Unavailable);
//! ```

mod memory;

pub use memory::MemoryRemoteStore;

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::config::RemoteConfig;
use crate::Result;

/// Remote collection names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    /// Trial results.
    Results,
    /// Session events.
    Events,
}

impl Collection {
    /// Both collections.
    pub const ALL: [Self; 2] = [Self::Results, Self::Events];

    /// Collection name on the remote backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Results => "results",
            Self::Events => "events",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asynchronous document store used as the remote mirror.
pub trait RemoteStore: Send + Sync {
    /// Append a document under a fresh, store-assigned key.
    fn push(&self, collection: Collection, doc: Value) -> impl Future<Output = Result<()>> + Send;

    /// Read every document in a collection, keyed by insertion key.
    ///
    /// Key order is the store's and need not match local insertion order.
    fn read_all(
        &self,
        collection: Collection,
    ) -> impl Future<Output = Result<BTreeMap<String, Value>>> + Send;

    /// Delete a whole collection.
    fn remove_all(&self, collection: Collection) -> impl Future<Output = Result<()>> + Send;
}

impl<R: RemoteStore> RemoteStore for Arc<R> {
    fn push(&self, collection: Collection, doc: Value) -> impl Future<Output = Result<()>> + Send {
        (**self).push(collection, doc)
    }

    fn read_all(
        &self,
        collection: Collection,
    ) -> impl Future<Output = Result<BTreeMap<String, Value>>> + Send {
        (**self).read_all(collection)
    }

    fn remove_all(&self, collection: Collection) -> impl Future<Output = Result<()>> + Send {
        (**self).remove_all(collection)
    }
}

/// Outcome of the availability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
    /// No remote backend configured.
    Unavailable,
    /// Remote backend initialized and usable.
    Ready,
    /// Remote backend configured but initialization failed.
    FailedInit,
}

impl RemoteStatus {
    /// Whether remote operations should be issued.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Result of probing for the remote backend.
///
/// `Unavailable` and `FailedInit` behave the same (remote work is skipped);
/// they differ only for diagnostics.
pub enum RemoteConnection<R> {
    /// No remote backend configured.
    Unavailable,
    /// Initialized backend.
    Ready(Arc<R>),
    /// Initialization failed with the given reason.
    FailedInit(String),
}

impl<R: RemoteStore> RemoteConnection<R> {
    /// Wrap an already initialized store.
    #[must_use]
    pub fn ready(store: R) -> Self {
        Self::Ready(Arc::new(store))
    }

    /// Probe for the remote backend.
    ///
    /// With no configuration the result is `Unavailable`. Otherwise `init`
    /// is called once; an error or a panic inside it yields `FailedInit`.
    /// Nothing escapes this function.
    pub fn connect<F>(config: Option<&RemoteConfig>, init: F) -> Self
    where
        F: FnOnce(&RemoteConfig) -> Result<R>,
    {
        let Some(config) = config else {
            warn!("remote backend not configured, using local storage only");
            return Self::Unavailable;
        };

        match catch_unwind(AssertUnwindSafe(|| init(config))) {
            Ok(Ok(store)) => {
                info!(endpoint = %config.database_url(), "remote backend connected");
                Self::ready(store)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "remote backend init failed");
                Self::FailedInit(e.to_string())
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!(reason = %reason, "remote backend init panicked");
                Self::FailedInit(reason)
            }
        }
    }
}

impl<R> RemoteConnection<R> {
    /// Probe outcome.
    #[must_use]
    pub const fn status(&self) -> RemoteStatus {
        match self {
            Self::Unavailable => RemoteStatus::Unavailable,
            Self::Ready(_) => RemoteStatus::Ready,
            Self::FailedInit(_) => RemoteStatus::FailedInit,
        }
    }

    /// The store, if ready.
    #[must_use]
    pub const fn store(&self) -> Option<&Arc<R>> {
        match self {
            Self::Ready(store) => Some(store),
            _ => None,
        }
    }

    /// Why initialization failed, if it did.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::FailedInit(reason) => Some(reason),
            _ => None,
        }
    }
}

impl<R> fmt::Debug for RemoteConnection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => f.write_str("Unavailable"),
            Self::Ready(_) => f.write_str("Ready"),
            Self::FailedInit(reason) => f.debug_tuple("FailedInit").field(reason).finish(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "remote initializer panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn config() -> RemoteConfig {
        RemoteConfig::new("https://example.invalid")
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::Results.as_str(), "results");
        assert_eq!(Collection::Events.to_string(), "events");
    }

    #[test]
    fn test_connect_without_config_is_unavailable() {
        let connection = RemoteConnection::<MemoryRemoteStore>::connect(None, |_| {
            panic!("initializer must not run without config")
        });
        assert_eq!(connection.status(), RemoteStatus::Unavailable);
        assert!(connection.store().is_none());
        assert!(!connection.status().is_ready());
    }

    #[test]
    fn test_connect_ready() {
        let connection = RemoteConnection::connect(Some(&config()), |_| Ok(MemoryRemoteStore::new()));
        assert_eq!(connection.status(), RemoteStatus::Ready);
        assert!(connection.store().is_some());
        assert!(connection.failure_reason().is_none());
    }

    #[test]
    fn test_connect_init_error_becomes_failed_init() {
        let connection = RemoteConnection::<MemoryRemoteStore>::connect(Some(&config()), |_| {
            Err(Error::RemoteInit("sdk missing".to_string()))
        });
        assert_eq!(connection.status(), RemoteStatus::FailedInit);
        assert!(connection.failure_reason().unwrap().contains("sdk missing"));
    }

    #[test]
    fn test_connect_init_panic_becomes_failed_init() {
        let connection = RemoteConnection::<MemoryRemoteStore>::connect(Some(&config()), |_| {
            panic!("bad credentials")
        });
        assert_eq!(connection.status(), RemoteStatus::FailedInit);
        assert_eq!(connection.failure_reason(), Some("bad credentials"));
    }

    #[test]
    fn test_initializer_sees_config() {
        let connection = RemoteConnection::connect(Some(&config()), |cfg| {
            assert_eq!(cfg.database_url(), "https://example.invalid");
            Ok(MemoryRemoteStore::new())
        });
        assert!(connection.status().is_ready());
    }
}
