//! Tracker configuration
//!
//! Loaded from a JSON document such as:
//!
//! ```json
//! {
//!   "remote": {
//!     "apiKey": "…",
//!     "authDomain": "study.firebaseapp.com",
//!     "databaseURL": "https://study-default-rtdb.firebasedatabase.app",
//!     "projectId": "study"
//!   },
//!   "storageDir": "/var/lib/study",
//!   "localQuotaBytes": 5242880
//! }
//! ```
//!
//! The remote section is opaque to the tracker; it is handed to the remote
//! initializer unchanged.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::local::{FileLocalStore, LocalStore, MemoryLocalStore};
use crate::{Error, Result};

/// Remote backend credentials and endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    #[serde(rename = "databaseURL")]
    database_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    storage_bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    messaging_sender_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    app_id: Option<String>,
}

impl RemoteConfig {
    /// Config with only the database endpoint set.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            api_key: None,
            auth_domain: None,
            project_id: None,
            storage_bucket: None,
            messaging_sender_id: None,
            app_id: None,
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the project ID.
    #[must_use]
    pub fn with_project_id(mut self, id: impl Into<String>) -> Self {
        self.project_id = Some(id.into());
        self
    }

    /// Database endpoint.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// API key, if set.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Auth domain, if set.
    #[must_use]
    pub fn auth_domain(&self) -> Option<&str> {
        self.auth_domain.as_deref()
    }

    /// Project ID, if set.
    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Storage bucket, if set.
    #[must_use]
    pub fn storage_bucket(&self) -> Option<&str> {
        self.storage_bucket.as_deref()
    }

    /// Messaging sender ID, if set.
    #[must_use]
    pub fn messaging_sender_id(&self) -> Option<&str> {
        self.messaging_sender_id.as_deref()
    }

    /// App ID, if set.
    #[must_use]
    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }
}

// Keeps the API key out of logs.
impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("database_url", &self.database_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("auth_domain", &self.auth_domain)
            .field("project_id", &self.project_id)
            .field("storage_bucket", &self.storage_bucket)
            .field("messaging_sender_id", &self.messaging_sender_id)
            .field("app_id", &self.app_id)
            .finish()
    }
}

/// Top-level tracker configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remote: Option<RemoteConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    storage_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    local_quota_bytes: Option<usize>,
}

impl TrackerConfig {
    /// Empty configuration: in-memory local store, no remote.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration document.
    ///
    /// # Errors
    /// Returns `Error::Config` if the document is malformed
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a JSON configuration file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, `Error::Config` if it
    /// is malformed
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Set the remote backend.
    #[must_use]
    pub fn with_remote(mut self, remote: RemoteConfig) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Persist the local log under `dir` instead of in memory.
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Cap the in-memory local store at `bytes`.
    ///
    /// File-backed storage has no quota; combining this with
    /// [`with_storage_dir`](Self::with_storage_dir) makes
    /// [`open_local_store`](Self::open_local_store) fail.
    #[must_use]
    pub const fn with_local_quota(mut self, bytes: usize) -> Self {
        self.local_quota_bytes = Some(bytes);
        self
    }

    /// Remote backend section, if any.
    #[must_use]
    pub const fn remote(&self) -> Option<&RemoteConfig> {
        self.remote.as_ref()
    }

    /// Storage directory, if any.
    #[must_use]
    pub fn storage_dir(&self) -> Option<&Path> {
        self.storage_dir.as_deref()
    }

    /// Local quota in bytes, if any.
    #[must_use]
    pub const fn local_quota_bytes(&self) -> Option<usize> {
        self.local_quota_bytes
    }

    /// Open the local store this configuration describes.
    ///
    /// A storage directory selects [`FileLocalStore`]; otherwise a
    /// [`MemoryLocalStore`] is used, capped by the quota if one is set.
    ///
    /// # Errors
    /// Returns `Error::Config` if both a storage directory and a quota are
    /// set, or an I/O error if the storage directory cannot be created
    pub fn open_local_store(&self) -> Result<Box<dyn LocalStore>> {
        if let Some(dir) = &self.storage_dir {
            if let Some(limit) = self.local_quota_bytes {
                return Err(Error::Config(format!(
                    "localQuotaBytes ({limit}) is not supported with storageDir {}",
                    dir.display()
                )));
            }
            return Ok(Box::new(FileLocalStore::open(dir)?));
        }
        let store: Box<dyn LocalStore> = match self.local_quota_bytes {
            Some(limit) => Box::new(MemoryLocalStore::with_quota(limit)),
            None => Box::new(MemoryLocalStore::new()),
        };
        Ok(store)
    }
}
