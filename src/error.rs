//! Error types for study-tracker
//!
//! Only local-path failures ever reach a caller. Remote failures are
//! constructed by [`RemoteStore`](crate::remote::RemoteStore) implementations
//! and end up in logs, not in return values.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// study-tracker error types
#[derive(Error, Debug)]
pub enum Error {
    /// Local store refused a write because it would exceed its quota
    #[error("Local storage quota exceeded: {needed} bytes needed, limit is {limit} bytes")]
    QuotaExceeded {
        /// Bytes the store would hold after the write
        needed: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// Local store failure other than quota
    #[error("Local storage error: {0}")]
    LocalStorage(String),

    /// Record or log could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote backend could not be initialized
    #[error("Remote initialization failed: {0}\nContinuing with local storage only")]
    RemoteInit(String),

    /// Remote write, read or delete rejected at runtime
    #[error("Remote operation failed: {0}")]
    RemoteOperation(String),

    /// Remote mirror worker is no longer running
    #[error("Remote mirror queue closed (worker stopped)")]
    QueueClosed,

    /// Table export requested for an empty result log
    #[error("No data to export")]
    NothingToExport,

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
