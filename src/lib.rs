//! # study-tracker: dual-write capture for two-arm usability studies
//!
//! Records trial results and timestamped events for an A/B reading study,
//! keeps them in a durable local log, mirrors them best-effort to a remote
//! document store, and exports them for analysis.
//!
//! ## Design Principles
//!
//! - **Local first**: every write lands in the local log synchronously before
//!   anything else happens; only local failures reach the caller
//! - **Best-effort mirror**: remote writes are queued, never awaited by the
//!   writer, never retried, and their failures are only logged
//! - **Injected collaborators**: the remote connection is probed once and
//!   handed to the tracker as a value
//! - **Pure exports**: document, table and summary views are functions of a
//!   log snapshot
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use study_tracker::local::MemoryLocalStore;
//! use study_tracker::record::{TrialResult, UiVersion};
//! use study_tracker::remote::{MemoryRemoteStore, RemoteConnection};
//! use study_tracker::Tracker;
//!
//! # async fn example() -> study_tracker::Result<()> {
//! let tracker = Tracker::new(
//!     MemoryLocalStore::new(),
//!     RemoteConnection::ready(MemoryRemoteStore::new()),
//! );
//!
//! let result = TrialResult::builder("p-001", UiVersion::B)
//!     .article("art-7", "politics, local")
//!     .reading_time_sec(131.0)
//!     .max_scroll_depth(92.0)
//!     .build();
//! tracker.record(&result)?;
//!
//! println!("{}", tracker.export_table()?.to_csv());
//! println!("{:?}", tracker.summary());
//!
//! tracker.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod local;
pub mod logging;
pub mod mirror;
pub mod record;
pub mod remote;
pub mod tracker;

pub use error::{Error, Result};
pub use tracker::Tracker;
