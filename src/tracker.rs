//! Tracking Service
//!
//! Every write goes to the local log first and synchronously. If the remote
//! backend is ready, the same write is queued for the remote mirror and the
//! call returns without waiting for it. The two paths are independent: a
//! remote failure never undoes or repeats a local write, and a local failure
//! is never mirrored.
//!
//! ```text
//!            ┌──────────────▶ LocalLog (sync, errors surface)
//! record ────┤
//!            └── if Ready ──▶ RemoteMirror ──▶ RemoteStore (async, errors logged)
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{RemoteConfig, TrackerConfig};
use crate::export::{self, ExportDocument, Summary, Table};
use crate::local::{LocalLog, LocalStore};
use crate::mirror::{MirrorStats, RemoteMirror};
use crate::record::{Event, TrialResult};
use crate::remote::{Collection, RemoteConnection, RemoteStatus, RemoteStore};
use crate::Result;

/// Dual-write tracker over a local log and an optional remote mirror.
///
/// # Example
///
/// ```rust
/// use study_tracker::local::MemoryLocalStore;
/// use study_tracker::record::{TrialResult, UiVersion};
/// use study_tracker::remote::{MemoryRemoteStore, RemoteConnection};
/// use study_tracker::Tracker;
///
/// # async fn example() -> study_tracker::Result<()> {
/// let tracker = Tracker::new(
///     MemoryLocalStore::new(),
///     RemoteConnection::ready(MemoryRemoteStore::new()),
/// );
///
/// tracker.record(&TrialResult::new("p1", UiVersion::A))?;
/// tracker.log_event("quiz_opened", None)?;
/// assert_eq!(tracker.read_all().len(), 1);
///
/// tracker.flush().await;
/// assert_eq!(tracker.read_all_remote().await.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct Tracker<L: LocalStore, R: RemoteStore> {
    local: LocalLog<L>,
    remote: RemoteConnection<R>,
    mirror: Option<RemoteMirror>,
    clock: Arc<dyn Clock>,
}

impl<L: LocalStore, R: RemoteStore + 'static> Tracker<L, R> {
    /// Build a tracker from a local store and a probed remote connection.
    ///
    /// A ready remote needs a tokio runtime for its mirror worker. Without
    /// one the remote is downgraded to `FailedInit` and the tracker runs
    /// local-only.
    #[must_use]
    pub fn new(local: L, remote: RemoteConnection<R>) -> Self {
        let (remote, mirror) = match remote {
            RemoteConnection::Ready(store) => match RemoteMirror::spawn(Arc::clone(&store)) {
                Ok(mirror) => (RemoteConnection::Ready(store), Some(mirror)),
                Err(e) => {
                    warn!(error = %e, "remote mirror unavailable, running local-only");
                    (RemoteConnection::FailedInit(e.to_string()), None)
                }
            },
            other => (other, None),
        };

        info!(remote = ?remote.status(), "tracker started");
        Self {
            local: LocalLog::new(local),
            remote,
            mirror,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for event stamps and export times.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }
}

impl<R: RemoteStore + 'static> Tracker<Box<dyn LocalStore>, R> {
    /// Build a tracker from configuration.
    ///
    /// `init` receives the remote section of the configuration, if there is
    /// one, and is called at most once.
    ///
    /// # Errors
    /// Returns error if the configured local store cannot be opened. Remote
    /// problems never fail construction.
    pub fn from_config<F>(config: &TrackerConfig, init: F) -> Result<Self>
    where
        F: FnOnce(&RemoteConfig) -> Result<R>,
    {
        let local = config.open_local_store()?;
        let remote = RemoteConnection::connect(config.remote(), init);
        Ok(Self::new(local, remote))
    }
}

impl<L: LocalStore, R: RemoteStore> Tracker<L, R> {
    /// Record a completed trial.
    ///
    /// Succeeds once the local append succeeds; the remote copy is queued
    /// and its outcome only logged.
    ///
    /// # Errors
    /// Returns error if the local append fails (quota, serialization, I/O).
    /// Nothing is mirrored in that case.
    pub fn record(&self, result: &TrialResult) -> Result<()> {
        let len = self.local.append_result(result)?;
        debug!(participant = result.participant_id(), len, "result recorded");
        self.mirror(Collection::Results, result);
        Ok(())
    }

    /// Record a named event stamped with the current time.
    ///
    /// Returns the stored event.
    ///
    /// # Errors
    /// Same as [`record`](Self::record)
    pub fn log_event(&self, name: &str, data: Option<Map<String, Value>>) -> Result<Event> {
        let event = Event::stamped(name, data.unwrap_or_default(), self.clock.now());
        self.local.append_event(&event)?;
        info!(event = name, "event logged");
        self.mirror(Collection::Events, &event);
        Ok(event)
    }

    /// All locally recorded results, in recording order.
    #[must_use]
    pub fn read_all(&self) -> Vec<TrialResult> {
        self.local.results()
    }

    /// All locally recorded events, in recording order.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.local.events()
    }

    /// Results as held by the remote backend.
    ///
    /// Empty when the remote is not ready or the read fails. Order follows
    /// the remote's insertion keys, not local recording order.
    pub async fn read_all_remote(&self) -> Vec<TrialResult> {
        self.read_remote(Collection::Results).await
    }

    /// Events as held by the remote backend. Same rules as
    /// [`read_all_remote`](Self::read_all_remote).
    pub async fn read_events_remote(&self) -> Vec<Event> {
        self.read_remote(Collection::Events).await
    }

    /// Remove every result and event, locally and (queued) remotely.
    ///
    /// # Errors
    /// Returns error if the local removal fails. Remote deletion is queued
    /// regardless and its outcome only logged.
    pub fn clear_all(&self) -> Result<()> {
        let local = self.local.clear();
        if let Some(mirror) = &self.mirror {
            for collection in Collection::ALL {
                mirror.remove_all(collection);
            }
        }
        info!("all results cleared");
        local
    }

    /// Wait until every remote operation queued so far has been attempted.
    pub async fn flush(&self) {
        if let Some(mirror) = &self.mirror {
            mirror.flush().await;
        }
    }

    /// Drain queued remote operations and stop the mirror worker.
    ///
    /// Later writes still reach the local log; their remote copies are
    /// dropped.
    pub async fn shutdown(&self) {
        if let Some(mirror) = &self.mirror {
            mirror.shutdown().await;
        }
    }

    /// Outcome of the remote availability probe.
    #[must_use]
    pub const fn remote_status(&self) -> RemoteStatus {
        self.remote.status()
    }

    /// Remote mirror counters; all zero when the remote is not ready.
    #[must_use]
    pub fn mirror_stats(&self) -> MirrorStats {
        self.mirror
            .as_ref()
            .map_or_else(MirrorStats::default, RemoteMirror::stats)
    }

    /// The local log.
    #[must_use]
    pub const fn local(&self) -> &LocalLog<L> {
        &self.local
    }

    /// Export the local snapshot as a document stamped now.
    #[must_use]
    pub fn export_document(&self) -> ExportDocument {
        export::to_document(&self.read_all(), &self.events(), self.clock.now())
    }

    /// Export the local results as a table.
    ///
    /// # Errors
    /// Returns `Error::NothingToExport` when no results are recorded
    pub fn export_table(&self) -> Result<Table> {
        export::to_table(&self.read_all())
    }

    /// Per-arm summary of the local results.
    #[must_use]
    pub fn summary(&self) -> Summary {
        export::summarize(&self.read_all())
    }

    /// Write the document export into `dir`.
    ///
    /// # Errors
    /// Returns error if the file cannot be written
    pub fn save_document<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let now = self.clock.now();
        let document = export::to_document(&self.read_all(), &self.events(), now);
        export::save_document(dir, &document, now)
    }

    /// Write the table export into `dir`.
    ///
    /// # Errors
    /// Returns `Error::NothingToExport` when no results are recorded, or an
    /// I/O error if the file cannot be written
    pub fn save_table<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let table = self.export_table()?;
        export::save_table(dir, &table, self.clock.now())
    }

    fn mirror<T: Serialize>(&self, collection: Collection, entry: &T) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        match serde_json::to_value(entry) {
            Ok(doc) => mirror.push(collection, doc),
            Err(e) => warn!(%collection, error = %e, "entry not mirrored"),
        }
    }

    async fn read_remote<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        let Some(store) = self.remote.store() else {
            return Vec::new();
        };
        match store.read_all(collection).await {
            Ok(docs) => docs
                .into_iter()
                .filter_map(|(key, doc)| match serde_json::from_value(doc) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!(%collection, key = %key, error = %e, "skipping undecodable remote entry");
                        None
                    }
                })
                .collect(),
            Err(e) => {
                warn!(%collection, error = %e, "remote read failed");
                Vec::new()
            }
        }
    }
}

impl<L: LocalStore, R: RemoteStore> fmt::Debug for Tracker<L, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("remote", &self.remote)
            .field("mirror", &self.mirror_stats())
            .finish_non_exhaustive()
    }
}
