//! Remote mirror queue
//!
//! Remote writes and deletes are never awaited by the caller. They are
//! queued on an unbounded channel and executed in order by one background
//! task. Outcomes are counted and logged; nothing is retried.
//!
//! ```text
//! record() ──push──▶ [ Push | Push | RemoveAll | Flush ] ──▶ worker ──▶ RemoteStore
//!                                                  │
//!                                   flush() ◀──────┘ (oneshot)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::remote::{Collection, RemoteStore};
use crate::{Error, Result};

enum RemoteOp {
    Push { collection: Collection, doc: Value },
    RemoveAll { collection: Collection },
    Flush(oneshot::Sender<()>),
    Shutdown,
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Snapshot of mirror activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorStats {
    /// Operations accepted onto the queue.
    pub enqueued: u64,
    /// Operations the remote store accepted.
    pub completed: u64,
    /// Operations the remote store rejected.
    pub failed: u64,
}

impl MirrorStats {
    /// Operations not yet attempted.
    #[must_use]
    pub const fn pending(&self) -> u64 {
        self.enqueued
            .saturating_sub(self.completed)
            .saturating_sub(self.failed)
    }
}

/// Ordered queue of remote operations with a background worker.
pub struct RemoteMirror {
    sender: mpsc::UnboundedSender<RemoteOp>,
    counters: Arc<Counters>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteMirror {
    /// Start the worker on the current tokio runtime.
    ///
    /// # Errors
    /// Returns `Error::RemoteInit` when called outside a tokio runtime
    pub fn spawn<R>(store: Arc<R>) -> Result<Self>
    where
        R: RemoteStore + 'static,
    {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::RemoteInit(format!("no async runtime for remote mirror: {e}")))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        let worker = handle.spawn(run(store, receiver, Arc::clone(&counters)));

        Ok(Self {
            sender,
            counters,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Queue a document push. Never blocks.
    pub fn push(&self, collection: Collection, doc: Value) {
        self.enqueue(RemoteOp::Push { collection, doc });
    }

    /// Queue deletion of a whole collection. Never blocks.
    pub fn remove_all(&self, collection: Collection) {
        self.enqueue(RemoteOp::RemoveAll { collection });
    }

    /// Wait until every operation queued before this call has been attempted.
    ///
    /// Returns immediately once the worker has stopped.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(RemoteOp::Flush(done)).is_err() {
            return;
        }
        // Sender dropped means the worker exited; nothing left to wait for.
        let _ = wait.await;
    }

    /// Drain the queue and stop the worker.
    ///
    /// Operations queued afterwards are dropped with a warning.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(RemoteOp::Shutdown);
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!(error = %e, "remote mirror worker ended abnormally");
            }
        }
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> MirrorStats {
        MirrorStats {
            enqueued: self.counters.enqueued.load(Ordering::SeqCst),
            completed: self.counters.completed.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
        }
    }

    fn enqueue(&self, op: RemoteOp) {
        // Counted before sending so the worker never sees an op it cannot
        // account for.
        self.counters.enqueued.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(op).is_err() {
            self.counters.enqueued.fetch_sub(1, Ordering::SeqCst);
            warn!(error = %Error::QueueClosed, "remote operation dropped");
        }
    }
}

impl Drop for RemoteMirror {
    fn drop(&mut self) {
        // Let the worker finish what is queued, then exit on its own.
        let _ = self.sender.send(RemoteOp::Shutdown);
    }
}

async fn run<R: RemoteStore>(
    store: Arc<R>,
    mut receiver: mpsc::UnboundedReceiver<RemoteOp>,
    counters: Arc<Counters>,
) {
    while let Some(op) = receiver.recv().await {
        let (action, collection, outcome) = match op {
            RemoteOp::Push { collection, doc } => ("push", collection, store.push(collection, doc).await),
            RemoteOp::RemoveAll { collection } => {
                ("remove", collection, store.remove_all(collection).await)
            }
            RemoteOp::Flush(done) => {
                let _ = done.send(());
                continue;
            }
            RemoteOp::Shutdown => break,
        };

        match outcome {
            Ok(()) => {
                counters.completed.fetch_add(1, Ordering::SeqCst);
                debug!(action, %collection, "remote mirror op completed");
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::SeqCst);
                warn!(action, %collection, error = %e, "remote mirror op failed");
            }
        }
    }

    // Ops that raced in behind Shutdown are dropped, but still accounted.
    receiver.close();
    while let Ok(op) = receiver.try_recv() {
        match op {
            RemoteOp::Push { collection, .. } | RemoteOp::RemoveAll { collection } => {
                counters.failed.fetch_add(1, Ordering::SeqCst);
                warn!(%collection, error = %Error::QueueClosed, "remote mirror op dropped at shutdown");
            }
            RemoteOp::Flush(done) => {
                let _ = done.send(());
            }
            RemoteOp::Shutdown => {}
        }
    }
    debug!("remote mirror worker stopped");
}
