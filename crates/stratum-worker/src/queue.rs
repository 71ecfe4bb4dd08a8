//! In-process sweep queue.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, warn};

use stratum_core::types::{DirectoryId, FileId};

/// Work deferred past the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepJob {
    /// Delete the subtrees below a removed directory. The ids are the
    /// removed directory's former direct children.
    CascadeDelete {
        /// Child directories.
        directories: Vec<DirectoryId>,
        /// Child files.
        files: Vec<FileId>,
    },
    /// Ask the storage coordinator to release a deleted file's bytes.
    ReleaseContent {
        /// Deleted file.
        file_id: FileId,
        /// Its last known size.
        size: u64,
    },
}

/// Job discriminant used to route jobs to handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SweepKind {
    /// [`SweepJob::CascadeDelete`].
    CascadeDelete,
    /// [`SweepJob::ReleaseContent`].
    ReleaseContent,
}

impl std::fmt::Display for SweepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CascadeDelete => write!(f, "cascade_delete"),
            Self::ReleaseContent => write!(f, "release_content"),
        }
    }
}

impl SweepJob {
    /// This job's kind.
    pub fn kind(&self) -> SweepKind {
        match self {
            Self::CascadeDelete { .. } => SweepKind::CascadeDelete,
            Self::ReleaseContent { .. } => SweepKind::ReleaseContent,
        }
    }
}

/// Receiving half, owned by the runner.
pub type SweepReceiver = mpsc::Receiver<SweepJob>;

/// Cloneable producer handle.
#[derive(Debug, Clone)]
pub struct SweepQueue {
    sender: mpsc::Sender<SweepJob>,
}

impl SweepQueue {
    /// Create a queue holding at most `capacity` waiting jobs.
    pub fn new(capacity: usize) -> (Self, SweepReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Enqueue without blocking the caller.
    ///
    /// When the queue is full the job is parked on a detached task that
    /// waits for capacity, so it outlives the request that produced it.
    /// Only a closed queue drops a job. Must be called inside a tokio
    /// runtime.
    pub fn enqueue(&self, job: SweepJob) {
        let kind = job.kind();
        match self.sender.try_send(job) {
            Ok(()) => debug!(kind = %kind, "Sweep job queued"),
            Err(TrySendError::Full(job)) => {
                warn!(kind = %kind, "Sweep queue full, parking job until capacity frees");
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    if sender.send(job).await.is_err() {
                        error!(kind = %kind, "Sweep queue closed, dropping parked job");
                    }
                });
            }
            Err(TrySendError::Closed(_)) => {
                error!(kind = %kind, "Sweep queue closed, dropping job");
            }
        }
    }
}
