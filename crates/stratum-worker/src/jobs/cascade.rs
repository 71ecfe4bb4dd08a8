//! Cascading delete of the subtrees below a removed directory.
//!
//! Descendants are walked breadth-first through their canonical documents,
//! never through the mirrors of the removed directory, so children attached
//! after the mirror snapshot was taken are still found.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use stratum_core::traits::StorageCoordinator;
use stratum_core::types::{DirectoryId, FileId};
use stratum_database::TreeStore;

use crate::executor::{SweepError, SweepHandler, SweepReport};
use crate::queue::{SweepJob, SweepKind};

/// Deletes every descendant record and releases every descendant file's bytes.
#[derive(Debug)]
pub struct CascadeDeleteHandler {
    store: Arc<dyn TreeStore>,
    coordinator: Arc<dyn StorageCoordinator>,
}

impl CascadeDeleteHandler {
    /// Create a handler over `store`, releasing through `coordinator`.
    pub fn new(store: Arc<dyn TreeStore>, coordinator: Arc<dyn StorageCoordinator>) -> Self {
        Self { store, coordinator }
    }

    async fn sweep_file(&self, id: FileId, report: &mut SweepReport) {
        let file = match self.store.find_file(&id).await {
            Ok(Some(file)) => file,
            Ok(None) => return,
            Err(e) => return report.fail(format!("load file {id}: {e}")),
        };

        match self.store.delete_file(&id).await {
            Ok(true) => report.files_deleted += 1,
            Ok(false) => {}
            Err(e) => return report.fail(format!("delete file {id}: {e}")),
        }

        match self.coordinator.delete(id.object_id(), file.size).await {
            Ok(()) => report.contents_released += 1,
            Err(e) => report.fail(format!("release file {id}: {e}")),
        }
    }
}

#[async_trait]
impl SweepHandler for CascadeDeleteHandler {
    fn kind(&self) -> SweepKind {
        SweepKind::CascadeDelete
    }

    async fn execute(&self, job: &SweepJob) -> Result<SweepReport, SweepError> {
        let SweepJob::CascadeDelete { directories, files } = job else {
            return Err(SweepError::Mismatched {
                expected: self.kind(),
                actual: job.kind(),
            });
        };

        let mut report = SweepReport::default();
        for id in files {
            self.sweep_file(*id, &mut report).await;
        }

        let mut queue: VecDeque<DirectoryId> = directories.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            let dir = match self.store.find_directory(&id).await {
                Ok(Some(dir)) => dir,
                Ok(None) => continue,
                Err(e) => {
                    report.fail(format!("load directory {id}: {e}"));
                    continue;
                }
            };

            debug!(
                directory_id = %id,
                directories = dir.directories.len(),
                files = dir.files.len(),
                "Sweeping directory"
            );

            queue.extend(dir.directories.iter().map(|d| d.id));
            for file in &dir.files {
                self.sweep_file(file.id, &mut report).await;
            }

            match self.store.delete_directory(&id).await {
                Ok(true) => report.directories_deleted += 1,
                Ok(false) => {}
                Err(e) => report.fail(format!("delete directory {id}: {e}")),
            }
        }

        Ok(report)
    }
}
