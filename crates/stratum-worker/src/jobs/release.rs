//! Content release after a file delete.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use stratum_core::traits::StorageCoordinator;

use crate::executor::{SweepError, SweepHandler, SweepReport};
use crate::queue::{SweepJob, SweepKind};

/// Tells the storage coordinator to drop a deleted file's bytes.
#[derive(Debug)]
pub struct ReleaseContentHandler {
    coordinator: Arc<dyn StorageCoordinator>,
}

impl ReleaseContentHandler {
    /// Create a handler releasing through `coordinator`.
    pub fn new(coordinator: Arc<dyn StorageCoordinator>) -> Self {
        Self { coordinator }
    }
}

#[async_trait]
impl SweepHandler for ReleaseContentHandler {
    fn kind(&self) -> SweepKind {
        SweepKind::ReleaseContent
    }

    async fn execute(&self, job: &SweepJob) -> Result<SweepReport, SweepError> {
        let SweepJob::ReleaseContent { file_id, size } = job else {
            return Err(SweepError::Mismatched {
                expected: self.kind(),
                actual: job.kind(),
            });
        };

        let mut report = SweepReport::default();
        match self.coordinator.delete(file_id.object_id(), *size).await {
            Ok(()) => {
                debug!(file_id = %file_id, size, "Released file content");
                report.contents_released += 1;
            }
            Err(e) => report.fail(format!("release {file_id}: {e}")),
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use stratum_core::types::FileId;

    use super::*;
    use crate::jobs::testing::RecordingCoordinator;

    #[tokio::test]
    async fn releases_through_the_coordinator() {
        let coordinator = Arc::new(RecordingCoordinator::default());
        let handler = ReleaseContentHandler::new(coordinator.clone());
        let file_id = FileId::new();

        let report = handler
            .execute(&SweepJob::ReleaseContent { file_id, size: 9 })
            .await
            .unwrap();
        assert_eq!(report.contents_released, 1);
        assert_eq!(*coordinator.released.lock(), vec![(file_id.object_id(), 9)]);
    }

    #[tokio::test]
    async fn coordinator_failure_is_reported_not_raised() {
        let handler = ReleaseContentHandler::new(Arc::new(RecordingCoordinator::failing()));
        let report = handler
            .execute(&SweepJob::ReleaseContent {
                file_id: FileId::new(),
                size: 1,
            })
            .await
            .unwrap();
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn rejects_other_job_kinds() {
        let handler = ReleaseContentHandler::new(Arc::new(RecordingCoordinator::default()));
        let err = handler
            .execute(&SweepJob::CascadeDelete {
                directories: vec![],
                files: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SweepError::Mismatched { .. }));
    }
}
