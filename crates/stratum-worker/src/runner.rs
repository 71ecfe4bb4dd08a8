//! Sweep runner: drains the queue and executes jobs on detached tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tracing::{info, warn};

use stratum_core::config::WorkerConfig;

use crate::executor::SweepExecutor;
use crate::queue::{SweepJob, SweepReceiver};

/// Consumes the sweep queue until cancelled.
#[derive(Debug)]
pub struct SweepRunner {
    receiver: SweepReceiver,
    executor: Arc<SweepExecutor>,
    concurrency: usize,
    drain_timeout: Duration,
}

impl SweepRunner {
    /// Create a runner for `receiver`.
    pub fn new(receiver: SweepReceiver, executor: Arc<SweepExecutor>, config: &WorkerConfig) -> Self {
        Self {
            receiver,
            executor,
            concurrency: config.concurrency.max(1),
            drain_timeout: Duration::from_secs(config.drain_timeout_seconds),
        }
    }

    /// Run until `cancel` flips to `true` or every producer is gone.
    ///
    /// On shutdown the queue is closed, jobs already queued are still
    /// started, and in-flight jobs get up to the drain timeout to finish.
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) {
        info!(concurrency = self.concurrency, "Sweep runner started");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        info!("Sweep runner received shutdown signal");
                        break;
                    }
                }
                job = self.receiver.recv() => {
                    match job {
                        Some(job) => self.dispatch(&semaphore, job).await,
                        None => {
                            info!("Sweep queue closed");
                            break;
                        }
                    }
                }
            }
        }

        let drain_timeout = self.drain_timeout;
        let permits = self.concurrency as u32;

        self.receiver.close();
        let drain = async {
            while let Some(job) = self.receiver.recv().await {
                self.dispatch(&semaphore, job).await;
            }
            let _ = semaphore.acquire_many(permits).await;
        };

        info!("Sweep runner waiting for in-flight jobs");
        if tokio::time::timeout(drain_timeout, drain).await.is_err() {
            warn!(
                timeout_seconds = drain_timeout.as_secs(),
                "Sweep runner stopped with jobs still running"
            );
        }

        info!("Sweep runner shut down");
    }

    async fn dispatch(&self, semaphore: &Arc<Semaphore>, job: SweepJob) {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            warn!(kind = %job.kind(), "Sweep runner closed, dropping job");
            return;
        };

        let executor = Arc::clone(&self.executor);
        tokio::spawn(async move {
            let _permit = permit;
            executor.execute(&job).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use stratum_core::types::FileId;

    use super::*;
    use crate::executor::{SweepError, SweepHandler, SweepReport};
    use crate::queue::{SweepKind, SweepQueue};

    #[derive(Debug, Default)]
    struct Counting {
        seen: Mutex<Vec<FileId>>,
    }

    #[async_trait]
    impl SweepHandler for Counting {
        fn kind(&self) -> SweepKind {
            SweepKind::ReleaseContent
        }

        async fn execute(&self, job: &SweepJob) -> Result<SweepReport, SweepError> {
            if let SweepJob::ReleaseContent { file_id, .. } = job {
                self.seen.lock().push(*file_id);
            }
            Ok(SweepReport::default())
        }
    }

    #[tokio::test]
    async fn runs_queued_jobs_and_drains_on_shutdown() {
        let handler = Arc::new(Counting::default());
        let mut executor = SweepExecutor::new();
        executor.register(handler.clone());

        let (queue, receiver) = SweepQueue::new(16);
        let runner = SweepRunner::new(receiver, Arc::new(executor), &WorkerConfig::default());
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let ids: Vec<FileId> = (0..5).map(|_| FileId::new()).collect();
        for id in &ids {
            queue.enqueue(SweepJob::ReleaseContent { file_id: *id, size: 1 });
        }

        let handle = tokio::spawn(runner.run(cancel_rx));
        cancel_tx.send(true).unwrap();
        handle.await.unwrap();

        let mut seen = handler.seen.lock().clone();
        seen.sort();
        let mut expected = ids.clone();
        expected.sort();
        assert_eq!(seen, expected);
    }
}
