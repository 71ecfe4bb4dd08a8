//! Sweep executor: dispatches jobs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use stratum_core::error::AppError;

use crate::queue::{SweepJob, SweepKind};

/// Trait for sweep handler implementations.
#[async_trait]
pub trait SweepHandler: Send + Sync + std::fmt::Debug {
    /// The job kind this handler processes.
    fn kind(&self) -> SweepKind;

    /// Run the job. Per-item failures go into the report; an `Err` means the
    /// job could not run at all.
    async fn execute(&self, job: &SweepJob) -> Result<SweepReport, SweepError>;
}

/// Errors raised by the sweep machinery.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// No handler is registered for the job kind.
    #[error("no handler registered for {0}")]
    NoHandler(SweepKind),
    /// A handler was given a job of another kind.
    #[error("handler for {expected} received a {actual} job")]
    Mismatched {
        /// Kind the handler serves.
        expected: SweepKind,
        /// Kind it received.
        actual: SweepKind,
    },
    /// Underlying application error.
    #[error(transparent)]
    App(#[from] AppError),
}

/// Outcome of one sweep job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Directory records removed.
    pub directories_deleted: u64,
    /// File records removed.
    pub files_deleted: u64,
    /// Files whose bytes the coordinator released.
    pub contents_released: u64,
    /// Items that could not be processed, one line each.
    pub failures: Vec<String>,
}

impl SweepReport {
    /// Record a failed item.
    pub fn fail(&mut self, what: impl Into<String>) {
        self.failures.push(what.into());
    }

    /// Whether every item succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Routes each job to the handler registered for its kind.
#[derive(Debug, Default)]
pub struct SweepExecutor {
    handlers: HashMap<SweepKind, Arc<dyn SweepHandler>>,
}

impl SweepExecutor {
    /// Create an executor with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the same kind.
    pub fn register(&mut self, handler: Arc<dyn SweepHandler>) {
        let kind = handler.kind();
        info!(kind = %kind, "Registered sweep handler");
        self.handlers.insert(kind, handler);
    }

    /// Run `job` and log its report. Failures never propagate further.
    pub async fn execute(&self, job: &SweepJob) -> Option<SweepReport> {
        let kind = job.kind();
        let Some(handler) = self.handlers.get(&kind) else {
            warn!(kind = %kind, error = %SweepError::NoHandler(kind), "Sweep job skipped");
            return None;
        };

        match handler.execute(job).await {
            Ok(report) => {
                if report.is_clean() {
                    info!(
                        kind = %kind,
                        directories_deleted = report.directories_deleted,
                        files_deleted = report.files_deleted,
                        contents_released = report.contents_released,
                        "Sweep job completed"
                    );
                } else {
                    warn!(
                        kind = %kind,
                        directories_deleted = report.directories_deleted,
                        files_deleted = report.files_deleted,
                        contents_released = report.contents_released,
                        failures = ?report.failures,
                        "Sweep job completed with failures"
                    );
                }
                Some(report)
            }
            Err(e) => {
                warn!(kind = %kind, error = %e, "Sweep job failed");
                None
            }
        }
    }
}
