//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use stratum_broker::CorrelationBroker;
use stratum_core::config::AppConfig;
use stratum_core::traits::StorageCoordinator;
use stratum_database::TreeStore;
use stratum_service::{DirectoryService, FileService, TreeEngine};
use stratum_worker::SweepQueue;

use crate::auth::TokenVerifier;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Tree store (PostgreSQL or in-memory)
    pub store: Arc<dyn TreeStore>,
    /// Correlation broker; the webhook delivers into its pending table
    pub broker: Arc<CorrelationBroker>,

    // ── Auth ─────────────────────────────────────────────────
    /// Bearer token verifier
    pub token_verifier: Arc<TokenVerifier>,

    // ── Services ─────────────────────────────────────────────
    /// Directory service
    pub directory_service: Arc<DirectoryService>,
    /// File service
    pub file_service: Arc<FileService>,
}

impl AppState {
    /// Wires the services over `store` and `broker`.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn TreeStore>,
        broker: Arc<CorrelationBroker>,
        sweeps: SweepQueue,
    ) -> Self {
        let engine = TreeEngine::new(Arc::clone(&store), sweeps.clone());
        let coordinator: Arc<dyn StorageCoordinator> = broker.clone();
        let directory_service = Arc::new(DirectoryService::new(engine.clone()));
        let file_service = Arc::new(FileService::new(
            engine,
            coordinator,
            sweeps,
            config.broker.service_account.clone(),
        ));
        let token_verifier = Arc::new(TokenVerifier::new(&config.auth));

        Self {
            config: Arc::new(config),
            store,
            broker,
            token_verifier,
            directory_service,
            file_service,
        }
    }
}
