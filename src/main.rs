//! Stratum server: directory tree metadata and storage-coordinator broker.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use stratum_broker::{CorrelationBroker, MemoryPublisher, RedisPublisher};
use stratum_core::config::{AppConfig, LogFormat, PublisherBackend, StoreBackend};
use stratum_core::error::AppError;
use stratum_core::traits::{MessagePublisher, StorageCoordinator};
use stratum_database::{DatabasePool, MemoryTreeStore, PgTreeStore, TreeStore};
use stratum_worker::jobs::{CascadeDeleteHandler, ReleaseContentHandler};
use stratum_worker::{SweepExecutor, SweepQueue, SweepRunner};

#[tokio::main]
async fn main() {
    let env = std::env::var("STRATUM_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Stratum v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Tree store ───────────────────────────────────────
    let store: Arc<dyn TreeStore> = match config.store.backend {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let db = DatabasePool::connect(&config.database).await?;
            stratum_database::migration::run_migrations(db.pool()).await?;
            Arc::new(PgTreeStore::new(db.into_pool()))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory tree store; data is lost on restart");
            Arc::new(MemoryTreeStore::new())
        }
    };

    // ── Step 2: Outbound channel + correlation broker ────────────
    let publisher: Arc<dyn MessagePublisher> = match config.broker.publisher {
        PublisherBackend::Redis => {
            tracing::info!("Connecting to Redis publisher...");
            Arc::new(RedisPublisher::connect(&config.broker.redis_url).await?)
        }
        PublisherBackend::Memory => Arc::new(MemoryPublisher::default()),
    };
    let broker = Arc::new(CorrelationBroker::new(publisher, &config.broker));
    tracing::info!(
        topic = %config.broker.topic,
        timeout_seconds = config.broker.response_timeout_seconds,
        "Correlation broker ready"
    );

    // ── Step 3: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 4: Background sweep worker ──────────────────────────
    let (sweeps, sweep_rx) = SweepQueue::new(config.worker.queue_capacity);

    let coordinator: Arc<dyn StorageCoordinator> = broker.clone();
    let mut executor = SweepExecutor::new();
    executor.register(Arc::new(CascadeDeleteHandler::new(
        Arc::clone(&store),
        Arc::clone(&coordinator),
    )));
    executor.register(Arc::new(ReleaseContentHandler::new(coordinator)));

    let runner = SweepRunner::new(sweep_rx, Arc::new(executor), &config.worker);
    let worker_cancel = shutdown_rx.clone();
    let worker_handle = tokio::spawn(async move {
        runner.run(worker_cancel).await;
    });
    tracing::info!(
        concurrency = config.worker.concurrency,
        "Background sweep worker started"
    );

    // ── Step 5: Build and start HTTP server ──────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);

    let state = stratum_api::AppState::new(config, store, broker, sweeps);
    let app = stratum_api::build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Stratum server listening on {}", addr);

    // ── Step 6: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 7: Wait for background tasks ────────────────────────
    tracing::info!("Waiting for background sweeps to complete...");
    if tokio::time::timeout(grace, worker_handle).await.is_err() {
        tracing::warn!("Background sweeps did not finish within the grace period");
    }

    tracing::info!("Stratum server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
