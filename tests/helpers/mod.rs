//! Shared test helpers for integration tests.
//!
//! Every test app runs on `MemoryTreeStore` and `MemoryPublisher`, with the
//! sweep runner live in the background. A scripted storage coordinator can
//! be attached to answer broker requests through the webhook.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use tower::ServiceExt;
use uuid::Uuid;

use stratum_broker::{CorrelationBroker, MemoryPublisher, Operation, Response};
use stratum_core::config::{AppConfig, PublisherBackend, StoreBackend};
use stratum_core::traits::StorageCoordinator;
use stratum_database::MemoryTreeStore;
use stratum_worker::jobs::{CascadeDeleteHandler, ReleaseContentHandler};
use stratum_worker::{SweepExecutor, SweepQueue, SweepRunner};

/// Host the scripted coordinator hands out.
pub const NODE_HOST: &str = "node-1:9000";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Tree store for direct inspection
    pub store: Arc<MemoryTreeStore>,
    /// Outbound channel the broker publishes on
    pub publisher: Arc<MemoryPublisher>,
    /// Correlation broker
    pub broker: Arc<CorrelationBroker>,
    /// Application config
    pub config: AppConfig,
    /// Operations the scripted coordinator has answered
    pub answered: Arc<Mutex<Vec<Operation>>>,
    shutdown: watch::Sender<bool>,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.store.backend = StoreBackend::Memory;
        config.broker.publisher = PublisherBackend::Memory;
        config.broker.response_timeout_seconds = 5;

        let store = Arc::new(MemoryTreeStore::new());
        let publisher = Arc::new(MemoryPublisher::default());
        let broker = Arc::new(CorrelationBroker::new(publisher.clone(), &config.broker));

        let (sweeps, sweep_rx) = SweepQueue::new(config.worker.queue_capacity);
        let coordinator: Arc<dyn StorageCoordinator> = broker.clone();
        let mut executor = SweepExecutor::new();
        executor.register(Arc::new(CascadeDeleteHandler::new(
            store.clone(),
            coordinator.clone(),
        )));
        executor.register(Arc::new(ReleaseContentHandler::new(coordinator)));
        let runner = SweepRunner::new(sweep_rx, Arc::new(executor), &config.worker);

        let (shutdown, cancel) = watch::channel(false);
        tokio::spawn(runner.run(cancel));

        let state = stratum_api::AppState::new(config.clone(), store.clone(), broker.clone(), sweeps);
        let router = stratum_api::build_app(state);

        Self {
            router,
            store,
            publisher,
            broker,
            config,
            answered: Arc::new(Mutex::new(Vec::new())),
            shutdown,
        }
    }

    /// Sign a token for `user_id` with the configured secret.
    pub fn token(&self, user_id: &str) -> String {
        let exp = chrono::Utc::now().timestamp() + 3600;
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &serde_json::json!({ "id": user_id, "exp": exp }),
            &EncodingKey::from_secret(self.config.auth.jwt_secret.as_bytes()),
        )
        .expect("Failed to sign token")
    }

    /// Answer every published request through the webhook. A non-empty
    /// `error` makes every answer a failure.
    pub fn spawn_coordinator(&self, error: &str) {
        let mut requests = self.publisher.subscribe();
        let router = self.router.clone();
        let token = self.token(&self.config.broker.service_account);
        let answered = Arc::clone(&self.answered);
        let error = error.to_string();

        tokio::spawn(async move {
            while let Ok((_, payload)) = requests.recv().await {
                let request = stratum_broker::Request::decode(&payload)
                    .expect("Broker published an undecodable request");
                answered.lock().push(request.operation);

                let response = Response {
                    correlation_id: request.correlation_id,
                    host: NODE_HOST.to_string(),
                    connection_id: Uuid::new_v4(),
                    error: error.clone(),
                };
                let body = response.encode().expect("Failed to encode response");
                let _ = send(&router, "POST", "/internal/storage/responses", Body::from(body), Some(&token)).await;
            }
        });
    }

    /// Make a JSON request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();
        send(&self.router, method, path, Body::from(body_str), token).await
    }

    /// POST a raw body to the webhook.
    pub async fn deliver(&self, body: Vec<u8>, token: &str) -> TestResponse {
        send(
            &self.router,
            "POST",
            "/internal/storage/responses",
            Body::from(body),
            Some(token),
        )
        .await
    }

    /// Poll `check` until it holds or two seconds pass.
    pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn send(
    router: &Router,
    method: &str,
    path: &str,
    body: Body,
    token: Option<&str>,
) -> TestResponse {
    let mut req = Request::builder()
        .method(method)
        .uri(path)
        .header("Content-Type", "application/json");

    if let Some(token) = token {
        req = req.header("Authorization", format!("Bearer {token}"));
    }

    let req = req.body(body).expect("Failed to build request");

    let response = router
        .clone()
        .oneshot(req)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("Failed to read body");

    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    TestResponse { status, body }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `data` field of a success envelope.
    pub fn data(&self) -> &Value {
        assert_eq!(self.status, StatusCode::OK, "Request failed: {:?}", self.body);
        &self.body["data"]
    }

    /// `data.<key>` as a string.
    pub fn str(&self, key: &str) -> String {
        self.data()[key]
            .as_str()
            .unwrap_or_else(|| panic!("No string `{key}` in {:?}", self.body))
            .to_string()
    }
}
