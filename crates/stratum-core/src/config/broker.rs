//! Correlation broker configuration.

use serde::{Deserialize, Serialize};

/// Which channel carries outbound storage requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublisherBackend {
    /// Redis `PUBLISH`.
    Redis,
    /// In-process broadcast channel (single node, tests).
    Memory,
}

/// Settings for the storage-coordinator handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Outbound channel backend.
    #[serde(default = "default_publisher")]
    pub publisher: PublisherBackend,
    /// Redis URL, used when `publisher = "redis"`.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Topic that outbound requests are published on.
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Host advertised in outbound requests so the coordinator can call back.
    #[serde(default = "default_host")]
    pub host: String,
    /// How long a caller waits for the coordinator's response.
    #[serde(default = "default_response_timeout")]
    pub response_timeout_seconds: u64,
    /// How long a delivered correlation id is remembered for duplicate detection.
    #[serde(default = "default_consumed_ttl")]
    pub consumed_ttl_seconds: u64,
    /// Identity the coordinator authenticates as.
    #[serde(default = "default_service_account")]
    pub service_account: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            publisher: default_publisher(),
            redis_url: default_redis_url(),
            topic: default_topic(),
            host: default_host(),
            response_timeout_seconds: default_response_timeout(),
            consumed_ttl_seconds: default_consumed_ttl(),
            service_account: default_service_account(),
        }
    }
}

fn default_publisher() -> PublisherBackend {
    PublisherBackend::Redis
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_topic() -> String {
    "stratum.storage.requests".to_string()
}

fn default_host() -> String {
    "localhost:8080".to_string()
}

fn default_response_timeout() -> u64 {
    30
}

fn default_consumed_ttl() -> u64 {
    300
}

fn default_service_account() -> String {
    "fs".to_string()
}
