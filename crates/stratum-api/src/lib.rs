//! # stratum-api
//!
//! HTTP API layer for Stratum built on Axum.
//!
//! Exposes the directory and file endpoints, the internal webhook the
//! storage coordinator answers through, and liveness/readiness probes.

pub mod app;
pub mod auth;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use auth::TokenVerifier;
pub use state::AppState;
