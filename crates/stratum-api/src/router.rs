//! Route definitions for the Stratum HTTP API.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post, put},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the router with all routes and the request logger, threading
/// `state` through every handler.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(directory_routes())
        .merge(file_routes())
        .merge(internal_routes())
        .merge(health_routes())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Directory tree endpoints
fn directory_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/directory",
            get(handlers::directory::get_root).post(handlers::directory::create_directory),
        )
        .route("/directory/search", get(handlers::directory::search))
        .route(
            "/directory/{id}",
            get(handlers::directory::get_directory).delete(handlers::directory::delete_directory),
        )
        .route("/directory/{id}/move", patch(handlers::directory::move_directory))
        .route("/directory/{id}/rename", patch(handlers::directory::rename_directory))
        .route("/directory/{id}/share", patch(handlers::directory::share_directory))
        .route("/directory/{id}/star", patch(handlers::directory::star_directory))
}

/// File endpoints
fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/file", post(handlers::file::create_file))
        .route(
            "/file/{id}",
            get(handlers::file::get_file).delete(handlers::file::delete_file),
        )
        .route("/file/{id}/update", put(handlers::file::update_file))
        .route("/file/{id}/rename", patch(handlers::file::rename_file))
        .route("/file/{id}/move", patch(handlers::file::move_file))
        .route("/file/{id}/share", patch(handlers::file::share_file))
        .route("/file/{id}/star", patch(handlers::file::star_file))
}

/// Storage coordinator callback
fn internal_routes() -> Router<AppState> {
    Router::new().route(
        "/internal/storage/responses",
        post(handlers::internal::deliver_response),
    )
}

/// Liveness and readiness
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/live", get(handlers::health::live))
        .route("/ready", get(handlers::health::ready))
}
