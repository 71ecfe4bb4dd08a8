//! Webhook the storage coordinator answers through.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use tracing::{debug, warn};

use stratum_broker::{DeliveryOutcome, Response};
use stratum_core::error::AppError;

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /internal/storage/responses
///
/// Body is a bincode-encoded [`Response`]. Only the service account may
/// call this.
pub async fn deliver_response(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Bytes,
) -> ApiResult<Json<serde_json::Value>> {
    if auth.user_id != state.config.broker.service_account {
        warn!(user_id = %auth.user_id, "Non-service caller hit the storage webhook");
        return Err(AppError::wrong_user().into());
    }

    let response = Response::decode(&body).map_err(AppError::from)?;
    let correlation_id = response.correlation_id;

    match state.broker.pending().deliver(response).await {
        DeliveryOutcome::Delivered => {
            debug!(correlation_id = %correlation_id, "Storage response delivered");
            Ok(Json(
                serde_json::json!({ "success": true, "data": { "correlation_id": correlation_id } }),
            ))
        }
        DeliveryOutcome::AlreadyConsumed => Err(AppError::conflict(format!(
            "response {correlation_id} already consumed"
        ))
        .into()),
        DeliveryOutcome::Unknown => Err(AppError::not_found(format!(
            "no request waiting on {correlation_id}"
        ))
        .into()),
    }
}
