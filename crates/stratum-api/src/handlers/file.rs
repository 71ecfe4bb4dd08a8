//! File handlers. Get, create and update wait on the storage coordinator.

use axum::Json;
use axum::extract::{Path, Query, State};

use crate::dto::request::{
    CreateFileRequest, MoveParams, RenameParams, ResizeParams, ShareParams, validated,
};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::extractors::path::{parse_directory_id, parse_file_id};
use crate::state::AppState;

/// GET /file/{id}
pub async fn get_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_file_id(&id)?;
    let handle = state.file_service.get(&auth, id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": handle })))
}

/// POST /file
pub async fn create_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateFileRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let req = validated(req)?;
    let parent_id = parse_directory_id(&req.parent_directory_id)?;
    let handle = state
        .file_service
        .create(&auth, parent_id, &req.name, &req.extension, req.size)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": handle })))
}

/// PUT /file/{id}/update?size=
pub async fn update_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Query(params): Query<ResizeParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_file_id(&id)?;
    let placement = state.file_service.update(&auth, id, params.size).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": placement })))
}

/// DELETE /file/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.file_service.delete(&auth, &id).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": { "message": "File deleted" } }),
    ))
}

/// PATCH /file/{id}/rename?name=
pub async fn rename_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Query(params): Query<RenameParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let params = validated(params)?;
    let id = parse_file_id(&id)?;
    let file = state.file_service.rename(&auth, id, &params.name).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": file })))
}

/// PATCH /file/{id}/move?to=
pub async fn move_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Query(params): Query<MoveParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_file_id(&id)?;
    let to = parse_directory_id(&params.to)?;
    let file = state.file_service.move_to(&auth, id, to).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": file })))
}

/// PATCH /file/{id}/share?public=
pub async fn share_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Query(params): Query<ShareParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_file_id(&id)?;
    let file = state.file_service.share(&auth, id, params.public).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": file })))
}

/// PATCH /file/{id}/star
pub async fn star_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_file_id(&id)?;
    let file = state.file_service.star(&auth, id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": file })))
}
