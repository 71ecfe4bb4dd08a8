//! Directory handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use crate::dto::request::{
    CreateDirectoryRequest, MoveParams, RenameParams, SearchParams, ShareParams, validated,
};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::extractors::PageParams;
use crate::extractors::path::parse_directory_id;
use crate::state::AppState;

/// GET /directory
pub async fn get_root(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let page = params.into_child_page()?;
    let dir = state.directory_service.get(&auth, None, &page).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": dir })))
}

/// GET /directory/{id}
pub async fn get_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_directory_id(&id)?;
    let page = params.into_child_page()?;
    let dir = state.directory_service.get(&auth, Some(id), &page).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": dir })))
}

/// GET /directory/search
pub async fn search(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let query = params.into_query()?;
    let result = state.directory_service.search(&auth, &query).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": result })))
}

/// POST /directory
pub async fn create_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateDirectoryRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let req = validated(req)?;
    let parent_id = parse_directory_id(&req.parent_directory_id)?;
    let dir = state
        .directory_service
        .create(&auth, parent_id, &req.name)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": dir })))
}

/// PATCH /directory/{id}/rename?name=
pub async fn rename_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Query(params): Query<RenameParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let params = validated(params)?;
    let id = parse_directory_id(&id)?;
    let dir = state
        .directory_service
        .rename(&auth, id, &params.name)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": dir })))
}

/// PATCH /directory/{id}/move?to=
pub async fn move_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Query(params): Query<MoveParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_directory_id(&id)?;
    let to = parse_directory_id(&params.to)?;
    let dir = state.directory_service.move_to(&auth, id, to).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": dir })))
}

/// PATCH /directory/{id}/share?public=
pub async fn share_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Query(params): Query<ShareParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_directory_id(&id)?;
    let dir = state
        .directory_service
        .share(&auth, id, params.public)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": dir })))
}

/// PATCH /directory/{id}/star
pub async fn star_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_directory_id(&id)?;
    let dir = state.directory_service.star(&auth, id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": dir })))
}

/// DELETE /directory/{id}
pub async fn delete_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_directory_id(&id)?;
    state.directory_service.delete(&auth, id).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": { "message": "Directory deleted" } }),
    ))
}
