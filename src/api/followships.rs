//! Followship Endpoints
//! Mission: Follow and unfollow edges for the signed-in user

use crate::api::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AddFollowshipRequest {
    pub following_id: Uuid,
}

/// POST /api/followships
pub async fn add_followship(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<AddFollowshipRequest>,
) -> Result<StatusCode, ApiError> {
    let me = current.0.user.id;

    if payload.following_id == me {
        return Err(ApiError::validation("cannot follow yourself"));
    }
    if state.db.get_user_by_id(payload.following_id)?.is_none() {
        return Err(ApiError::not_found("user not found"));
    }
    if !state.db.add_followship(me, payload.following_id)? {
        return Err(ApiError::conflict("already following this user"));
    }

    Ok(StatusCode::OK)
}

/// DELETE /api/followships/:following_id
pub async fn remove_followship(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(following_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.db.remove_followship(current.0.user.id, following_id)? {
        return Err(ApiError::not_found("followship not found"));
    }

    Ok(StatusCode::OK)
}
