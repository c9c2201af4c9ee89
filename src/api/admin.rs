//! Admin Endpoints
//! Mission: Moderation surface, reachable only through the admin role gate

use crate::api::AppState;
use crate::error::ApiError;
use crate::models::UserWithStats;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

/// GET /api/admin/users: every user-role account with its aggregates
pub async fn get_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserWithStats>>, ApiError> {
    Ok(Json(state.db.list_users_with_stats()?))
}

/// DELETE /api/admin/tweets/:id: remove a tweet with its replies and likes
pub async fn remove_tweet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.db.delete_tweet(id)? {
        return Err(ApiError::not_found("tweet not found"));
    }

    info!("🗑️  Tweet removed by admin: {}", id);

    Ok(StatusCode::OK)
}
