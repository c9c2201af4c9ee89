//! Reply Endpoints
//! Mission: Listing and posting replies under a tweet

use crate::api::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::ReplyWithAuthor;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

const REPLY_MAX_CHARS: usize = 140;

/// GET /api/tweets/:id/replies, oldest first
pub async fn get_replies(
    State(state): State<AppState>,
    Path(tweet_id): Path<Uuid>,
) -> Result<Json<Vec<ReplyWithAuthor>>, ApiError> {
    if state.db.get_tweet(tweet_id)?.is_none() {
        return Err(ApiError::not_found("tweet not found"));
    }

    Ok(Json(state.db.replies_of_tweet(tweet_id)?))
}

#[derive(Debug, Deserialize)]
pub struct PostReplyRequest {
    pub comment: String,
}

/// POST /api/tweets/:id/replies
pub async fn post_reply(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(tweet_id): Path<Uuid>,
    Json(payload): Json<PostReplyRequest>,
) -> Result<StatusCode, ApiError> {
    let comment = payload.comment.trim();
    if comment.is_empty() {
        return Err(ApiError::validation("reply cannot be blank"));
    }
    if comment.chars().count() > REPLY_MAX_CHARS {
        return Err(ApiError::validation("reply is limited to 140 characters"));
    }

    if state.db.get_tweet(tweet_id)?.is_none() {
        return Err(ApiError::not_found("tweet not found"));
    }

    state.db.create_reply(tweet_id, current.0.user.id, comment)?;

    Ok(StatusCode::OK)
}
