//! Tweet Endpoints
//! Mission: Tweet feed, single tweets, posting, and like toggles

use crate::api::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::{Tweet, TweetWithMeta};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TWEET_MAX_CHARS: usize = 140;

/// Tweet with per-viewer like flag
#[derive(Debug, Serialize)]
pub struct TweetResponse {
    #[serde(flatten)]
    pub tweet: TweetWithMeta,
    pub is_liked: bool,
}

/// GET /api/tweets: full feed, newest first
pub async fn get_tweets(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<TweetResponse>>, ApiError> {
    let liked = current.0.liked_tweet_ids();
    let tweets = state
        .db
        .list_tweets()?
        .into_iter()
        .map(|tweet| TweetResponse {
            is_liked: liked.contains(&tweet.id),
            tweet,
        })
        .collect();

    Ok(Json(tweets))
}

/// GET /api/tweets/:id
pub async fn get_tweet(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<TweetResponse>, ApiError> {
    let tweet = state
        .db
        .get_tweet_with_meta(id)?
        .ok_or_else(|| ApiError::not_found("tweet not found"))?;

    Ok(Json(TweetResponse {
        is_liked: current.0.liked_tweet_ids().contains(&tweet.id),
        tweet,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PostTweetRequest {
    pub description: String,
}

/// POST /api/tweets
pub async fn post_tweet(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<PostTweetRequest>,
) -> Result<Json<Tweet>, ApiError> {
    let description = payload.description.trim();
    if description.is_empty() {
        return Err(ApiError::validation("tweet cannot be blank"));
    }
    if description.chars().count() > TWEET_MAX_CHARS {
        return Err(ApiError::validation("tweet is limited to 140 characters"));
    }

    let tweet = state.db.create_tweet(current.0.user.id, description)?;

    Ok(Json(tweet))
}

/// POST /api/tweets/:id/like
pub async fn add_like(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.db.get_tweet(id)?.is_none() {
        return Err(ApiError::not_found("tweet not found"));
    }
    if !state.db.add_like(current.0.user.id, id)? {
        return Err(ApiError::conflict("already liked this tweet"));
    }

    Ok(StatusCode::OK)
}

/// POST /api/tweets/:id/unlike
pub async fn remove_like(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.db.get_tweet(id)?.is_none() {
        return Err(ApiError::not_found("tweet not found"));
    }
    if !state.db.remove_like(current.0.user.id, id)? {
        return Err(ApiError::not_found("like not found"));
    }

    Ok(StatusCode::OK)
}
