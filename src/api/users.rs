//! User Endpoints
//! Mission: Signup, sign-in, profiles, follow listings, and rankings

use crate::api::tweets::TweetResponse;
use crate::api::AppState;
use crate::auth::models::{Role, SigninRequest, SigninResponse, User};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::{FollowProfile, LikedTweet, RankedUser, SortOrder, UserReply};
use crate::storage::{NewUser, DEFAULT_AVATAR_URL, DEFAULT_COVER_URL};
use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    Extension, Form, Json,
};
use bcrypt::{hash, DEFAULT_COST};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const NAME_MAX_CHARS: usize = 50;
const INTRODUCTION_MAX_CHARS: usize = 160;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub account: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub check_password: String,
}

/// POST /api/users
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<User>, ApiError> {
    let account = payload.account.trim();
    let name = payload.name.trim();
    let email = payload.email.trim();
    let password = payload.password.trim();
    let check_password = payload.check_password.trim();

    if account.is_empty()
        || name.is_empty()
        || email.is_empty()
        || password.is_empty()
        || check_password.is_empty()
    {
        return Err(ApiError::validation("all fields are required"));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(ApiError::validation("name must be 50 characters or fewer"));
    }
    if password != check_password {
        return Err(ApiError::validation(
            "password and check password do not match",
        ));
    }

    // Uniqueness is scoped to the user-role partition; the admin partition
    // may hold the same account string
    if state.db.account_taken(Role::User, account, None)? {
        return Err(ApiError::conflict("account already registered"));
    }
    if state.db.email_taken(Role::User, email, None)? {
        return Err(ApiError::conflict("email already registered"));
    }

    let password_hash = hash(password, DEFAULT_COST).context("Failed to hash password")?;

    let user = state.db.create_user(NewUser {
        role: Role::User,
        account: account.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash,
        avatar: DEFAULT_AVATAR_URL.to_string(),
        cover: DEFAULT_COVER_URL.to_string(),
    })?;

    Ok(Json(user))
}

/// POST /api/:role/signin
pub async fn signin(
    State(state): State<AppState>,
    Path(role): Path<String>,
    Form(payload): Form<SigninRequest>,
) -> Result<Json<SigninResponse>, ApiError> {
    let role =
        Role::from_str(&role).ok_or_else(|| ApiError::authentication("unknown sign-in route"))?;

    let identity = state
        .local
        .authenticate(role, payload.account.trim(), &payload.password)?;

    let token = state.jwt.issue(&identity)?;

    Ok(Json(SigninResponse {
        token,
        user: identity,
    }))
}

#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    pub id: Uuid,
    pub account: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub cover: String,
    pub introduction: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub tweet_count: i64,
    pub followers: Vec<Uuid>,
    pub followings: Vec<Uuid>,
    pub is_myself: bool,
    pub is_following: bool,
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfileResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(id)?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    let tweet_count = state.db.tweet_count(id)?;
    let followers = state.db.follower_ids(id)?;
    let followings = state.db.following_ids(id)?;
    let me = &current.0;

    Ok(Json(UserProfileResponse {
        id: user.id,
        account: user.account,
        name: user.name,
        email: user.email,
        avatar: user.avatar,
        cover: user.cover,
        introduction: user.introduction,
        created_at: user.created_at,
        updated_at: user.updated_at,
        tweet_count,
        followers,
        followings,
        is_myself: me.user.id == id,
        is_following: me.is_following(id),
    }))
}

#[derive(Debug, Deserialize)]
pub struct EditProfileRequest {
    pub name: String,
    pub introduction: Option<String>,
}

/// PUT /api/users/:id: profile fields, self only
pub async fn edit_user_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditProfileRequest>,
) -> Result<Json<User>, ApiError> {
    if current.0.user.id != id {
        return Err(ApiError::forbidden("no permission to edit"));
    }

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(ApiError::validation("name must be 50 characters or fewer"));
    }

    let introduction = payload.introduction.as_deref().map(str::trim);
    if let Some(intro) = introduction {
        if intro.chars().count() > INTRODUCTION_MAX_CHARS {
            return Err(ApiError::validation(
                "introduction must be 160 characters or fewer",
            ));
        }
    }

    let user = state
        .db
        .update_profile(id, name, introduction)?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct EditAccountRequest {
    pub account: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub check_password: String,
}

/// PUT /api/users/:id/account: credentials, self only. An empty password
/// keeps the current one.
pub async fn edit_user_account(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditAccountRequest>,
) -> Result<Json<User>, ApiError> {
    if current.0.user.id != id {
        return Err(ApiError::forbidden("no permission to edit"));
    }

    let account = payload.account.trim();
    let name = payload.name.trim();
    let email = payload.email.trim();
    let password = payload.password.trim();
    let check_password = payload.check_password.trim();

    if account.is_empty() || name.is_empty() || email.is_empty() {
        return Err(ApiError::validation(
            "account, name, and email are required",
        ));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(ApiError::validation("name must be 50 characters or fewer"));
    }
    if password != check_password {
        return Err(ApiError::validation(
            "password and check password do not match",
        ));
    }

    let role = current.0.user.role;
    if state.db.account_taken(role, account, Some(id))? {
        return Err(ApiError::conflict("account already registered"));
    }
    if state.db.email_taken(role, email, Some(id))? {
        return Err(ApiError::conflict("email already registered"));
    }

    let password_hash = if password.is_empty() {
        None
    } else {
        Some(hash(password, DEFAULT_COST).context("Failed to hash password")?)
    };

    let user = state
        .db
        .update_account(id, account, name, email, password_hash.as_deref())?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok(Json(user))
}

/// GET /api/users/:id/tweets
pub async fn get_user_tweets(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TweetResponse>>, ApiError> {
    ensure_user_exists(&state, id)?;

    let liked = current.0.liked_tweet_ids();
    let tweets = state
        .db
        .tweets_of_user(id)?
        .into_iter()
        .map(|tweet| TweetResponse {
            is_liked: liked.contains(&tweet.id),
            tweet,
        })
        .collect();

    Ok(Json(tweets))
}

/// GET /api/users/:id/replied_tweets
pub async fn get_user_replies(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<UserReply>>, ApiError> {
    ensure_user_exists(&state, id)?;
    Ok(Json(state.db.replies_of_user(id)?))
}

#[derive(Debug, Serialize)]
pub struct LikedTweetResponse {
    #[serde(flatten)]
    pub like: LikedTweet,
    pub is_liked: bool,
}

/// GET /api/users/:id/likes
pub async fn get_user_likes(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LikedTweetResponse>>, ApiError> {
    ensure_user_exists(&state, id)?;

    let liked = current.0.liked_tweet_ids();
    let likes = state
        .db
        .liked_tweets_of_user(id)?
        .into_iter()
        .map(|like| LikedTweetResponse {
            is_liked: liked.contains(&like.tweet_id),
            like,
        })
        .collect();

    Ok(Json(likes))
}

#[derive(Debug, Serialize)]
pub struct FollowerResponse {
    pub follower_id: Uuid,
    pub name: String,
    pub avatar: String,
    pub introduction: Option<String>,
    pub is_following: bool,
}

/// GET /api/users/:id/followers
pub async fn get_user_followers(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<FollowerResponse>>, ApiError> {
    ensure_user_exists(&state, id)?;

    let me = &current.0;
    let followers = state
        .db
        .followers_of(id)?
        .into_iter()
        .map(|p: FollowProfile| FollowerResponse {
            is_following: me.is_following(p.id),
            follower_id: p.id,
            name: p.name,
            avatar: p.avatar,
            introduction: p.introduction,
        })
        .collect();

    Ok(Json(followers))
}

#[derive(Debug, Serialize)]
pub struct FollowingResponse {
    pub following_id: Uuid,
    pub name: String,
    pub avatar: String,
    pub introduction: Option<String>,
    pub is_following: bool,
}

/// GET /api/users/:id/followings
pub async fn get_user_followings(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<FollowingResponse>>, ApiError> {
    ensure_user_exists(&state, id)?;

    let me = &current.0;
    let followings = state
        .db
        .followings_of(id)?
        .into_iter()
        .map(|p: FollowProfile| FollowingResponse {
            is_following: me.is_following(p.id),
            following_id: p.id,
            name: p.name,
            avatar: p.avatar,
            introduction: p.introduction,
        })
        .collect();

    Ok(Json(followings))
}

#[derive(Debug, Deserialize)]
pub struct RankQuery {
    pub order: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RankedUserResponse {
    #[serde(flatten)]
    pub user: RankedUser,
    pub is_following: bool,
}

/// GET /api/followers: follower-count leaderboard, caller excluded
pub async fn get_followers_rank(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<RankQuery>,
) -> Result<Json<Vec<RankedUserResponse>>, ApiError> {
    let order = match params.order.as_deref() {
        None => SortOrder::Desc,
        Some(raw) => SortOrder::from_str(raw)
            .ok_or_else(|| ApiError::validation("order must be ASC or DESC"))?,
    };
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let me = &current.0;
    let users = state
        .db
        .followers_rank(me.user.id, order, limit)?
        .into_iter()
        .map(|user| RankedUserResponse {
            is_following: me.is_following(user.id),
            user,
        })
        .collect();

    Ok(Json(users))
}

fn ensure_user_exists(state: &AppState, id: Uuid) -> Result<(), ApiError> {
    state
        .db
        .get_user_by_id(id)?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("user not found"))
}
