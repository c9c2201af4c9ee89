//! API Router
//! Mission: Wire public, authenticated, and admin route groups

use crate::api::{admin, followships, replies, tweets, users};
use crate::auth::{authenticated, authenticated_admin, AuthVerifier, JwtHandler, LocalStrategy};
use crate::middleware::request_logging;
use crate::storage::Database;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub jwt: Arc<JwtHandler>,
    pub local: LocalStrategy,
}

/// Build the full application router.
///
/// The strategy and verifier are constructed here and owned by the router
/// state; middleware receives them explicitly rather than through any
/// process-wide registration.
pub fn create_router(db: Arc<Database>, jwt: Arc<JwtHandler>) -> Router {
    let state = AppState {
        db: db.clone(),
        jwt: jwt.clone(),
        local: LocalStrategy::new(db.clone()),
    };
    let verifier = AuthVerifier { db, jwt };

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/users", post(users::signup))
        .route("/api/:role/signin", post(users::signin));

    let admin_routes = Router::new()
        .route("/api/admin/users", get(admin::get_users))
        .route("/api/admin/tweets/:id", delete(admin::remove_tweet))
        .route_layer(middleware::from_fn(authenticated_admin));

    let protected_routes = Router::new()
        .route("/api/followers", get(users::get_followers_rank))
        .route("/api/users/:id/followings", get(users::get_user_followings))
        .route("/api/users/:id/followers", get(users::get_user_followers))
        .route("/api/users/:id/likes", get(users::get_user_likes))
        .route(
            "/api/users/:id/replied_tweets",
            get(users::get_user_replies),
        )
        .route("/api/users/:id/tweets", get(users::get_user_tweets))
        .route("/api/users/:id/account", put(users::edit_user_account))
        .route(
            "/api/users/:id",
            get(users::get_user).put(users::edit_user_profile),
        )
        .route("/api/followships", post(followships::add_followship))
        .route(
            "/api/followships/:following_id",
            delete(followships::remove_followship),
        )
        .route(
            "/api/tweets/:id/replies",
            get(replies::get_replies).post(replies::post_reply),
        )
        .route("/api/tweets/:id/like", post(tweets::add_like))
        .route("/api/tweets/:id/unlike", post(tweets::remove_like))
        .route("/api/tweets/:id", get(tweets::get_tweet))
        .route("/api/tweets", get(tweets::get_tweets).post(tweets::post_tweet))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(verifier, authenticated));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Liveness probe
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
