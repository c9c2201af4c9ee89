//! Authorization Middleware
//! Mission: Gate protected routes on a verified identity, admin routes on role

use crate::auth::jwt::JwtHandler;
use crate::auth::models::AuthenticatedIdentity;
use crate::error::ApiError;
use crate::storage::Database;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Extension,
};
use std::sync::Arc;
use uuid::Uuid;

/// Verification state handed to the bearer gate at router setup.
/// No global registration: whoever builds the router owns these values.
#[derive(Clone)]
pub struct AuthVerifier {
    pub db: Arc<Database>,
    pub jwt: Arc<JwtHandler>,
}

/// Request-scoped identity attached by [`authenticated`]
#[derive(Clone)]
pub struct CurrentUser(pub Arc<AuthenticatedIdentity>);

/// Identity-presence gate: extract the bearer token, verify it, and
/// rehydrate the identity from the live store.
///
/// Only the token's subject id is trusted; follow and like sets are
/// re-read on every request so authorization never relies on the
/// sign-in-time snapshot. A token whose subject has been deleted since
/// issuance is rejected like any other bad token.
pub async fn authenticated(
    State(verifier): State<AuthVerifier>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::authentication("authentication required"))?;

    let claims = verifier
        .jwt
        .verify(token)
        .map_err(|_| ApiError::authentication("invalid or expired token"))?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::authentication("invalid or expired token"))?;

    let user = verifier
        .db
        .get_user_by_id(user_id)?
        .ok_or_else(|| ApiError::authentication("account no longer exists"))?;

    let following_ids = verifier.db.following_ids(user.id)?;
    let follower_ids = verifier.db.follower_ids(user.id)?;
    let likes = verifier.db.likes_of_user(user.id)?;

    let identity = AuthenticatedIdentity {
        user,
        following_ids,
        follower_ids,
        likes: Some(likes),
    };

    req.extensions_mut().insert(CurrentUser(Arc::new(identity)));

    Ok(next.run(req).await)
}

/// Role gate for admin-only routes; must be layered inside
/// [`authenticated`] so the identity is already attached.
pub async fn authenticated_admin(
    Extension(current): Extension<CurrentUser>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !current.0.is_admin() {
        return Err(ApiError::forbidden("admin permission required"));
    }

    Ok(next.run(req).await)
}
