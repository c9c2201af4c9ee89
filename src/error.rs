//! Centralized Error Channel
//! Mission: Funnel every handler failure through one response formatter

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Crate-wide API error. Handlers raise the specific variant; the
/// `IntoResponse` impl is the single place status codes and the response
/// shape are decided.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or missing input (400)
    Validation(String),
    /// Bad credentials, bad/expired token, unknown role (401)
    Authentication(String),
    /// Authenticated but not allowed (403)
    Forbidden(String),
    /// Referenced entity absent (404)
    NotFound(String),
    /// Duplicate account/email/edge (409)
    Conflict(String),
    /// Store or signing failure (500); message never leaves the process
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(err) => {
                error!("internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({ "status": "error", "message": message })),
        )
            .into_response()
    }
}
