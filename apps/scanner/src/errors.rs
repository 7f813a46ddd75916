use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::session::SessionError;
use crate::auth::store::StoreError;

pub const SIGNUP_FAILED_MESSAGE: &str = "An error occurred during signup";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Unreadable signup body or a failure while registering. Details are
    /// logged; the client only sees a fixed message.
    #[error("Signup failed: {0}")]
    SignupFailed(String),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmailTaken => {
                AppError::Conflict("User with this email already exists".to_string())
            }
            StoreError::NotFound => AppError::NotFound("User not found".to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Invalid(_) => AppError::Unauthorized,
            SessionError::Encode(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, "ALREADY_EXISTS", msg.clone()),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".to_string(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::OAuth(msg) => {
                tracing::error!("OAuth error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "OAUTH_ERROR",
                    "Sign-in with the identity provider failed".to_string(),
                )
            }
            AppError::SignupFailed(details) => {
                tracing::error!("Signup failed: {details}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SIGNUP_FAILED",
                    SIGNUP_FAILED_MESSAGE.to_string(),
                )
            }
            AppError::Template(e) => {
                tracing::error!("Template error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "message": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
