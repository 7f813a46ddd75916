//! `POST /api/submit`: relays the scan form to the webhook.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::auth::AuthUser;
use crate::state::AppState;

pub const PROXY_ERROR: &str = "Failed to call scan webhook";

/// Body returned whenever the upstream call fails, whatever the cause.
#[derive(Debug, Serialize)]
pub struct ProxyFailure {
    pub error: &'static str,
    pub details: String,
}

impl ProxyFailure {
    fn new(details: impl Into<String>) -> Self {
        Self {
            error: PROXY_ERROR,
            details: details.into(),
        }
    }
}

impl IntoResponse for ProxyFailure {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

/// POST /api/submit
///
/// The body is forwarded as-is. On success the upstream status and JSON body
/// are returned unchanged; every failure becomes a 500 `ProxyFailure`.
pub async fn handle_submit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let payload = match body {
        Ok(Json(payload)) => payload,
        Err(rejection) => return ProxyFailure::new(rejection.body_text()).into_response(),
    };

    match state.scanner.forward(&payload).await {
        Ok(reply) => {
            let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::OK);
            (status, Json(reply.body)).into_response()
        }
        Err(e) => {
            warn!(user_id = user.id_or_unknown(), "Proxy error: {e}");
            ProxyFailure::new(e.to_string()).into_response()
        }
    }
}
