use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Liveness check; does not touch the webhook.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-scanner"
    }))
}
