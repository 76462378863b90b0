use axum::response::Json;
use serde_json::{json, Value};

/// Liveness probe served at `/sd/health`.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
