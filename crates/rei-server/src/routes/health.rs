use axum::Json;
use chrono::Utc;

/// GET /health: liveness probe, no authentication.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
