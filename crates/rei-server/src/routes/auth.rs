use axum::Json;

use crate::auth::BearerActor;

/// GET /api/v1/auth/me: the actor the bearer token resolves to.
pub async fn me(BearerActor(actor): BearerActor) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "id": actor.id,
        "email": actor.email,
        "name": actor.name,
        "role": actor.role,
        "slack_user_id": actor.slack_user_id,
        "active": actor.active,
    }))
}
