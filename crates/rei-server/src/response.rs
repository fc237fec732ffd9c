use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rei_core::dispatch::DispatchResult;
use rei_core::types::Reason;
use serde_json::json;

/// HTTP status for a dispatch outcome.
pub fn status_for(result: &DispatchResult) -> StatusCode {
    match result.reason {
        None => StatusCode::OK,
        Some(Reason::AccountDisabled | Reason::InsufficientRole) => StatusCode::FORBIDDEN,
        Some(Reason::UnknownCommand | Reason::InvalidArguments) => StatusCode::BAD_REQUEST,
        Some(Reason::UpstreamTimeout) => StatusCode::GATEWAY_TIMEOUT,
        Some(Reason::UpstreamError) => StatusCode::BAD_GATEWAY,
        Some(Reason::HandlerMissing) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `{status, tool, payload}` on success, `{status, tool, error, reason}`
/// otherwise.
pub fn body_for(result: &DispatchResult) -> serde_json::Value {
    match (&result.payload, result.reason) {
        (Some(payload), None) => json!({
            "status": result.outcome,
            "tool": result.tool,
            "payload": payload,
        }),
        (_, reason) => json!({
            "status": result.outcome,
            "tool": result.tool,
            "error": result.message,
            "reason": reason,
        }),
    }
}

pub struct DispatchResponse(pub DispatchResult);

impl IntoResponse for DispatchResponse {
    fn into_response(self) -> Response {
        (status_for(&self.0), Json(body_for(&self.0))).into_response()
    }
}
