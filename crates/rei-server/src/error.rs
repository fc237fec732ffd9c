use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rei_core::error::ReiError;

// ---------------------------------------------------------------------------
// Sentinels carried through the anyhow chain
// ---------------------------------------------------------------------------

/// The caller could not be authenticated. Never reaches the dispatcher.
#[derive(Debug)]
struct Unauthenticated(String);

impl std::fmt::Display for Unauthenticated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for Unauthenticated {}

#[derive(Debug)]
struct BadRequest(String);

impl std::fmt::Display for BadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequest {}

// ---------------------------------------------------------------------------
// AppError
// ---------------------------------------------------------------------------

/// Error type for routes that fail before a dispatch result exists.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self(Unauthenticated(msg.into()).into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequest(msg.into()).into())
    }

    pub fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<Unauthenticated>().is_some() {
            return StatusCode::UNAUTHORIZED;
        }
        if self.0.downcast_ref::<BadRequest>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        match self.0.downcast_ref::<ReiError>() {
            Some(e) => match e {
                ReiError::InvalidToken(_) | ReiError::TokenExpired => StatusCode::UNAUTHORIZED,
                ReiError::UserNotFound(_) => StatusCode::NOT_FOUND,
                ReiError::UserExists(_) => StatusCode::CONFLICT,
                ReiError::InvalidRole(_) | ReiError::InvalidTool(_) => StatusCode::BAD_REQUEST,
                ReiError::NotInitialized => StatusCode::SERVICE_UNAVAILABLE,
                ReiError::ActivityDb(_)
                | ReiError::Io(_)
                | ReiError::Yaml(_)
                | ReiError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status == StatusCode::UNAUTHORIZED {
            serde_json::json!({ "error": self.0.to_string(), "reason": "unauthenticated" })
        } else {
            serde_json::json!({ "error": self.0.to_string() })
        };
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
