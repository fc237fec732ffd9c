use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use rei_core::actor::Actor;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// The actor behind a REST request, resolved from its bearer token.
///
/// Resolution order:
/// 1. token auth not configured → 401
/// 2. `Authorization: Bearer <token>` missing or malformed → 401
/// 3. bad signature or expired → 401
/// 4. subject not in the user directory → 401
/// 5. otherwise the current user record, active or not; disabled accounts
///    are refused by the dispatcher so the attempt is recorded
pub struct BearerActor(pub Actor);

impl FromRequestParts<AppState> for BearerActor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        resolve(state, header).await.map(BearerActor)
    }
}

pub async fn resolve(state: &AppState, header: Option<&str>) -> Result<Actor, AppError> {
    if state.config.auth.token_secret.is_empty() {
        return Err(AppError::unauthenticated("token authentication is not configured"));
    }
    let token = header
        .and_then(bearer_token)
        .ok_or_else(|| AppError::unauthenticated("missing bearer token"))?;

    let claims = state.signer.verify(token, Utc::now()).map_err(|e| {
        debug!(error = %e, "rejected bearer token");
        AppError::unauthenticated(e.to_string())
    })?;

    let users = state.users.read().await;
    let user = users
        .get(&claims.sub)
        .ok_or_else(|| AppError::unauthenticated("unknown token subject"))?;
    Ok(user.to_actor())
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
