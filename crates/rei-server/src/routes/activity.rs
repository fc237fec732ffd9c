use axum::extract::{Query, State};
use rei_core::command::Command;
use rei_core::types::{Source, Tool};
use serde::Deserialize;

use crate::auth::BearerActor;
use crate::response::DispatchResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ActivityParams {
    pub actor: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub limit: Option<String>,
}

/// GET /api/v1/activity: the activity-log tool over query parameters.
///
/// Goes through the dispatcher like any other tool, so the role policy
/// applies and the query itself is recorded.
pub async fn list_activity(
    State(app): State<AppState>,
    BearerActor(actor): BearerActor,
    Query(params): Query<ActivityParams>,
) -> DispatchResponse {
    let raw_args = [
        ("actor", params.actor),
        ("since", params.since),
        ("until", params.until),
        ("limit", params.limit),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.map(|v| format!("{key}={v}")))
    .collect();

    let command = Command {
        tool: Tool::ActivityLog,
        raw_args,
        source: Source::Api,
    };
    DispatchResponse(app.dispatcher.dispatch(&actor, &command).await)
}
