use axum::body::Bytes;
use axum::extract::{Path, State};
use rei_core::actor::Actor;
use rei_core::command::Command;
use rei_core::dispatch::DispatchResult;
use rei_core::types::{Source, Tool};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::auth::BearerActor;
use crate::error::AppError;
use crate::response::DispatchResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ToolBody {
    #[serde(default)]
    pub args: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommandBody {
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub args: String,
}

/// POST /api/v1/{tool}: run one tool with `{"args": "..."}`. The body may be
/// omitted for tools that take no arguments.
pub async fn run_tool(
    State(app): State<AppState>,
    BearerActor(actor): BearerActor,
    Path(tool): Path<String>,
    body: Bytes,
) -> Result<DispatchResponse, AppError> {
    let body: ToolBody = parse_body(&body)?;
    Ok(DispatchResponse(dispatch(&app, &actor, &tool, &body.args).await))
}

/// POST /api/v1/activity: the `activity` alias of [`run_tool`]. The path is
/// also the GET listing route, so it needs its own handler.
pub async fn run_activity(
    State(app): State<AppState>,
    BearerActor(actor): BearerActor,
    body: Bytes,
) -> Result<DispatchResponse, AppError> {
    let body: ToolBody = parse_body(&body)?;
    let tool = Tool::ActivityLog.as_str();
    Ok(DispatchResponse(dispatch(&app, &actor, tool, &body.args).await))
}

/// POST /api/v1/commands: `{"tool": "...", "args": "..."}`.
pub async fn run_command(
    State(app): State<AppState>,
    BearerActor(actor): BearerActor,
    body: Bytes,
) -> Result<DispatchResponse, AppError> {
    let body: CommandBody = parse_body(&body)?;
    Ok(DispatchResponse(dispatch(&app, &actor, &body.tool, &body.args).await))
}

/// An empty body is the default value; anything else must be valid JSON.
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::bad_request(format!("invalid JSON body: {e}")))
}

async fn dispatch(app: &AppState, actor: &Actor, tool: &str, args: &str) -> DispatchResult {
    let token = tool.trim();
    if token.is_empty() {
        return app.dispatcher.dispatch(actor, &Command::help(Source::Api)).await;
    }
    match token.parse::<Tool>() {
        Ok(Tool::Help) => app.dispatcher.dispatch(actor, &Command::help(Source::Api)).await,
        Ok(t) => {
            app.dispatcher
                .dispatch(actor, &Command::new(t, args, Source::Api))
                .await
        }
        Err(_) => app
            .dispatcher
            .reject_unknown(actor, token, args.trim(), Source::Api)
            .await,
    }
}
