use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use rei_core::command::Command;
use rei_core::help::COMMAND_PREFIX;
use rei_core::types::{Source, Tool};
use serde_json::json;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::slack::{format, signature, EventEnvelope, MessageEvent, SlashCommand};
use crate::state::AppState;

const RETRY_HEADER: &str = "x-slack-retry-num";

fn verify_signature(app: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), AppError> {
    signature::verify(
        &app.config.slack.signing_secret,
        headers,
        body,
        Utc::now().timestamp(),
        app.config.slack.tolerance_secs,
    )
    .map_err(|e| {
        warn!(error = %e, "rejected slack request");
        AppError::unauthenticated(format!("invalid slack request: {e}"))
    })
}

/// Argument text after the tool token, for reply formatting.
fn args_of(text: &str) -> String {
    text.split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim().to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// POST /slack/commands
// ---------------------------------------------------------------------------

/// POST /slack/commands: `/rei <tool> <args>`.
///
/// Answers inline when the dispatch finishes within the acknowledgement
/// budget. Otherwise replies with an acknowledgement and posts the final
/// message to `response_url` when it is ready.
pub async fn slash_command(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    verify_signature(&app, &headers, &body)?;

    let cmd = SlashCommand::from_form(&body);
    if cmd.user_id.is_empty() {
        return Err(AppError::bad_request("slash command without user_id"));
    }
    let actor = app.users.read().await.resolve_slack(&cmd.user_id);
    let text = cmd.command_text().to_string();
    let args = args_of(&text);

    let dispatcher = app.dispatcher.clone();
    let task_actor = actor.clone();
    let task_text = text.clone();
    let mut task = tokio::spawn(async move {
        dispatcher
            .dispatch_text(&task_actor, &task_text, Source::Slack)
            .await
    });

    let budget = Duration::from_millis(app.config.slack.ack_budget_ms);
    match tokio::time::timeout(budget, &mut task).await {
        Ok(joined) => {
            let result = joined.map_err(|e| anyhow::anyhow!("dispatch task failed: {e}"))?;
            Ok(Json(format::render(&result, &args, &actor)))
        }
        Err(_) => {
            let Some(url) = cmd.response_url else {
                let result = task
                    .await
                    .map_err(|e| anyhow::anyhow!("dispatch task failed: {e}"))?;
                return Ok(Json(format::render(&result, &args, &actor)));
            };
            info!(actor = %actor.id, "slash command exceeded ack budget; answering via response_url");
            let slack = app.slack.clone();
            let ack_args = args.clone();
            tokio::spawn(async move {
                match task.await {
                    Ok(result) => {
                        let message = format::render(&result, &args, &actor);
                        if let Err(e) = slack.respond(&url, &message).await {
                            warn!(error = %e, "failed to deliver delayed slash command reply");
                        }
                    }
                    Err(e) => error!(error = %e, "dispatch task failed"),
                }
            });
            Ok(Json(format::ack(&ack_args)))
        }
    }
}

// ---------------------------------------------------------------------------
// POST /slack/events
// ---------------------------------------------------------------------------

/// POST /slack/events: Events API callbacks.
///
/// Mentions and direct messages are answered by the `ask` tool. The reply is
/// posted with `chat.postMessage` after the callback has been acknowledged.
pub async fn events(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    verify_signature(&app, &headers, &body)?;

    let envelope: EventEnvelope = serde_json::from_slice(&body)
        .map_err(|e| AppError::bad_request(format!("invalid event payload: {e}")))?;

    match envelope {
        EventEnvelope::UrlVerification { challenge } => Ok(Json(json!({ "challenge": challenge }))),
        EventEnvelope::EventCallback { event } => {
            // Retries redeliver events already being handled.
            if headers.contains_key(RETRY_HEADER) {
                return Ok(Json(json!({ "ok": true })));
            }
            if let Some(question) = event.question() {
                tokio::spawn(answer_event(app, event, question));
            }
            Ok(Json(json!({ "ok": true })))
        }
        EventEnvelope::Other => Ok(Json(json!({ "ok": true }))),
    }
}

async fn answer_event(app: AppState, event: MessageEvent, question: String) {
    let Some(user) = event.user.as_deref() else {
        return;
    };
    let actor = app.users.read().await.resolve_slack(user);

    let reply = if question.is_empty() {
        format!("Hey! Use `{COMMAND_PREFIX} help` to see what I can do, or just ask me a question!")
    } else {
        let command = Command::new(Tool::Ask, &question, Source::Slack);
        let result = app.dispatcher.dispatch(&actor, &command).await;
        format::plain_text(&result, &actor)
    };
    let text = if event.kind == "app_mention" {
        format!("<@{user}> {reply}")
    } else {
        reply
    };

    let Some(channel) = event.channel.as_deref() else {
        return;
    };
    if !app.slack.has_bot_token() {
        warn!(channel, "no slack bot token configured; event reply dropped");
        return;
    }
    if let Err(e) = app.slack.post_message(channel, &text, None).await {
        warn!(channel, error = %e, "failed to post event reply");
    }
}
