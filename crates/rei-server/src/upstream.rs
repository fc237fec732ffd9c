//! Bridge handler forwarding a tool call to a configured HTTP endpoint.
//!
//! The endpoint receives
//! `{tool, args, text, actor: {id, email, role}, location?}` and answers
//! with the JSON payload returned to the caller as-is.

use async_trait::async_trait;
use reqwest::StatusCode;
use rei_core::actor::Actor;
use rei_core::dispatch::{HandlerError, ToolHandler};
use rei_core::help::COMMAND_PREFIX;
use rei_core::location::parse_location;
use rei_core::types::Tool;
use serde_json::json;
use tracing::debug;

pub struct UpstreamHandler {
    tool: Tool,
    url: String,
    client: reqwest::Client,
}

impl UpstreamHandler {
    pub fn new(tool: Tool, url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            tool,
            url: url.into(),
            client,
        }
    }

    fn request_body(&self, actor: &Actor, args: &[String]) -> serde_json::Value {
        let text = args.join(" ");
        let mut body = json!({
            "tool": self.tool.as_str(),
            "args": args,
            "text": text,
            "actor": {
                "id": actor.id,
                "email": actor.email,
                "role": actor.role,
            },
        });
        if matches!(self.tool, Tool::Search | Tool::Buyers) {
            body["location"] = json!(parse_location(&text));
        }
        body
    }
}

#[async_trait]
impl ToolHandler for UpstreamHandler {
    async fn invoke(
        &self,
        actor: &Actor,
        args: &[String],
    ) -> Result<serde_json::Value, HandlerError> {
        if args.is_empty() {
            return Err(HandlerError::InvalidArguments(missing_args_message(self.tool)));
        }

        debug!(tool = %self.tool, url = %self.url, "calling upstream");
        let response = self
            .client
            .post(&self.url)
            .json(&self.request_body(actor, args))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
            return Err(HandlerError::UpstreamTimeout);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HandlerError::Upstream(format!(
                "upstream returned {}: {}",
                status.as_u16(),
                error_detail(&body)
            )));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| HandlerError::Upstream(format!("invalid upstream response: {e}")))
    }
}

fn transport_error(e: reqwest::Error) -> HandlerError {
    if e.is_timeout() {
        HandlerError::UpstreamTimeout
    } else {
        HandlerError::Upstream(e.to_string())
    }
}

/// Pull `error` or `detail` out of a JSON error body, else the raw text.
fn error_detail(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| v.get("error").or_else(|| v.get("detail")))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

pub fn missing_args_message(tool: Tool) -> String {
    let what = match tool {
        Tool::Lookup | Tool::Skip => "Please provide an address.",
        Tool::Search | Tool::Buyers => "Please provide a location.",
        Tool::Ask => "Please ask a question.",
        Tool::ActivityLog | Tool::Help => "Missing arguments.",
    };
    match tool.example() {
        Some(example) => format!("{what} Example: `{COMMAND_PREFIX} {example}`"),
        None => what.to_string(),
    }
}
