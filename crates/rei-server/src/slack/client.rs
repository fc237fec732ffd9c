use serde::Deserialize;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("no slack bot token is configured")]
    MissingBotToken,
    #[error("slack api request failed: {0}")]
    ApiRequest(String),
    #[error("slack api responded with error `{0}`")]
    ApiResponse(String),
}

#[derive(Debug, Deserialize)]
struct SlackEnvelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Outbound Slack calls: Web API with the bot token, and `response_url`
/// follow-ups for slash commands.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: Option<String>,
}

impl SlackClient {
    pub fn new(http: reqwest::Client, api_base: &str, bot_token: Option<String>) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn has_bot_token(&self) -> bool {
        self.bot_token.is_some()
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<(), SlackError> {
        let token = self.bot_token.as_deref().ok_or(SlackError::MissingBotToken)?;
        let mut body = json!({
            "channel": channel,
            "text": text,
        });
        if let Some(ts) = thread_ts.filter(|v| !v.trim().is_empty()) {
            body["thread_ts"] = json!(ts);
        }
        let envelope: SlackEnvelope = self
            .http
            .post(self.endpoint("chat.postMessage"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SlackError::ApiRequest(e.to_string()))?
            .json()
            .await
            .map_err(|e| SlackError::ApiRequest(e.to_string()))?;
        if !envelope.ok {
            return Err(SlackError::ApiResponse(
                envelope
                    .error
                    .unwrap_or_else(|| "chat.postMessage failed".to_string()),
            ));
        }
        Ok(())
    }

    /// Deliver a delayed slash-command answer.
    pub async fn respond(
        &self,
        response_url: &str,
        message: &serde_json::Value,
    ) -> Result<(), SlackError> {
        let resp = self
            .http
            .post(response_url)
            .json(message)
            .send()
            .await
            .map_err(|e| SlackError::ApiRequest(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(SlackError::ApiResponse(format!(
                "response_url returned {}",
                resp.status().as_u16()
            )));
        }
        Ok(())
    }
}
