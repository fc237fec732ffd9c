//! Slack ingress: request signing, payload shapes, message formatting and the
//! outbound Web API client.

pub mod client;
pub mod format;
pub mod signature;

use std::sync::OnceLock;

use regex::Regex;
use rei_core::help::COMMAND_PREFIX;
use serde::Deserialize;

/// Fields of a slash-command POST that the gateway uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlashCommand {
    pub user_id: String,
    pub user_name: Option<String>,
    pub command: Option<String>,
    pub text: String,
    pub response_url: Option<String>,
}

impl SlashCommand {
    /// Decode the `application/x-www-form-urlencoded` body.
    pub fn from_form(body: &[u8]) -> Self {
        let mut cmd = SlashCommand::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "user_id" => cmd.user_id = value.into_owned(),
                "user_name" => cmd.user_name = Some(value.into_owned()),
                "command" => cmd.command = Some(value.into_owned()),
                "text" => cmd.text = value.into_owned(),
                "response_url" => cmd.response_url = Some(value.into_owned()).filter(|u| !u.is_empty()),
                _ => {}
            }
        }
        cmd
    }

    /// Command text with a leading `/rei` removed, if the user typed it.
    pub fn command_text(&self) -> &str {
        strip_command_prefix(&self.text)
    }
}

pub fn strip_command_prefix(text: &str) -> &str {
    let trimmed = text.trim_start();
    match trimmed.strip_prefix(COMMAND_PREFIX) {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => trimmed.trim_end(),
    }
}

static MENTION_RE: OnceLock<Regex> = OnceLock::new();

/// Remove `<@U123>` user mentions.
pub fn strip_mentions(text: &str) -> String {
    let re = MENTION_RE.get_or_init(|| Regex::new(r"<@[A-Z0-9]+>").expect("static pattern"));
    re.replace_all(text, "").trim().to_string()
}

// ---------------------------------------------------------------------------
// Events API payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    UrlVerification { challenge: String },
    EventCallback { event: MessageEvent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub channel_type: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
}

impl MessageEvent {
    /// Question text if this event should be answered by the `ask` tool.
    ///
    /// Mentions are always answered (an empty mention gets a greeting, hence
    /// `Some("")`). Plain messages only count in direct messages and never
    /// when they look like a slash command. Bot messages are ignored.
    pub fn question(&self) -> Option<String> {
        if self.bot_id.is_some() || self.subtype.is_some() || self.user.is_none() {
            return None;
        }
        match self.kind.as_str() {
            "app_mention" => Some(strip_mentions(&self.text)),
            "message" if self.channel_type.as_deref() == Some("im") => {
                let text = self.text.trim();
                if text.is_empty() || text.starts_with('/') {
                    None
                } else {
                    Some(text.to_string())
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_slash_form() {
        let body = b"user_id=U1&user_name=dana&command=%2Frei&text=buyers+Dallas%2C+TX&response_url=https%3A%2F%2Fhooks.slack.com%2Fx";
        let cmd = SlashCommand::from_form(body);
        assert_eq!(cmd.user_id, "U1");
        assert_eq!(cmd.command.as_deref(), Some("/rei"));
        assert_eq!(cmd.text, "buyers Dallas, TX");
        assert_eq!(cmd.response_url.as_deref(), Some("https://hooks.slack.com/x"));
    }

    #[test]
    fn strips_command_prefix() {
        assert_eq!(strip_command_prefix("/rei lookup 1 Main"), "lookup 1 Main");
        assert_eq!(strip_command_prefix("  /rei"), "");
        assert_eq!(strip_command_prefix("lookup 1 Main "), "lookup 1 Main");
        assert_eq!(strip_command_prefix("/reindex"), "/reindex");
    }

    #[test]
    fn strips_mentions() {
        assert_eq!(strip_mentions("<@U0BOT> what's MAO?"), "what's MAO?");
        assert_eq!(strip_mentions("<@U0BOT>"), "");
    }

    #[test]
    fn mention_and_dm_become_questions() {
        let mention: EventEnvelope = serde_json::from_value(serde_json::json!({
            "type": "event_callback",
            "event": { "type": "app_mention", "user": "U1", "text": "<@U0BOT> hi", "channel": "C1" }
        }))
        .unwrap();
        let EventEnvelope::EventCallback { event } = mention else {
            panic!("expected callback");
        };
        assert_eq!(event.question().as_deref(), Some("hi"));

        let dm: MessageEvent = serde_json::from_value(serde_json::json!({
            "type": "message", "user": "U1", "text": "comps?", "channel_type": "im"
        }))
        .unwrap();
        assert_eq!(dm.question().as_deref(), Some("comps?"));

        let channel: MessageEvent = serde_json::from_value(serde_json::json!({
            "type": "message", "user": "U1", "text": "comps?", "channel_type": "channel"
        }))
        .unwrap();
        assert_eq!(channel.question(), None);

        let bot: MessageEvent = serde_json::from_value(serde_json::json!({
            "type": "message", "user": "U1", "bot_id": "B1", "text": "echo", "channel_type": "im"
        }))
        .unwrap();
        assert_eq!(bot.question(), None);
    }

    #[test]
    fn unknown_envelope_is_tolerated() {
        let env: EventEnvelope =
            serde_json::from_value(serde_json::json!({ "type": "app_rate_limited" })).unwrap();
        assert!(matches!(env, EventEnvelope::Other));
    }
}
