use crate::dispatch::ToolTimeouts;
use crate::error::{ReiError, Result};
use crate::paths;
use crate::types::Tool;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const ENV_TOKEN_SECRET: &str = "REI_TOKEN_SECRET";
pub const ENV_SLACK_SIGNING_SECRET: &str = "SLACK_SIGNING_SECRET";
pub const ENV_SLACK_BOT_TOKEN: &str = "SLACK_BOT_TOKEN";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub token_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: i64,
}

fn default_token_ttl() -> i64 {
    crate::token::DEFAULT_TTL_HOURS
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            token_ttl_hours: default_token_ttl(),
        }
    }
}

// ---------------------------------------------------------------------------
// SlackConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub signing_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    /// Maximum clock skew accepted on `X-Slack-Request-Timestamp`.
    #[serde(default = "default_tolerance")]
    pub tolerance_secs: u64,
    /// Time allowed before a slash command is acknowledged and the answer
    /// moves to `response_url`.
    #[serde(default = "default_ack_budget")]
    pub ack_budget_ms: u64,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_tolerance() -> u64 {
    300
}

fn default_ack_budget() -> u64 {
    2500
}

fn default_api_base() -> String {
    "https://slack.com/api".to_string()
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            bot_token: None,
            tolerance_secs: default_tolerance(),
            ack_budget_ms: default_ack_budget(),
            api_base: default_api_base(),
        }
    }
}

// ---------------------------------------------------------------------------
// ToolsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,
    /// Per-tool timeout overrides, keyed by tool name.
    #[serde(default)]
    pub timeouts: BTreeMap<String, u64>,
    /// Upstream endpoint per tool, keyed by tool name.
    #[serde(default)]
    pub upstreams: BTreeMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    crate::dispatch::DEFAULT_TIMEOUT.as_secs()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_timeout_secs(),
            timeouts: BTreeMap::new(),
            upstreams: BTreeMap::new(),
        }
    }
}

impl ToolsConfig {
    /// Timeouts for the dispatcher. Unknown tool names are skipped; `validate`
    /// reports them.
    pub fn tool_timeouts(&self) -> ToolTimeouts {
        let mut timeouts = ToolTimeouts::uniform(Duration::from_secs(self.default_timeout_secs));
        for (name, secs) in &self.timeouts {
            if let Ok(tool) = name.parse::<Tool>() {
                timeouts = timeouts.with(tool, Duration::from_secs(*secs));
            }
        }
        timeouts
    }

    /// Configured upstreams with their tools resolved.
    pub fn upstreams(&self) -> Vec<(Tool, String)> {
        self.upstreams
            .iter()
            .filter_map(|(name, url)| name.parse::<Tool>().ok().map(|t| (t, url.clone())))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            slack: SlackConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(ReiError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Overlay secrets from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(v) = non_empty(ENV_TOKEN_SECRET) {
            self.auth.token_secret = v;
        }
        if let Some(v) = non_empty(ENV_SLACK_SIGNING_SECRET) {
            self.slack.signing_secret = v;
        }
        if let Some(v) = non_empty(ENV_SLACK_BOT_TOKEN) {
            self.slack.bot_token = Some(v);
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.auth.token_secret.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "auth.token_secret is empty; REST requests will be rejected (set {ENV_TOKEN_SECRET})"
                ),
            });
        }
        if self.auth.token_ttl_hours <= 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "auth.token_ttl_hours must be positive".to_string(),
            });
        }
        if self.slack.signing_secret.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "slack.signing_secret is empty; Slack requests will be rejected (set {ENV_SLACK_SIGNING_SECRET})"
                ),
            });
        }
        if self.tools.default_timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "tools.default_timeout_secs must be greater than zero".to_string(),
            });
        }

        for (name, secs) in &self.tools.timeouts {
            if name.parse::<Tool>().is_err() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("unknown tool '{name}' in tools.timeouts"),
                });
            } else if *secs == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("tools.timeouts.{name} must be greater than zero"),
                });
            }
        }

        for (name, url) in &self.tools.upstreams {
            match name.parse::<Tool>() {
                Err(_) => warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("unknown tool '{name}' in tools.upstreams"),
                }),
                Ok(Tool::Help | Tool::ActivityLog) => warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("tool '{name}' is built in; its upstream is ignored"),
                }),
                Ok(_) => {}
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("tools.upstreams.{name} is not an http(s) URL: '{url}'"),
                });
            }
        }

        warnings
    }
}
