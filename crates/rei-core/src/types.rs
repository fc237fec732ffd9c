use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ReiError;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Acquisitions,
    Dispositions,
    Member,
}

impl Role {
    pub fn all() -> &'static [Role] {
        &[
            Role::Admin,
            Role::Manager,
            Role::Acquisitions,
            Role::Dispositions,
            Role::Member,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Acquisitions => "acquisitions",
            Role::Dispositions => "dispositions",
            Role::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ReiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "acquisitions" => Ok(Role::Acquisitions),
            "dispositions" => Ok(Role::Dispositions),
            "member" => Ok(Role::Member),
            _ => Err(ReiError::InvalidRole(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tool
// ---------------------------------------------------------------------------

/// Every operation a user can invoke. `Help` is terminal and never reaches
/// a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    Lookup,
    Search,
    Buyers,
    Skip,
    Ask,
    ActivityLog,
    Help,
}

impl Tool {
    pub fn all() -> &'static [Tool] {
        &[
            Tool::Lookup,
            Tool::Search,
            Tool::Buyers,
            Tool::Skip,
            Tool::Ask,
            Tool::ActivityLog,
            Tool::Help,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Lookup => "lookup",
            Tool::Search => "search",
            Tool::Buyers => "buyers",
            Tool::Skip => "skip",
            Tool::Ask => "ask",
            Tool::ActivityLog => "activity-log",
            Tool::Help => "help",
        }
    }

    /// Command syntax shown in help output.
    pub fn usage(self) -> &'static str {
        match self {
            Tool::Lookup => "lookup [address]",
            Tool::Search => "search [city, state]",
            Tool::Buyers => "buyers [city, state]",
            Tool::Skip => "skip [address]",
            Tool::Ask => "ask [question]",
            Tool::ActivityLog => "activity [actor=<id>] [since=<time>] [until=<time>] [limit=<n>]",
            Tool::Help => "help",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Tool::Lookup => "Get property details",
            Tool::Search => "Find high equity leads",
            Tool::Buyers => "Find cash buyers",
            Tool::Skip => "Get owner contact info",
            Tool::Ask => "Ask the AI assistant anything",
            Tool::ActivityLog => "Review recent team activity",
            Tool::Help => "Show available commands",
        }
    }

    /// Example invocation used when a tool is called without its arguments.
    pub fn example(self) -> Option<&'static str> {
        match self {
            Tool::Lookup => Some("lookup 123 Main St, Plano, TX"),
            Tool::Search => Some("search Plano, TX"),
            Tool::Buyers => Some("buyers Dallas, TX"),
            Tool::Skip => Some("skip 123 Main St, Plano, TX"),
            Tool::Ask => Some("ask What's a good MAO formula?"),
            Tool::ActivityLog | Tool::Help => None,
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tool {
    type Err = ReiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lookup" => Ok(Tool::Lookup),
            "search" => Ok(Tool::Search),
            "buyers" => Ok(Tool::Buyers),
            "skip" => Ok(Tool::Skip),
            "ask" => Ok(Tool::Ask),
            "activity" | "activity-log" | "activity_log" => Ok(Tool::ActivityLog),
            "help" => Ok(Tool::Help),
            _ => Err(ReiError::InvalidTool(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Slack,
    Api,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Slack => "slack",
            Source::Api => "api",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcome / Reason
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Denied,
    Error,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Denied => "denied",
            Outcome::Error => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a dispatch did not succeed. `AccountDisabled` and `InsufficientRole`
/// are the only reasons paired with `Outcome::Denied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    AccountDisabled,
    InsufficientRole,
    UnknownCommand,
    InvalidArguments,
    UpstreamTimeout,
    UpstreamError,
    HandlerMissing,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::AccountDisabled => "account_disabled",
            Reason::InsufficientRole => "insufficient_role",
            Reason::UnknownCommand => "unknown_command",
            Reason::InvalidArguments => "invalid_arguments",
            Reason::UpstreamTimeout => "upstream_timeout",
            Reason::UpstreamError => "upstream_error",
            Reason::HandlerMissing => "handler_missing",
        }
    }

    pub fn outcome(self) -> Outcome {
        match self {
            Reason::AccountDisabled | Reason::InsufficientRole => Outcome::Denied,
            _ => Outcome::Error,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_parse_is_case_insensitive() {
        assert_eq!("LOOKUP".parse::<Tool>().unwrap(), Tool::Lookup);
        assert_eq!("Buyers".parse::<Tool>().unwrap(), Tool::Buyers);
    }

    #[test]
    fn activity_aliases_resolve_to_one_tool() {
        for alias in ["activity", "activity-log", "activity_log"] {
            assert_eq!(alias.parse::<Tool>().unwrap(), Tool::ActivityLog);
        }
    }

    #[test]
    fn tool_names_round_trip_through_as_str() {
        for tool in Tool::all() {
            assert_eq!(tool.as_str().parse::<Tool>().unwrap(), *tool);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = "owner".parse::<Role>().unwrap_err();
        assert!(matches!(err, ReiError::InvalidRole(ref s) if s == "owner"));
    }

    #[test]
    fn denial_reasons_map_to_denied_outcome() {
        assert_eq!(Reason::AccountDisabled.outcome(), Outcome::Denied);
        assert_eq!(Reason::InsufficientRole.outcome(), Outcome::Denied);
        assert_eq!(Reason::UpstreamTimeout.outcome(), Outcome::Error);
        assert_eq!(Reason::HandlerMissing.outcome(), Outcome::Error);
    }

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&Tool::ActivityLog).unwrap(),
            "\"activity-log\""
        );
        assert_eq!(
            serde_json::to_string(&Reason::UpstreamTimeout).unwrap(),
            "\"upstream_timeout\""
        );
    }
}
