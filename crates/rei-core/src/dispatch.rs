//! Tool registry and dispatcher.
//!
//! `Dispatcher::dispatch` is the single entry point both ingress adapters call
//! once they have resolved an [`Actor`]. It never fails: every branch ends in a
//! [`DispatchResult`] and exactly one activity entry.
//!
//! Evaluation order:
//! 1. inactive actor → denied / `account_disabled`
//! 2. `help` → static help text, policy bypassed
//! 3. policy denies → denied / `insufficient_role`
//! 4. no registered handler → error / `handler_missing`
//! 5. handler runs in its own task under the tool's timeout
//! 6. handler failure → error / failure kind (never denied)
//! 7. append the activity entry, return

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::activity::{ActivityEntry, ActivitySink};
use crate::actor::Actor;
use crate::command::{self, Command};
use crate::help;
use crate::policy::Policy;
use crate::types::{Outcome, Reason, Source, Tool};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Handler contract
// ---------------------------------------------------------------------------

/// Typed failure a tool handler may return.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("upstream timed out")]
    UpstreamTimeout,

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

impl HandlerError {
    pub fn reason(&self) -> Reason {
        match self {
            HandlerError::UpstreamTimeout => Reason::UpstreamTimeout,
            HandlerError::Upstream(_) => Reason::UpstreamError,
            HandlerError::InvalidArguments(_) => Reason::InvalidArguments,
        }
    }
}

/// A tool implementation. Handlers for the research tools wrap external
/// clients; the dispatcher only sees the JSON payload or a [`HandlerError`].
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn invoke(
        &self,
        actor: &Actor,
        args: &[String],
    ) -> Result<serde_json::Value, HandlerError>;
}

// ---------------------------------------------------------------------------
// ToolRegistry
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: HashMap<Tool, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Tool, handler: Arc<dyn ToolHandler>) -> &mut Self {
        self.handlers.insert(tool, handler);
        self
    }

    pub fn get(&self, tool: Tool) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(&tool).cloned()
    }

    pub fn contains(&self, tool: Tool) -> bool {
        self.handlers.contains_key(&tool)
    }

    /// Registered tools in declaration order.
    pub fn tools(&self) -> Vec<Tool> {
        Tool::all()
            .iter()
            .copied()
            .filter(|t| self.handlers.contains_key(t))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ToolTimeouts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ToolTimeouts {
    pub default: Duration,
    pub per_tool: HashMap<Tool, Duration>,
}

impl ToolTimeouts {
    pub fn uniform(default: Duration) -> Self {
        Self {
            default,
            per_tool: HashMap::new(),
        }
    }

    pub fn with(mut self, tool: Tool, budget: Duration) -> Self {
        self.per_tool.insert(tool, budget);
        self
    }

    pub fn for_tool(&self, tool: Tool) -> Duration {
        self.per_tool.get(&tool).copied().unwrap_or(self.default)
    }
}

impl Default for ToolTimeouts {
    fn default() -> Self {
        Self::uniform(DEFAULT_TIMEOUT)
    }
}

// ---------------------------------------------------------------------------
// DispatchResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    /// Tool name, or the unrecognised token for unknown commands.
    pub tool: String,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Human-readable detail for non-success outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DispatchResult {
    pub fn success(tool: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            tool: tool.into(),
            outcome: Outcome::Success,
            reason: None,
            payload: Some(payload),
            message: None,
        }
    }

    pub fn failure(tool: impl Into<String>, reason: Reason, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            outcome: reason.outcome(),
            reason: Some(reason),
            payload: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher {
    policy: Arc<Policy>,
    registry: ToolRegistry,
    log: Arc<dyn ActivitySink>,
    timeouts: ToolTimeouts,
}

impl Dispatcher {
    pub fn new(policy: Arc<Policy>, registry: ToolRegistry, log: Arc<dyn ActivitySink>) -> Self {
        Self {
            policy,
            registry,
            log,
            timeouts: ToolTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: ToolTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn activity_log(&self) -> &Arc<dyn ActivitySink> {
        &self.log
    }

    /// Dispatch an already-parsed command.
    pub async fn dispatch(&self, actor: &Actor, command: &Command) -> DispatchResult {
        let result = self.evaluate(actor, command).await;
        self.record(
            actor,
            command.tool.as_str(),
            &command.args_text(),
            command.source,
            &result,
        )
        .await;
        result
    }

    /// Parse `raw` and dispatch it.
    ///
    /// Unknown commands are recorded against the resolved actor with the
    /// offending token as the tool name. A disabled actor is still reported as
    /// `account_disabled`, whatever it typed.
    pub async fn dispatch_text(&self, actor: &Actor, raw: &str, source: Source) -> DispatchResult {
        match command::parse(raw, source) {
            Ok(cmd) => self.dispatch(actor, &cmd).await,
            Err(e) => self.reject_unknown(actor, e.token(), raw.trim(), source).await,
        }
    }

    /// Record and answer a tool token that names no tool. Used by adapters
    /// that receive the tool name separately from its arguments.
    pub async fn reject_unknown(
        &self,
        actor: &Actor,
        token: &str,
        args: &str,
        source: Source,
    ) -> DispatchResult {
        let result = if actor.active {
            DispatchResult::failure(
                token,
                Reason::UnknownCommand,
                format!("Unknown command: `{token}`. {}", help::hint()),
            )
        } else {
            disabled(token)
        };
        self.record(actor, token, args, source, &result).await;
        result
    }

    async fn evaluate(&self, actor: &Actor, command: &Command) -> DispatchResult {
        let tool = command.tool;

        if !actor.active {
            return disabled(tool.as_str());
        }

        if tool == Tool::Help {
            return DispatchResult::success(
                tool.as_str(),
                serde_json::json!({ "text": help::render(&self.policy) }),
            );
        }

        if !self.policy.is_allowed(actor.role, tool) {
            return DispatchResult::failure(
                tool.as_str(),
                Reason::InsufficientRole,
                format!("The {} role may not use `{tool}`.", actor.role),
            );
        }

        let Some(handler) = self.registry.get(tool) else {
            error!(tool = %tool, "no handler registered for an allowed tool");
            return DispatchResult::failure(
                tool.as_str(),
                Reason::HandlerMissing,
                format!("`{tool}` is not available right now."),
            );
        };

        let budget = self.timeouts.for_tool(tool);
        let owned_actor = actor.clone();
        let args = command.raw_args.clone();
        let task = tokio::spawn(async move { handler.invoke(&owned_actor, &args).await });
        let abort = task.abort_handle();

        match tokio::time::timeout(budget, task).await {
            Ok(Ok(Ok(payload))) => DispatchResult::success(tool.as_str(), payload),
            Ok(Ok(Err(e))) => DispatchResult::failure(tool.as_str(), e.reason(), e.to_string()),
            Ok(Err(join_err)) => {
                warn!(tool = %tool, error = %join_err, "tool handler task failed");
                DispatchResult::failure(
                    tool.as_str(),
                    Reason::UpstreamError,
                    "tool handler failed unexpectedly",
                )
            }
            Err(_) => {
                abort.abort();
                DispatchResult::failure(
                    tool.as_str(),
                    Reason::UpstreamTimeout,
                    format!("`{tool}` did not answer within {}s", budget.as_secs_f64()),
                )
            }
        }
    }

    /// Append the entry off the async workers; the durable sink commits with
    /// an fsync. Awaited so the entry exists before the result is returned.
    async fn record(
        &self,
        actor: &Actor,
        tool: &str,
        args: &str,
        source: Source,
        result: &DispatchResult,
    ) {
        info!(
            actor = %actor.id,
            tool = %tool,
            source = %source,
            outcome = %result.outcome,
            reason = ?result.reason,
            "dispatch"
        );
        let entry = ActivityEntry::new(&actor.id, tool, args, source, result.outcome, result.reason);
        let log = self.log.clone();
        match tokio::task::spawn_blocking(move || log.append(entry)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(actor = %actor.id, tool = %tool, error = %e, "failed to append activity entry")
            }
            Err(e) => {
                error!(actor = %actor.id, tool = %tool, error = %e, "activity append task failed")
            }
        }
    }
}

fn disabled(tool: &str) -> DispatchResult {
    DispatchResult::failure(tool, Reason::AccountDisabled, "This account is disabled.")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
