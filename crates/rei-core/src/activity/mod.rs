//! Append-only audit trail of dispatch attempts.
//!
//! Every call into the dispatcher produces exactly one [`ActivityEntry`]. Sinks
//! only ever append; retention and rotation belong to whoever operates the
//! storage.

pub mod db;
pub mod query;

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::types::{Outcome, Reason, Source};

pub use db::ActivityDb;
pub use query::ActivityQueryHandler;

/// Logged argument text is cut to this many characters.
pub const ARGS_SUMMARY_MAX: usize = 100;

pub const DEFAULT_QUERY_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// ActivityEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub actor_id: String,
    /// Tool name, or the unrecognised token for unknown commands.
    pub tool: String,
    pub args_summary: String,
    pub source: Source,
    pub timestamp: DateTime<Utc>,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
}

impl ActivityEntry {
    pub fn new(
        actor_id: impl Into<String>,
        tool: impl Into<String>,
        args: &str,
        source: Source,
        outcome: Outcome,
        reason: Option<Reason>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id: actor_id.into(),
            tool: tool.into(),
            args_summary: summarize(args),
            source,
            timestamp: Utc::now(),
            outcome,
            reason,
        }
    }
}

fn summarize(args: &str) -> String {
    match args.char_indices().nth(ARGS_SUMMARY_MAX) {
        Some((cut, _)) => args[..cut].to_string(),
        None => args.to_string(),
    }
}

// ---------------------------------------------------------------------------
// ActivityFilter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFilter {
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_QUERY_LIMIT
}

impl Default for ActivityFilter {
    fn default() -> Self {
        Self {
            actor: None,
            since: None,
            until: None,
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl ActivityFilter {
    pub fn matches(&self, entry: &ActivityEntry) -> bool {
        if let Some(ref actor) = self.actor {
            if &entry.actor_id != actor {
                return false;
            }
        }
        if self.since.is_some_and(|since| entry.timestamp < since) {
            return false;
        }
        if self.until.is_some_and(|until| entry.timestamp > until) {
            return false;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// ActivitySink
// ---------------------------------------------------------------------------

/// Shared audit sink. Implementations serialize concurrent appends themselves;
/// callers never hold a lock around them.
pub trait ActivitySink: Send + Sync {
    fn append(&self, entry: ActivityEntry) -> Result<()>;

    /// Matching entries, newest first, at most `filter.limit`.
    fn query(&self, filter: &ActivityFilter) -> Result<Vec<ActivityEntry>>;
}

/// In-process sink used by tests and by `serve --memory-log`.
#[derive(Debug, Default)]
pub struct MemoryActivityLog {
    entries: Mutex<Vec<ActivityEntry>>,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every entry in append order.
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ActivitySink for MemoryActivityLog {
    fn append(&self, entry: ActivityEntry) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry);
        Ok(())
    }

    fn query(&self, filter: &ActivityFilter) -> Result<Vec<ActivityEntry>> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entries
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .take(filter.limit)
            .cloned()
            .collect())
    }
}
