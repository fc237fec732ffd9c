//! The `activity-log` tool: read-only listing of the audit trail.
//!
//! It is registered like any other tool, so access goes through the same
//! permission policy (admin and manager in the standard table) and every
//! query is itself recorded.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::actor::Actor;
use crate::dispatch::{HandlerError, ToolHandler};

use super::{ActivityFilter, ActivitySink};

/// Largest `limit` a single query may request.
pub const MAX_QUERY_LIMIT: usize = 1000;

pub struct ActivityQueryHandler {
    log: Arc<dyn ActivitySink>,
}

impl ActivityQueryHandler {
    pub fn new(log: Arc<dyn ActivitySink>) -> Self {
        Self { log }
    }
}

#[async_trait]
impl ToolHandler for ActivityQueryHandler {
    async fn invoke(
        &self,
        _actor: &Actor,
        args: &[String],
    ) -> Result<serde_json::Value, HandlerError> {
        let filter = parse_filter(args, Utc::now())?;
        let log = self.log.clone();
        let entries = tokio::task::spawn_blocking(move || log.query(&filter))
            .await
            .map_err(|e| HandlerError::Upstream(format!("activity query task failed: {e}")))?
            .map_err(|e| HandlerError::Upstream(e.to_string()))?;
        Ok(serde_json::json!({
            "count": entries.len(),
            "activity": entries,
        }))
    }
}

/// Build a filter from `key=value` tokens.
///
/// Keys: `actor`, `since`, `until`, `limit`. Times are RFC 3339 or a relative
/// age such as `30m`, `24h`, `7d` (meaning that long before `now`).
pub fn parse_filter(args: &[String], now: DateTime<Utc>) -> Result<ActivityFilter, HandlerError> {
    let mut filter = ActivityFilter::default();
    for arg in args {
        let (key, value) = arg.split_once('=').ok_or_else(|| {
            HandlerError::InvalidArguments(format!("expected key=value, got '{arg}'"))
        })?;
        match key.to_ascii_lowercase().as_str() {
            "actor" => filter.actor = Some(value.to_string()),
            "since" => filter.since = Some(parse_time(value, now)?),
            "until" => filter.until = Some(parse_time(value, now)?),
            "limit" => {
                let n: usize = value.parse().map_err(|_| {
                    HandlerError::InvalidArguments(format!("limit must be a number, got '{value}'"))
                })?;
                filter.limit = n.clamp(1, MAX_QUERY_LIMIT);
            }
            other => {
                return Err(HandlerError::InvalidArguments(format!(
                    "unknown filter '{other}' (expected actor, since, until, limit)"
                )))
            }
        }
    }
    Ok(filter)
}

fn parse_time(value: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, HandlerError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let invalid = || {
        HandlerError::InvalidArguments(format!(
            "'{value}' is neither an RFC 3339 time nor an age like 24h"
        ))
    };
    if value.len() < 2 || !value.is_char_boundary(value.len() - 1) {
        return Err(invalid());
    }
    let (amount, unit) = value.split_at(value.len() - 1);
    let amount: i64 = amount.parse().map_err(|_| invalid())?;
    let age = match unit {
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        _ => None,
    }
    .ok_or_else(invalid)?;
    now.checked_sub_signed(age).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityEntry, MemoryActivityLog};
    use crate::types::{Outcome, Role, Source};

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_args_use_defaults() {
        let f = parse_filter(&[], Utc::now()).unwrap();
        assert_eq!(f, ActivityFilter::default());
    }

    #[test]
    fn parses_all_keys() {
        let now = Utc::now();
        let f = parse_filter(
            &args(&["actor=u1", "since=24h", "until=2026-01-02T03:04:05Z", "limit=5"]),
            now,
        )
        .unwrap();
        assert_eq!(f.actor.as_deref(), Some("u1"));
        assert_eq!(f.since, Some(now - Duration::hours(24)));
        assert_eq!(
            f.until.unwrap().to_rfc3339(),
            "2026-01-02T03:04:05+00:00"
        );
        assert_eq!(f.limit, 5);
    }

    #[test]
    fn limit_is_clamped() {
        let f = parse_filter(&args(&["limit=999999"]), Utc::now()).unwrap();
        assert_eq!(f.limit, MAX_QUERY_LIMIT);
        let f = parse_filter(&args(&["limit=0"]), Utc::now()).unwrap();
        assert_eq!(f.limit, 1);
    }

    #[test]
    fn rejects_bad_tokens() {
        for bad in ["bogus", "color=red", "limit=ten", "since=yesterday", "since=5w"] {
            let err = parse_filter(&args(&[bad]), Utc::now()).unwrap_err();
            assert!(matches!(err, HandlerError::InvalidArguments(_)), "{bad}");
        }
    }

    #[tokio::test]
    async fn handler_returns_matching_entries() {
        let log = Arc::new(MemoryActivityLog::new());
        for actor in ["u1", "u2", "u1"] {
            log.append(ActivityEntry::new(actor, "lookup", "", Source::Api, Outcome::Success, None))
                .unwrap();
        }
        let handler = ActivityQueryHandler::new(log);
        let payload = handler
            .invoke(&Actor::new("boss", Role::Admin), &args(&["actor=u1"]))
            .await
            .unwrap();
        assert_eq!(payload["count"], 2);
        assert_eq!(payload["activity"][0]["actor_id"], "u1");
    }
}
