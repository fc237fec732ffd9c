use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rei_core::activity::query::parse_filter;
use rei_core::activity::{ActivityDb, ActivitySink};
use rei_core::paths;
use std::path::Path;

use super::load_config;
use crate::output::{print_json, print_table};

/// Filter flags as typed on the command line.
#[derive(Debug, Default)]
pub struct Filters {
    pub actor: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub limit: Option<usize>,
}

impl Filters {
    /// `key=value` tokens, the same form the `activity-log` tool accepts.
    fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(v) = &self.actor {
            args.push(format!("actor={v}"));
        }
        if let Some(v) = &self.since {
            args.push(format!("since={v}"));
        }
        if let Some(v) = &self.until {
            args.push(format!("until={v}"));
        }
        if let Some(v) = self.limit {
            args.push(format!("limit={v}"));
        }
        args
    }
}

pub fn run(root: &Path, filters: Filters, json: bool) -> Result<()> {
    load_config(root)?;
    let filter = parse_filter(&filters.to_args(), Utc::now()).map_err(|e| anyhow!("{e}"))?;

    let path = paths::activity_db_path(root);
    let db = ActivityDb::open(&path).with_context(|| {
        format!("cannot open {} (is `rei serve` holding it?)", path.display())
    })?;
    let entries = db.query(&filter)?;

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No activity.");
        return Ok(());
    }
    let rows = entries
        .iter()
        .map(|e| {
            vec![
                e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                e.actor_id.clone(),
                e.tool.clone(),
                e.source.to_string(),
                e.outcome.to_string(),
                e.reason.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
                e.args_summary.clone(),
            ]
        })
        .collect();
    print_table(
        &["TIME", "ACTOR", "TOOL", "SOURCE", "OUTCOME", "REASON", "ARGS"],
        rows,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_become_filter_tokens() {
        let f = Filters {
            actor: Some("u1".into()),
            since: Some("24h".into()),
            until: None,
            limit: Some(5),
        };
        assert_eq!(f.to_args(), vec!["actor=u1", "since=24h", "limit=5"]);
        assert!(Filters::default().to_args().is_empty());
    }
}
