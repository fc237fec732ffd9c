//! Durable activity log backed by redb.
//!
//! # Table design
//!
//! A single `ACTIVITY` table uses a 24-byte composite key:
//! ```text
//! [ timestamp_ms: u64 big-endian (8 bytes) | uuid: 16 bytes ]
//! ```
//!
//! Big-endian timestamps in the high bytes make byte order equal time order,
//! so a `since..=until` filter is a single range scan. Walking the range in
//! reverse yields newest-first results without sorting.
//!
//! Entries are written once and never updated or removed.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTableMetadata, TableDefinition};
use uuid::Uuid;

use crate::error::{ReiError, Result};

use super::{ActivityEntry, ActivityFilter, ActivitySink};

// ---------------------------------------------------------------------------
// Table definition
// ---------------------------------------------------------------------------

/// Key: 24-byte composite (timestamp_ms big-endian ++ uuid bytes)
/// Value: JSON-encoded ActivityEntry
const ACTIVITY: TableDefinition<&[u8], &[u8]> = TableDefinition::new("activity");

// ---------------------------------------------------------------------------
// Key helpers
// ---------------------------------------------------------------------------

fn entry_key(ts: DateTime<Utc>, id: Uuid) -> [u8; 24] {
    let mut key = [0u8; 24];
    let ms = ts.timestamp_millis().max(0) as u64;
    key[..8].copy_from_slice(&ms.to_be_bytes());
    key[8..].copy_from_slice(id.as_bytes());
    key
}

/// Smallest key at or after `ts` (uuid suffix all zeros).
fn lower_bound(ts: Option<DateTime<Utc>>) -> [u8; 24] {
    let mut key = [0u8; 24];
    if let Some(ts) = ts {
        let ms = ts.timestamp_millis().max(0) as u64;
        key[..8].copy_from_slice(&ms.to_be_bytes());
    }
    key
}

/// Largest key at or before `ts` (uuid suffix all `0xff`).
fn upper_bound(ts: Option<DateTime<Utc>>) -> [u8; 24] {
    let mut key = [0xffu8; 24];
    if let Some(ts) = ts {
        let ms = ts.timestamp_millis().max(0) as u64;
        key[..8].copy_from_slice(&ms.to_be_bytes());
    }
    key
}

fn db_err(e: impl std::fmt::Display) -> ReiError {
    ReiError::ActivityDb(e.to_string())
}

// ---------------------------------------------------------------------------
// ActivityDb
// ---------------------------------------------------------------------------

pub struct ActivityDb {
    db: Database,
}

impl ActivityDb {
    /// Open or create the redb database at `path`.
    ///
    /// Creates the `ACTIVITY` table if it doesn't already exist.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(ACTIVITY).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        Ok(Self { db })
    }

    /// Total number of stored entries.
    pub fn count(&self) -> Result<u64> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(ACTIVITY).map_err(db_err)?;
        table.len().map_err(db_err)
    }
}

impl ActivitySink for ActivityDb {
    fn append(&self, entry: ActivityEntry) -> Result<()> {
        let key = entry_key(entry.timestamp, entry.id);
        let value = serde_json::to_vec(&entry)?;
        // redb allows one write transaction at a time, which serializes
        // concurrent appends.
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(ACTIVITY).map_err(db_err)?;
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    fn query(&self, filter: &ActivityFilter) -> Result<Vec<ActivityEntry>> {
        let lower = lower_bound(filter.since);
        let upper = upper_bound(filter.until);
        if lower > upper {
            return Ok(Vec::new());
        }

        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(ACTIVITY).map_err(db_err)?;

        let mut result = Vec::new();
        for item in table
            .range(lower.as_slice()..=upper.as_slice())
            .map_err(db_err)?
            .rev()
        {
            if result.len() >= filter.limit {
                break;
            }
            let (_, v) = item.map_err(db_err)?;
            let entry: ActivityEntry = serde_json::from_slice(v.value())?;
            if filter.matches(&entry) {
                result.push(entry);
            }
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Outcome, Reason, Source};
    use chrono::Duration;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, ActivityDb) {
        let dir = TempDir::new().unwrap();
        let db = ActivityDb::open(&dir.path().join("activity.redb")).unwrap();
        (dir, db)
    }

    fn entry_at(actor: &str, tool: &str, ts: DateTime<Utc>) -> ActivityEntry {
        let mut e = ActivityEntry::new(actor, tool, "Plano, TX", Source::Slack, Outcome::Success, None);
        e.timestamp = ts;
        e
    }

    #[test]
    fn append_then_query_returns_entry() {
        let (_dir, db) = open_tmp();
        let e = ActivityEntry::new(
            "u1",
            "skip",
            "123 Main St",
            Source::Slack,
            Outcome::Denied,
            Some(Reason::InsufficientRole),
        );
        db.append(e.clone()).unwrap();

        let got = db.query(&ActivityFilter::default()).unwrap();
        assert_eq!(got, vec![e]);
        assert_eq!(db.count().unwrap(), 1);
    }

    #[test]
    fn query_is_newest_first() {
        let (_dir, db) = open_tmp();
        let now = Utc::now();
        // Insert out of chronological order
        db.append(entry_at("u1", "second", now - Duration::seconds(10))).unwrap();
        db.append(entry_at("u1", "third", now)).unwrap();
        db.append(entry_at("u1", "first", now - Duration::seconds(20))).unwrap();

        let tools: Vec<_> = db
            .query(&ActivityFilter::default())
            .unwrap()
            .into_iter()
            .map(|e| e.tool)
            .collect();
        assert_eq!(tools, vec!["third", "second", "first"]);
    }

    #[test]
    fn time_range_is_inclusive() {
        let (_dir, db) = open_tmp();
        let now = Utc::now();
        db.append(entry_at("u1", "old", now - Duration::hours(3))).unwrap();
        db.append(entry_at("u1", "mid", now - Duration::hours(2))).unwrap();
        db.append(entry_at("u1", "new", now)).unwrap();

        let filter = ActivityFilter {
            since: Some(now - Duration::hours(2)),
            until: Some(now - Duration::hours(1)),
            ..Default::default()
        };
        let got = db.query(&filter).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].tool, "mid");
    }

    #[test]
    fn actor_filter_and_limit() {
        let (_dir, db) = open_tmp();
        let now = Utc::now();
        for i in 0..5 {
            db.append(entry_at("u1", "lookup", now - Duration::seconds(i))).unwrap();
            db.append(entry_at("u2", "search", now - Duration::seconds(i))).unwrap();
        }
        let filter = ActivityFilter {
            actor: Some("u2".into()),
            limit: 3,
            ..Default::default()
        };
        let got = db.query(&filter).unwrap();
        assert_eq!(got.len(), 3);
        assert!(got.iter().all(|e| e.actor_id == "u2"));
    }

    #[test]
    fn inverted_range_is_empty() {
        let (_dir, db) = open_tmp();
        db.append(entry_at("u1", "lookup", Utc::now())).unwrap();
        let filter = ActivityFilter {
            since: Some(Utc::now()),
            until: Some(Utc::now() - Duration::hours(1)),
            ..Default::default()
        };
        assert!(db.query(&filter).unwrap().is_empty());
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("activity.redb");
        {
            let db = ActivityDb::open(&path).unwrap();
            db.append(entry_at("u1", "ask", Utc::now())).unwrap();
        }
        let db = ActivityDb::open(&path).unwrap();
        assert_eq!(db.count().unwrap(), 1);
    }

    #[test]
    fn empty_db_query_returns_empty() {
        let (_dir, db) = open_tmp();
        assert!(db.query(&ActivityFilter::default()).unwrap().is_empty());
    }
}
