// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Activity log for note, category, encryption and key operations.
//!
//! Entries are appended to the `activity_logs` table under a sequential id
//! and read back newest first. Descriptions are human-readable labels; they
//! are written by the HTTP layer and are never used for control flow.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use super::database::{DbError, DbResult, NotesDatabase, ACTIVITY_LOGS};

/// The single local user every action is attributed to.
pub const LOCAL_ACTOR_ID: i64 = 1;

/// Address recorded when the peer cannot be determined.
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// What was done.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Create,
    Read,
    Update,
    Delete,
    Check,
    Generate,
}

/// What it was done to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Note,
    Category,
    Encryption,
    Key,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Check => "check",
            Self::Generate => "generate",
        }
    }
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Category => "category",
            Self::Encryption => "encryption",
            Self::Key => "key",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "check" => Ok(Self::Check),
            "generate" => Ok(Self::Generate),
            other => Err(format!("Unknown action: {other}")),
        }
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(Self::Note),
            "category" => Ok(Self::Category),
            "encryption" => Ok(Self::Encryption),
            "key" => Ok(Self::Key),
            other => Err(format!("Unknown entity type: {other}")),
        }
    }
}

/// An activity log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    /// Sequential id, assigned on append. Zero until then.
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub action: ActivityAction,
    pub entity_type: EntityType,
    /// Affected note or category, absent for listings and status checks.
    pub entity_id: Option<String>,
    pub description: String,
    #[serde(rename = "userId")]
    pub actor_id: i64,
    pub ip_address: String,
}

impl ActivityLog {
    pub fn new(action: ActivityAction, entity_type: EntityType, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            timestamp: Utc::now(),
            action,
            entity_type,
            entity_id: None,
            description: description.into(),
            actor_id: LOCAL_ACTOR_ID,
            ip_address: UNKNOWN_ADDRESS.to_string(),
        }
    }

    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = ip.into();
        self
    }

    #[cfg(test)]
    pub(crate) fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Query filters. Unset fields match everything; `limit == 0` means no limit.
#[derive(Debug, Clone, Default)]
pub struct ActivityLogFilter {
    pub entity_type: Option<EntityType>,
    pub action: Option<ActivityAction>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: usize,
    pub offset: usize,
}

impl ActivityLogFilter {
    fn matches(&self, log: &ActivityLog) -> bool {
        self.entity_type.is_none_or(|t| log.entity_type == t)
            && self.action.is_none_or(|a| log.action == a)
            && self.start.is_none_or(|start| log.timestamp >= start)
            && self.end.is_none_or(|end| log.timestamp <= end)
    }
}

pub struct AuditRepository<'a> {
    db: &'a NotesDatabase,
}

impl<'a> AuditRepository<'a> {
    pub fn new(db: &'a NotesDatabase) -> Self {
        Self { db }
    }

    /// Append an entry, returning its assigned id.
    pub fn append(&self, log: &ActivityLog) -> DbResult<u64> {
        let write_txn = self.db.inner().begin_write()?;
        let id;
        {
            let mut table = write_txn.open_table(ACTIVITY_LOGS)?;
            id = match table.last()? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };

            let mut entry = log.clone();
            entry.id = id;
            let json = serde_json::to_vec(&entry)?;
            table.insert(id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(id)
    }

    /// Matching entries, newest first, after `offset` and up to `limit`.
    pub fn list(&self, filter: &ActivityLogFilter) -> DbResult<Vec<ActivityLog>> {
        let read_txn = self.db.inner().begin_read()?;
        let table = read_txn.open_table(ACTIVITY_LOGS)?;
        let limit = if filter.limit == 0 {
            usize::MAX
        } else {
            filter.limit
        };

        let mut matched = 0usize;
        let mut logs = Vec::new();
        for entry in table.iter()?.rev() {
            if logs.len() >= limit {
                break;
            }
            let (key, value) = entry?;
            let log: ActivityLog = match serde_json::from_slice(value.value()) {
                Ok(log) => log,
                Err(e) => {
                    warn!(id = key.value(), error = %e, "Skipping malformed activity log row");
                    continue;
                }
            };
            if !filter.matches(&log) {
                continue;
            }
            matched += 1;
            if matched > filter.offset {
                logs.push(log);
            }
        }
        Ok(logs)
    }

    /// Number of matching entries, ignoring `limit` and `offset`.
    pub fn count(&self, filter: &ActivityLogFilter) -> DbResult<u64> {
        let read_txn = self.db.inner().begin_read()?;
        let table = read_txn.open_table(ACTIVITY_LOGS)?;

        let mut count = 0u64;
        for entry in table.iter()? {
            let (_, value) = entry?;
            if let Ok(log) = serde_json::from_slice::<ActivityLog>(value.value()) {
                if filter.matches(&log) {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    pub fn get(&self, id: u64) -> DbResult<ActivityLog> {
        let read_txn = self.db.inner().begin_read()?;
        let table = read_txn.open_table(ACTIVITY_LOGS)?;
        match table.get(id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(DbError::NotFound(format!(
                "Activity log with ID {id} not found"
            ))),
        }
    }

    /// Delete entries older than `days` days. Returns the number removed.
    pub fn delete_older_than(&self, days: u32) -> DbResult<u64> {
        self.delete_before(retention_cutoff(Utc::now(), days))
    }

    fn delete_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {

        let write_txn = self.db.inner().begin_write()?;
        let mut removed = 0u64;
        {
            let mut table = write_txn.open_table(ACTIVITY_LOGS)?;

            let mut expired = Vec::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                if let Ok(log) = serde_json::from_slice::<ActivityLog>(value.value()) {
                    if log.timestamp < cutoff {
                        expired.push(key.value());
                    }
                }
            }

            for id in expired {
                if table.remove(id)?.is_some() {
                    removed += 1;
                }
            }
        }
        write_txn.commit()?;
        Ok(removed)
    }
}

/// `now - days`, clamped to the earliest representable instant.
fn retention_cutoff(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(days))
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (NotesDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = NotesDatabase::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    #[test]
    fn create_activity_log() {
        let log = ActivityLog::new(ActivityAction::Create, EntityType::Note, "Created note: x")
            .with_entity("note-1")
            .with_ip("192.168.1.1");

        assert_eq!(log.action, ActivityAction::Create);
        assert_eq!(log.entity_id.as_deref(), Some("note-1"));
        assert_eq!(log.ip_address, "192.168.1.1");
        assert_eq!(log.actor_id, LOCAL_ACTOR_ID);
    }

    #[test]
    fn wire_format_uses_camel_case() {
        let log = ActivityLog::new(ActivityAction::Check, EntityType::Encryption, "status");
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["entityType"], "encryption");
        assert_eq!(json["action"], "check");
        assert_eq!(json["userId"], 1);
        assert_eq!(json["ipAddress"], "unknown");
    }

    #[test]
    fn parse_names() {
        assert_eq!("note".parse::<EntityType>().unwrap(), EntityType::Note);
        assert_eq!("generate".parse::<ActivityAction>().unwrap(), ActivityAction::Generate);
        assert!("invoice".parse::<EntityType>().is_err());
        assert!("Create".parse::<ActivityAction>().is_err());
    }

    #[test]
    fn append_assigns_sequential_ids() {
        let (db, _dir) = temp_db();
        let repo = AuditRepository::new(&db);

        let first = repo
            .append(&ActivityLog::new(ActivityAction::Read, EntityType::Note, "a"))
            .unwrap();
        let second = repo
            .append(&ActivityLog::new(ActivityAction::Read, EntityType::Note, "b"))
            .unwrap();

        assert_eq!((first, second), (1, 2));
        assert_eq!(repo.get(2).unwrap().description, "b");
        assert!(matches!(repo.get(3), Err(DbError::NotFound(_))));
    }

    #[test]
    fn list_is_newest_first_with_pagination() {
        let (db, _dir) = temp_db();
        let repo = AuditRepository::new(&db);
        for i in 0..5 {
            repo.append(&ActivityLog::new(
                ActivityAction::Read,
                EntityType::Note,
                format!("entry {i}"),
            ))
            .unwrap();
        }

        let page = repo
            .list(&ActivityLogFilter {
                limit: 2,
                offset: 1,
                ..Default::default()
            })
            .unwrap();
        let descriptions: Vec<_> = page.iter().map(|l| l.description.as_str()).collect();
        assert_eq!(descriptions, ["entry 3", "entry 2"]);

        assert_eq!(repo.list(&ActivityLogFilter::default()).unwrap().len(), 5);
    }

    #[test]
    fn filters_apply_to_list_and_count() {
        let (db, _dir) = temp_db();
        let repo = AuditRepository::new(&db);
        repo.append(&ActivityLog::new(ActivityAction::Create, EntityType::Note, "n1"))
            .unwrap();
        repo.append(&ActivityLog::new(ActivityAction::Delete, EntityType::Note, "n2"))
            .unwrap();
        repo.append(&ActivityLog::new(ActivityAction::Create, EntityType::Category, "c1"))
            .unwrap();

        let notes = ActivityLogFilter {
            entity_type: Some(EntityType::Note),
            ..Default::default()
        };
        let creates = ActivityLogFilter {
            action: Some(ActivityAction::Create),
            ..Default::default()
        };

        assert_eq!(repo.count(&notes).unwrap(), 2);
        assert_eq!(repo.count(&creates).unwrap(), 2);
        assert_eq!(repo.count(&ActivityLogFilter::default()).unwrap(), 3);

        let created_notes = repo
            .list(&ActivityLogFilter {
                entity_type: Some(EntityType::Note),
                action: Some(ActivityAction::Create),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(created_notes.len(), 1);
        assert_eq!(created_notes[0].description, "n1");
    }

    #[test]
    fn time_range_filter() {
        let (db, _dir) = temp_db();
        let repo = AuditRepository::new(&db);
        let now = Utc::now();
        repo.append(&ActivityLog::new(ActivityAction::Read, EntityType::Note, "old").at(now - Duration::days(3)))
            .unwrap();
        repo.append(&ActivityLog::new(ActivityAction::Read, EntityType::Note, "new").at(now))
            .unwrap();

        let recent = repo
            .list(&ActivityLogFilter {
                start: Some(now - Duration::days(1)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].description, "new");

        let early = ActivityLogFilter {
            end: Some(now - Duration::days(2)),
            ..Default::default()
        };
        assert_eq!(repo.count(&early).unwrap(), 1);
    }

    #[test]
    fn delete_older_than_removes_only_expired() {
        let (db, _dir) = temp_db();
        let repo = AuditRepository::new(&db);
        let now = Utc::now();
        repo.append(&ActivityLog::new(ActivityAction::Read, EntityType::Note, "ancient").at(now - Duration::days(40)))
            .unwrap();
        repo.append(&ActivityLog::new(ActivityAction::Read, EntityType::Note, "stale").at(now - Duration::days(8)))
            .unwrap();
        repo.append(&ActivityLog::new(ActivityAction::Read, EntityType::Note, "fresh"))
            .unwrap();

        assert_eq!(repo.delete_older_than(7).unwrap(), 2);
        let remaining = repo.list(&ActivityLogFilter::default()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].description, "fresh");

        // Ids keep growing after a purge.
        let id = repo
            .append(&ActivityLog::new(ActivityAction::Read, EntityType::Note, "next"))
            .unwrap();
        assert_eq!(id, 4);
    }

    #[test]
    fn retention_cutoff_clamps_huge_ages() {
        let now = Utc::now();
        assert_eq!(retention_cutoff(now, 7), now - Duration::days(7));
        assert_eq!(retention_cutoff(now, u32::MAX), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn delete_older_than_max_days_removes_nothing() {
        let (db, _dir) = temp_db();
        let repo = AuditRepository::new(&db);
        repo.append(&ActivityLog::new(ActivityAction::Read, EntityType::Note, "old").at(Utc::now() - Duration::days(400)))
            .unwrap();

        assert_eq!(repo.delete_older_than(u32::MAX).unwrap(), 0);
        assert_eq!(repo.count(&ActivityLogFilter::default()).unwrap(), 1);
    }
}
