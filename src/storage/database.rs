// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded notes database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `categories`: category id → serialized `Category` (JSON bytes)
//! - `notes`: note id → serialized `Note` (JSON bytes)
//! - `activity_logs`: sequential u64 id → serialized `ActivityLog`
//!
//! Category and note rows are stored exactly as the repositories hand them
//! over. Sensitive fields are already ciphertext by then, and nothing in this
//! layer looks inside them.

use std::path::Path;

use redb::{Database, ReadableDatabase, TableDefinition};

// =============================================================================
// Table Definitions
// =============================================================================

pub(crate) const CATEGORIES: TableDefinition<&str, &[u8]> = TableDefinition::new("categories");

pub(crate) const NOTES: TableDefinition<&str, &[u8]> = TableDefinition::new("notes");

pub(crate) const ACTIVITY_LOGS: TableDefinition<u64, &[u8]> =
    TableDefinition::new("activity_logs");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    NotFound(String),

    /// A row with the same key or unique value already exists.
    #[error("{0}")]
    Conflict(String),

    /// A foreign key points at a row that does not exist.
    #[error("{0}")]
    InvalidReference(String),

    /// The row is still referenced and cannot be removed.
    #[error("{0}")]
    InUse(String),
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// NotesDatabase
// =============================================================================

pub struct NotesDatabase {
    db: Database,
}

impl NotesDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CATEGORIES)?;
            let _ = write_txn.open_table(NOTES)?;
            let _ = write_txn.open_table(ACTIVITY_LOGS)?;
        }
        write_txn.commit()?;

        tracing::debug!(path = %path.display(), "Notes database opened");
        Ok(Self { db })
    }

    pub(crate) fn inner(&self) -> &Database {
        &self.db
    }

    /// Cheap liveness probe: open a read transaction and one table.
    pub fn ping(&self) -> DbResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(NOTES)?;
        Ok(())
    }
}
