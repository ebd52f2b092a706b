// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Note repository.
//!
//! `category_id` is the only column the repository interprets: it must name
//! an existing category on create and update.

use redb::{ReadableDatabase, ReadableTable};
use tracing::warn;

use crate::encryption::Sealed;
use crate::models::{Note, Priority};
use crate::storage::database::{DbError, DbResult, NotesDatabase, CATEGORIES, NOTES};

pub const NOTE_NOT_FOUND: &str = "Note not found";

/// Listing filters. All fields are optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub category_id: Option<String>,
    pub priority: Option<Priority>,
    /// Maximum number of rows returned; `None` returns all of them.
    pub limit: Option<usize>,
}

impl NoteFilter {
    fn matches(&self, note: &Note) -> bool {
        let category_ok = match &self.category_id {
            Some(wanted) => note.category_id.as_deref() == Some(wanted.as_str()),
            None => true,
        };
        let priority_ok = self.priority.is_none_or(|p| note.priority == p);
        category_ok && priority_ok
    }
}

pub struct NoteRepository<'a> {
    db: &'a NotesDatabase,
}

impl<'a> NoteRepository<'a> {
    pub fn new(db: &'a NotesDatabase) -> Self {
        Self { db }
    }

    pub fn create(&self, note: &Sealed<Note>) -> DbResult<()> {
        let stored = note.as_stored();
        let json = serde_json::to_vec(stored)?;

        let write_txn = self.db.inner().begin_write()?;
        {
            let categories = write_txn.open_table(CATEGORIES)?;
            ensure_category(&categories, stored.category_id.as_deref())?;

            let mut table = write_txn.open_table(NOTES)?;
            if table.get(stored.id.as_str())?.is_some() {
                return Err(DbError::Conflict(format!("Note {} already exists", stored.id)));
            }
            table.insert(stored.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Notes in creation order, filtered, truncated to `filter.limit`.
    pub fn get_all(&self, filter: &NoteFilter) -> DbResult<Vec<Sealed<Note>>> {
        let read_txn = self.db.inner().begin_read()?;
        let table = read_txn.open_table(NOTES)?;
        let limit = filter.limit.unwrap_or(usize::MAX);

        let mut notes = Vec::new();
        for entry in table.iter()? {
            if notes.len() >= limit {
                break;
            }
            let (key, value) = entry?;
            match serde_json::from_slice::<Note>(value.value()) {
                Ok(note) if filter.matches(&note) => notes.push(Sealed::from_storage(note)),
                Ok(_) => {}
                Err(e) => warn!(id = %key.value(), error = %e, "Skipping malformed note row"),
            }
        }
        Ok(notes)
    }

    pub fn get_by_id(&self, id: &str) -> DbResult<Sealed<Note>> {
        let read_txn = self.db.inner().begin_read()?;
        let table = read_txn.open_table(NOTES)?;
        match table.get(id)? {
            Some(value) => {
                let note: Note = serde_json::from_slice(value.value())?;
                Ok(Sealed::from_storage(note))
            }
            None => Err(DbError::NotFound(NOTE_NOT_FOUND.to_string())),
        }
    }

    pub fn update(&self, note: &Sealed<Note>) -> DbResult<()> {
        let stored = note.as_stored();
        let json = serde_json::to_vec(stored)?;

        let write_txn = self.db.inner().begin_write()?;
        {
            let mut table = write_txn.open_table(NOTES)?;
            if table.get(stored.id.as_str())?.is_none() {
                return Err(DbError::NotFound(NOTE_NOT_FOUND.to_string()));
            }

            let categories = write_txn.open_table(CATEGORIES)?;
            ensure_category(&categories, stored.category_id.as_deref())?;

            table.insert(stored.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn delete(&self, id: &str) -> DbResult<()> {
        let write_txn = self.db.inner().begin_write()?;
        {
            let mut table = write_txn.open_table(NOTES)?;
            if table.remove(id)?.is_none() {
                return Err(DbError::NotFound(NOTE_NOT_FOUND.to_string()));
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove several notes in one transaction, ignoring ids that are gone.
    /// Returns how many rows were removed.
    pub fn delete_many(&self, ids: &[String]) -> DbResult<usize> {
        let write_txn = self.db.inner().begin_write()?;
        let mut removed = 0;
        {
            let mut table = write_txn.open_table(NOTES)?;
            for id in ids {
                if table.remove(id.as_str())?.is_some() {
                    removed += 1;
                }
            }
        }
        write_txn.commit()?;
        Ok(removed)
    }
}

fn ensure_category<T>(categories: &T, category_id: Option<&str>) -> DbResult<()>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    if let Some(id) = category_id {
        if categories.get(id)?.is_none() {
            return Err(DbError::InvalidReference(format!(
                "Category {id} does not exist"
            )));
        }
    }
    Ok(())
}
