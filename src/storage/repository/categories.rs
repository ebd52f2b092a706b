// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Category repository.
//!
//! Rows go in and come out as [`Sealed<Category>`]; the repository never
//! decrypts or inspects the name.

use redb::{ReadableDatabase, ReadableTable};
use serde::Deserialize;
use tracing::warn;

use crate::encryption::Sealed;
use crate::models::Category;
use crate::storage::database::{DbError, DbResult, NotesDatabase, CATEGORIES, NOTES};

pub const CATEGORY_NOT_FOUND: &str = "Category not found";

/// The only note column the repository needs for reference checks.
#[derive(Deserialize)]
struct NoteCategoryLink {
    #[serde(default)]
    category_id: Option<String>,
}

pub struct CategoryRepository<'a> {
    db: &'a NotesDatabase,
}

impl<'a> CategoryRepository<'a> {
    pub fn new(db: &'a NotesDatabase) -> Self {
        Self { db }
    }

    pub fn create(&self, category: &Sealed<Category>) -> DbResult<()> {
        let stored = category.as_stored();
        let json = serde_json::to_vec(stored)?;

        let write_txn = self.db.inner().begin_write()?;
        {
            let mut table = write_txn.open_table(CATEGORIES)?;
            if table.get(stored.id.as_str())?.is_some() {
                return Err(DbError::Conflict(format!(
                    "Category {} already exists",
                    stored.id
                )));
            }
            table.insert(stored.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Every category in creation order. Rows that are not valid JSON are
    /// skipped with a warning.
    pub fn get_all(&self) -> DbResult<Vec<Sealed<Category>>> {
        let read_txn = self.db.inner().begin_read()?;
        let table = read_txn.open_table(CATEGORIES)?;

        let mut categories = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            match serde_json::from_slice::<Category>(value.value()) {
                Ok(category) => categories.push(Sealed::from_storage(category)),
                Err(e) => warn!(id = %key.value(), error = %e, "Skipping malformed category row"),
            }
        }
        Ok(categories)
    }

    pub fn get_by_id(&self, id: &str) -> DbResult<Sealed<Category>> {
        let read_txn = self.db.inner().begin_read()?;
        let table = read_txn.open_table(CATEGORIES)?;
        match table.get(id)? {
            Some(value) => {
                let category: Category = serde_json::from_slice(value.value())?;
                Ok(Sealed::from_storage(category))
            }
            None => Err(DbError::NotFound(CATEGORY_NOT_FOUND.to_string())),
        }
    }

    pub fn exists(&self, id: &str) -> DbResult<bool> {
        let read_txn = self.db.inner().begin_read()?;
        let table = read_txn.open_table(CATEGORIES)?;
        Ok(table.get(id)?.is_some())
    }

    pub fn update(&self, category: &Sealed<Category>) -> DbResult<()> {
        let stored = category.as_stored();
        let json = serde_json::to_vec(stored)?;

        let write_txn = self.db.inner().begin_write()?;
        {
            let mut table = write_txn.open_table(CATEGORIES)?;
            if table.get(stored.id.as_str())?.is_none() {
                return Err(DbError::NotFound(CATEGORY_NOT_FOUND.to_string()));
            }
            table.insert(stored.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove a category. Fails with [`DbError::InUse`] while any note still
    /// points at it; the check and the removal share one transaction.
    pub fn delete(&self, id: &str) -> DbResult<()> {
        let write_txn = self.db.inner().begin_write()?;
        {
            let notes = write_txn.open_table(NOTES)?;
            let mut referencing = 0usize;
            for entry in notes.iter()? {
                let (_, value) = entry?;
                if let Ok(link) = serde_json::from_slice::<NoteCategoryLink>(value.value()) {
                    if link.category_id.as_deref() == Some(id) {
                        referencing += 1;
                    }
                }
            }
            if referencing > 0 {
                return Err(DbError::InUse(format!(
                    "Category is still used by {referencing} note(s)"
                )));
            }

            let mut table = write_txn.open_table(CATEGORIES)?;
            if table.remove(id)?.is_none() {
                return Err(DbError::NotFound(CATEGORY_NOT_FOUND.to_string()));
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}
