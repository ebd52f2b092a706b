// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the on-disk layout.
//!
//! ```text
//! $DATA_DIR/
//!   settings.json   # encryption key + notes_limit (mode 0600)
//!   notes.redb      # categories, notes, activity logs
//! ```

use std::path::{Path, PathBuf};

/// Default data directory (the working directory).
pub const DATA_ROOT: &str = ".";

pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const DATABASE_FILE_NAME: &str = "notes.redb";

#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
    settings_override: Option<PathBuf>,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            settings_override: None,
        }
    }

    /// Keep the settings record somewhere other than the data directory.
    pub fn with_settings_file(mut self, path: impl AsRef<Path>) -> Self {
        self.settings_override = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_file(&self) -> PathBuf {
        self.settings_override
            .clone()
            .unwrap_or_else(|| self.root.join(SETTINGS_FILE_NAME))
    }

    pub fn database_file(&self) -> PathBuf {
        self.root.join(DATABASE_FILE_NAME)
    }
}
