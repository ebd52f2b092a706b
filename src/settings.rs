// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persisted settings record (`settings.json`).
//!
//! ```json
//! {
//!   "encryption_key": "<base64 of 32 bytes>",
//!   "notes_limit": 10
//! }
//! ```
//!
//! The file holds key material, so it is created owner-read/write only.
//! This module is plain file I/O; key generation lives in
//! [`crate::encryption::KeyStore`].

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Default page size for note listings.
pub const DEFAULT_NOTES_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("settings file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Base64-encoded 32-byte AES key. Empty means "not generated yet".
    #[serde(default)]
    pub encryption_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_limit: Option<u32>,
}

impl Settings {
    /// Listing page size, never less than 1.
    pub fn notes_limit(&self) -> u32 {
        match self.notes_limit {
            Some(limit) if limit > 0 => limit,
            _ => DEFAULT_NOTES_LIMIT,
        }
    }
}

/// Reads and writes the settings record at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the settings record, `Ok(None)` if the file does not exist.
    pub fn load(&self) -> Result<Option<Settings>, SettingsError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|source| SettingsError::Malformed {
                path: self.path.clone(),
                source,
            })
    }

    /// Write the settings record atomically.
    ///
    /// The record goes to a freshly created, uniquely named temp file in the
    /// same directory, which is then persisted over the target. Leftover
    /// temp files from an interrupted save are never reused.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let mut temp = NamedTempFile::new_in(dir).map_err(io_err)?;
        restrict_permissions(temp.as_file()).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, settings).map_err(|source| {
                SettingsError::Malformed {
                    path: self.path.clone(),
                    source,
                }
            })?;
            writer.flush().map_err(io_err)?;
        }

        temp.persist(&self.path)
            .map(|_| ())
            .map_err(|e| io_err(e.error))
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_missing_file_returns_none() {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::new(temp.path().join("settings.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::new(temp.path().join("settings.json"));
        let settings = Settings {
            encryption_key: "a2V5".to_string(),
            notes_limit: Some(25),
        };

        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), Some(settings));
        assert!(!temp.path().join("settings.tmp").exists());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(&path, b"{ not json").unwrap();

        let err = SettingsStore::new(&path).load().unwrap_err();
        assert!(matches!(err, SettingsError::Malformed { .. }));
    }

    #[test]
    fn notes_limit_falls_back_to_default() {
        let mut settings = Settings::default();
        assert_eq!(settings.notes_limit(), DEFAULT_NOTES_LIMIT);

        settings.notes_limit = Some(0);
        assert_eq!(settings.notes_limit(), DEFAULT_NOTES_LIMIT);

        settings.notes_limit = Some(3);
        assert_eq!(settings.notes_limit(), 3);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert!(settings.encryption_key.is_empty());
        assert_eq!(settings.notes_limit, None);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        SettingsStore::new(&path).save(&Settings::default()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn stale_temp_file_does_not_loosen_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let stale = temp.path().join("settings.tmp");
        fs::write(&stale, b"left over").unwrap();
        fs::set_permissions(&stale, fs::Permissions::from_mode(0o644)).unwrap();

        let path = temp.path().join("settings.json");
        let store = SettingsStore::new(&path);
        store
            .save(&Settings {
                encryption_key: "a2V5".into(),
                notes_limit: Some(5),
            })
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap().unwrap().notes_limit, Some(5));

        // Saving over an existing record keeps it owner-only.
        store.save(&Settings::default()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
