// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Validity gate for the encryption subsystem.
//!
//! The gate owns the data key and a single validity flag. The flag starts
//! false and is latched true only by [`EncryptionGate::initialize`] after a
//! known-answer round trip succeeds. Initialization takes `&mut self`, and
//! the gate is shared behind an `Arc` only once it has run, so the
//! "initialize, then read" ordering is enforced by the type system and no
//! locking is needed on the read side.
//!
//! A failed initialization is not fatal: the service keeps running, but
//! every write is refused with [`EncryptionError::Unavailable`] and every
//! read of stored ciphertext with [`EncryptionError::KeyUnavailable`].

use tracing::debug;

use super::cipher;
use super::error::{EncryptionError, EncryptionResult};
use super::key_store::{EncryptionKey, KeySource};

/// Known plaintext used for the startup self-test.
const SELF_TEST_SENTINEL: &str = "personal-notes encryption self-test ✓";

#[derive(Debug, Default)]
pub struct EncryptionGate {
    key: Option<EncryptionKey>,
    valid: bool,
}

impl EncryptionGate {
    /// A gate that refuses all writes until initialized.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the key from `source`, then seal and open a sentinel value with it.
    ///
    /// On any failure the flag stays false and the error is returned for the
    /// caller to log. Calling this on an already valid gate is a no-op.
    pub fn initialize(&mut self, source: &dyn KeySource) -> EncryptionResult<()> {
        if self.valid {
            debug!("Encryption gate already initialized");
            return Ok(());
        }

        let key = source.load_or_create_key()?;
        self.key = Some(key);

        if let Some(key) = &self.key {
            self_test(key)?;
            self.valid = true;
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Precondition guard for every mutating operation.
    pub fn require_valid(&self) -> EncryptionResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(EncryptionError::Unavailable)
        }
    }

    /// Precondition guard for every read that opens stored ciphertext.
    pub fn require_readable(&self) -> EncryptionResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(EncryptionError::KeyUnavailable)
        }
    }

    /// The verified key. Never returns a key that failed the self-test.
    pub fn active_key(&self) -> EncryptionResult<&EncryptionKey> {
        self.require_valid()?;
        self.key.as_ref().ok_or(EncryptionError::Unavailable)
    }

    /// Same key as [`Self::active_key`], refused with the read-side error.
    pub fn read_key(&self) -> EncryptionResult<&EncryptionKey> {
        self.require_readable()?;
        self.key.as_ref().ok_or(EncryptionError::KeyUnavailable)
    }
}

fn self_test(key: &EncryptionKey) -> EncryptionResult<()> {
    let sealed = cipher::encrypt_string(SELF_TEST_SENTINEL, key)
        .map_err(|e| EncryptionError::SelfTest(format!("seal failed: {e}")))?;
    let opened = cipher::decrypt_string(&sealed, key)
        .map_err(|e| EncryptionError::SelfTest(format!("open failed: {e}")))?;

    if opened.as_bytes() != SELF_TEST_SENTINEL.as_bytes() {
        return Err(EncryptionError::SelfTest(
            "round trip returned different bytes".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::key_store::{KeyStore, StaticKey};
    use crate::settings::{Settings, SettingsStore};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn new_gate_is_invalid() {
        let gate = EncryptionGate::new();
        assert!(!gate.is_valid());
        assert!(matches!(
            gate.require_valid(),
            Err(EncryptionError::Unavailable)
        ));
        assert!(gate.active_key().is_err());
        assert!(matches!(
            gate.read_key(),
            Err(EncryptionError::KeyUnavailable)
        ));
    }

    #[test]
    fn initialize_latches_valid() {
        let mut gate = EncryptionGate::new();
        gate.initialize(&StaticKey::new(EncryptionKey::generate()))
            .unwrap();

        assert!(gate.is_valid());
        assert!(gate.require_valid().is_ok());
        assert!(gate.active_key().is_ok());

        // A second initialize with a broken source cannot unlatch it.
        gate.initialize(&StaticKey::broken("ignored")).unwrap();
        assert!(gate.is_valid());
    }

    #[test]
    fn broken_key_leaves_gate_invalid() {
        let mut gate = EncryptionGate::new();
        let err = gate
            .initialize(&StaticKey::broken("expected 32 bytes, got 5"))
            .unwrap_err();

        assert!(matches!(err, EncryptionError::Configuration(_)));
        assert!(!gate.is_valid());
        assert!(gate.active_key().is_err());
    }

    #[test]
    fn corrupt_settings_file_leaves_gate_invalid() {
        let temp = TempDir::new().unwrap();
        let settings = SettingsStore::new(temp.path().join("settings.json"));
        settings
            .save(&Settings {
                encryption_key: "c2hvcnQ=".to_string(),
                notes_limit: None,
            })
            .unwrap();

        let mut gate = EncryptionGate::new();
        assert!(gate.initialize(&KeyStore::new(settings)).is_err());
        assert!(!gate.is_valid());
    }

    #[test]
    fn fresh_settings_file_initializes() {
        let temp = TempDir::new().unwrap();
        let settings = SettingsStore::new(temp.path().join("settings.json"));

        let mut gate = EncryptionGate::new();
        gate.initialize(&KeyStore::new(settings)).unwrap();
        assert!(gate.is_valid());
    }

    #[test]
    fn valid_gate_is_readable_from_many_threads() {
        let mut gate = EncryptionGate::new();
        gate.initialize(&StaticKey::new(EncryptionKey::generate()))
            .unwrap();
        let gate = Arc::new(gate);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                std::thread::spawn(move || {
                    let key = gate.active_key().unwrap();
                    let sealed = cipher::encrypt_string("concurrent", key).unwrap();
                    cipher::decrypt_string(&sealed, key).unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), "concurrent");
        }
    }
}
