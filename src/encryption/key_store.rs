// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Loading, generating and persisting the 256-bit data key.
//!
//! The key lives base64-encoded in the settings record. It is generated once
//! (OS randomness) when the record or its key field is absent, and is never
//! rotated or re-derived while the process runs.

use std::fmt;

use base64ct::{Base64, Encoding};
use rand::{rngs::OsRng, RngCore};
use tracing::{info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::{EncryptionError, EncryptionResult};
use crate::settings::{Settings, SettingsStore, DEFAULT_NOTES_LIMIT};

/// AES-256 key size in bytes.
pub const KEY_LENGTH: usize = 32;

/// Raw AES-256 key material. Always exactly [`KEY_LENGTH`] bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_LENGTH]);

impl EncryptionKey {
    /// Fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap existing key bytes, refusing anything that is not 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> EncryptionResult<Self> {
        let array: [u8; KEY_LENGTH] = bytes.try_into().map_err(|_| {
            EncryptionError::Configuration(format!(
                "expected {KEY_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Decode the base64 form stored in the settings record.
    pub fn from_base64(encoded: &str) -> EncryptionResult<Self> {
        let mut decoded = Base64::decode_vec(encoded.trim()).map_err(|e| {
            EncryptionError::Configuration(format!("key is not valid base64: {e}"))
        })?;
        let key = Self::from_slice(&decoded);
        decoded.zeroize();
        key
    }

    pub fn to_base64(&self) -> String {
        Base64::encode_string(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

/// Anything that can hand the gate a key at startup.
pub trait KeySource {
    fn load_or_create_key(&self) -> EncryptionResult<EncryptionKey>;
}

/// Key source backed by the settings file.
#[derive(Debug, Clone)]
pub struct KeyStore {
    settings: SettingsStore,
}

impl KeyStore {
    pub fn new(settings: SettingsStore) -> Self {
        Self { settings }
    }

    fn generate_and_persist(&self, existing: Option<Settings>) -> EncryptionResult<EncryptionKey> {
        let key = EncryptionKey::generate();
        let mut settings = existing.unwrap_or_default();
        settings.encryption_key = key.to_base64();
        if settings.notes_limit.is_none() {
            settings.notes_limit = Some(DEFAULT_NOTES_LIMIT);
        }

        self.settings.save(&settings)?;
        info!(
            path = %self.settings.path().display(),
            "Generated new encryption key"
        );
        Ok(key)
    }
}

impl KeySource for KeyStore {
    fn load_or_create_key(&self) -> EncryptionResult<EncryptionKey> {
        match self.settings.load()? {
            Some(settings) if !settings.encryption_key.trim().is_empty() => {
                EncryptionKey::from_base64(&settings.encryption_key)
            }
            Some(settings) => {
                warn!(
                    path = %self.settings.path().display(),
                    "Settings file has no encryption key, generating one"
                );
                self.generate_and_persist(Some(settings))
            }
            None => self.generate_and_persist(None),
        }
    }
}

/// Key source that always returns the same outcome. Handy when the key comes
/// from somewhere other than the settings file, and in tests.
#[derive(Debug, Clone)]
pub struct StaticKey(Result<EncryptionKey, String>);

impl StaticKey {
    pub fn new(key: EncryptionKey) -> Self {
        Self(Ok(key))
    }

    /// A source whose key material is unusable.
    pub fn broken(reason: impl Into<String>) -> Self {
        Self(Err(reason.into()))
    }
}

impl KeySource for StaticKey {
    fn load_or_create_key(&self) -> EncryptionResult<EncryptionKey> {
        self.0
            .clone()
            .map_err(EncryptionError::Configuration)
    }
}
