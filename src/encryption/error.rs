// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy for the encryption subsystem.

use thiserror::Error;

use crate::settings::SettingsError;

/// Message returned to callers when a write is attempted with an invalid gate.
///
/// Kept stable so operators can tell key-configuration problems apart from
/// generic server errors.
pub const ENCRYPTION_UNAVAILABLE_MESSAGE: &str =
    "Encryption system is not properly initialized. Data modification is disabled for security reasons.";

/// Message returned when stored data is requested while the key is unusable.
pub const KEY_UNAVAILABLE_MESSAGE: &str =
    "Encryption key is unavailable. Stored data cannot be read until the key is fixed.";

#[derive(Debug, Error)]
pub enum EncryptionError {
    /// Malformed or wrong-length key material. Only raised on the startup path.
    #[error("invalid encryption key: {0}")]
    Configuration(String),

    /// The gate is not valid; the write must be rejected.
    #[error("{}", ENCRYPTION_UNAVAILABLE_MESSAGE)]
    Unavailable,

    /// The gate is not valid; stored ciphertext cannot be opened.
    #[error("{}", KEY_UNAVAILABLE_MESSAGE)]
    KeyUnavailable,

    /// Authentication failure, truncated blob or bad encoding.
    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The known-answer round trip returned different bytes.
    #[error("encryption self-test failed: {0}")]
    SelfTest(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

pub type EncryptionResult<T> = Result<T, EncryptionError>;
