// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-entity field encryption policy.
//!
//! Each entity type declares its sensitive fields once, through
//! [`SensitiveFields`]. [`FieldCodec`] is the only place that turns a
//! plaintext entity into its stored form and back.
//!
//! The stored form is the [`Sealed`] wrapper. Repositories only accept and
//! return `Sealed<T>`, and handlers only ever serialize `T`, so an entity
//! cannot cross the storage boundary in the wrong representation.
//!
//! ## Bulk-read policy
//!
//! [`FieldCodec::decrypt_fields_lenient`] drops any entity with a field that
//! fails to decode or authenticate, logging a warning with its id. Legacy
//! plaintext is never passed through on listings. [`FieldCodec::safe_decrypt`]
//! is the only pass-through path, for best-effort labels.

use std::sync::Arc;

use tracing::warn;

use super::cipher;
use super::error::EncryptionResult;
use super::gate::EncryptionGate;

/// Static declaration of which string fields of an entity are encrypted.
pub trait SensitiveFields {
    /// Entity name used in logs and audit records.
    const ENTITY_TYPE: &'static str;

    fn entity_id(&self) -> &str;

    /// Mutable access to every encrypted field, in a fixed order.
    fn sensitive_fields_mut(&mut self) -> Vec<&mut String>;
}

/// An entity whose sensitive fields hold ciphertext (base64 blobs).
///
/// Only [`FieldCodec::encrypt_fields`] and [`Sealed::from_storage`] create
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed<T>(T);

impl<T> Sealed<T> {
    /// Wrap a row read back from the store. Its fields are whatever was
    /// persisted, so they still have to go through the codec.
    pub fn from_storage(stored: T) -> Self {
        Self(stored)
    }

    /// The stored representation, for persisting.
    pub fn as_stored(&self) -> &T {
        &self.0
    }

    pub fn into_stored(self) -> T {
        self.0
    }
}

impl<T: SensitiveFields> Sealed<T> {
    pub fn entity_id(&self) -> &str {
        self.0.entity_id()
    }
}

/// Encrypt-on-write / decrypt-on-read for [`SensitiveFields`] entities.
#[derive(Debug, Clone)]
pub struct FieldCodec {
    gate: Arc<EncryptionGate>,
}

impl FieldCodec {
    pub fn new(gate: Arc<EncryptionGate>) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &EncryptionGate {
        &self.gate
    }

    /// Encrypt every sensitive field.
    ///
    /// The gate is checked before any field is touched, and the entity is
    /// consumed, so a failure can never leave a half-encrypted value behind.
    pub fn encrypt_fields<T: SensitiveFields>(&self, mut entity: T) -> EncryptionResult<Sealed<T>> {
        let key = self.gate.active_key()?;

        for field in entity.sensitive_fields_mut() {
            *field = cipher::encrypt_string(field, key)?;
        }
        Ok(Sealed(entity))
    }

    /// Strict decryption for a single entity. Any field failure is an error.
    pub fn decrypt_fields<T: SensitiveFields>(&self, sealed: Sealed<T>) -> EncryptionResult<T> {
        let key = self.gate.read_key()?;
        let mut entity = sealed.0;

        for field in entity.sensitive_fields_mut() {
            *field = cipher::decrypt_string(field, key)?;
        }
        Ok(entity)
    }

    /// Decrypt a listing, dropping entities that cannot be decrypted.
    ///
    /// With an invalid gate nothing can be opened, so the whole listing is
    /// dropped under a single WARN. Handlers that must tell "no data" apart
    /// from "no key" check [`EncryptionGate::require_readable`] first.
    pub fn decrypt_fields_lenient<T: SensitiveFields>(&self, sealed: Vec<Sealed<T>>) -> Vec<T> {
        let total = sealed.len();
        if total > 0 && !self.gate.is_valid() {
            warn!(
                entity_type = T::ENTITY_TYPE,
                total,
                "Encryption key unavailable, listing returned empty"
            );
            return Vec::new();
        }
        let mut entities = Vec::with_capacity(total);

        for item in sealed {
            let id = item.entity_id().to_string();
            match self.decrypt_fields(item) {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    warn!(
                        entity_type = T::ENTITY_TYPE,
                        entity_id = %id,
                        error = %e,
                        "Dropping entity that could not be decrypted"
                    );
                }
            }
        }

        if entities.len() < total {
            warn!(
                entity_type = T::ENTITY_TYPE,
                dropped = total - entities.len(),
                total,
                "Listing returned with undecryptable entities omitted"
            );
        }
        entities
    }

    /// Best-effort decryption that never fails.
    ///
    /// Returns `value` unchanged when the gate is invalid, the value is
    /// empty, or it does not decode and authenticate. Never use the result
    /// for control flow.
    pub fn safe_decrypt(&self, value: &str) -> String {
        if value.is_empty() {
            return String::new();
        }
        let Ok(key) = self.gate.read_key() else {
            return value.to_string();
        };
        cipher::decrypt_string(value, key).unwrap_or_else(|_| value.to_string())
    }
}
