// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Field Encryption at Rest
//!
//! Sensitive note and category text is sealed with AES-256-GCM before it
//! reaches the database and opened again on the way out.
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`key_store`] | loads or generates the 32-byte key in `settings.json` |
//! | [`cipher`] | seals and opens single values (`nonce || ciphertext || tag`) |
//! | [`gate`] | self-tests the key once and latches the write permission |
//! | [`codec`] | per-entity encrypt-on-write / decrypt-on-read policy |
//!
//! ## Startup
//!
//! ```rust,ignore
//! let mut gate = EncryptionGate::new();
//! if let Err(e) = gate.initialize(&KeyStore::new(settings)) {
//!     tracing::warn!(error = %e, "Running read-only");
//! }
//! let codec = FieldCodec::new(Arc::new(gate));
//! ```

pub mod cipher;
pub mod codec;
pub mod error;
pub mod gate;
pub mod key_store;

pub use codec::{FieldCodec, Sealed, SensitiveFields};
pub use error::{
    EncryptionError, EncryptionResult, ENCRYPTION_UNAVAILABLE_MESSAGE, KEY_UNAVAILABLE_MESSAGE,
};
pub use gate::EncryptionGate;
pub use key_store::{EncryptionKey, KeySource, KeyStore, StaticKey, KEY_LENGTH};
