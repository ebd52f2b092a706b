// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-256-GCM sealing of individual values.
//!
//! Blob layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`, no
//! associated data. Every call draws a fresh nonce from the OS CSPRNG, so
//! sealing the same plaintext twice never yields the same blob.
//!
//! The string helpers wrap the blob in standard padded base64, which is the
//! form stored in the database.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64ct::{Base64, Encoding};
use rand::{rngs::OsRng, RngCore};

use super::error::{EncryptionError, EncryptionResult};
use super::key_store::EncryptionKey;

/// GCM nonce size in bytes.
pub const NONCE_LENGTH: usize = 12;

/// GCM authentication tag size in bytes.
pub const TAG_LENGTH: usize = 16;

fn cipher_for(key: &EncryptionKey) -> EncryptionResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| EncryptionError::Configuration(e.to_string()))
}

fn generate_nonce() -> [u8; NONCE_LENGTH] {
    let mut nonce = [0u8; NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Encrypt `plaintext`, returning `nonce || ciphertext+tag`.
pub fn seal(plaintext: &[u8], key: &EncryptionKey) -> EncryptionResult<Vec<u8>> {
    let cipher = cipher_for(key)?;
    let nonce = generate_nonce();

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| EncryptionError::Encryption("AES-GCM encryption failed".into()))?;

    let mut blob = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a blob produced by [`seal`].
///
/// Fails without returning any plaintext when the blob is shorter than a
/// nonce or when authentication fails (tampering, wrong key, truncation).
pub fn open(blob: &[u8], key: &EncryptionKey) -> EncryptionResult<Vec<u8>> {
    if blob.len() < NONCE_LENGTH {
        return Err(EncryptionError::Decryption(format!(
            "ciphertext too short: {} bytes",
            blob.len()
        )));
    }

    let (nonce, ciphertext) = blob.split_at(NONCE_LENGTH);
    let cipher = cipher_for(key)?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| EncryptionError::Decryption("authentication failed".into()))
}

/// Seal a UTF-8 string and return the base64 form.
pub fn encrypt_string(plaintext: &str, key: &EncryptionKey) -> EncryptionResult<String> {
    let blob = seal(plaintext.as_bytes(), key)?;
    Ok(Base64::encode_string(&blob))
}

/// Reverse of [`encrypt_string`].
pub fn decrypt_string(encoded: &str, key: &EncryptionKey) -> EncryptionResult<String> {
    let blob = Base64::decode_vec(encoded.trim())
        .map_err(|e| EncryptionError::Decryption(format!("invalid base64: {e}")))?;
    let plaintext = open(&blob, key)?;

    String::from_utf8(plaintext)
        .map_err(|_| EncryptionError::Decryption("plaintext is not valid UTF-8".into()))
}
