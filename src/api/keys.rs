// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use base64ct::{Base64, Encoding};
use sha2::{Digest, Sha256};

use super::guard::ClientAddress;
use crate::{
    error::ApiError,
    models::{GenerateKeyRequest, GenerateKeyResponse},
    state::AppState,
    storage::{ActivityAction, ActivityLog, EntityType},
};

pub const KEY_INPUT_EMPTY: &str = "input text cannot be empty";

/// Derive a 32-byte key from a passphrase: base64 of its SHA-256 digest.
///
/// The result is in the format the `encryption_key` setting expects. This
/// is a convenience for operators, not a password KDF.
pub fn derive_key(text: &str) -> String {
    Base64::encode_string(&Sha256::digest(text.as_bytes()))
}

#[utoipa::path(
    post,
    path = "/generate-key",
    request_body = GenerateKeyRequest,
    tag = "Encryption",
    responses(
        (status = 200, body = GenerateKeyResponse),
        (status = 400, description = "Empty input")
    )
)]
pub async fn generate_key(
    State(state): State<AppState>,
    ClientAddress(ip): ClientAddress,
    Json(request): Json<GenerateKeyRequest>,
) -> Result<Json<GenerateKeyResponse>, ApiError> {
    if request.text.is_empty() {
        return Err(ApiError::bad_request(KEY_INPUT_EMPTY));
    }

    let key = derive_key(&request.text);

    state.audit.record(
        ActivityLog::new(
            ActivityAction::Generate,
            EntityType::Key,
            "Generated encryption key from text",
        )
        .with_ip(ip),
    );

    Ok(Json(GenerateKeyResponse { key }))
}
