// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use super::guard::ClientAddress;
use crate::{
    encryption::ENCRYPTION_UNAVAILABLE_MESSAGE,
    models::EncryptionStatusResponse,
    state::AppState,
    storage::{ActivityAction, ActivityLog, EntityType},
};

pub const ENCRYPTION_VALID_MESSAGE: &str =
    "Encryption system is properly initialized and working correctly.";

/// Report whether the server accepts writes.
#[utoipa::path(
    get,
    path = "/encryption/status",
    tag = "Encryption",
    responses((status = 200, body = EncryptionStatusResponse))
)]
pub async fn encryption_status(
    State(state): State<AppState>,
    ClientAddress(ip): ClientAddress,
) -> Json<EncryptionStatusResponse> {
    let valid = state.gate().is_valid();

    state.audit.record(
        ActivityLog::new(
            ActivityAction::Check,
            EntityType::Encryption,
            format!(
                "Checked encryption status: {}",
                if valid { "valid" } else { "invalid" }
            ),
        )
        .with_ip(ip),
    );

    Json(EncryptionStatusResponse {
        encryption_valid: valid,
        message: if valid {
            ENCRYPTION_VALID_MESSAGE
        } else {
            ENCRYPTION_UNAVAILABLE_MESSAGE
        }
        .to_string(),
    })
}
