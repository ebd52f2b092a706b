// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request extractors shared by the handlers.
//!
//! Put `WritesEnabled` first in every mutating handler's argument list:
//!
//! ```rust,ignore
//! async fn create_note(
//!     _: WritesEnabled,
//!     State(state): State<AppState>,
//!     Json(request): Json<NoteRequest>,
//! ) -> Result<(StatusCode, Json<Note>), ApiError> { ... }
//! ```
//!
//! A rejected request is answered with 403 before the body is parsed, so it
//! never reaches the codec or the store.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::UNKNOWN_ADDRESS;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Proof that the encryption gate allowed this request to write.
#[derive(Debug, Clone, Copy)]
pub struct WritesEnabled;

impl WritesEnabled {
    pub fn check(state: &AppState) -> Result<Self, ApiError> {
        state.gate().require_valid().map_err(|e| {
            warn!("Write rejected: encryption unavailable");
            ApiError::from(e)
        })?;
        Ok(Self)
    }
}

impl FromRequestParts<AppState> for WritesEnabled {
    type Rejection = ApiError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Self::check(state)
    }
}

/// Best-effort client address for the activity log.
///
/// First entry of `X-Forwarded-For`, else the socket peer (when the server
/// was started with connect info), else `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddress(pub String);

impl ClientAddress {
    fn from_parts(parts: &Parts) -> Self {
        let forwarded = parts
            .headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        if let Some(addr) = forwarded {
            return Self(addr.to_string());
        }

        match parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            Some(ConnectInfo(peer)) => Self(peer.ip().to_string()),
            None => Self(UNKNOWN_ADDRESS.to_string()),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientAddress {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}
