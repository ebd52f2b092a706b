// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::encryption::EncryptionError;
use crate::storage::DbError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<EncryptionError> for ApiError {
    fn from(err: EncryptionError) -> Self {
        match err {
            EncryptionError::Unavailable => Self::forbidden(err.to_string()),
            EncryptionError::KeyUnavailable => Self::service_unavailable(err.to_string()),
            EncryptionError::Decryption(_) => {
                error!(error = %err, "Stored data could not be decrypted");
                Self::internal("Stored data could not be decrypted")
            }
            other => {
                error!(error = %other, "Encryption failure");
                Self::internal("Encryption failure")
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(message) => Self::not_found(message),
            DbError::Conflict(message) | DbError::InUse(message) => Self::conflict(message),
            DbError::InvalidReference(message) => Self::bad_request(message),
            other => {
                error!(error = %other, "Database failure");
                Self::internal("Database failure")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::{ENCRYPTION_UNAVAILABLE_MESSAGE, KEY_UNAVAILABLE_MESSAGE};
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        assert_eq!(ApiError::forbidden("no").status, StatusCode::FORBIDDEN);
        assert_eq!(ApiError::conflict("dup").status, StatusCode::CONFLICT);
        assert_eq!(
            ApiError::internal("boom").status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }

    #[test]
    fn unavailable_encryption_is_forbidden_with_stable_message() {
        let err = ApiError::from(EncryptionError::Unavailable);
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, ENCRYPTION_UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn unavailable_key_on_read_is_service_unavailable() {
        let err = ApiError::from(EncryptionError::KeyUnavailable);
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.message, KEY_UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn decryption_failure_hides_details() {
        let err = ApiError::from(EncryptionError::Decryption("authentication failed".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("authentication"));
    }

    #[test]
    fn database_errors_map_to_statuses() {
        let cases = [
            (DbError::NotFound("Note not found".into()), StatusCode::NOT_FOUND),
            (DbError::Conflict("dup".into()), StatusCode::CONFLICT),
            (DbError::InUse("busy".into()), StatusCode::CONFLICT),
            (DbError::InvalidReference("ref".into()), StatusCode::BAD_REQUEST),
        ];
        for (db_err, status) in cases {
            assert_eq!(ApiError::from(db_err).status, status);
        }

        let serde_err = serde_json::from_str::<u32>("x").unwrap_err();
        let err = ApiError::from(DbError::Serde(serde_err));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Database failure");
    }
}
