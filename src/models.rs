// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the REST API, plus the two domain
//! entities. All types derive `Serialize`/`Deserialize` and `ToSchema` for
//! JSON handling and the OpenAPI document.
//!
//! [`Note`] and [`Category`] are the plaintext views. Their stored form is
//! the same struct wrapped in [`Sealed`](crate::encryption::Sealed), with
//! the fields named by [`SensitiveFields`] holding ciphertext.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::encryption::SensitiveFields;

// =============================================================================
// Categories
// =============================================================================

/// A named group of notes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Category {
    /// UUID v7 identifier.
    pub id: String,
    /// Display name (encrypted at rest).
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// A new category with a fresh time-ordered id.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl SensitiveFields for Category {
    const ENTITY_TYPE: &'static str = "category";

    fn entity_id(&self) -> &str {
        &self.id
    }

    fn sensitive_fields_mut(&mut self) -> Vec<&mut String> {
        vec![&mut self.name]
    }
}

/// Body for creating or renaming a category.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CategoryRequest {
    pub name: String,
}

// =============================================================================
// Notes
// =============================================================================

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// A note. `subject`, `content` and `tags` are encrypted at rest.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub subject: String,
    pub content: String,
    pub priority: Priority,
    /// Free-form, comma separated.
    pub tags: String,
    /// Owning category, if any. Must reference an existing category.
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(request: NoteRequest) -> Self {
        let now = Utc::now();
        let mut note = Self {
            id: uuid::Uuid::now_v7().to_string(),
            subject: String::new(),
            content: String::new(),
            priority: Priority::default(),
            tags: String::new(),
            category_id: None,
            created_at: now,
            updated_at: now,
        };
        note.apply(request);
        note
    }

    /// Overwrite the editable fields, keeping id and creation time.
    pub fn apply(&mut self, request: NoteRequest) {
        self.category_id = request.normalized_category_id();
        self.subject = request.subject;
        self.content = request.content;
        self.priority = request.priority;
        self.tags = request.tags;
        self.updated_at = Utc::now();
    }
}

impl SensitiveFields for Note {
    const ENTITY_TYPE: &'static str = "note";

    fn entity_id(&self) -> &str {
        &self.id
    }

    fn sensitive_fields_mut(&mut self) -> Vec<&mut String> {
        vec![&mut self.subject, &mut self.content, &mut self.tags]
    }
}

/// Body for creating or replacing a note.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct NoteRequest {
    pub subject: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub category_id: Option<String>,
}

impl NoteRequest {
    /// Blank ids (the web form sends `""`) mean "no category".
    pub fn normalized_category_id(&self) -> Option<String> {
        self.category_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

/// Filters for `GET /notes`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NoteQuery {
    /// Only notes in this category.
    pub category_id: Option<String>,
    /// Only notes with this priority.
    pub priority: Option<Priority>,
    /// Page size. Anything but a positive integer falls back to the
    /// `notes_limit` setting.
    #[param(value_type = Option<u32>)]
    pub limit: Option<String>,
    /// `true` (or `1`) returns every matching note, ignoring `limit`.
    #[param(value_type = Option<bool>)]
    pub all: Option<String>,
}

// =============================================================================
// Encryption & keys
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct EncryptionStatusResponse {
    pub encryption_valid: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateKeyRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct GenerateKeyResponse {
    /// Base64 of the SHA-256 digest of `text`.
    pub key: String,
}

// =============================================================================
// Generic responses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DeletedLogsResponse {
    pub message: String,
    #[serde(rename = "rowsAffected")]
    pub rows_affected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(subject: &str, category_id: Option<&str>) -> NoteRequest {
        NoteRequest {
            subject: subject.to_string(),
            content: "body".to_string(),
            priority: Priority::High,
            tags: "a,b".to_string(),
            category_id: category_id.map(str::to_string),
        }
    }

    #[test]
    fn note_request_defaults() {
        let parsed: NoteRequest = serde_json::from_str(r#"{"subject":"s"}"#).unwrap();
        assert_eq!(parsed.priority, Priority::Medium);
        assert!(parsed.content.is_empty());
        assert!(parsed.tags.is_empty());
        assert_eq!(parsed.category_id, None);
    }

    #[test]
    fn blank_category_id_means_none() {
        assert_eq!(request("s", Some("")).normalized_category_id(), None);
        assert_eq!(request("s", Some("  ")).normalized_category_id(), None);
        assert_eq!(
            request("s", Some("cat-1")).normalized_category_id(),
            Some("cat-1".to_string())
        );
    }

    #[test]
    fn apply_keeps_identity() {
        let mut note = Note::new(request("first", None));
        let id = note.id.clone();
        let created = note.created_at;

        note.apply(request("second", Some("cat-1")));
        assert_eq!(note.id, id);
        assert_eq!(note.created_at, created);
        assert_eq!(note.subject, "second");
        assert_eq!(note.category_id.as_deref(), Some("cat-1"));
    }

    #[test]
    fn note_ids_are_time_ordered() {
        let first = Note::new(request("a", None));
        let second = Note::new(request("b", None));
        assert!(first.id < second.id);
    }

    #[test]
    fn sensitive_fields_cover_text_only() {
        let mut note = Note::new(request("s", None));
        assert_eq!(note.sensitive_fields_mut().len(), 3);

        let mut category = Category::new("Work");
        let fields = category.sensitive_fields_mut();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].as_str(), "Work");
    }

    #[test]
    fn priority_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), r#""high""#);
        let parsed: Priority = serde_json::from_str(r#""low""#).unwrap();
        assert_eq!(parsed, Priority::Low);
    }

    #[test]
    fn deleted_logs_response_wire_names() {
        let body = serde_json::to_value(DeletedLogsResponse {
            message: "ok".into(),
            rows_affected: 3,
        })
        .unwrap();
        assert_eq!(body["rowsAffected"], 3);
    }
}
