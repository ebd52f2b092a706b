// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::guard::{ClientAddress, WritesEnabled};
use crate::{
    error::ApiError,
    models::{Note, NoteQuery, NoteRequest},
    state::AppState,
    storage::{ActivityAction, ActivityLog, EntityType, NoteFilter, NoteRepository},
};

pub const NOTE_SUBJECT_EMPTY: &str = "note subject cannot be empty";

fn ensure_subject(request: &NoteRequest) -> Result<(), ApiError> {
    if request.subject.trim().is_empty() {
        return Err(ApiError::bad_request(NOTE_SUBJECT_EMPTY));
    }
    Ok(())
}

impl NoteQuery {
    fn wants_all(&self) -> bool {
        self.all
            .as_deref()
            .map(str::trim)
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
    }

    fn into_filter(self, default_limit: u32) -> NoteFilter {
        let limit = if self.wants_all() {
            None
        } else {
            Some(
                self.limit
                    .as_deref()
                    .and_then(|raw| raw.trim().parse::<usize>().ok())
                    .filter(|limit| *limit > 0)
                    .unwrap_or(default_limit as usize),
            )
        };

        NoteFilter {
            category_id: self.category_id.filter(|id| !id.trim().is_empty()),
            priority: self.priority,
            limit,
        }
    }
}

fn audit(state: &AppState, action: ActivityAction, description: String, note_id: Option<&str>, ip: String) {
    let mut entry = ActivityLog::new(action, EntityType::Note, description).with_ip(ip);
    if let Some(id) = note_id {
        entry = entry.with_entity(id);
    }
    state.audit.record(entry);
}

/// List notes in creation order.
///
/// The page size is applied to stored rows, so a page can come back short
/// when some rows cannot be decrypted.
#[utoipa::path(
    get,
    path = "/notes",
    params(NoteQuery),
    tag = "Notes",
    responses(
        (status = 200, body = [Note]),
        (status = 503, description = "Encryption key unavailable")
    )
)]
pub async fn list_notes(
    State(state): State<AppState>,
    ClientAddress(ip): ClientAddress,
    Query(query): Query<NoteQuery>,
) -> Result<Json<Vec<Note>>, ApiError> {
    state.gate().require_readable()?;
    let filter = query.into_filter(state.notes_limit);
    let sealed = NoteRepository::new(&state.db).get_all(&filter)?;
    let notes = state.codec.decrypt_fields_lenient(sealed);

    audit(&state, ActivityAction::Read, "Retrieved notes".to_string(), None, ip);
    Ok(Json(notes))
}

#[utoipa::path(
    get,
    path = "/notes/{id}",
    params(("id" = String, Path, description = "Note identifier")),
    tag = "Notes",
    responses(
        (status = 200, body = Note),
        (status = 404, description = "Note not found"),
        (status = 500, description = "Note could not be decrypted"),
        (status = 503, description = "Encryption key unavailable")
    )
)]
pub async fn get_note(
    Path(id): Path<String>,
    State(state): State<AppState>,
    ClientAddress(ip): ClientAddress,
) -> Result<Json<Note>, ApiError> {
    let sealed = NoteRepository::new(&state.db).get_by_id(&id)?;
    let note = state.codec.decrypt_fields(sealed)?;

    audit(
        &state,
        ActivityAction::Read,
        format!("Retrieved note: {}", note.subject),
        Some(&note.id),
        ip,
    );
    Ok(Json(note))
}

#[utoipa::path(
    post,
    path = "/notes",
    request_body = NoteRequest,
    tag = "Notes",
    responses(
        (status = 201, body = Note),
        (status = 400, description = "Empty subject or unknown category"),
        (status = 403, description = "Encryption unavailable")
    )
)]
pub async fn create_note(
    _: WritesEnabled,
    State(state): State<AppState>,
    ClientAddress(ip): ClientAddress,
    Json(request): Json<NoteRequest>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    ensure_subject(&request)?;

    let sealed = state.codec.encrypt_fields(Note::new(request))?;
    NoteRepository::new(&state.db).create(&sealed)?;

    let label = state.codec.safe_decrypt(&sealed.as_stored().subject);
    let note = state.codec.decrypt_fields(sealed)?;

    audit(
        &state,
        ActivityAction::Create,
        format!("Created note: {label}"),
        Some(&note.id),
        ip,
    );
    Ok((StatusCode::CREATED, Json(note)))
}

#[utoipa::path(
    put,
    path = "/notes/{id}",
    params(("id" = String, Path, description = "Note identifier")),
    request_body = NoteRequest,
    tag = "Notes",
    responses(
        (status = 200, body = Note),
        (status = 400, description = "Empty subject or unknown category"),
        (status = 403, description = "Encryption unavailable"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn update_note(
    _: WritesEnabled,
    Path(id): Path<String>,
    State(state): State<AppState>,
    ClientAddress(ip): ClientAddress,
    Json(request): Json<NoteRequest>,
) -> Result<Json<Note>, ApiError> {
    ensure_subject(&request)?;

    let repo = NoteRepository::new(&state.db);
    // Every sensitive field is overwritten by `apply`, so no stale
    // ciphertext is re-encrypted.
    let mut note = repo.get_by_id(&id)?.into_stored();
    note.apply(request);

    let sealed = state.codec.encrypt_fields(note)?;
    repo.update(&sealed)?;

    let label = state.codec.safe_decrypt(&sealed.as_stored().subject);
    let note = state.codec.decrypt_fields(sealed)?;

    audit(
        &state,
        ActivityAction::Update,
        format!("Updated note: {label}"),
        Some(&note.id),
        ip,
    );
    Ok(Json(note))
}

#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(("id" = String, Path, description = "Note identifier")),
    tag = "Notes",
    responses(
        (status = 204),
        (status = 403, description = "Encryption unavailable"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn delete_note(
    _: WritesEnabled,
    Path(id): Path<String>,
    State(state): State<AppState>,
    ClientAddress(ip): ClientAddress,
) -> Result<StatusCode, ApiError> {
    let repo = NoteRepository::new(&state.db);
    let existing = repo.get_by_id(&id)?;
    let label = state.codec.safe_decrypt(&existing.as_stored().subject);

    repo.delete(&id)?;

    audit(
        &state,
        ActivityAction::Delete,
        format!("Deleted note: {label}"),
        Some(&id),
        ip,
    );
    Ok(StatusCode::NO_CONTENT)
}
