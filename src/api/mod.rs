// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        Category, CategoryRequest, CountResponse, DeletedLogsResponse, EncryptionStatusResponse,
        GenerateKeyRequest, GenerateKeyResponse, Note, NoteRequest, Priority,
    },
    state::AppState,
    storage::{ActivityAction, ActivityLog, EntityType},
};

pub mod activity_logs;
pub mod categories;
pub mod encryption;
pub mod guard;
pub mod health;
pub mod keys;
pub mod notes;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/encryption/status", get(encryption::encryption_status))
        .route("/generate-key", post(keys::generate_key))
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/{id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/notes/{id}",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/activity-logs", get(activity_logs::list_activity_logs))
        .route(
            "/activity-logs/count",
            get(activity_logs::count_activity_logs),
        )
        .route("/activity-logs/{id}", get(activity_logs::get_activity_log))
        .route(
            "/activity-logs/entity-type/{entity_type}",
            get(activity_logs::logs_by_entity_type),
        )
        .route(
            "/activity-logs/entity-type/{entity_type}/count",
            get(activity_logs::count_by_entity_type),
        )
        .route(
            "/activity-logs/action/{action}",
            get(activity_logs::logs_by_action),
        )
        .route(
            "/activity-logs/action/{action}/count",
            get(activity_logs::count_by_action),
        )
        .route(
            "/activity-logs/older-than/{days}",
            delete(activity_logs::delete_old_logs),
        )
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        encryption::encryption_status,
        keys::generate_key,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        notes::list_notes,
        notes::get_note,
        notes::create_note,
        notes::update_note,
        notes::delete_note,
        activity_logs::list_activity_logs,
        activity_logs::count_activity_logs,
        activity_logs::get_activity_log,
        activity_logs::logs_by_entity_type,
        activity_logs::count_by_entity_type,
        activity_logs::logs_by_action,
        activity_logs::count_by_action,
        activity_logs::delete_old_logs,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            Category,
            CategoryRequest,
            Note,
            NoteRequest,
            Priority,
            EncryptionStatusResponse,
            GenerateKeyRequest,
            GenerateKeyResponse,
            CountResponse,
            DeletedLogsResponse,
            ActivityLog,
            ActivityAction,
            EntityType,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Encryption", description = "Encryption status and key derivation"),
        (name = "Categories", description = "Category management"),
        (name = "Notes", description = "Encrypted notes"),
        (name = "Activity Logs", description = "Audit trail queries and retention"),
        (name = "Health", description = "Liveness and readiness")
    )
)]
struct ApiDoc;
