// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read access to the activity log, plus retention cleanup.
//!
//! These handlers never write audit entries themselves.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::{
    error::ApiError,
    models::{CountResponse, DeletedLogsResponse},
    state::AppState,
    storage::{ActivityAction, ActivityLog, ActivityLogFilter, AuditRepository, EntityType},
};

/// Page size when the caller does not pass `limit`.
pub const DEFAULT_LOG_LIMIT: usize = 20;
pub const INVALID_DAYS: &str = "Invalid number of days";
pub const INVALID_LOG_ID: &str = "Invalid log ID";

/// Filters for `GET /activity-logs`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityLogQuery {
    /// `note`, `category`, `encryption` or `key`.
    pub entity_type: Option<String>,
    /// `create`, `read`, `update`, `delete`, `check` or `generate`.
    pub action: Option<String>,
    /// Only entries at or after this instant (RFC 3339).
    pub start_date: Option<DateTime<Utc>>,
    /// Only entries at or before this instant (RFC 3339).
    pub end_date: Option<DateTime<Utc>>,
    /// Page size, default 20. `0` returns everything.
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Pagination for the filtered shortcut routes.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

fn parse_entity_type(raw: &str) -> Result<EntityType, ApiError> {
    raw.parse::<EntityType>().map_err(ApiError::bad_request)
}

fn parse_action(raw: &str) -> Result<ActivityAction, ApiError> {
    raw.parse::<ActivityAction>().map_err(ApiError::bad_request)
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl ActivityLogQuery {
    fn to_filter(&self) -> Result<ActivityLogFilter, ApiError> {
        Ok(ActivityLogFilter {
            entity_type: non_blank(self.entity_type.as_ref())
                .map(parse_entity_type)
                .transpose()?,
            action: non_blank(self.action.as_ref())
                .map(parse_action)
                .transpose()?,
            start: self.start_date,
            end: self.end_date,
            limit: self.limit.unwrap_or(DEFAULT_LOG_LIMIT),
            offset: self.offset.unwrap_or(0),
        })
    }
}

impl PageQuery {
    fn to_filter(&self) -> ActivityLogFilter {
        ActivityLogFilter {
            limit: self.limit.unwrap_or(DEFAULT_LOG_LIMIT),
            offset: self.offset.unwrap_or(0),
            ..Default::default()
        }
    }
}

#[utoipa::path(
    get,
    path = "/activity-logs",
    params(ActivityLogQuery),
    tag = "Activity Logs",
    responses(
        (status = 200, body = [ActivityLog]),
        (status = 400, description = "Unknown entity type or action")
    )
)]
pub async fn list_activity_logs(
    State(state): State<AppState>,
    Query(query): Query<ActivityLogQuery>,
) -> Result<Json<Vec<ActivityLog>>, ApiError> {
    let filter = query.to_filter()?;
    Ok(Json(AuditRepository::new(&state.db).list(&filter)?))
}

#[utoipa::path(
    get,
    path = "/activity-logs/count",
    params(ActivityLogQuery),
    tag = "Activity Logs",
    responses((status = 200, body = CountResponse))
)]
pub async fn count_activity_logs(
    State(state): State<AppState>,
    Query(query): Query<ActivityLogQuery>,
) -> Result<Json<CountResponse>, ApiError> {
    let filter = query.to_filter()?;
    let count = AuditRepository::new(&state.db).count(&filter)?;
    Ok(Json(CountResponse { count }))
}

#[utoipa::path(
    get,
    path = "/activity-logs/{id}",
    params(("id" = u64, Path, description = "Activity log identifier")),
    tag = "Activity Logs",
    responses(
        (status = 200, body = ActivityLog),
        (status = 400, description = "Invalid log ID"),
        (status = 404, description = "Activity log not found")
    )
)]
pub async fn get_activity_log(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ActivityLog>, ApiError> {
    let id = id
        .trim()
        .parse::<u64>()
        .map_err(|_| ApiError::bad_request(INVALID_LOG_ID))?;
    Ok(Json(AuditRepository::new(&state.db).get(id)?))
}

#[utoipa::path(
    get,
    path = "/activity-logs/entity-type/{entity_type}",
    params(
        ("entity_type" = String, Path, description = "note, category, encryption or key"),
        PageQuery
    ),
    tag = "Activity Logs",
    responses(
        (status = 200, body = [ActivityLog]),
        (status = 400, description = "Unknown entity type")
    )
)]
pub async fn logs_by_entity_type(
    Path(entity_type): Path<String>,
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<ActivityLog>>, ApiError> {
    let filter = ActivityLogFilter {
        entity_type: Some(parse_entity_type(&entity_type)?),
        ..page.to_filter()
    };
    Ok(Json(AuditRepository::new(&state.db).list(&filter)?))
}

#[utoipa::path(
    get,
    path = "/activity-logs/entity-type/{entity_type}/count",
    params(("entity_type" = String, Path, description = "note, category, encryption or key")),
    tag = "Activity Logs",
    responses((status = 200, body = CountResponse))
)]
pub async fn count_by_entity_type(
    Path(entity_type): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CountResponse>, ApiError> {
    let filter = ActivityLogFilter {
        entity_type: Some(parse_entity_type(&entity_type)?),
        ..Default::default()
    };
    let count = AuditRepository::new(&state.db).count(&filter)?;
    Ok(Json(CountResponse { count }))
}

#[utoipa::path(
    get,
    path = "/activity-logs/action/{action}",
    params(
        ("action" = String, Path, description = "create, read, update, delete, check or generate"),
        PageQuery
    ),
    tag = "Activity Logs",
    responses(
        (status = 200, body = [ActivityLog]),
        (status = 400, description = "Unknown action")
    )
)]
pub async fn logs_by_action(
    Path(action): Path<String>,
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<ActivityLog>>, ApiError> {
    let filter = ActivityLogFilter {
        action: Some(parse_action(&action)?),
        ..page.to_filter()
    };
    Ok(Json(AuditRepository::new(&state.db).list(&filter)?))
}

#[utoipa::path(
    get,
    path = "/activity-logs/action/{action}/count",
    params(("action" = String, Path, description = "create, read, update, delete, check or generate")),
    tag = "Activity Logs",
    responses((status = 200, body = CountResponse))
)]
pub async fn count_by_action(
    Path(action): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CountResponse>, ApiError> {
    let filter = ActivityLogFilter {
        action: Some(parse_action(&action)?),
        ..Default::default()
    };
    let count = AuditRepository::new(&state.db).count(&filter)?;
    Ok(Json(CountResponse { count }))
}

/// Retention cleanup. `days` must be a positive integer.
#[utoipa::path(
    delete,
    path = "/activity-logs/older-than/{days}",
    params(("days" = String, Path, description = "Age threshold in days, greater than zero")),
    tag = "Activity Logs",
    responses(
        (status = 200, body = DeletedLogsResponse),
        (status = 400, description = "Invalid number of days")
    )
)]
pub async fn delete_old_logs(
    Path(days): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DeletedLogsResponse>, ApiError> {
    let days = days
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|d| *d > 0)
        .ok_or_else(|| ApiError::bad_request(INVALID_DAYS))?;

    let rows_affected = AuditRepository::new(&state.db).delete_older_than(days)?;
    info!(days, rows_affected, "Purged old activity logs");

    Ok(Json(DeletedLogsResponse {
        message: "Old logs deleted successfully".to_string(),
        rows_affected,
    }))
}
