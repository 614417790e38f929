//! Route handlers.
//!
//! # Responsibilities
//! - Validate request shape (required fields, parameter presence)
//! - Run client-supplied scope values through the pattern filter
//! - Translate store results/errors into the response envelope
//!
//! Handlers map 1:1 to store operations and own no state beyond
//! `AppState`.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ServiceError;
use crate::http::response;
use crate::http::server::AppState;
use crate::store::{NewPreset, ScopeType};

const DEFAULT_LOG_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct DeviceQuery {
    pub device_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    pub value: Option<String>,
    #[allow(dead_code)] // accepted for symmetry with the other reads; scope lookups are not device-scoped
    pub device_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    pub days: Option<u32>,
}

/// Body shape shared by create (POST) and update (PUT).
#[derive(Debug, Deserialize)]
pub struct SavePresetBody {
    pub id: Option<String>,
    pub name: Option<String>,
    pub scope_type: Option<ScopeType>,
    #[serde(default)]
    pub scope_value: String,
    pub device_id: Option<String>,
    pub fields: Option<serde_json::Value>,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

fn require(value: Option<String>, field: &str) -> Result<String, ServiceError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ServiceError::Validation(format!("missing required field '{field}'"))),
    }
}

/// Liveness probe. Bypasses auth, still behind the origin filter.
pub async fn health() -> Response {
    response::ok(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /presets?device_id=
pub async fn list_presets(
    State(state): State<AppState>,
    Query(query): Query<DeviceQuery>,
) -> Result<Response, ServiceError> {
    let device_id = require(query.device_id, "device_id")?;
    let presets = state.store.get_all(&device_id)?;
    Ok(response::ok(presets))
}

/// POST /presets
pub async fn create_preset(
    State(state): State<AppState>,
    body: Result<axum::Json<SavePresetBody>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let axum::Json(body) = body.map_err(|e| ServiceError::Validation(e.body_text()))?;
    save_preset(state, body).await
}

/// PUT /presets/{id}
pub async fn update_preset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<axum::Json<SavePresetBody>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let axum::Json(mut body) = body.map_err(|e| ServiceError::Validation(e.body_text()))?;
    body.id = Some(id);
    save_preset(state, body).await
}

async fn save_preset(state: AppState, body: SavePresetBody) -> Result<Response, ServiceError> {
    let name = require(body.name, "name")?;
    let device_id = require(body.device_id, "device_id")?;
    let scope_type = body
        .scope_type
        .ok_or_else(|| ServiceError::Validation("missing required field 'scope_type'".into()))?;

    // Global presets carry no scope value; anything else goes through
    // the pattern filter before it can be stored.
    if !body.scope_value.is_empty() && !state.patterns.is_allowed(&body.scope_value) {
        return Err(ServiceError::Filtered);
    }

    let (preset, newly_created) = state.store.save(NewPreset {
        id: body.id,
        name,
        scope_type,
        scope_value: body.scope_value,
        fields: body.fields.unwrap_or_else(|| json!({})),
        encrypted: body.encrypted,
        device_id,
        metadata: body.metadata,
    })?;

    Ok(if newly_created {
        response::created(preset)
    } else {
        response::ok(preset)
    })
}

/// GET /presets/{id}?device_id=
pub async fn get_preset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeviceQuery>,
) -> Result<Response, ServiceError> {
    let device_id = require(query.device_id, "device_id")?;
    match state.store.get(&id, &device_id)? {
        Some(preset) => Ok(response::ok(preset)),
        None => Err(ServiceError::NotFound),
    }
}

/// DELETE /presets/{id}?device_id=
pub async fn delete_preset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeviceQuery>,
) -> Result<Response, ServiceError> {
    let device_id = require(query.device_id, "device_id")?;
    state.store.delete(&id, &device_id)?;
    Ok(response::message("preset deleted"))
}

/// POST /presets/{id}/usage
pub async fn record_usage(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    state.store.record_usage(&id)?;
    Ok(response::message("usage recorded"))
}

/// GET /presets/scope/{type}?value=
///
/// The scope value lives in a query parameter, not a path segment: a
/// scope value may itself be a full URL containing slashes.
pub async fn get_presets_by_scope(
    State(state): State<AppState>,
    Path(scope_type): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> Result<Response, ServiceError> {
    let scope_type: ScopeType = scope_type
        .parse()
        .map_err(ServiceError::Validation)?;
    let value = require(query.value, "value")?;

    if !state.patterns.is_allowed(&value) {
        return Err(ServiceError::Filtered);
    }

    let presets = state.store.get_by_scope(scope_type, &value)?;
    Ok(response::ok(presets))
}

/// GET /devices
pub async fn list_devices(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let devices = state.store.list_devices()?;
    Ok(response::ok(devices))
}

/// GET /sync/log/{id}?limit=
pub async fn preset_sync_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Response, ServiceError> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    let entries = state.store.sync_log(&id, limit)?;
    Ok(response::ok(entries))
}

/// GET /sync/log?limit=
pub async fn recent_sync_log(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Response, ServiceError> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    let entries = state.store.recent_sync_log(limit)?;
    Ok(response::ok(entries))
}

/// GET /sync/status?device_id=
pub async fn sync_status(
    State(state): State<AppState>,
    Query(query): Query<DeviceQuery>,
) -> Result<Response, ServiceError> {
    let device_id = require(query.device_id, "device_id")?;
    let count = state.store.count_for_device(&device_id)?;
    Ok(response::ok(json!({
        "device_id": device_id,
        "preset_count": count,
        "status": "ok",
    })))
}

/// POST /sync/cleanup?days=
pub async fn cleanup(
    State(state): State<AppState>,
    query: Result<Query<CleanupQuery>, axum::extract::rejection::QueryRejection>,
) -> Result<Response, ServiceError> {
    let Query(query) = query.map_err(|e| ServiceError::Validation(e.body_text()))?;
    let days = query
        .days
        .ok_or_else(|| ServiceError::Validation("missing required parameter 'days'".into()))?;
    let removed = state.store.cleanup_older_than(days)?;
    Ok(response::ok(json!({ "removed": removed })))
}

/// Catch-all for unknown routes, keeping the envelope shape.
pub async fn not_found() -> Response {
    response::error(axum::http::StatusCode::NOT_FOUND, "no such route")
}
