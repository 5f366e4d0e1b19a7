//! Request handlers for the REST surface.
//!
//! All responses use the JSON envelope: `{"success": true, "data": ...}` on
//! success, with failures handled by [`ApiError`]. Member mutations go
//! through the evented storage in [`AppState`], so each successful write
//! publishes its event without any extra step here.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use carebridge_auth::CaregiverIdentity;
use carebridge_core::member::{CreateMemberInput, UpdateMemberInput};
use carebridge_core::{format_rfc3339, now_utc};
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::server::AppState;

/// Wrap `data` in the success envelope.
fn success<T: serde::Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// `GET /` welcome payload.
pub async fn root() -> Json<Value> {
    success(json!({
        "message": "Welcome to the CareBridge Caregiver API",
    }))
}

/// `GET /health` liveness probe.
pub async fn health() -> Json<Value> {
    success(json!({
        "status": "healthy",
        "timestamp": format_rfc3339(now_utc()),
    }))
}

/// `GET /api/caregivers/me` profile of the authenticated caregiver.
///
/// The external subject id stays internal; the profile carries only the
/// caregiver's own fields.
pub async fn me(Extension(identity): Extension<CaregiverIdentity>) -> Json<Value> {
    let caregiver = &identity.caregiver;
    success(json!({
        "id": caregiver.id,
        "name": caregiver.name,
        "email": caregiver.email,
        "createdAt": format_rfc3339(caregiver.created_at),
    }))
}

/// `POST /api/protected-members` create a member record owned by the caller.
pub async fn create_member(
    State(state): State<AppState>,
    Extension(identity): Extension<CaregiverIdentity>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    // Map field mismatches ourselves so they get the JSON error envelope
    // instead of axum's plain-text rejection.
    let input: CreateMemberInput =
        serde_json::from_value(body).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let input = input.validated()?;

    let member = state.members.create(identity.caregiver_id(), input).await?;

    Ok((StatusCode::CREATED, success(member)).into_response())
}

/// `GET /api/protected-members` all members owned by the caller, newest first.
pub async fn list_members(
    State(state): State<AppState>,
    Extension(identity): Extension<CaregiverIdentity>,
) -> Result<Json<Value>, ApiError> {
    let members = state
        .members
        .list_for_caregiver(identity.caregiver_id())
        .await?;
    Ok(success(members))
}

/// `PATCH /api/protected-members/{id}` partial update of an owned member.
pub async fn update_member(
    State(state): State<AppState>,
    Extension(identity): Extension<CaregiverIdentity>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let input: UpdateMemberInput =
        serde_json::from_value(body).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let input = input.validated()?;

    let member = state
        .members
        .update(&id, identity.caregiver_id(), input)
        .await?;
    Ok(success(member))
}

/// `DELETE /api/protected-members/{id}` remove an owned member.
pub async fn delete_member(
    State(state): State<AppState>,
    Extension(identity): Extension<CaregiverIdentity>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.members.delete(&id, identity.caregiver_id()).await?;
    Ok(success(json!({
        "message": "Protected member deleted successfully",
    })))
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
