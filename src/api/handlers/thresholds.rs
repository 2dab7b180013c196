//! Session threshold endpoints.
//!
//! Reads return the caller's session copy; edits require a privileged role
//! and touch only that session. The defaults handed to new sessions come
//! from `plant_config.toml` and are not editable over the API.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::types::Thresholds;

use super::super::envelope::{ApiErrorResponse, ApiResponse};
use super::{require_session, ApiState};

/// Payload of GET/PUT /api/v1/thresholds
#[derive(Debug, Serialize)]
pub struct ThresholdsPayload {
    pub thresholds: Thresholds,
}

/// GET /api/v1/thresholds — the session's current threshold set.
pub async fn get_thresholds(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let (token, _role) = match require_session(&state, &headers).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };
    match state.sessions.thresholds_of(&token).await {
        Some(thresholds) => ApiResponse::ok(ThresholdsPayload { thresholds }),
        None => ApiErrorResponse::unauthorized("unknown or expired session"),
    }
}

/// PUT /api/v1/thresholds — replace the session's threshold set.
/// Privileged roles only; the full set is validated before it applies.
pub async fn put_thresholds(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(thresholds): Json<Thresholds>,
) -> Response {
    let (token, role) = match require_session(&state, &headers).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };
    if !role.can_edit_thresholds() {
        return ApiErrorResponse::forbidden("threshold edits require a supervisor or admin role");
    }
    if let Err(errors) = thresholds.validate() {
        return ApiErrorResponse::validation("invalid thresholds", errors);
    }

    if state.sessions.set_thresholds(&token, thresholds.clone()).await {
        info!(%role, "session thresholds updated");
        ApiResponse::ok(ThresholdsPayload { thresholds })
    } else {
        ApiErrorResponse::unauthorized("unknown or expired session")
    }
}
