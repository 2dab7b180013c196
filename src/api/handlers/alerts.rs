//! Session alert log endpoints.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Serialize;

use crate::types::Alert;

use super::super::envelope::{ApiErrorResponse, ApiResponse};
use super::{require_session, ApiState};

/// Payload of GET /api/v1/alerts
#[derive(Debug, Serialize)]
pub struct AlertsPayload {
    pub alerts: Vec<Alert>,
}

/// GET /api/v1/alerts — the session's accumulated alert log.
pub async fn list(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let (token, _role) = match require_session(&state, &headers).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };
    match state.sessions.alerts_of(&token).await {
        Some(alerts) => ApiResponse::ok(AlertsPayload { alerts }),
        None => ApiErrorResponse::unauthorized("unknown or expired session"),
    }
}

/// DELETE /api/v1/alerts — explicit user action emptying the log.
pub async fn clear(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let (token, _role) = match require_session(&state, &headers).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };
    if state.sessions.clear_alerts(&token).await {
        ApiResponse::ok(serde_json::json!({ "cleared": true }))
    } else {
        ApiErrorResponse::unauthorized("unknown or expired session")
    }
}
