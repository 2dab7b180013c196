//! Login / logout endpoints.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::Role;

use super::super::envelope::{ApiErrorResponse, ApiResponse};
use super::{bearer_token, ApiState};

/// Request body for POST /api/v1/auth/login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
}

/// POST /api/v1/auth/login — authenticate and open a session.
pub async fn login(
    State(state): State<ApiState>,
    Json(request): Json<LoginRequest>,
) -> Response {
    match state
        .credentials
        .authenticate(&request.username, &request.password)
    {
        Some(role) => {
            let token = state.sessions.open(role).await;
            info!(username = %request.username, %role, "session opened");
            ApiResponse::created(LoginResponse { token, role })
        }
        None => ApiErrorResponse::unauthorized("invalid username or password"),
    }
}

/// POST /api/v1/auth/logout — close the caller's session.
pub async fn logout(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    match bearer_token(&headers) {
        Some(token) if state.sessions.close(&token).await => {
            ApiResponse::ok(serde_json::json!({ "closed": true }))
        }
        _ => ApiErrorResponse::unauthorized("unknown or expired session"),
    }
}
