//! Consistent response envelope for all API endpoints.
//!
//! Every response is wrapped in either [`ApiResponse`] (success) or
//! [`ApiErrorResponse`] (error), ensuring a uniform JSON shape. Successful
//! responses computed from a stale records snapshot carry `meta.stale` so
//! the dashboard can show a "données non actualisées" notice.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
    pub version: &'static str,
    /// Set when the payload was computed from the last known-good snapshot
    /// because a backend refresh failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale: Option<bool>,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: "1",
            stale: None,
        }
    }
}

/// Successful response: `{ "data": T, "meta": { ... } }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Response {
        Self::with_status(StatusCode::OK, data, false)
    }

    /// 200 with the stale marker set when the snapshot is not fresh.
    pub fn ok_maybe_stale(data: T, stale: bool) -> Response {
        Self::with_status(StatusCode::OK, data, stale)
    }

    pub fn created(data: T) -> Response {
        Self::with_status(StatusCode::CREATED, data, false)
    }

    fn with_status(status: StatusCode, data: T, stale: bool) -> Response {
        let body = Self {
            data,
            meta: ResponseMeta {
                stale: stale.then_some(true),
                ..ResponseMeta::default()
            },
        };
        (status, axum::Json(body)).into_response()
    }
}

/// Error detail inside [`ApiErrorResponse`].
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    /// Per-field validation messages, when applicable.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// Error response: `{ "error": { "code", "message", "details" }, "meta": { ... } }`
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
    pub meta: ResponseMeta,
}

impl ApiErrorResponse {
    fn build(status: StatusCode, code: &str, msg: impl Into<String>, details: Vec<String>) -> Response {
        let body = Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: msg.into(),
                details,
            },
            meta: ResponseMeta::default(),
        };
        (status, axum::Json(body)).into_response()
    }

    pub fn bad_request(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, Vec::new())
    }

    /// 400 carrying one message per offending field.
    pub fn validation(msg: impl Into<String>, details: Vec<String>) -> Response {
        Self::build(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", msg, details)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg, Vec::new())
    }

    pub fn forbidden(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::FORBIDDEN, "FORBIDDEN", msg, Vec::new())
    }

    pub fn not_found(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::NOT_FOUND, "NOT_FOUND", msg, Vec::new())
    }

    /// Collaborator fault: the hosted backend answered with an error.
    /// Surfaces the backend's status and message, never crashes the engine.
    pub fn bad_gateway(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_GATEWAY, "BACKEND_ERROR", msg, Vec::new())
    }

    pub fn internal(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg, Vec::new())
    }
}
