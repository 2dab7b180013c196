//! API route handlers
//!
//! Grouped by area: authentication, records, KPI snapshot/leaderboard,
//! thresholds, alerts, service status. Every handler reads one immutable
//! records snapshot through the cache and passes the session's thresholds
//! into the engine explicitly.

pub mod alerts;
pub mod auth;
pub mod kpi;
pub mod records;
pub mod status;
pub mod thresholds;

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::response::Response;

use crate::auth::{CredentialStore, Role};
use crate::backend::{RecordsSource, SnapshotCache};
use crate::config::PlantInfo;
use crate::session::SessionStore;

use super::envelope::ApiErrorResponse;

// ============================================================================
// API State
// ============================================================================

/// Shared state for all handlers.
#[derive(Clone)]
pub struct ApiState {
    /// Logged-in sessions (role, thresholds, alert log)
    pub sessions: Arc<SessionStore>,
    /// TTL cache in front of the records source
    pub cache: Arc<SnapshotCache>,
    /// Write path to the backend of record
    pub source: Arc<dyn RecordsSource>,
    /// Injected credential lookup
    pub credentials: Arc<dyn CredentialStore>,
    /// Plant identity, shown by the health endpoint
    pub plant: PlantInfo,
}

impl ApiState {
    pub fn new(
        sessions: Arc<SessionStore>,
        cache: Arc<SnapshotCache>,
        source: Arc<dyn RecordsSource>,
        credentials: Arc<dyn CredentialStore>,
        plant: PlantInfo,
    ) -> Self {
        Self {
            sessions,
            cache,
            source,
            credentials,
            plant,
        }
    }
}

// ============================================================================
// Session extraction
// ============================================================================

/// Pull the bearer token out of the Authorization header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// Resolve the caller's session or produce the 401 to return.
pub(crate) async fn require_session(
    state: &ApiState,
    headers: &HeaderMap,
) -> Result<(String, Role), Response> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiErrorResponse::unauthorized("missing bearer token"))?;
    match state.sessions.role_of(&token).await {
        Some(role) => Ok((token, role)),
        None => Err(ApiErrorResponse::unauthorized("unknown or expired session")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc-123"));
        assert_eq!(bearer_token(&headers), Some("abc-123".to_string()));
    }

    #[test]
    fn test_bearer_token_missing_or_malformed() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }
}
