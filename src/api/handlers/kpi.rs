//! KPI snapshot and leaderboard endpoints.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::engine::aggregate::{self, WorkerStats};
use crate::engine::{alerts, kpi};
use crate::types::{Alert, KpiSnapshot};

use super::super::envelope::{ApiErrorResponse, ApiResponse};
use super::records::RecordsQuery;
use super::{require_session, ApiState};

/// Payload of GET /api/v1/snapshot
#[derive(Debug, Serialize)]
pub struct SnapshotPayload {
    pub snapshot: KpiSnapshot,
    /// Alerts fired by this computation that were new to the session log
    pub new_alerts: Vec<Alert>,
    /// Total alerts accumulated in the session log
    pub alerts_total: usize,
    /// Set when the backend could not be reached at all and the snapshot
    /// was computed over an explicit empty record set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_error: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// GET /api/v1/snapshot — compute KPIs with the session's thresholds,
/// absorb fired alerts into the session log.
pub async fn snapshot(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(query): Query<RecordsQuery>,
) -> Response {
    let (token, _role) = match require_session(&state, &headers).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };
    let filter = match query.into_filter() {
        Ok(f) => f,
        Err(resp) => return resp,
    };

    let thresholds = match state.sessions.thresholds_of(&token).await {
        Some(t) => t,
        None => return ApiErrorResponse::unauthorized("unknown or expired session"),
    };

    // Collaborator faults never abort the dashboard: with no snapshot at
    // all the KPIs compute over an explicit empty set, with a notice.
    let (weigh, incidents, fetched_at, stale, backend_error) = match state.cache.read().await {
        Ok(read) => (
            filter.apply(&read.snapshot.weigh),
            filter.apply_incidents(&read.snapshot.incidents),
            Some(read.snapshot.fetched_at),
            read.stale,
            None,
        ),
        Err(e) => {
            warn!(error = %e, "snapshot computed over empty record set");
            (Vec::new(), Vec::new(), None, true, Some(e.to_string()))
        }
    };

    let computed = kpi::snapshot_from_records(&weigh, &incidents, &thresholds);
    let fired = alerts::evaluate(&computed, &thresholds);

    let new_alerts: Vec<Alert> = {
        let existing = state
            .sessions
            .alerts_of(&token)
            .await
            .unwrap_or_default();
        fired
            .iter()
            .filter(|a| !existing.iter().any(|e| e.message == a.message))
            .cloned()
            .collect()
    };
    state.sessions.absorb_alerts(&token, fired).await;
    let alerts_total = state
        .sessions
        .alerts_of(&token)
        .await
        .map_or(0, |list| list.len());

    ApiResponse::ok_maybe_stale(
        SnapshotPayload {
            snapshot: computed,
            new_alerts,
            alerts_total,
            backend_error,
            fetched_at,
        },
        stale,
    )
}

/// Payload of GET /api/v1/leaderboard
#[derive(Debug, Serialize)]
pub struct LeaderboardPayload {
    /// Workers ranked by mean throughput descending, worker_id ascending
    /// on ties
    pub workers: Vec<WorkerStats>,
    pub excluded_count: usize,
    pub fetched_at: DateTime<Utc>,
}

/// GET /api/v1/leaderboard — ranked per-worker aggregates.
pub async fn leaderboard(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(query): Query<RecordsQuery>,
) -> Response {
    if let Err(resp) = require_session(&state, &headers).await {
        return resp;
    }
    let filter = match query.into_filter() {
        Ok(f) => f,
        Err(resp) => return resp,
    };

    let read = match state.cache.read().await {
        Ok(read) => read,
        Err(e) => {
            warn!(error = %e, "leaderboard unavailable, backend unreachable");
            return ApiErrorResponse::bad_gateway(e.to_string());
        }
    };

    let aggregates = aggregate::aggregate(&filter.apply(&read.snapshot.weigh));
    ApiResponse::ok_maybe_stale(
        LeaderboardPayload {
            workers: aggregates.workers,
            excluded_count: aggregates.excluded_count,
            fetched_at: read.snapshot.fetched_at,
        },
        read.stale,
    )
}
