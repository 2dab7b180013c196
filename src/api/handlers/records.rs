//! Weigh-in and incident record endpoints: listing, inserts, CSV export,
//! explicit cache refresh.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::{BackendError, NewIncident, NewWeighRecord};
use crate::engine::aggregate::RecordFilter;
use crate::engine::rate;
use crate::types::{IncidentRecord, Line, Tier, WeighRecord};

use super::super::envelope::{ApiErrorResponse, ApiResponse};
use super::{require_session, ApiState};

// ============================================================================
// Query / view types
// ============================================================================

/// Common filter query string: ?from&to&line&worker_id
#[derive(Debug, Default, Deserialize)]
pub struct RecordsQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub line: Option<u8>,
    pub worker_id: Option<String>,
}

impl RecordsQuery {
    /// Convert to an engine filter; a line number outside {1, 2} is a
    /// client error, not a coercion.
    pub fn into_filter(self) -> Result<RecordFilter, Response> {
        let line = match self.line {
            None => None,
            Some(n) => Some(
                Line::try_from(n)
                    .map_err(|e| ApiErrorResponse::bad_request(e))?,
            ),
        };
        Ok(RecordFilter {
            from: self.from,
            to: self.to,
            line,
            worker_id: self.worker_id,
        })
    }
}

/// One weigh record as the dashboard table shows it: stored fields plus the
/// recomputed throughput and tier.
#[derive(Debug, Serialize)]
pub struct RecordView {
    #[serde(flatten)]
    pub record: WeighRecord,
    pub throughput_kg_h: f64,
    pub tier: Tier,
}

/// Payload of GET /api/v1/records
#[derive(Debug, Serialize)]
pub struct RecordsPayload {
    pub records: Vec<RecordView>,
    /// Rows dropped for a non-positive duration
    pub excluded_count: usize,
    pub fetched_at: DateTime<Utc>,
}

fn record_views(records: &[WeighRecord]) -> (Vec<RecordView>, usize) {
    let mut views = Vec::with_capacity(records.len());
    let mut excluded = 0usize;
    for record in records {
        match rate::rate_and_tier(record) {
            Ok((throughput_kg_h, tier)) => views.push(RecordView {
                record: record.clone(),
                throughput_kg_h,
                tier,
            }),
            Err(_) => excluded += 1,
        }
    }
    (views, excluded)
}

fn backend_error_response(error: &BackendError) -> Response {
    warn!(%error, "backend call failed");
    ApiErrorResponse::bad_gateway(error.to_string())
}

// ============================================================================
// Weigh records
// ============================================================================

/// GET /api/v1/records — filtered rows with recomputed throughput.
pub async fn list(
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
        Err(e) => return backend_error_response(&e),
    };

    let filtered = filter.apply(&read.snapshot.weigh);
    let (records, excluded_count) = record_views(&filtered);
    ApiResponse::ok_maybe_stale(
        RecordsPayload {
            records,
            excluded_count,
            fetched_at: read.snapshot.fetched_at,
        },
        read.stale,
    )
}

/// POST /api/v1/records — insert one weigh-in, invalidate the cache.
pub async fn create(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(payload): Json<NewWeighRecord>,
) -> Response {
    if let Err(resp) = require_session(&state, &headers).await {
        return resp;
    }
    if let Err(errors) = payload.validate() {
        return ApiErrorResponse::validation("invalid weigh record", errors);
    }

    match state.source.insert_weigh_record(&payload).await {
        Ok(created) => {
            state.cache.invalidate();
            info!(worker_id = %created.worker_id, line = %created.line, "weigh record inserted");
            ApiResponse::created(created)
        }
        Err(e) => backend_error_response(&e),
    }
}

// ============================================================================
// Incidents
// ============================================================================

/// Payload of GET /api/v1/incidents
#[derive(Debug, Serialize)]
pub struct IncidentsPayload {
    pub incidents: Vec<IncidentRecord>,
    pub fetched_at: DateTime<Utc>,
}

/// GET /api/v1/incidents — filtered incident rows.
pub async fn list_incidents(
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
        Err(e) => return backend_error_response(&e),
    };

    ApiResponse::ok_maybe_stale(
        IncidentsPayload {
            incidents: filter.apply_incidents(&read.snapshot.incidents),
            fetched_at: read.snapshot.fetched_at,
        },
        read.stale,
    )
}

/// POST /api/v1/incidents — insert one incident, invalidate the cache.
pub async fn create_incident(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(payload): Json<NewIncident>,
) -> Response {
    if let Err(resp) = require_session(&state, &headers).await {
        return resp;
    }
    if let Err(errors) = payload.validate() {
        return ApiErrorResponse::validation("invalid incident", errors);
    }

    match state.source.insert_incident(&payload).await {
        Ok(created) => {
            state.cache.invalidate();
            info!(kind = ?created.kind, line = %created.line, "incident inserted");
            ApiResponse::created(created)
        }
        Err(e) => backend_error_response(&e),
    }
}

// ============================================================================
// CSV export
// ============================================================================

/// GET /api/v1/records/export — filtered rows as a CSV download.
pub async fn export_csv(
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
        Err(e) => return backend_error_response(&e),
    };

    let filtered = filter.apply(&read.snapshot.weigh);
    let (views, _) = record_views(&filtered);

    match render_csv(&views) {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"rendement.csv\"",
                ),
            ],
            body,
        )
            .into_response(),
        Err(e) => ApiErrorResponse::internal(format!("CSV rendering failed: {e}")),
    }
}

fn render_csv(views: &[RecordView]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "sequence_no",
        "worker_id",
        "line",
        "weight_kg",
        "work_duration_hours",
        "throughput_kg_h",
        "tier",
        "recorded_at",
    ])?;
    for view in views {
        writer.write_record([
            view.record.sequence_no.to_string(),
            view.record.worker_id.clone(),
            view.record.line.number().to_string(),
            format!("{:.3}", view.record.weight_kg),
            format!("{:.3}", view.record.work_duration_hours),
            format!("{:.3}", view.throughput_kg_h),
            view.tier.to_string(),
            view.record.recorded_at.to_rfc3339(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))
}

// ============================================================================
// Cache control
// ============================================================================

/// POST /api/v1/refresh — user-triggered cache invalidation.
pub async fn refresh(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    if let Err(resp) = require_session(&state, &headers).await {
        return resp;
    }
    state.cache.invalidate();
    ApiResponse::ok(serde_json::json!({ "invalidated": true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(worker: &str, weight_kg: f64, hours: f64) -> WeighRecord {
        WeighRecord {
            worker_id: worker.to_string(),
            line: Line::One,
            weight_kg,
            work_duration_hours: hours,
            recorded_at: Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap(),
            sequence_no: 1,
        }
    }

    #[test]
    fn test_record_views_exclude_faulted_durations() {
        let records = vec![record("OP-01", 32.0, 8.0), record("OP-02", 30.0, 0.0)];
        let (views, excluded) = record_views(&records);
        assert_eq!(views.len(), 1);
        assert_eq!(excluded, 1);
        assert!((views[0].throughput_kg_h - 4.0).abs() < 1e-9);
        assert_eq!(views[0].tier, Tier::Acceptable);
    }

    #[test]
    fn test_query_rejects_unknown_line() {
        let query = RecordsQuery {
            line: Some(3),
            ..RecordsQuery::default()
        };
        assert!(query.into_filter().is_err());
    }

    #[test]
    fn test_csv_rendering() {
        let (views, _) = record_views(&[record("OP-01", 32.0, 8.0)]);
        let bytes = render_csv(&views).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("sequence_no,worker_id"));
        let row = lines.next().unwrap();
        assert!(row.contains("OP-01"));
        assert!(row.contains("4.000"));
    }
}
