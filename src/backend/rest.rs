//! REST client for the hosted records backend.
//!
//! The backend of record is a hosted Postgres REST gateway keeping the
//! plant's historical column names: `rendements` rows carry
//! `operatrice_id` / `ligne` / `poids_kg` / `temps_min`, `incidents` rows
//! carry `type` / `gravite`. Field presence is not guaranteed — every wire
//! field has a serde default so a sparse row ingests instead of erroring.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::defaults::BACKEND_HTTP_TIMEOUT_SECS;
use crate::config::BackendConfig;
use crate::types::{IncidentKind, IncidentRecord, IncidentSeverity, Line, WeighRecord};

use super::{BackendError, NewIncident, NewWeighRecord, RecordsSource};

// ============================================================================
// Wire rows
// ============================================================================

/// One `rendements` row as the backend serves it. Loosely typed: missing
/// numerics coerce to 0, a missing timestamp coerces to the Unix epoch.
#[derive(Debug, Clone, Deserialize)]
struct RendementRow {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    operatrice_id: String,
    #[serde(default)]
    ligne: u8,
    #[serde(default)]
    poids_kg: f64,
    #[serde(default)]
    temps_min: f64,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<RendementRow> for WeighRecord {
    fn from(row: RendementRow) -> Self {
        WeighRecord {
            worker_id: row.operatrice_id,
            line: Line::from_wire(row.ligne),
            weight_kg: row.poids_kg,
            // Stored in minutes; the engine works in hours. A zero or
            // missing duration stays zero and faults in the rate stage.
            work_duration_hours: row.temps_min / 60.0,
            recorded_at: row.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            sequence_no: row.id,
        }
    }
}

/// Insert payload for `rendements`.
#[derive(Debug, Serialize)]
struct RendementInsert<'a> {
    operatrice_id: &'a str,
    ligne: u8,
    poids_kg: f64,
    temps_min: u32,
}

/// One `incidents` row as the backend serves it.
#[derive(Debug, Clone, Deserialize)]
struct IncidentRow {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    ligne: u8,
    #[serde(default)]
    gravite: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    operatrice_id: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<IncidentRow> for IncidentRecord {
    fn from(row: IncidentRow) -> Self {
        IncidentRecord {
            kind: IncidentKind::from_wire(&row.kind),
            line: Line::from_wire(row.ligne),
            severity: IncidentSeverity::from_wire(&row.gravite),
            description: row.description,
            worker_id: row.operatrice_id,
            occurred_at: row.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }
}

/// Insert payload for `incidents`.
#[derive(Debug, Serialize)]
struct IncidentInsert<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    ligne: u8,
    gravite: &'static str,
    description: &'a str,
    operatrice_id: &'a str,
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for the hosted backend.
#[derive(Clone)]
pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    weigh_table: String,
    incident_table: String,
}

impl RestBackend {
    /// Build a client from the backend section of the plant config.
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(BACKEND_HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            weigh_table: config.weigh_table.clone(),
            incident_table: config.incident_table.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// GET every row of a table, oldest first.
    async fn fetch_rows<Row: for<'de> Deserialize<'de>>(
        &self,
        table: &str,
    ) -> Result<Vec<Row>, BackendError> {
        let resp = self
            .http
            .get(self.table_url(table))
            .query(&[("select", "*"), ("order", "created_at.asc")])
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let rows: Vec<Row> = resp.json().await?;
        debug!(table, count = rows.len(), "fetched backend rows");
        Ok(rows)
    }

    /// POST one row, asking the backend to echo the created representation.
    async fn insert_row<Row: for<'de> Deserialize<'de>>(
        &self,
        table: &str,
        body: &impl Serialize,
    ) -> Result<Row, BackendError> {
        let resp = self
            .http
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if status != reqwest::StatusCode::CREATED && !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        // return=representation yields a one-element array.
        let mut rows: Vec<Row> = resp.json().await?;
        rows.pop().ok_or(BackendError::Status {
            status: status.as_u16(),
            message: "backend accepted the insert but returned no row".to_string(),
        })
    }
}

#[async_trait]
impl RecordsSource for RestBackend {
    async fn fetch_weigh_records(&self) -> Result<Vec<WeighRecord>, BackendError> {
        let rows: Vec<RendementRow> = self.fetch_rows(&self.weigh_table).await?;
        Ok(rows.into_iter().map(WeighRecord::from).collect())
    }

    async fn fetch_incidents(&self) -> Result<Vec<IncidentRecord>, BackendError> {
        let rows: Vec<IncidentRow> = self.fetch_rows(&self.incident_table).await?;
        Ok(rows.into_iter().map(IncidentRecord::from).collect())
    }

    async fn insert_weigh_record(
        &self,
        payload: &NewWeighRecord,
    ) -> Result<WeighRecord, BackendError> {
        let body = RendementInsert {
            operatrice_id: &payload.worker_id,
            ligne: payload.line.number(),
            poids_kg: payload.weight_kg,
            temps_min: payload.duration_minutes,
        };
        let row: RendementRow = self.insert_row(&self.weigh_table, &body).await?;
        Ok(row.into())
    }

    async fn insert_incident(
        &self,
        payload: &NewIncident,
    ) -> Result<IncidentRecord, BackendError> {
        let body = IncidentInsert {
            kind: payload.kind.wire_code(),
            ligne: payload.line.number(),
            gravite: payload.severity.wire_code(),
            description: &payload.description,
            operatrice_id: &payload.worker_id,
        };
        let row: IncidentRow = self.insert_row(&self.incident_table, &body).await?;
        Ok(row.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_rendement_row_coerces_defaults() {
        // Only the id present: everything else takes its default.
        let row: RendementRow = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        let record = WeighRecord::from(row);
        assert_eq!(record.sequence_no, 7);
        assert_eq!(record.weight_kg, 0.0);
        assert_eq!(record.work_duration_hours, 0.0);
        assert_eq!(record.recorded_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(record.line, Line::One);
    }

    #[test]
    fn test_rendement_row_minutes_convert_to_hours() {
        let row: RendementRow = serde_json::from_str(
            r#"{"id": 1, "operatrice_id": "OP-03", "ligne": 2, "poids_kg": 21.0, "temps_min": 300.0}"#,
        )
        .unwrap();
        let record = WeighRecord::from(row);
        assert_eq!(record.line, Line::Two);
        assert!((record.work_duration_hours - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_incident_row_wire_parse() {
        let row: IncidentRow = serde_json::from_str(
            r#"{"type": "panne", "ligne": 1, "gravite": "critique", "description": "tapis bloqué", "operatrice_id": "OP-02"}"#,
        )
        .unwrap();
        let incident = IncidentRecord::from(row);
        assert_eq!(incident.kind, IncidentKind::Breakdown);
        assert_eq!(incident.severity, IncidentSeverity::Critical);
    }

    #[test]
    fn test_unknown_extra_fields_are_ignored() {
        let row: RendementRow = serde_json::from_str(
            r#"{"id": 2, "poids_kg": 10.0, "temps_min": 120.0, "rendement": 5.0}"#,
        )
        .unwrap();
        // The stored "rendement" column is ignored; throughput is recomputed.
        let record = WeighRecord::from(row);
        assert!((record.work_duration_hours - 2.0).abs() < 1e-9);
    }
}
