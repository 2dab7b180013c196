//! Records backend boundary
//!
//! The engine never talks HTTP directly: it consumes immutable snapshots
//! obtained through the [`RecordsSource`] trait. Two implementations ship:
//!
//! - `rest::RestBackend` — the hosted REST backend of record
//! - `memory::MemorySource` — in-process store for offline mode and tests
//!
//! `cache::SnapshotCache` sits in front of whichever source is active and
//! bounds the request rate with a short freshness window.

pub mod cache;
pub mod memory;
pub mod rest;

pub use cache::{CachedRead, RecordsSnapshot, SnapshotCache};
pub use memory::MemorySource;
pub use rest::RestBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{IncidentKind, IncidentRecord, IncidentSeverity, Line, WeighRecord};

/// Backend faults. All recoverable: the caller falls back to the last
/// known-good snapshot or an explicit empty result.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to decode backend payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Payload for inserting one weigh-in.
///
/// Durations arrive in minutes, matching the entry form (hours + minutes
/// folded client-side); the backend stores minutes as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWeighRecord {
    pub worker_id: String,
    pub line: Line,
    pub weight_kg: f64,
    pub duration_minutes: u32,
}

impl NewWeighRecord {
    /// Form-level validation, one message per offending field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.worker_id.trim().is_empty() {
            errors.push("worker_id must not be empty".to_string());
        }
        if self.weight_kg < 0.0 {
            errors.push(format!("weight_kg must be >= 0, got {}", self.weight_kg));
        }
        if self.duration_minutes == 0 {
            errors.push("duration_minutes must be >= 1".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Payload for inserting one incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIncident {
    pub kind: IncidentKind,
    pub line: Line,
    pub severity: IncidentSeverity,
    pub description: String,
    pub worker_id: String,
}

impl NewIncident {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.worker_id.trim().is_empty() {
            errors.push("worker_id must not be empty".to_string());
        }
        if self.description.trim().is_empty() {
            errors.push("description must not be empty".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Read/write boundary to the backend of record.
///
/// Reads return zero or more rows; writes return the created row so the
/// caller can confirm what was stored.
#[async_trait]
pub trait RecordsSource: Send + Sync {
    async fn fetch_weigh_records(&self) -> Result<Vec<WeighRecord>, BackendError>;

    async fn fetch_incidents(&self) -> Result<Vec<IncidentRecord>, BackendError>;

    async fn insert_weigh_record(
        &self,
        payload: &NewWeighRecord,
    ) -> Result<WeighRecord, BackendError>;

    async fn insert_incident(&self, payload: &NewIncident)
        -> Result<IncidentRecord, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_weigh_record_validation() {
        let good = NewWeighRecord {
            worker_id: "OP-01".to_string(),
            line: Line::One,
            weight_kg: 12.5,
            duration_minutes: 180,
        };
        assert!(good.validate().is_ok());

        let bad = NewWeighRecord {
            worker_id: "  ".to_string(),
            line: Line::One,
            weight_kg: -3.0,
            duration_minutes: 0,
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_new_incident_validation() {
        let bad = NewIncident {
            kind: IncidentKind::Breakdown,
            line: Line::Two,
            severity: IncidentSeverity::Severe,
            description: String::new(),
            worker_id: "OP-04".to_string(),
        };
        assert!(bad.validate().is_err());
    }
}
