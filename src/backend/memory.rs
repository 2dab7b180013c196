//! In-memory records source.
//!
//! Backs offline/demo deployments and the test suite: same contract as the
//! REST backend, no network. Rows live in process memory and are lost on
//! shutdown.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::types::{IncidentRecord, WeighRecord};

use super::{BackendError, NewIncident, NewWeighRecord, RecordsSource};

/// Process-local records store.
#[derive(Debug, Default)]
pub struct MemorySource {
    weigh: Mutex<Vec<WeighRecord>>,
    incidents: Mutex<Vec<IncidentRecord>>,
    next_seq: AtomicI64,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with existing rows (tests, demo seeds).
    pub fn seeded(weigh: Vec<WeighRecord>, incidents: Vec<IncidentRecord>) -> Self {
        let next_seq = weigh.iter().map(|r| r.sequence_no).max().unwrap_or(0) + 1;
        Self {
            weigh: Mutex::new(weigh),
            incidents: Mutex::new(incidents),
            next_seq: AtomicI64::new(next_seq),
        }
    }

    fn lock_weigh(&self) -> std::sync::MutexGuard<'_, Vec<WeighRecord>> {
        self.weigh.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_incidents(&self) -> std::sync::MutexGuard<'_, Vec<IncidentRecord>> {
        self.incidents.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl RecordsSource for MemorySource {
    async fn fetch_weigh_records(&self) -> Result<Vec<WeighRecord>, BackendError> {
        Ok(self.lock_weigh().clone())
    }

    async fn fetch_incidents(&self) -> Result<Vec<IncidentRecord>, BackendError> {
        Ok(self.lock_incidents().clone())
    }

    async fn insert_weigh_record(
        &self,
        payload: &NewWeighRecord,
    ) -> Result<WeighRecord, BackendError> {
        let record = WeighRecord {
            worker_id: payload.worker_id.clone(),
            line: payload.line,
            weight_kg: payload.weight_kg,
            work_duration_hours: f64::from(payload.duration_minutes) / 60.0,
            recorded_at: Utc::now(),
            sequence_no: self.next_seq.fetch_add(1, Ordering::SeqCst),
        };
        self.lock_weigh().push(record.clone());
        Ok(record)
    }

    async fn insert_incident(
        &self,
        payload: &NewIncident,
    ) -> Result<IncidentRecord, BackendError> {
        let incident = IncidentRecord {
            kind: payload.kind,
            line: payload.line,
            severity: payload.severity,
            description: payload.description.clone(),
            worker_id: payload.worker_id.clone(),
            occurred_at: Utc::now(),
        };
        self.lock_incidents().push(incident.clone());
        Ok(incident)
    }
}
