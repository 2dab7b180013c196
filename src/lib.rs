//! Suivi-Rendement: Plant Productivity Intelligence
//!
//! Service tracking factory-floor throughput (kg/h) for a date-processing
//! plant: weigh-in and incident records flow in from a hosted backend, a
//! pure KPI engine turns them into the indicators operators watch, and a
//! threshold evaluator raises structured alerts.
//!
//! ## Architecture
//!
//! - **Engine**: pure computation — rate, aggregation, KPI synthesis, alerts
//! - **Backend**: records source trait with REST and in-memory impls, plus
//!   a short-TTL snapshot cache
//! - **Sessions**: per-user thresholds and alert log
//! - **API**: axum JSON surface consumed by the dashboard

pub mod api;
pub mod auth;
pub mod backend;
pub mod config;
pub mod engine;
pub mod session;
pub mod types;

// Re-export plant configuration
pub use config::PlantConfig;

// Re-export commonly used types
pub use types::{
    Alert, AlertCategory, AlertSeverity, IncidentKind, IncidentRecord, IncidentSeverity,
    KpiSnapshot, Line, Thresholds, Tier, WeighRecord,
};

// Re-export engine entry points
pub use engine::alerts::AlertLog;
pub use engine::kpi::{compute_snapshot, snapshot_from_records};

// Re-export backend boundary
pub use backend::{BackendError, MemorySource, RecordsSource, RestBackend, SnapshotCache};

// Re-export auth capability
pub use auth::{CredentialStore, Role, StaticCredentials};
