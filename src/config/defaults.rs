//! Service-wide default constants.
//!
//! Centralises the tunable values that ship out of the box. Grouped by
//! subsystem for easy discovery; everything here can be overridden in
//! `plant_config.toml`.

// ============================================================================
// KPI Thresholds
// ============================================================================

/// Target throughput for a good shift (kg/h). Matches the Excellent tier
/// cut point.
pub const DEFAULT_RENDEMENT_HIGH_KG_H: f64 = 4.5;

/// Minimum acceptable throughput (kg/h). Matches the Acceptable tier cut
/// point; lines and workers below it count as underperforming.
pub const DEFAULT_RENDEMENT_MID_KG_H: f64 = 4.0;

/// Maximum tolerated share of records in {Low, Critical} tiers (%).
pub const DEFAULT_NON_PRODUCTIVITY_PCT: f64 = 30.0;

/// Maximum tolerated share of workers below the mid cutoff (%).
pub const DEFAULT_UNDERPERFORMANCE_PCT: f64 = 30.0;

/// Maximum tolerated stddev of per-record throughput (kg/h).
pub const DEFAULT_VARIABILITY_KG_H: f64 = 1.5;

/// Breakdown count at or above which an alert fires.
pub const DEFAULT_BREAKDOWN_COUNT: u32 = 3;

/// Maximum tolerated error incidents per weigh record (%).
pub const DEFAULT_ERROR_RATE_PCT: f64 = 10.0;

// ============================================================================
// Backend
// ============================================================================

/// How long a fetched record snapshot stays fresh (seconds).
///
/// Bounds the request rate against the hosted backend; writes and the
/// refresh endpoint invalidate early.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// HTTP client timeout for backend requests (seconds).
pub const BACKEND_HTTP_TIMEOUT_SECS: u64 = 15;

/// Weigh-in table name on the hosted backend.
pub const DEFAULT_WEIGH_TABLE: &str = "rendements";

/// Incident table name on the hosted backend.
pub const DEFAULT_INCIDENT_TABLE: &str = "incidents";

// ============================================================================
// Server
// ============================================================================

/// Default HTTP listen address.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8080";
