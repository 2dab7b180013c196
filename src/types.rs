//! Shared data structures for the plant productivity pipeline
//!
//! This module defines the core types flowing through the service:
//! - `WeighRecord` / `IncidentRecord`: rows owned by the hosted backend
//! - `Tier`: qualitative throughput bucket
//! - `Thresholds`: per-session KPI limits
//! - `KpiSnapshot`: computed indicators, never persisted
//! - `Alert`: structured threshold-breach notice

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Production Lines
// ============================================================================

/// Production line identifier. The plant runs two conditioning lines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub enum Line {
    #[default]
    One,
    Two,
}

impl Line {
    /// All lines, in display order.
    pub const ALL: [Line; 2] = [Line::One, Line::Two];

    /// Line number as shown to operators (1 or 2).
    pub fn number(self) -> u8 {
        match self {
            Line::One => 1,
            Line::Two => 2,
        }
    }

    /// Parse a wire line number, falling back to line 1 for unknown values.
    ///
    /// The backend does not enforce the column, so out-of-range numbers are
    /// coerced rather than rejected.
    pub fn from_wire(n: u8) -> Self {
        match n {
            2 => Line::Two,
            _ => Line::One,
        }
    }
}

impl TryFrom<u8> for Line {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Line::One),
            2 => Ok(Line::Two),
            other => Err(format!("unknown production line: {other}")),
        }
    }
}

impl From<Line> for u8 {
    fn from(line: Line) -> u8 {
        line.number()
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ligne {}", self.number())
    }
}

// ============================================================================
// Weigh-In Records
// ============================================================================

/// A single weigh-in: one worker, one line, one batch on the scale.
///
/// Throughput is always recomputed as `weight_kg / work_duration_hours`;
/// any value stored alongside the row is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeighRecord {
    /// Worker badge identifier (e.g. "OP-12")
    pub worker_id: String,
    /// Production line the batch came from
    pub line: Line,
    /// Net weight on the scale, kilograms (>= 0)
    pub weight_kg: f64,
    /// Time worked for this batch, hours (> 0 for a valid record)
    pub work_duration_hours: f64,
    /// When the backend recorded the row
    pub recorded_at: DateTime<Utc>,
    /// Backend row id, used for stable ordering
    pub sequence_no: i64,
}

// ============================================================================
// Throughput Tiers
// ============================================================================

/// Tier cut points (kg/h). Bins are half-open, lower-inclusive.
pub const TIER_EXCELLENT_KG_H: f64 = 4.5;
pub const TIER_ACCEPTABLE_KG_H: f64 = 4.0;
pub const TIER_LOW_KG_H: f64 = 3.5;

/// Qualitative throughput bucket derived from kg/h.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Tier {
    Critical,
    Low,
    Acceptable,
    Excellent,
}

impl Tier {
    /// Classify a throughput value. Total over [0, inf).
    pub fn classify(kg_per_hour: f64) -> Self {
        if kg_per_hour >= TIER_EXCELLENT_KG_H {
            Tier::Excellent
        } else if kg_per_hour >= TIER_ACCEPTABLE_KG_H {
            Tier::Acceptable
        } else if kg_per_hour >= TIER_LOW_KG_H {
            Tier::Low
        } else {
            Tier::Critical
        }
    }

    /// True for tiers counted as non-productive output.
    pub fn is_non_productive(self) -> bool {
        matches!(self, Tier::Low | Tier::Critical)
    }

    /// Display name for dashboard cards.
    pub fn display_name(self) -> &'static str {
        match self {
            Tier::Critical => "Critique",
            Tier::Low => "Faible",
            Tier::Acceptable => "Acceptable",
            Tier::Excellent => "Excellent",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Incident Records
// ============================================================================

/// Incident classification: machine breakdown or handling error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    Breakdown,
    Error,
}

impl IncidentKind {
    /// Wire value used by the backend's `type` column.
    pub fn wire_code(self) -> &'static str {
        match self {
            IncidentKind::Breakdown => "panne",
            IncidentKind::Error => "erreur",
        }
    }

    /// Parse the backend's `type` column. Unknown values coerce to Error,
    /// the lower-impact kind.
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "panne" | "breakdown" => IncidentKind::Breakdown,
            _ => IncidentKind::Error,
        }
    }
}

/// Incident severity as logged by line supervisors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSeverity {
    #[default]
    Minor,
    Moderate,
    Severe,
    Critical,
}

impl IncidentSeverity {
    /// Wire value written to the backend's `gravite` column.
    pub fn wire_code(self) -> &'static str {
        match self {
            IncidentSeverity::Minor => "mineure",
            IncidentSeverity::Moderate => "moderee",
            IncidentSeverity::Severe => "severe",
            IncidentSeverity::Critical => "critique",
        }
    }

    /// Parse the backend's `gravite` column, French or English spellings.
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "critique" | "critical" => IncidentSeverity::Critical,
            "severe" | "sévère" | "grave" => IncidentSeverity::Severe,
            "moderee" | "modérée" | "moderate" => IncidentSeverity::Moderate,
            _ => IncidentSeverity::Minor,
        }
    }
}

/// A breakdown or error event on a production line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncidentRecord {
    pub kind: IncidentKind,
    pub line: Line,
    pub severity: IncidentSeverity,
    pub description: String,
    pub worker_id: String,
    pub occurred_at: DateTime<Utc>,
}

// ============================================================================
// Thresholds
// ============================================================================

/// KPI limits evaluated by the alert engine.
///
/// One set per session: defaults come from `PlantConfig` at login, privileged
/// roles may edit their copy, and every KPI computation receives the set as
/// an explicit parameter. Nothing here is global state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    /// Target throughput (kg/h) — the "good shift" line on charts
    pub rendement_high: f64,
    /// Minimum acceptable throughput (kg/h); below this a line is in breach
    pub rendement_mid: f64,
    /// Maximum tolerated share of records in {Low, Critical} tiers (%)
    pub non_productivity_pct: f64,
    /// Maximum tolerated share of workers below `rendement_mid` (%)
    pub underperformance_pct: f64,
    /// Maximum tolerated stddev of per-record throughput (kg/h)
    pub variability: f64,
    /// Breakdown count at or above which an alert fires
    pub breakdown_count: u32,
    /// Maximum tolerated error incidents per weigh record (%)
    pub error_rate_pct: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        use crate::config::defaults;
        Self {
            rendement_high: defaults::DEFAULT_RENDEMENT_HIGH_KG_H,
            rendement_mid: defaults::DEFAULT_RENDEMENT_MID_KG_H,
            non_productivity_pct: defaults::DEFAULT_NON_PRODUCTIVITY_PCT,
            underperformance_pct: defaults::DEFAULT_UNDERPERFORMANCE_PCT,
            variability: defaults::DEFAULT_VARIABILITY_KG_H,
            breakdown_count: defaults::DEFAULT_BREAKDOWN_COUNT,
            error_rate_pct: defaults::DEFAULT_ERROR_RATE_PCT,
        }
    }
}

impl Thresholds {
    /// Range-check every field. Returns one message per offending field so
    /// the edit form can show them all at once.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.rendement_high <= 0.0 {
            errors.push("rendement_high must be > 0 kg/h".to_string());
        }
        if self.rendement_mid <= 0.0 {
            errors.push("rendement_mid must be > 0 kg/h".to_string());
        }
        if self.rendement_mid > self.rendement_high {
            errors.push(format!(
                "rendement_mid ({}) must not exceed rendement_high ({})",
                self.rendement_mid, self.rendement_high
            ));
        }
        for (name, value) in [
            ("non_productivity_pct", self.non_productivity_pct),
            ("underperformance_pct", self.underperformance_pct),
            ("error_rate_pct", self.error_rate_pct),
        ] {
            if !(0.0..=100.0).contains(&value) {
                errors.push(format!("{name} must be within 0..=100, got {value}"));
            }
        }
        if self.variability < 0.0 {
            errors.push("variability must be >= 0 kg/h".to_string());
        }
        if self.breakdown_count == 0 {
            errors.push("breakdown_count must be >= 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// KPI Snapshot
// ============================================================================

/// Computed indicators for one filtered record set.
///
/// Never persisted; recomputed on demand from an immutable record snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KpiSnapshot {
    /// Mean throughput of line 1 records (kg/h), 0.0 when the line is absent
    pub throughput_line1: f64,
    /// Mean throughput of line 2 records (kg/h), 0.0 when the line is absent
    pub throughput_line2: f64,
    /// Share of records in {Low, Critical} tiers (%)
    pub non_productivity_pct: f64,
    /// Share of distinct workers whose mean throughput is below the mid
    /// cutoff (%)
    pub underperformance_pct: f64,
    /// Sample stddev of per-record throughput (kg/h), 0.0 below 2 records
    pub variability: f64,
    /// Breakdown incidents in range
    pub breakdown_count: u32,
    /// Mean minutes between consecutive breakdowns; `None` below 2
    /// breakdowns (insufficient data, distinct from 0)
    pub mtbf_minutes: Option<f64>,
    /// Error incidents per weigh record (%)
    pub error_rate_pct: f64,
    /// Composite 0-100 health indicator
    pub global_score: f64,
    /// Valid weigh records that entered the computation
    pub record_count: usize,
    /// Records excluded for a non-positive work duration
    pub excluded_count: usize,
}

// ============================================================================
// Alerts
// ============================================================================

/// Which KPI a breach alert refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Throughput,
    NonProductivity,
    Underperformance,
    Variability,
    Breakdowns,
    Errors,
}

impl AlertCategory {
    /// Icon tag rendered by the dashboard next to the message.
    pub fn icon(self) -> &'static str {
        match self {
            AlertCategory::Throughput => "trending-down",
            AlertCategory::NonProductivity => "clock",
            AlertCategory::Underperformance => "users",
            AlertCategory::Variability => "activity",
            AlertCategory::Breakdowns => "wrench",
            AlertCategory::Errors => "alert-triangle",
        }
    }

    /// Fixed severity per category.
    pub fn severity(self) -> AlertSeverity {
        match self {
            AlertCategory::Throughput | AlertCategory::Breakdowns | AlertCategory::Errors => {
                AlertSeverity::High
            }
            AlertCategory::NonProductivity
            | AlertCategory::Underperformance
            | AlertCategory::Variability => AlertSeverity::Medium,
        }
    }
}

/// How urgently the breach needs attention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Medium,
    High,
}

/// A human-readable threshold-breach notice.
///
/// Deduplicated by exact message text within a session's alert log.
/// Serialize-only: alerts are produced server-side, never parsed back.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Alert {
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub icon: &'static str,
    pub message: String,
}

impl Alert {
    /// Build an alert with the category's fixed severity and icon.
    pub fn new(category: AlertCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            severity: category.severity(),
            icon: category.icon(),
            message: message.into(),
        }
    }
}
