//! KPI Synthesizer
//!
//! Combines aggregates and incidents into the named indicators operators
//! see, plus one composite 0-100 global score. The score is a weighted
//! excess-penalty model: only the amount by which a KPI exceeds its
//! threshold counts against the score, weighted per KPI, then clamped.

use chrono::{DateTime, Utc};

use crate::engine::aggregate::{self, Aggregates};
use crate::types::{IncidentKind, IncidentRecord, KpiSnapshot, Line, Thresholds, WeighRecord};

/// Penalty weight applied to variability excess.
const VARIABILITY_WEIGHT: f64 = 2.0;
/// Penalty weight applied to each breakdown above the threshold.
const BREAKDOWN_WEIGHT: f64 = 5.0;

/// Compute the full KPI snapshot for one filtered record set.
///
/// Pure: identical inputs yield an identical snapshot. Incidents are
/// expected to be pre-filtered to the same window as the records.
pub fn compute_snapshot(
    aggregates: &Aggregates,
    incidents: &[IncidentRecord],
    thresholds: &Thresholds,
) -> KpiSnapshot {
    let throughput_line1 = aggregates
        .line(Line::One)
        .map_or(0.0, |stats| stats.mean_throughput);
    let throughput_line2 = aggregates
        .line(Line::Two)
        .map_or(0.0, |stats| stats.mean_throughput);

    let record_count = aggregates.record_count;

    let non_productive = aggregates.tiers.iter().filter(|t| t.is_non_productive()).count();
    let non_productivity_pct = if record_count == 0 {
        0.0
    } else {
        100.0 * non_productive as f64 / record_count as f64
    };

    let worker_count = aggregates.workers.len();
    let underperformers = aggregates
        .workers
        .iter()
        .filter(|w| w.stats.mean_throughput < thresholds.rendement_mid)
        .count();
    let underperformance_pct = if worker_count == 0 {
        0.0
    } else {
        100.0 * underperformers as f64 / worker_count as f64
    };

    let variability = aggregate::sample_stddev(&aggregates.throughputs);

    let breakdown_times: Vec<DateTime<Utc>> = incidents
        .iter()
        .filter(|i| i.kind == IncidentKind::Breakdown)
        .map(|i| i.occurred_at)
        .collect();
    let breakdown_count = breakdown_times.len() as u32;
    let mtbf_minutes = mean_time_between(&breakdown_times);

    let error_count = incidents.iter().filter(|i| i.kind == IncidentKind::Error).count();
    let error_rate_pct = if record_count == 0 {
        0.0
    } else {
        100.0 * error_count as f64 / record_count as f64
    };

    let penalty = excess(non_productivity_pct, thresholds.non_productivity_pct)
        + excess(underperformance_pct, thresholds.underperformance_pct)
        + excess(variability, thresholds.variability) * VARIABILITY_WEIGHT
        + excess(f64::from(breakdown_count), f64::from(thresholds.breakdown_count))
            * BREAKDOWN_WEIGHT
        + excess(error_rate_pct, thresholds.error_rate_pct);
    let global_score = (100.0 - penalty).clamp(0.0, 100.0);

    KpiSnapshot {
        throughput_line1,
        throughput_line2,
        non_productivity_pct,
        underperformance_pct,
        variability,
        breakdown_count,
        mtbf_minutes,
        error_rate_pct,
        global_score,
        record_count,
        excluded_count: aggregates.excluded_count,
    }
}

/// Aggregate then synthesize in one call, for callers holding raw records.
pub fn snapshot_from_records(
    records: &[WeighRecord],
    incidents: &[IncidentRecord],
    thresholds: &Thresholds,
) -> KpiSnapshot {
    let aggregates = aggregate::aggregate(records);
    compute_snapshot(&aggregates, incidents, thresholds)
}

/// Amount by which `value` exceeds `limit`, floored at zero.
fn excess(value: f64, limit: f64) -> f64 {
    (value - limit).max(0.0)
}

/// Mean minutes between consecutive events, time-sorted.
///
/// `None` below two events: a single breakdown has no "time between", and
/// reporting 0 would read as back-to-back failures.
fn mean_time_between(times: &[DateTime<Utc>]) -> Option<f64> {
    if times.len() < 2 {
        return None;
    }
    let mut sorted = times.to_vec();
    sorted.sort();
    let deltas: Vec<f64> = sorted
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_seconds() as f64 / 60.0)
        .collect();
    Some(aggregate::mean(&deltas))
}
