//! Aggregator
//!
//! Groups weigh records by worker and by production line, producing count,
//! total weight, mean throughput and sample stddev per group. Records whose
//! duration faults (see `rate`) are dropped before grouping and surfaced as
//! an excluded count. Empty inputs yield zeroed aggregates, never NaN.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::rate;
use crate::types::{IncidentRecord, Line, Tier, WeighRecord};

// ============================================================================
// Filtering
// ============================================================================

/// Optional pre-filter applied before aggregation: date range, line, worker.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub line: Option<Line>,
    pub worker_id: Option<String>,
}

impl RecordFilter {
    /// Does a weigh record fall inside the filter window?
    pub fn matches(&self, record: &WeighRecord) -> bool {
        if let Some(from) = self.from {
            if record.recorded_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if record.recorded_at > to {
                return false;
            }
        }
        if let Some(line) = self.line {
            if record.line != line {
                return false;
            }
        }
        if let Some(ref worker_id) = self.worker_id {
            if record.worker_id != *worker_id {
                return false;
            }
        }
        true
    }

    /// Does an incident fall inside the filter window? Worker filtering is
    /// not applied to incidents — a line incident affects everyone on it.
    pub fn matches_incident(&self, incident: &IncidentRecord) -> bool {
        if let Some(from) = self.from {
            if incident.occurred_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if incident.occurred_at > to {
                return false;
            }
        }
        if let Some(line) = self.line {
            if incident.line != line {
                return false;
            }
        }
        true
    }

    /// Clone the matching records.
    pub fn apply(&self, records: &[WeighRecord]) -> Vec<WeighRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }

    /// Clone the matching incidents.
    pub fn apply_incidents(&self, incidents: &[IncidentRecord]) -> Vec<IncidentRecord> {
        incidents
            .iter()
            .filter(|i| self.matches_incident(i))
            .cloned()
            .collect()
    }
}

// ============================================================================
// Group Statistics
// ============================================================================

/// Summary statistics for one group of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub count: usize,
    pub total_weight_kg: f64,
    pub mean_throughput: f64,
    pub stddev_throughput: f64,
}

/// Per-worker statistics, used for the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerStats {
    pub worker_id: String,
    #[serde(flatten)]
    pub stats: GroupStats,
}

/// Per-line statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStats {
    pub line: Line,
    #[serde(flatten)]
    pub stats: GroupStats,
}

/// Aggregation result over one filtered record set.
///
/// Carries everything the KPI synthesizer needs: per-record throughputs and
/// tiers (input order), per-worker and per-line groups, and the count of
/// records excluded for a faulted duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregates {
    /// Valid records that entered the aggregation
    pub record_count: usize,
    /// Records dropped for a non-positive duration
    pub excluded_count: usize,
    /// Throughput per valid record, input order
    pub throughputs: Vec<f64>,
    /// Tier per valid record, input order
    pub tiers: Vec<Tier>,
    /// Worker groups, ranked: mean throughput descending, worker_id
    /// ascending on ties
    pub workers: Vec<WorkerStats>,
    /// Line groups in line order
    pub lines: Vec<LineStats>,
}

impl Aggregates {
    /// Stats for one line, if any record hit it.
    pub fn line(&self, line: Line) -> Option<&GroupStats> {
        self.lines.iter().find(|l| l.line == line).map(|l| &l.stats)
    }
}

/// Aggregate a (pre-filtered) record set.
pub fn aggregate(records: &[WeighRecord]) -> Aggregates {
    let mut throughputs = Vec::with_capacity(records.len());
    let mut tiers = Vec::with_capacity(records.len());
    let mut excluded_count = 0usize;

    // BTreeMap keeps worker iteration deterministic before the rank sort.
    let mut worker_groups: BTreeMap<&str, (Vec<f64>, f64)> = BTreeMap::new();
    let mut line_groups: BTreeMap<u8, (Vec<f64>, f64)> = BTreeMap::new();

    for record in records {
        let kg_per_hour = match rate::throughput(record) {
            Ok(v) => v,
            Err(_) => {
                excluded_count += 1;
                continue;
            }
        };
        throughputs.push(kg_per_hour);
        tiers.push(Tier::classify(kg_per_hour));

        let worker = worker_groups
            .entry(record.worker_id.as_str())
            .or_insert_with(|| (Vec::new(), 0.0));
        worker.0.push(kg_per_hour);
        worker.1 += record.weight_kg;

        let line = line_groups
            .entry(record.line.number())
            .or_insert_with(|| (Vec::new(), 0.0));
        line.0.push(kg_per_hour);
        line.1 += record.weight_kg;
    }

    let mut workers: Vec<WorkerStats> = worker_groups
        .into_iter()
        .map(|(worker_id, (rates, total_weight_kg))| WorkerStats {
            worker_id: worker_id.to_string(),
            stats: group_stats(&rates, total_weight_kg),
        })
        .collect();
    workers.sort_by(|a, b| {
        b.stats
            .mean_throughput
            .partial_cmp(&a.stats.mean_throughput)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.worker_id.cmp(&b.worker_id))
    });

    let lines: Vec<LineStats> = line_groups
        .into_iter()
        .map(|(number, (rates, total_weight_kg))| LineStats {
            line: Line::from_wire(number),
            stats: group_stats(&rates, total_weight_kg),
        })
        .collect();

    Aggregates {
        record_count: throughputs.len(),
        excluded_count,
        throughputs,
        tiers,
        workers,
        lines,
    }
}

fn group_stats(rates: &[f64], total_weight_kg: f64) -> GroupStats {
    GroupStats {
        count: rates.len(),
        total_weight_kg,
        mean_throughput: mean(rates),
        stddev_throughput: sample_stddev(rates),
    }
}

// ============================================================================
// Statistics helpers
// ============================================================================

/// Arithmetic mean; 0.0 for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1); 0.0 below two samples.
pub(crate) fn sample_stddev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (sum_sq / (n as f64 - 1.0)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(worker: &str, line: Line, weight_kg: f64, hours: f64, seq: i64) -> WeighRecord {
        WeighRecord {
            worker_id: worker.to_string(),
            line,
            weight_kg,
            work_duration_hours: hours,
            recorded_at: Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap()
                + chrono::Duration::minutes(seq),
            sequence_no: seq,
        }
    }

    #[test]
    fn test_empty_input_yields_zeroed_aggregates() {
        let agg = aggregate(&[]);
        assert_eq!(agg.record_count, 0);
        assert_eq!(agg.excluded_count, 0);
        assert!(agg.workers.is_empty());
        assert!(agg.lines.is_empty());
    }

    #[test]
    fn test_faulted_durations_are_excluded_and_counted() {
        let records = vec![
            record("OP-01", Line::One, 32.0, 8.0, 1),
            record("OP-02", Line::One, 30.0, 0.0, 2),
            record("OP-03", Line::Two, 28.0, -2.0, 3),
        ];
        let agg = aggregate(&records);
        assert_eq!(agg.record_count, 1);
        assert_eq!(agg.excluded_count, 2);
        assert_eq!(agg.workers.len(), 1);
        assert_eq!(agg.workers[0].worker_id, "OP-01");
    }

    #[test]
    fn test_leaderboard_ranks_by_mean_descending() {
        let records = vec![
            record("OP-01", Line::One, 30.0, 10.0, 1), // 3.0 kg/h
            record("OP-02", Line::One, 50.0, 10.0, 2), // 5.0 kg/h
            record("OP-03", Line::Two, 42.0, 10.0, 3), // 4.2 kg/h
        ];
        let agg = aggregate(&records);
        let order: Vec<&str> = agg.workers.iter().map(|w| w.worker_id.as_str()).collect();
        assert_eq!(order, vec!["OP-02", "OP-03", "OP-01"]);
    }

    #[test]
    fn test_leaderboard_ties_break_by_worker_id_ascending() {
        let records = vec![
            record("OP-09", Line::One, 40.0, 10.0, 1),
            record("OP-02", Line::One, 40.0, 10.0, 2),
            record("OP-05", Line::Two, 40.0, 10.0, 3),
        ];
        let agg = aggregate(&records);
        let order: Vec<&str> = agg.workers.iter().map(|w| w.worker_id.as_str()).collect();
        assert_eq!(order, vec!["OP-02", "OP-05", "OP-09"]);
    }

    #[test]
    fn test_per_line_grouping() {
        let records = vec![
            record("OP-01", Line::One, 30.0, 10.0, 1),
            record("OP-02", Line::One, 50.0, 10.0, 2),
            record("OP-03", Line::Two, 46.0, 10.0, 3),
        ];
        let agg = aggregate(&records);
        let line1 = agg.line(Line::One).unwrap();
        assert_eq!(line1.count, 2);
        assert!((line1.mean_throughput - 4.0).abs() < 1e-9);
        assert!((line1.total_weight_kg - 80.0).abs() < 1e-9);
        let line2 = agg.line(Line::Two).unwrap();
        assert_eq!(line2.count, 1);
        assert!((line2.mean_throughput - 4.6).abs() < 1e-9);
    }

    #[test]
    fn test_single_record_group_has_zero_stddev() {
        let agg = aggregate(&[record("OP-01", Line::One, 32.0, 8.0, 1)]);
        assert_eq!(agg.workers[0].stats.stddev_throughput, 0.0);
    }

    #[test]
    fn test_sample_stddev_ddof_one() {
        // stddev of [2, 4, 4, 4, 5, 5, 7, 9] with ddof=1 is ~2.138
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = sample_stddev(&values);
        assert!((sd - 2.13809).abs() < 1e-4, "got {sd}");
    }

    #[test]
    fn test_filter_by_line_and_window() {
        let records = vec![
            record("OP-01", Line::One, 30.0, 10.0, 0),
            record("OP-02", Line::Two, 50.0, 10.0, 30),
            record("OP-03", Line::One, 42.0, 10.0, 600),
        ];
        let filter = RecordFilter {
            from: Some(Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap()),
            line: Some(Line::One),
            worker_id: None,
        };
        let kept = filter.apply(&records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].worker_id, "OP-01");
    }
}
