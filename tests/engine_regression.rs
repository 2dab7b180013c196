//! Engine Regression Tests
//!
//! Exercises the full pure pipeline — records → aggregation → KPI snapshot
//! → alert evaluation → session log — against the reference behaviors the
//! dashboards rely on.

use chrono::{TimeZone, Utc};

use suivi_rendement::engine::{aggregate, alerts, kpi};
use suivi_rendement::types::{
    IncidentKind, IncidentRecord, IncidentSeverity, Line, Thresholds, Tier, WeighRecord,
};

fn record(worker: &str, line: Line, weight_kg: f64, hours: f64, seq: i64) -> WeighRecord {
    WeighRecord {
        worker_id: worker.to_string(),
        line,
        weight_kg,
        work_duration_hours: hours,
        recorded_at: Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap(),
        sequence_no: seq,
    }
}

fn breakdown_at(minute: i64) -> IncidentRecord {
    IncidentRecord {
        kind: IncidentKind::Breakdown,
        line: Line::One,
        severity: IncidentSeverity::Severe,
        description: "arrêt convoyeur".to_string(),
        worker_id: "OP-01".to_string(),
        occurred_at: Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap()
            + chrono::Duration::minutes(minute),
    }
}

/// Three line-1 records at 3.0 / 4.2 / 5.0 kg/h and one line-2 record at
/// 4.6 kg/h.
fn reference_records() -> Vec<WeighRecord> {
    vec![
        record("OP-01", Line::One, 30.0, 10.0, 1),
        record("OP-02", Line::One, 42.0, 10.0, 2),
        record("OP-03", Line::One, 50.0, 10.0, 3),
        record("OP-04", Line::Two, 46.0, 10.0, 4),
    ]
}

#[test]
fn reference_scenario_end_to_end() {
    let records = reference_records();
    let aggregates = aggregate::aggregate(&records);

    // Per-record tiers, input order
    assert_eq!(
        aggregates.tiers,
        vec![Tier::Critical, Tier::Acceptable, Tier::Excellent, Tier::Excellent]
    );

    let snapshot = kpi::compute_snapshot(&aggregates, &[], &Thresholds::default());
    assert!((snapshot.throughput_line1 - 4.067).abs() < 1e-3);
    assert!((snapshot.throughput_line2 - 4.6).abs() < 1e-9);
    assert!((snapshot.non_productivity_pct - 25.0).abs() < 1e-9);
    assert_eq!(snapshot.record_count, 4);
    assert_eq!(snapshot.global_score, 100.0);
}

#[test]
fn throughput_recomputation_matches_weight_over_duration() {
    let records = reference_records();
    let aggregates = aggregate::aggregate(&records);
    for (record, throughput) in records.iter().zip(&aggregates.throughputs) {
        let expected = record.weight_kg / record.work_duration_hours;
        assert!((throughput - expected).abs() < 1e-12);
    }
}

#[test]
fn empty_input_never_raises() {
    let aggregates = aggregate::aggregate(&[]);
    assert_eq!(aggregates.record_count, 0);

    let snapshot = kpi::compute_snapshot(&aggregates, &[], &Thresholds::default());
    assert_eq!(snapshot.global_score, 100.0);
    assert_eq!(snapshot.mtbf_minutes, None);
    assert!(alerts::evaluate(&snapshot, &Thresholds::default()).is_empty());
}

#[test]
fn mtbf_reference_cases() {
    let thresholds = Thresholds::default();

    // Breakdowns at t=0 and t=90 minutes
    let two = vec![breakdown_at(0), breakdown_at(90)];
    let snapshot = kpi::snapshot_from_records(&reference_records(), &two, &thresholds);
    assert!((snapshot.mtbf_minutes.unwrap() - 90.0).abs() < 1e-9);

    // A single breakdown is insufficient data, not zero
    let one = vec![breakdown_at(30)];
    let snapshot = kpi::snapshot_from_records(&reference_records(), &one, &thresholds);
    assert_eq!(snapshot.mtbf_minutes, None);
}

#[test]
fn global_score_clamps_under_extreme_breakdowns() {
    let incidents: Vec<IncidentRecord> = (0..1000).map(breakdown_at).collect();
    let snapshot =
        kpi::snapshot_from_records(&reference_records(), &incidents, &Thresholds::default());
    assert_eq!(snapshot.global_score, 0.0);
}

#[test]
fn synthesizer_has_no_hidden_state() {
    let records = reference_records();
    let incidents = vec![breakdown_at(0), breakdown_at(45)];
    let thresholds = Thresholds::default();

    let runs: Vec<_> = (0..3)
        .map(|_| kpi::snapshot_from_records(&records, &incidents, &thresholds))
        .collect();
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[1], runs[2]);
}

#[test]
fn breach_fires_alert_and_log_dedups_across_computations() {
    // Thresholds rigged so the reference scenario breaches non-productivity.
    let thresholds = Thresholds {
        non_productivity_pct: 20.0,
        ..Thresholds::default()
    };
    let records = reference_records();

    let snapshot = kpi::snapshot_from_records(&records, &[], &thresholds);
    let fired = alerts::evaluate(&snapshot, &thresholds);
    assert_eq!(fired.len(), 1);

    let mut log = alerts::AlertLog::new();
    assert_eq!(log.absorb(fired.clone()), 1);

    // Same inputs, same message: the log must not grow.
    let again = alerts::evaluate(&kpi::snapshot_from_records(&records, &[], &thresholds), &thresholds);
    assert_eq!(log.absorb(again), 0);
    assert_eq!(log.len(), 1);

    log.clear();
    assert!(log.is_empty());
}

#[test]
fn faulted_durations_flow_through_as_exclusions() {
    let mut records = reference_records();
    records.push(record("OP-05", Line::One, 25.0, 0.0, 5));

    let snapshot = kpi::snapshot_from_records(&records, &[], &Thresholds::default());
    assert_eq!(snapshot.record_count, 4, "faulted record must not enter the KPIs");
    assert_eq!(snapshot.excluded_count, 1);
    // Line 1 mean unchanged by the excluded record
    assert!((snapshot.throughput_line1 - 4.067).abs() < 1e-3);
}

#[test]
fn date_filter_restricts_the_computation() {
    let mut records = reference_records();
    // A stray record from the day before
    records.push(WeighRecord {
        recorded_at: Utc.with_ymd_and_hms(2025, 6, 9, 8, 0, 0).unwrap(),
        ..record("OP-09", Line::One, 10.0, 10.0, 9)
    });

    let filter = aggregate::RecordFilter {
        from: Some(Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap()),
        to: None,
        line: None,
        worker_id: None,
    };
    let snapshot =
        kpi::snapshot_from_records(&filter.apply(&records), &[], &Thresholds::default());
    assert_eq!(snapshot.record_count, 4);
}
