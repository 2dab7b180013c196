//! Alert Evaluator
//!
//! Stateless rule firing over a KPI snapshot, plus the session-scoped
//! `AlertLog` that accumulates fired alerts across computations.
//!
//! Dedup key is the exact message text. Messages embed the measured values,
//! so a KPI that breaches again with a different value produces a new entry;
//! the existing dashboards rely on that behavior, so it is kept.

use serde::Serialize;

use crate::types::{Alert, AlertCategory, KpiSnapshot, Line, Thresholds};

/// Evaluate every KPI against its threshold. One alert per breach, fixed
/// category/severity/icon mapping.
pub fn evaluate(snapshot: &KpiSnapshot, thresholds: &Thresholds) -> Vec<Alert> {
    let mut alerts = Vec::new();

    // An idle line reports 0.0 throughput but is not underperforming.
    for (line, throughput) in [
        (Line::One, snapshot.throughput_line1),
        (Line::Two, snapshot.throughput_line2),
    ] {
        if throughput > 0.0 && throughput < thresholds.rendement_mid {
            alerts.push(Alert::new(
                AlertCategory::Throughput,
                format!(
                    "Rendement {line} faible : {throughput:.2} kg/h (seuil {:.2})",
                    thresholds.rendement_mid
                ),
            ));
        }
    }

    if snapshot.non_productivity_pct > thresholds.non_productivity_pct {
        alerts.push(Alert::new(
            AlertCategory::NonProductivity,
            format!(
                "Taux de non-productivité élevé : {:.1}% (seuil {:.1}%)",
                snapshot.non_productivity_pct, thresholds.non_productivity_pct
            ),
        ));
    }

    if snapshot.underperformance_pct > thresholds.underperformance_pct {
        alerts.push(Alert::new(
            AlertCategory::Underperformance,
            format!(
                "Part d'opératrices sous le seuil : {:.1}% (seuil {:.1}%)",
                snapshot.underperformance_pct, thresholds.underperformance_pct
            ),
        ));
    }

    if snapshot.variability > thresholds.variability {
        alerts.push(Alert::new(
            AlertCategory::Variability,
            format!(
                "Variabilité du rendement élevée : {:.2} kg/h (seuil {:.2})",
                snapshot.variability, thresholds.variability
            ),
        ));
    }

    if snapshot.breakdown_count >= thresholds.breakdown_count {
        alerts.push(Alert::new(
            AlertCategory::Breakdowns,
            format!(
                "Pannes répétées : {} sur la période (seuil {})",
                snapshot.breakdown_count, thresholds.breakdown_count
            ),
        ));
    }

    if snapshot.error_rate_pct > thresholds.error_rate_pct {
        alerts.push(Alert::new(
            AlertCategory::Errors,
            format!(
                "Taux d'erreurs élevé : {:.1}% (seuil {:.1}%)",
                snapshot.error_rate_pct, thresholds.error_rate_pct
            ),
        ));
    }

    alerts
}

// ============================================================================
// Session Alert Log
// ============================================================================

/// Accumulating alert list for one session.
///
/// New alerts append only when their exact message text is not already
/// present. Clearing is an explicit user action; there is no expiry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertLog {
    entries: Vec<Alert>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the alerts whose message is not already logged. Returns how
    /// many were actually added.
    pub fn absorb(&mut self, alerts: Vec<Alert>) -> usize {
        let mut added = 0;
        for alert in alerts {
            if !self.entries.iter().any(|e| e.message == alert.message) {
                self.entries.push(alert);
                added += 1;
            }
        }
        added
    }

    /// Empty the log. Explicit user action only.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[Alert] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AlertSeverity;

    fn snapshot() -> KpiSnapshot {
        KpiSnapshot {
            throughput_line1: 4.3,
            throughput_line2: 4.6,
            non_productivity_pct: 10.0,
            underperformance_pct: 10.0,
            variability: 0.5,
            breakdown_count: 0,
            mtbf_minutes: None,
            error_rate_pct: 0.0,
            global_score: 100.0,
            record_count: 10,
            excluded_count: 0,
        }
    }

    #[test]
    fn test_healthy_snapshot_fires_nothing() {
        assert!(evaluate(&snapshot(), &Thresholds::default()).is_empty());
    }

    #[test]
    fn test_low_line_throughput_fires_high_severity() {
        let s = KpiSnapshot {
            throughput_line1: 3.2,
            ..snapshot()
        };
        let alerts = evaluate(&s, &Thresholds::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category, AlertCategory::Throughput);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert!(alerts[0].message.contains("Ligne 1"));
    }

    #[test]
    fn test_idle_line_does_not_fire() {
        let s = KpiSnapshot {
            throughput_line2: 0.0,
            ..snapshot()
        };
        assert!(evaluate(&s, &Thresholds::default()).is_empty());
    }

    #[test]
    fn test_breakdown_threshold_is_inclusive() {
        let thresholds = Thresholds::default(); // fires at >= 3
        let s = KpiSnapshot {
            breakdown_count: 3,
            ..snapshot()
        };
        let alerts = evaluate(&s, &thresholds);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category, AlertCategory::Breakdowns);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
    }

    #[test]
    fn test_every_breach_fires_once() {
        let s = KpiSnapshot {
            throughput_line1: 3.0,
            throughput_line2: 3.1,
            non_productivity_pct: 55.0,
            underperformance_pct: 60.0,
            variability: 2.5,
            breakdown_count: 4,
            error_rate_pct: 25.0,
            ..snapshot()
        };
        let alerts = evaluate(&s, &Thresholds::default());
        assert_eq!(alerts.len(), 7, "two line breaches + five KPI breaches");
    }

    #[test]
    fn test_log_dedups_by_exact_message() {
        let mut log = AlertLog::new();
        let alert = Alert::new(AlertCategory::Errors, "Taux d'erreurs élevé : 25.0%");
        assert_eq!(log.absorb(vec![alert.clone()]), 1);
        assert_eq!(log.absorb(vec![alert]), 0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_log_keeps_messages_with_different_values() {
        // Known quirk: same breach, new value, new entry.
        let mut log = AlertLog::new();
        log.absorb(vec![Alert::new(AlertCategory::Errors, "Taux d'erreurs élevé : 25.0%")]);
        log.absorb(vec![Alert::new(AlertCategory::Errors, "Taux d'erreurs élevé : 30.0%")]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_clear_empties_regardless_of_count() {
        let mut log = AlertLog::new();
        for i in 0..5 {
            log.absorb(vec![Alert::new(AlertCategory::Errors, format!("alerte {i}"))]);
        }
        assert_eq!(log.len(), 5);
        log.clear();
        assert!(log.is_empty());
    }
}
