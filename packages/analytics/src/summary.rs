//! Headline indicators shown above the charts.

use police_calls_analytics_models::KpiSummary;
use police_calls_call_models::CallRecord;

use crate::{AnalysisSettings, monthly, risk, round2};

/// Risk score above which a location counts as high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 85.0;

/// Computes the indicator row for the window.
///
/// The month-over-month change is that of the latest monthly row, and the
/// high-risk count is taken from the ranked risk table the dashboard
/// shows. Daily averages are over every calendar day in the window.
#[must_use]
pub fn kpi_summary(calls: &[CallRecord], settings: &AnalysisSettings) -> KpiSummary {
    let total_calls = calls.len() as u64;
    let severe_calls = calls.iter().filter(|c| c.is_severe()).count() as u64;

    let latest_mom_change_pct = monthly::monthly_trends(calls, &settings.range, &settings.monthly)
        .last()
        .map_or(0.0, |m| m.pct_change);

    let high_risk_locations = risk::score_locations(calls, settings.as_of, &settings.risk)
        .iter()
        .filter(|r| r.risk_score > HIGH_RISK_THRESHOLD)
        .count() as u64;

    #[allow(clippy::cast_precision_loss)]
    let severe_pct = if total_calls == 0 {
        0.0
    } else {
        round2(severe_calls as f64 / total_calls as f64 * 100.0)
    };
    #[allow(clippy::cast_precision_loss)]
    let avg_daily_calls = round2(total_calls as f64 / settings.range.days() as f64);

    KpiSummary {
        total_calls,
        latest_mom_change_pct,
        severe_calls,
        severe_pct,
        avg_daily_calls,
        high_risk_locations,
        high_risk_threshold: HIGH_RISK_THRESHOLD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{call, range};
    use police_calls_call_models::{CallRecord, Priority};

    #[test]
    fn summarizes_volume_and_severity() {
        let calls = vec![
            call("A", "2024-01-05 10:00:00", Priority::P1, "1 Main St"),
            call("B", "2024-01-06 10:00:00", Priority::P3, "1 Main St"),
            call("C", "2024-02-01 10:00:00", Priority::P2, "1 Main St"),
            call("D", "2024-02-02 10:00:00", Priority::P5, "1 Main St"),
            call("E", "2024-02-03 10:00:00", Priority::P5, "1 Main St"),
        ];
        let settings = AnalysisSettings::new(range("2024-01-01", "2024-02-29"));
        let kpi = kpi_summary(&calls, &settings);

        assert_eq!(kpi.total_calls, 5);
        assert_eq!(kpi.severe_calls, 2);
        assert!((kpi.severe_pct - 40.0).abs() < 1e-9);
        assert!((kpi.latest_mom_change_pct - 50.0).abs() < 1e-9);
        // 5 calls over 60 days
        assert!((kpi.avg_daily_calls - 0.08).abs() < 1e-9);
        assert_eq!(kpi.high_risk_locations, 0);
    }

    #[test]
    fn counts_locations_above_the_high_risk_line() {
        // 20 severe calls: 6.0 + 40.0 + 10.0 + 15.0 = 71.0
        // 30 severe calls: 9.0 + 60.0 + 10.0 + 15.0 = 94.0
        let mut calls: Vec<CallRecord> = Vec::new();
        for (address, count) in [("1 Low St", 20), ("2 Hot St", 30)] {
            for i in 0..count {
                calls.push(call(
                    &format!("{address}{i}"),
                    "2024-01-30 10:00:00",
                    Priority::P1,
                    address,
                ));
            }
        }
        let settings = AnalysisSettings::new(range("2024-01-01", "2024-01-31"));
        let kpi = kpi_summary(&calls, &settings);
        assert_eq!(kpi.high_risk_locations, 1);
        assert!((kpi.high_risk_threshold - HIGH_RISK_THRESHOLD).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_window_is_all_zero() {
        let settings = AnalysisSettings::new(range("2024-01-01", "2024-01-31"));
        let kpi = kpi_summary(&[], &settings);
        assert_eq!(kpi.total_calls, 0);
        assert!(kpi.severe_pct.abs() < f64::EPSILON);
        assert!(kpi.avg_daily_calls.abs() < f64::EPSILON);
    }
}
