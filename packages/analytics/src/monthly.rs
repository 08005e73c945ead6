//! Monthly call volume with running totals and month-over-month change.

use std::collections::BTreeMap;

use chrono::{Datelike as _, Months, NaiveDate};
use police_calls_analytics_models::{MonthlyInsights, MonthlyReport, MonthlyTrend, Trend};
use police_calls_call_models::{CallRecord, DateRange};

use crate::round2;

/// Tuning for the monthly view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthlyOptions {
    /// Emit zero rows for months in the window that have no calls. Off by
    /// default: only months with at least one call are reported.
    pub fill_gaps: bool,
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Groups calls by calendar month, ascending.
///
/// `pct_change` compares each row with the row before it; the first row,
/// and any row whose predecessor had zero calls, reports 0.
#[must_use]
pub fn monthly_trends(
    calls: &[CallRecord],
    range: &DateRange,
    options: &MonthlyOptions,
) -> Vec<MonthlyTrend> {
    let mut by_month: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();

    if options.fill_gaps {
        let last = month_start(range.end());
        let mut month = month_start(range.start());
        while month <= last {
            by_month.insert(month, (0, 0));
            let Some(next) = month.checked_add_months(Months::new(1)) else {
                break;
            };
            month = next;
        }
    }

    for call in calls {
        let entry = by_month
            .entry(month_start(call.call_datetime.date()))
            .or_insert((0, 0));
        entry.0 += 1;
        if call.is_severe() {
            entry.1 += 1;
        }
    }

    let mut running_total = 0u64;
    let mut previous: Option<u64> = None;

    by_month
        .into_iter()
        .map(|(month, (calls, severe_calls))| {
            running_total += calls;
            #[allow(clippy::cast_precision_loss)]
            let pct_change = match previous {
                Some(prev) if prev > 0 => round2((calls as f64 - prev as f64) / prev as f64 * 100.0),
                _ => 0.0,
            };
            previous = Some(calls);

            MonthlyTrend {
                month: month.format("%Y-%m").to_string(),
                month_start: month,
                calls,
                severe_calls,
                running_total,
                pct_change,
            }
        })
        .collect()
}

/// Derives the narrative that accompanies the monthly chart.
///
/// Returns `None` when there are no months.
#[must_use]
pub fn insights(months: &[MonthlyTrend]) -> Option<MonthlyInsights> {
    let first = months.first()?;
    let last = months.last()?;

    // Earliest month wins ties.
    let peak = months
        .iter()
        .fold(first, |best, m| if m.calls > best.calls { m } else { best });

    let growth: Vec<f64> = months.iter().skip(1).map(|m| m.pct_change).collect();
    #[allow(clippy::cast_precision_loss)]
    let avg_growth_pct = if growth.is_empty() {
        0.0
    } else {
        round2(growth.iter().sum::<f64>() / growth.len() as f64)
    };

    Some(MonthlyInsights {
        peak_month: peak.month.clone(),
        peak_calls: peak.calls,
        total_calls: last.running_total,
        avg_growth_pct,
        trend: if last.pct_change > 0.0 {
            Trend::Increasing
        } else {
            Trend::Decreasing
        },
    })
}

/// Builds the monthly view.
#[must_use]
pub fn report(calls: &[CallRecord], range: &DateRange, options: &MonthlyOptions) -> MonthlyReport {
    let months = monthly_trends(calls, range, options);
    let insights = insights(&months);
    MonthlyReport { months, insights }
}
