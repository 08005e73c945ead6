//! Address concentration (Pareto) analysis.

use std::collections::BTreeMap;

use police_calls_analytics_models::{ParetoEntry, ParetoReport, ParetoSummary};
use police_calls_call_models::CallRecord;

use crate::{AnalyticsError, round2};

/// Number of ranked addresses shown by default.
pub const TOP_ADDRESSES: usize = 50;
/// Cumulative share the summary reports against.
pub const DEFAULT_THRESHOLD_PCT: f64 = 80.0;

/// Tuning for the concentration view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParetoOptions {
    /// Maximum rows to return.
    pub limit: usize,
    /// Target cumulative share, in percent.
    pub threshold_pct: f64,
}

impl Default for ParetoOptions {
    fn default() -> Self {
        Self {
            limit: TOP_ADDRESSES,
            threshold_pct: DEFAULT_THRESHOLD_PCT,
        }
    }
}

/// Ranks every address by call count, busiest first, with cumulative
/// totals against all calls that have an address. Ties are ordered by
/// address.
#[must_use]
pub fn rank_addresses(calls: &[CallRecord]) -> Vec<ParetoEntry> {
    let mut by_address: BTreeMap<&str, u64> = BTreeMap::new();
    for call in calls {
        if let Some(address) = call.address() {
            *by_address.entry(address).or_default() += 1;
        }
    }

    let grand_total: u64 = by_address.values().sum();
    let mut counts: Vec<(&str, u64)> = by_address.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let mut cumulative = 0u64;
    (1u32..)
        .zip(counts)
        .map(|(rank, (address, calls))| {
            cumulative += calls;
            #[allow(clippy::cast_precision_loss)]
            let cumulative_pct = round2(cumulative as f64 / grand_total as f64 * 100.0);
            ParetoEntry {
                rank,
                address: address.to_string(),
                calls,
                cumulative_calls: cumulative,
                cumulative_pct,
            }
        })
        .collect()
}

/// Fewest top-ranked addresses whose cumulative share reaches
/// `threshold_pct`, or `None` for an empty ranking.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidParameter`] unless
/// `0 < threshold_pct <= 100`.
pub fn addresses_for_share(
    entries: &[ParetoEntry],
    threshold_pct: f64,
) -> Result<Option<u32>, AnalyticsError> {
    if threshold_pct.is_nan() || threshold_pct <= 0.0 || threshold_pct > 100.0 {
        return Err(AnalyticsError::InvalidParameter {
            message: format!("Pareto threshold must be in (0, 100], got {threshold_pct}"),
        });
    }

    let Some(grand_total) = entries.last().map(|e| e.cumulative_calls) else {
        return Ok(None);
    };

    // Cross-multiplied so an exact hit is never lost to a rounded division
    // and 79.996% does not count as 80%.
    #[allow(clippy::cast_precision_loss)]
    let target = threshold_pct * grand_total as f64;
    #[allow(clippy::cast_precision_loss)]
    let rank = entries
        .iter()
        .find(|e| e.cumulative_calls as f64 * 100.0 >= target)
        .map(|e| e.rank);
    Ok(rank)
}

/// Builds the concentration view.
///
/// The summary is computed over the full ranking; only the table is
/// truncated.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidParameter`] if the threshold is out of
/// range.
pub fn report(calls: &[CallRecord], options: &ParetoOptions) -> Result<ParetoReport, AnalyticsError> {
    let mut entries = rank_addresses(calls);
    let addresses_for_threshold = addresses_for_share(&entries, options.threshold_pct)?;

    let ranked_addresses = entries.len() as u64;
    let total_calls = entries.last().map_or(0, |e| e.cumulative_calls);

    #[allow(clippy::cast_precision_loss)]
    let share_of_addresses_pct = addresses_for_threshold
        .map(|rank| round2(f64::from(rank) / ranked_addresses as f64 * 100.0));

    entries.truncate(options.limit);

    Ok(ParetoReport {
        entries,
        summary: ParetoSummary {
            threshold_pct: options.threshold_pct,
            addresses_for_threshold,
            ranked_addresses,
            share_of_addresses_pct,
            focus_reduction_pct: share_of_addresses_pct.map(|share| round2(100.0 - share)),
            total_calls,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::call;
    use police_calls_call_models::Priority;

    /// Addresses with 5, 3, 1, 1 calls.
    fn sample() -> Vec<CallRecord> {
        let mut calls = Vec::new();
        for (address, count) in [("D St", 1), ("A St", 5), ("C St", 1), ("B St", 3)] {
            for i in 0..count {
                calls.push(call(
                    &format!("{address}-{i}"),
                    "2024-02-01 10:00:00",
                    Priority::P3,
                    address,
                ));
            }
        }
        calls
    }

    #[test]
    fn cumulative_share_is_monotonic_and_ends_at_one_hundred() {
        let entries = rank_addresses(&sample());
        let addresses: Vec<&str> = entries.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(addresses, vec!["A St", "B St", "C St", "D St"]);
        for pair in entries.windows(2) {
            assert!(pair[1].cumulative_pct >= pair[0].cumulative_pct);
            assert_eq!(pair[1].rank, pair[0].rank + 1);
        }
        let last = entries.last().unwrap();
        assert!((last.cumulative_pct - 100.0).abs() < 1e-9);
        assert_eq!(last.cumulative_calls, 10);
    }

    #[test]
    fn finds_the_minimum_rank_for_a_share() {
        let entries = rank_addresses(&sample());
        // 50%, 80%, 90%, 100%
        assert_eq!(addresses_for_share(&entries, 80.0).unwrap(), Some(2));
        assert_eq!(addresses_for_share(&entries, 50.0).unwrap(), Some(1));
        assert_eq!(addresses_for_share(&entries, 100.0).unwrap(), Some(4));
        assert_eq!(addresses_for_share(&[], 80.0).unwrap(), None);
    }

    #[test]
    fn an_exact_share_stops_at_its_own_rank() {
        let calls: Vec<CallRecord> = (0..100)
            .map(|i| {
                call(
                    &format!("c{i}"),
                    "2024-02-01 10:00:00",
                    Priority::P3,
                    &format!("{i:03} Oak St"),
                )
            })
            .collect();
        let entries = rank_addresses(&calls);
        assert!((entries[6].cumulative_pct - 7.0).abs() < 1e-9);

        for threshold in 1..=100_u32 {
            assert_eq!(
                addresses_for_share(&entries, f64::from(threshold)).unwrap(),
                Some(threshold),
                "threshold {threshold}%"
            );
        }
    }

    #[test]
    fn exact_shares_hold_for_uneven_totals() {
        // 25 addresses, one call each: rank 7 is exactly 28%.
        let calls: Vec<CallRecord> = (0..25)
            .map(|i| {
                call(
                    &format!("c{i}"),
                    "2024-02-01 10:00:00",
                    Priority::P3,
                    &format!("{i:02} Elm St"),
                )
            })
            .collect();
        let entries = rank_addresses(&calls);
        assert_eq!(addresses_for_share(&entries, 28.0).unwrap(), Some(7));
        assert_eq!(addresses_for_share(&entries, 28.5).unwrap(), Some(8));
    }

    #[test]
    fn rejects_thresholds_outside_the_percentage_range() {
        let entries = rank_addresses(&sample());
        assert!(addresses_for_share(&entries, 0.0).is_err());
        assert!(addresses_for_share(&entries, 100.5).is_err());
        assert!(addresses_for_share(&entries, f64::NAN).is_err());
    }

    #[test]
    fn summary_uses_the_full_ranking() {
        let options = ParetoOptions {
            limit: 1,
            ..ParetoOptions::default()
        };
        let report = report(&sample(), &options).unwrap();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.summary.ranked_addresses, 4);
        assert_eq!(report.summary.total_calls, 10);
        assert_eq!(report.summary.addresses_for_threshold, Some(2));
        assert_eq!(report.summary.share_of_addresses_pct, Some(50.0));
        assert_eq!(report.summary.focus_reduction_pct, Some(50.0));
    }

    #[test]
    fn ignores_calls_without_an_address() {
        let mut calls = sample();
        let mut unknown = call("X", "2024-02-01 10:00:00", Priority::P1, "");
        unknown.address = None;
        calls.push(unknown);
        calls.push(call("Y", "2024-02-01 10:00:00", Priority::P1, "   "));
        let entries = rank_addresses(&calls);
        assert_eq!(entries.last().unwrap().cumulative_calls, 10);
    }

    #[test]
    fn empty_window_has_no_concentration() {
        let report = report(&[], &ParetoOptions::default()).unwrap();
        assert!(report.entries.is_empty());
        assert_eq!(report.summary.addresses_for_threshold, None);
        assert_eq!(report.summary.share_of_addresses_pct, None);
        assert_eq!(report.summary.total_calls, 0);
    }
}
