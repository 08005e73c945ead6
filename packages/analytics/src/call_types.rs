//! Volume, average priority, and severe counts per call type.

use std::collections::BTreeMap;

use police_calls_analytics_models::CallTypeSummary;
use police_calls_call_models::CallRecord;

use crate::round2;

/// Number of call types shown by default.
pub const TOP_CALL_TYPES: usize = 15;

/// Tuning for the call type view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTypeOptions {
    /// Maximum rows to return.
    pub limit: usize,
}

impl Default for CallTypeOptions {
    fn default() -> Self {
        Self {
            limit: TOP_CALL_TYPES,
        }
    }
}

#[derive(Default)]
struct TypeAccum {
    total: u64,
    severe: u64,
    priority_sum: u64,
}

/// Summarizes calls by type, busiest first. Ties are ordered by call type
/// name. Calls without a type are skipped.
#[must_use]
pub fn breakdown(calls: &[CallRecord], options: &CallTypeOptions) -> Vec<CallTypeSummary> {
    let mut by_type: BTreeMap<&str, TypeAccum> = BTreeMap::new();

    for call in calls {
        let Some(call_type) = call.call_type() else {
            continue;
        };
        let entry = by_type.entry(call_type).or_default();
        entry.total += 1;
        entry.priority_sum += u64::from(call.priority.value());
        if call.is_severe() {
            entry.severe += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let mut rows: Vec<CallTypeSummary> = by_type
        .into_iter()
        .map(|(call_type, acc)| CallTypeSummary {
            call_type: call_type.to_string(),
            total_calls: acc.total,
            avg_priority: round2(acc.priority_sum as f64 / acc.total as f64),
            severe_calls: acc.severe,
        })
        .collect();

    // Stable sort keeps the name order from the map for equal counts.
    rows.sort_by(|a, b| b.total_calls.cmp(&a.total_calls));
    rows.truncate(options.limit);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::typed;
    use police_calls_call_models::Priority;

    #[test]
    fn ranks_types_by_volume_with_name_tiebreak() {
        let calls = vec![
            typed("1", "2024-01-01 00:00:00", Priority::P1, "THEFT"),
            typed("2", "2024-01-01 01:00:00", Priority::P4, "THEFT"),
            typed("3", "2024-01-01 02:00:00", Priority::P2, "ALARM"),
            typed("4", "2024-01-01 03:00:00", Priority::P5, "BURGLARY"),
            typed("5", "2024-01-01 04:00:00", Priority::P3, "THEFT"),
        ];
        let rows = breakdown(&calls, &CallTypeOptions::default());
        let names: Vec<&str> = rows.iter().map(|r| r.call_type.as_str()).collect();
        assert_eq!(names, vec!["THEFT", "ALARM", "BURGLARY"]);

        let theft = &rows[0];
        assert_eq!(theft.total_calls, 3);
        assert_eq!(theft.severe_calls, 1);
        assert!((theft.avg_priority - 2.67).abs() < 1e-9);
    }

    #[test]
    fn skips_calls_without_a_type() {
        let mut untyped = typed("1", "2024-01-01 00:00:00", Priority::P1, "THEFT");
        untyped.call_type = None;
        let mut blank = typed("2", "2024-01-01 00:00:00", Priority::P1, "THEFT");
        blank.call_type = Some(String::new());
        let rows = breakdown(&[untyped, blank], &CallTypeOptions::default());
        assert!(rows.is_empty());
    }

    #[test]
    fn limits_to_top_fifteen() {
        let calls: Vec<CallRecord> = (0..20)
            .map(|i| typed(&i.to_string(), "2024-01-01 00:00:00", Priority::P3, &format!("TYPE {i:02}")))
            .collect();
        let rows = breakdown(&calls, &CallTypeOptions::default());
        assert_eq!(rows.len(), TOP_CALL_TYPES);
        assert_eq!(rows[0].call_type, "TYPE 00");
    }
}
