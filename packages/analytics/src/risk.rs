//! Per-address composite risk scoring.
//!
//! The score is a hand-tuned linear blend of volume, severe volume,
//! average priority, and a flat recency bonus:
//!
//! ```text
//! risk_score = round(total_calls * 0.3
//!                  + severe_calls * 2.0
//!                  + avg_priority * 10
//!                  + (15 if days_since_last < 7 else 0), 2)
//! ```
//!
//! Priority 1 is the most severe, so the `avg_priority` term grows as an
//! address's calls get *milder*. [`RiskFormula::Observed`] keeps that
//! behavior; [`RiskFormula::SeverityWeighted`] replaces the term with
//! `(6 - avg_priority) * 10`.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use police_calls_analytics_models::{RiskCategory, RiskFormula, RiskRecord};
use police_calls_call_models::CallRecord;

use crate::round2;

/// Addresses with fewer calls than this are not scored.
pub const MIN_CALLS: u64 = 10;
/// Number of locations shown by default.
pub const TOP_LOCATIONS: usize = 25;

const VOLUME_WEIGHT: f64 = 0.3;
const SEVERE_WEIGHT: f64 = 2.0;
const PRIORITY_WEIGHT: f64 = 10.0;
const RECENCY_DAYS: i64 = 7;
const RECENCY_BONUS: f64 = 15.0;
/// One past the least severe priority value.
const PRIORITY_CEILING: f64 = 6.0;

/// Tuning for the risk view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskOptions {
    /// Minimum calls for an address to be scored.
    pub min_calls: u64,
    /// Maximum rows to return.
    pub limit: usize,
    /// Weighting of the average priority term.
    pub formula: RiskFormula,
}

impl Default for RiskOptions {
    fn default() -> Self {
        Self {
            min_calls: MIN_CALLS,
            limit: TOP_LOCATIONS,
            formula: RiskFormula::default(),
        }
    }
}

/// Computes the risk score for one address, rounded to 2 decimals.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn risk_score(
    total_calls: u64,
    severe_calls: u64,
    avg_priority: f64,
    days_since_last: i64,
    formula: RiskFormula,
) -> f64 {
    let priority_term = match formula {
        RiskFormula::Observed => avg_priority * PRIORITY_WEIGHT,
        RiskFormula::SeverityWeighted => (PRIORITY_CEILING - avg_priority) * PRIORITY_WEIGHT,
    };
    let recency = if days_since_last < RECENCY_DAYS {
        RECENCY_BONUS
    } else {
        0.0
    };

    round2(
        total_calls as f64 * VOLUME_WEIGHT
            + severe_calls as f64 * SEVERE_WEIGHT
            + priority_term
            + recency,
    )
}

struct AddressAccum {
    total: u64,
    severe: u64,
    priority_sum: u64,
    last_call: NaiveDateTime,
}

/// Scores every address with at least `min_calls` calls, highest risk
/// first. Ties are ordered by address. Calls without an address are
/// skipped.
///
/// `as_of` is the reference time for `days_since_last`. Calls after `as_of`
/// count as current, so `days_since_last` never drops below zero.
#[must_use]
pub fn score_locations(
    calls: &[CallRecord],
    as_of: NaiveDateTime,
    options: &RiskOptions,
) -> Vec<RiskRecord> {
    let mut by_address: BTreeMap<&str, AddressAccum> = BTreeMap::new();

    for call in calls {
        let Some(address) = call.address() else {
            continue;
        };
        let entry = by_address.entry(address).or_insert(AddressAccum {
            total: 0,
            severe: 0,
            priority_sum: 0,
            last_call: call.call_datetime,
        });
        entry.total += 1;
        entry.priority_sum += u64::from(call.priority.value());
        if call.is_severe() {
            entry.severe += 1;
        }
        if call.call_datetime > entry.last_call {
            entry.last_call = call.call_datetime;
        }
    }

    let mut records: Vec<RiskRecord> = by_address
        .into_iter()
        .filter(|(_, acc)| acc.total >= options.min_calls)
        .map(|(address, acc)| {
            #[allow(clippy::cast_precision_loss)]
            let avg_priority = acc.priority_sum as f64 / acc.total as f64;
            let days_since_last = (as_of - acc.last_call).num_days().max(0);
            let score = risk_score(
                acc.total,
                acc.severe,
                avg_priority,
                days_since_last,
                options.formula,
            );

            RiskRecord {
                address: address.to_string(),
                total_calls: acc.total,
                severe_calls: acc.severe,
                avg_priority: round2(avg_priority),
                days_since_last,
                risk_score: score,
                risk_category: RiskCategory::from_score(score),
            }
        })
        .collect();

    log::debug!(
        "Scored {} addresses with at least {} calls",
        records.len(),
        options.min_calls
    );

    records.sort_by(|a, b| {
        b.risk_score
            .total_cmp(&a.risk_score)
            .then_with(|| a.address.cmp(&b.address))
    });
    records.truncate(options.limit);
    records
}
