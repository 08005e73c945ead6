//! Response-time percentiles per call type.

use std::collections::BTreeMap;

use police_calls_analytics_models::{
    PercentileMethod, ResponseTimeExclusions, ResponseTimePercentiles, ResponseTimeReport,
};
use police_calls_call_models::CallRecord;

use crate::{percentile, round2};

/// Minimum qualifying calls for a call type to be reported.
pub const MIN_SAMPLES: usize = 50;
/// Responses slower than this are treated as data errors.
pub const MAX_RESPONSE_MINUTES: f64 = 120.0;
/// Number of call types shown by default.
pub const TOP_CALL_TYPES: usize = 10;
/// Reference SLA for the P90 response.
pub const SLA_TARGET_MINUTES: f64 = 10.0;

const FRACTIONS: [f64; 4] = [0.50, 0.75, 0.90, 0.95];

/// Tuning for the response-time view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseTimeOptions {
    /// Minimum qualifying calls per call type.
    pub min_samples: usize,
    /// Upper bound of a plausible response, in minutes.
    pub max_minutes: f64,
    /// Maximum rows to return.
    pub limit: usize,
    /// Preferred percentile method.
    pub method: PercentileMethod,
    /// SLA line that `p90` is compared against.
    pub sla_target_minutes: f64,
}

impl Default for ResponseTimeOptions {
    fn default() -> Self {
        Self {
            min_samples: MIN_SAMPLES,
            max_minutes: MAX_RESPONSE_MINUTES,
            limit: TOP_CALL_TYPES,
            method: PercentileMethod::default(),
            sla_target_minutes: SLA_TARGET_MINUTES,
        }
    }
}

/// Builds the response-time view.
///
/// Calls are excluded, and counted by reason, when they have no call type,
/// were never dispatched, or have a response outside `[0, max_minutes]`.
/// Call types with fewer than `min_samples` remaining calls are dropped.
/// Rows are ordered by `p90` descending, then call type.
#[must_use]
pub fn report(calls: &[CallRecord], options: &ResponseTimeOptions) -> ResponseTimeReport {
    let mut exclusions = ResponseTimeExclusions::default();
    let mut samples: BTreeMap<&str, Vec<f64>> = BTreeMap::new();

    for call in calls {
        let Some(call_type) = call.call_type() else {
            exclusions.missing_call_type += 1;
            continue;
        };
        let Some(minutes) = call.response_minutes() else {
            exclusions.not_dispatched += 1;
            continue;
        };
        if minutes < 0.0 {
            exclusions.negative += 1;
            continue;
        }
        if minutes > options.max_minutes {
            exclusions.over_limit += 1;
            continue;
        }
        samples.entry(call_type).or_default().push(minutes);
    }

    let mut rows = Vec::new();
    for (call_type, mut minutes) in samples {
        if minutes.len() < options.min_samples {
            exclusions.undersampled_types += 1;
            continue;
        }
        percentile::sort_samples(&mut minutes);

        let Some(([p50, p75, p90, p95], method)) =
            percentile::with_fallback(options.method, &minutes, FRACTIONS)
        else {
            log::error!("No percentile method could summarize {call_type}; skipping");
            continue;
        };

        rows.push(ResponseTimePercentiles {
            call_type: call_type.to_string(),
            total_calls: minutes.len() as u64,
            p50: round2(p50),
            p75: round2(p75),
            p90: round2(p90),
            p95: round2(p95),
            exceeds_sla: p90 > options.sla_target_minutes,
            method,
        });
    }

    rows.sort_by(|a, b| {
        b.p90
            .total_cmp(&a.p90)
            .then_with(|| a.call_type.cmp(&b.call_type))
    });
    rows.truncate(options.limit);

    log::debug!("Response-time exclusions: {exclusions:?}");

    ResponseTimeReport {
        rows,
        sla_target_minutes: options.sla_target_minutes,
        exclusions,
    }
}
