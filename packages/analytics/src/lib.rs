#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregations behind each police call dashboard view.
//!
//! Every public aggregation is a pure function over the call records
//! selected for a request. Nothing here touches storage or the clock: the
//! window and the "now" reference used for recency arrive through
//! [`AnalysisSettings`], so the same records and settings always produce
//! the same tables.

pub mod call_types;
pub mod chains;
pub mod heatmap;
pub mod monthly;
pub mod pareto;
pub mod percentile;
pub mod response_time;
pub mod risk;
pub mod summary;

#[cfg(test)]
pub(crate) mod testing;

use chrono::NaiveDateTime;
use police_calls_analytics_models::{ViewName, ViewPayload};
use police_calls_call_models::{CallRecord, DateRange};
use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A tuning parameter is outside its valid domain.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of what went wrong.
        message: String,
    },
}

/// Request-scoped inputs shared by every view.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// Selected window.
    pub range: DateRange,
    /// Reference time for recency calculations.
    pub as_of: NaiveDateTime,
    /// Monthly view tuning.
    pub monthly: monthly::MonthlyOptions,
    /// Call type view tuning.
    pub call_types: call_types::CallTypeOptions,
    /// Risk view tuning.
    pub risk: risk::RiskOptions,
    /// Response-time view tuning.
    pub response_time: response_time::ResponseTimeOptions,
    /// Concentration view tuning.
    pub pareto: pareto::ParetoOptions,
    /// Incident chain view tuning.
    pub chains: chains::ChainOptions,
}

impl AnalysisSettings {
    /// Default settings for `range`, measuring recency from the end of the
    /// window.
    #[must_use]
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            as_of: range.end_exclusive(),
            monthly: monthly::MonthlyOptions::default(),
            call_types: call_types::CallTypeOptions::default(),
            risk: risk::RiskOptions::default(),
            response_time: response_time::ResponseTimeOptions::default(),
            pareto: pareto::ParetoOptions::default(),
            chains: chains::ChainOptions::default(),
        }
    }

    /// Overrides the recency reference time.
    #[must_use]
    pub const fn with_as_of(mut self, as_of: NaiveDateTime) -> Self {
        self.as_of = as_of;
        self
    }
}

/// Computes a single view over `calls`.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the settings for the view are invalid.
pub fn compute_view(
    view: ViewName,
    calls: &[CallRecord],
    settings: &AnalysisSettings,
) -> Result<ViewPayload, AnalyticsError> {
    log::debug!("Computing {view} over {} calls", calls.len());

    Ok(match view {
        ViewName::Summary => ViewPayload::Summary(summary::kpi_summary(calls, settings)),
        ViewName::Monthly => {
            ViewPayload::Monthly(monthly::report(calls, &settings.range, &settings.monthly))
        }
        ViewName::CallTypes => {
            ViewPayload::CallTypes(call_types::breakdown(calls, &settings.call_types))
        }
        ViewName::Heatmap => ViewPayload::Heatmap(heatmap::temporal_heatmap(calls)),
        ViewName::RiskLocations => ViewPayload::RiskLocations(risk::score_locations(
            calls,
            settings.as_of,
            &settings.risk,
        )),
        ViewName::ResponseTimes => {
            ViewPayload::ResponseTimes(response_time::report(calls, &settings.response_time))
        }
        ViewName::Pareto => ViewPayload::Pareto(pareto::report(calls, &settings.pareto)?),
        ViewName::IncidentChains => {
            ViewPayload::IncidentChains(chains::detect_chains(calls, &settings.chains))
        }
    })
}

/// Rounds to two decimal places, half away from zero.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{call, range};
    use police_calls_call_models::Priority;

    #[test]
    fn every_view_computes_for_an_empty_window() {
        let settings = AnalysisSettings::new(range("2024-01-01", "2024-01-31"));
        for view in ViewName::all() {
            let payload = compute_view(*view, &[], &settings).unwrap();
            assert_eq!(payload.view(), *view);
            assert!(payload.is_empty(), "{view} should be empty");
        }
    }

    #[test]
    fn default_reference_time_is_the_end_of_the_window() {
        let settings = AnalysisSettings::new(range("2024-01-01", "2024-01-31"));
        assert_eq!(
            settings.as_of,
            crate::testing::at("2024-02-01 00:00:00")
        );
    }

    #[test]
    fn computed_payload_matches_requested_view() {
        let settings = AnalysisSettings::new(range("2024-01-01", "2024-01-31"));
        let calls = vec![call("C1", "2024-01-02 03:00:00", Priority::P1, "1 Main St")];
        let payload = compute_view(ViewName::Heatmap, &calls, &settings).unwrap();
        assert_eq!(payload.view(), ViewName::Heatmap);
        assert!(!payload.is_empty());
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert!((round2(65.433_333) - 65.43).abs() < 1e-9);
        assert!((round2(2.005_000_1) - 2.01).abs() < 1e-9);
        assert!((round2(-1.236) - -1.24).abs() < 1e-9);
    }
}
