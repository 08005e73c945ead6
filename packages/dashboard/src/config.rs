//! Environment-driven dashboard configuration.

use std::str::FromStr;
use std::time::Duration;

use police_calls_analytics::AnalysisSettings;
use police_calls_analytics::pareto::DEFAULT_THRESHOLD_PCT;
use police_calls_analytics_models::{ChainLengthMethod, PercentileMethod, RiskFormula};
use police_calls_call_models::DateRange;

use crate::DashboardError;
use crate::cache::CacheConfig;

/// Default bound on the snapshot query, in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
/// Default bound on a single view's computation, in seconds.
pub const DEFAULT_VIEW_TIMEOUT_SECS: u64 = 10;

/// Aggregation switches applied to every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// Emit zero rows for months without calls.
    pub monthly_fill_gaps: bool,
    /// Weighting of the risk score's priority term.
    pub risk_formula: RiskFormula,
    /// How chain length is reported.
    pub chain_length_method: ChainLengthMethod,
    /// Preferred response-time percentile method.
    pub percentile_method: PercentileMethod,
    /// Cumulative share reported by the concentration summary.
    pub pareto_threshold_pct: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            monthly_fill_gaps: false,
            risk_formula: RiskFormula::default(),
            chain_length_method: ChainLengthMethod::default(),
            percentile_method: PercentileMethod::default(),
            pareto_threshold_pct: DEFAULT_THRESHOLD_PCT,
        }
    }
}

impl AnalysisConfig {
    /// Settings for a request over `range`.
    #[must_use]
    pub fn settings(&self, range: DateRange) -> AnalysisSettings {
        let mut settings = AnalysisSettings::new(range);
        settings.monthly.fill_gaps = self.monthly_fill_gaps;
        settings.risk.formula = self.risk_formula;
        settings.chains.length_method = self.chain_length_method;
        settings.response_time.method = self.percentile_method;
        settings.pareto.threshold_pct = self.pareto_threshold_pct;
        settings
    }
}

/// Dashboard configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardConfig {
    /// Bound on fetching the call snapshot.
    pub query_timeout: Duration,
    /// Bound on computing one view.
    pub view_timeout: Duration,
    /// View cache settings.
    pub cache: CacheConfig,
    /// Aggregation switches.
    pub analysis: AnalysisConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            view_timeout: Duration::from_secs(DEFAULT_VIEW_TIMEOUT_SECS),
            cache: CacheConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Loads configuration from environment variables.
    ///
    /// Unset variables take their defaults. Recognized variables:
    /// `QUERY_TIMEOUT_SECS`, `VIEW_TIMEOUT_SECS`, `MONTHLY_FILL_GAPS`,
    /// `RISK_FORMULA`, `CHAIN_LENGTH_METHOD`, `PERCENTILE_METHOD`,
    /// `PARETO_THRESHOLD_PCT`, plus the cache variables read by
    /// [`CacheConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::InvalidConfig`] if a variable is set to a
    /// value that cannot be parsed.
    pub fn from_env() -> Result<Self, DashboardError> {
        let analysis = AnalysisConfig {
            monthly_fill_gaps: env_or("MONTHLY_FILL_GAPS", false)?,
            risk_formula: env_or("RISK_FORMULA", RiskFormula::default())?,
            chain_length_method: env_or("CHAIN_LENGTH_METHOD", ChainLengthMethod::default())?,
            percentile_method: env_or("PERCENTILE_METHOD", PercentileMethod::default())?,
            pareto_threshold_pct: env_or("PARETO_THRESHOLD_PCT", DEFAULT_THRESHOLD_PCT)?,
        };

        let config = Self {
            query_timeout: Duration::from_secs(env_or(
                "QUERY_TIMEOUT_SECS",
                DEFAULT_QUERY_TIMEOUT_SECS,
            )?),
            view_timeout: Duration::from_secs(env_or(
                "VIEW_TIMEOUT_SECS",
                DEFAULT_VIEW_TIMEOUT_SECS,
            )?),
            cache: CacheConfig::from_env(),
            analysis,
        };

        log::debug!("Dashboard config: {config:?}");
        Ok(config)
    }
}

fn env_or<T: FromStr>(name: &'static str, default: T) -> Result<T, DashboardError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            parse_value(name, &value)
        }
        _ => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, value: &str) -> Result<T, DashboardError> {
    value
        .trim()
        .parse()
        .map_err(|_| DashboardError::InvalidConfig {
            name,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_enum_switches_by_name() {
        assert_eq!(
            parse_value::<RiskFormula>("RISK_FORMULA", "severity_weighted").unwrap(),
            RiskFormula::SeverityWeighted
        );
        assert_eq!(
            parse_value::<ChainLengthMethod>("CHAIN_LENGTH_METHOD", " longest_run ").unwrap(),
            ChainLengthMethod::LongestRun
        );
        assert_eq!(
            parse_value::<PercentileMethod>("PERCENTILE_METHOD", "nearest_rank").unwrap(),
            PercentileMethod::NearestRank
        );
    }

    #[test]
    fn rejects_unparseable_values() {
        let err = parse_value::<u64>("VIEW_TIMEOUT_SECS", "soon").unwrap_err();
        assert!(matches!(
            err,
            DashboardError::InvalidConfig { name: "VIEW_TIMEOUT_SECS", .. }
        ));
    }

    #[test]
    fn analysis_switches_flow_into_settings() {
        let analysis = AnalysisConfig {
            monthly_fill_gaps: true,
            risk_formula: RiskFormula::SeverityWeighted,
            chain_length_method: ChainLengthMethod::LongestRun,
            percentile_method: PercentileMethod::NearestRank,
            pareto_threshold_pct: 90.0,
        };
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap();
        let settings = analysis.settings(range);

        assert!(settings.monthly.fill_gaps);
        assert_eq!(settings.risk.formula, RiskFormula::SeverityWeighted);
        assert_eq!(settings.chains.length_method, ChainLengthMethod::LongestRun);
        assert_eq!(settings.response_time.method, PercentileMethod::NearestRank);
        assert!((settings.pareto.threshold_pct - 90.0).abs() < f64::EPSILON);
        assert_eq!(settings.as_of, range.end_exclusive());
    }
}
