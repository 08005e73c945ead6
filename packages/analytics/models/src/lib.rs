#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types for the police call dashboard views.
//!
//! Each view is computed fresh from the calls selected by a request and
//! rendered by an external chart surface. The types here are the exact
//! tables those charts consume, plus the envelope ([`ViewState`],
//! [`ViewReport`]) that reports whether a view has data, no data, or could
//! not be produced.

use chrono::NaiveDate;
use police_calls_call_models::Priority;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Identifies one dashboard view.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViewName {
    /// Headline indicators.
    Summary,
    /// Monthly call volume with running totals.
    Monthly,
    /// Volume and severity by call type.
    CallTypes,
    /// Hour-of-day by day-of-week call counts.
    Heatmap,
    /// Composite risk score per address.
    RiskLocations,
    /// Response-time percentiles per call type.
    ResponseTimes,
    /// Address concentration (80/20) analysis.
    Pareto,
    /// Addresses with clustered incidents inside 24 hours.
    IncidentChains,
}

impl ViewName {
    /// Returns all views in dashboard order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Summary,
            Self::Monthly,
            Self::CallTypes,
            Self::Heatmap,
            Self::RiskLocations,
            Self::ResponseTimes,
            Self::Pareto,
            Self::IncidentChains,
        ]
    }

    /// Human-readable chart title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Summary => "Key Performance Indicators",
            Self::Monthly => "Monthly Call Volume with Cumulative Trend",
            Self::CallTypes => "Top Call Types by Volume",
            Self::Heatmap => "Call Distribution by Hour and Day of Week",
            Self::RiskLocations => "Predictive Risk Analysis - Top 25 Locations",
            Self::ResponseTimes => "Response Time Percentiles by Call Type",
            Self::Pareto => "Pareto Analysis - Location Concentration",
            Self::IncidentChains => "Incident Chains - Escalating Situations",
        }
    }
}

/// One calendar month of call volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    /// Month label (`YYYY-MM`).
    pub month: String,
    /// First day of the month.
    pub month_start: NaiveDate,
    /// Calls received in the month.
    pub calls: u64,
    /// Calls with priority 1 or 2.
    pub severe_calls: u64,
    /// Cumulative calls through this month.
    pub running_total: u64,
    /// Percent change from the previous row (0 when there is none).
    pub pct_change: f64,
}

/// Direction of the most recent month-over-month change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Trend {
    /// Latest month grew.
    Increasing,
    /// Latest month shrank or held flat.
    Decreasing,
}

/// Narrative statistics that accompany the monthly chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyInsights {
    /// Month with the most calls (`YYYY-MM`).
    pub peak_month: String,
    /// Calls in the peak month.
    pub peak_calls: u64,
    /// Calls across all months.
    pub total_calls: u64,
    /// Mean month-over-month change across months with a predecessor.
    pub avg_growth_pct: f64,
    /// Direction of the final month's change.
    pub trend: Trend,
}

/// The monthly view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    /// One row per month, ascending.
    pub months: Vec<MonthlyTrend>,
    /// Derived narrative, absent when there are no months.
    pub insights: Option<MonthlyInsights>,
}

/// Volume and severity for a single call type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallTypeSummary {
    /// Call type label.
    pub call_type: String,
    /// Calls of this type.
    pub total_calls: u64,
    /// Mean priority value (lower is more severe).
    pub avg_priority: f64,
    /// Calls of this type with priority 1 or 2.
    pub severe_calls: u64,
}

/// Day of the week, Monday first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum DayOfWeek {
    /// Monday
    Monday,
    /// Tuesday
    Tuesday,
    /// Wednesday
    Wednesday,
    /// Thursday
    Thursday,
    /// Friday
    Friday,
    /// Saturday
    Saturday,
    /// Sunday
    Sunday,
}

impl DayOfWeek {
    /// Returns all days in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
            Self::Sunday,
        ]
    }
}

impl From<chrono::Weekday> for DayOfWeek {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

/// Call count for one hour-of-day and day-of-week cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    /// Hour of day, 0-23.
    pub hour: u8,
    /// Day of week.
    pub day: DayOfWeek,
    /// Calls received in this cell.
    pub calls: u64,
}

/// Ordered risk bands for a location's risk score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskCategory {
    /// Score up to and including 70.
    Lower,
    /// Score above 70, up to and including 80.
    Moderate,
    /// Score above 80, up to and including 90.
    High,
    /// Score above 90.
    Critical,
}

impl RiskCategory {
    /// Upper bound (inclusive) of the `Lower` band.
    pub const LOWER_MAX: f64 = 70.0;
    /// Upper bound (inclusive) of the `Moderate` band.
    pub const MODERATE_MAX: f64 = 80.0;
    /// Upper bound (inclusive) of the `High` band.
    pub const HIGH_MAX: f64 = 90.0;

    /// Buckets a risk score. Each band includes its upper edge.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score <= Self::LOWER_MAX {
            Self::Lower
        } else if score <= Self::MODERATE_MAX {
            Self::Moderate
        } else if score <= Self::HIGH_MAX {
            Self::High
        } else {
            Self::Critical
        }
    }

    /// Display label used by the dashboard legend.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Lower => "Lower Risk",
            Self::Moderate => "Moderate Risk",
            Self::High => "High Risk",
            Self::Critical => "Critical",
        }
    }
}

/// Which weighting of average priority the risk score uses.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskFormula {
    /// `avg_priority * 10`, as scored by the reference dashboard. Because a
    /// lower priority is more severe, this term grows for milder call mixes.
    #[default]
    Observed,
    /// `(6 - avg_priority) * 10`, so more severe call mixes score higher.
    SeverityWeighted,
}

/// Composite risk for a single address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRecord {
    /// Location.
    pub address: String,
    /// Calls at the address in the window.
    pub total_calls: u64,
    /// Calls with priority 1 or 2.
    pub severe_calls: u64,
    /// Mean priority, rounded to 2 decimals.
    pub avg_priority: f64,
    /// Whole days between the reference time and the latest call; zero when
    /// the latest call is after the reference time.
    pub days_since_last: i64,
    /// Weighted score, rounded to 2 decimals.
    pub risk_score: f64,
    /// Band for `risk_score`.
    pub risk_category: RiskCategory,
}

/// How percentiles are computed from response-time samples.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PercentileMethod {
    /// Linear interpolation between closest ranks (`PERCENTILE_CONT`).
    #[default]
    Interpolated,
    /// Smallest sample whose rank covers the requested fraction.
    NearestRank,
}

/// Response-time distribution for a single call type, in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimePercentiles {
    /// Call type label.
    pub call_type: String,
    /// Qualifying calls used for the percentiles.
    pub total_calls: u64,
    /// Median response time.
    pub p50: f64,
    /// 75th percentile.
    pub p75: f64,
    /// 90th percentile.
    pub p90: f64,
    /// 95th percentile.
    pub p95: f64,
    /// Whether `p90` exceeds the SLA target.
    pub exceeds_sla: bool,
    /// Method that produced the values.
    pub method: PercentileMethod,
}

/// Counts of calls left out of the response-time view, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimeExclusions {
    /// Calls that were never dispatched.
    pub not_dispatched: u64,
    /// Calls dispatched before they were received.
    pub negative: u64,
    /// Calls whose response exceeded the plausible maximum.
    pub over_limit: u64,
    /// Calls without a call type.
    pub missing_call_type: u64,
    /// Call types dropped for having too few qualifying calls.
    pub undersampled_types: u64,
}

/// The response-time view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimeReport {
    /// One row per qualifying call type, slowest P90 first.
    pub rows: Vec<ResponseTimePercentiles>,
    /// Reference SLA line in minutes.
    pub sla_target_minutes: f64,
    /// Calls excluded from the percentiles.
    pub exclusions: ResponseTimeExclusions,
}

/// One ranked address in the concentration analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParetoEntry {
    /// 1 for the busiest address.
    pub rank: u32,
    /// Location.
    pub address: String,
    /// Calls at this address.
    pub calls: u64,
    /// Calls at this and every higher-ranked address.
    pub cumulative_calls: u64,
    /// `cumulative_calls` as a percentage of all addressed calls.
    pub cumulative_pct: f64,
}

/// Headline numbers for the concentration chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParetoSummary {
    /// Target cumulative share, in percent.
    pub threshold_pct: f64,
    /// Fewest top-ranked addresses reaching the target share.
    pub addresses_for_threshold: Option<u32>,
    /// Distinct addresses with at least one call.
    pub ranked_addresses: u64,
    /// `addresses_for_threshold` as a percentage of `ranked_addresses`.
    pub share_of_addresses_pct: Option<f64>,
    /// `100 - share_of_addresses_pct`.
    pub focus_reduction_pct: Option<f64>,
    /// Calls with a known address.
    pub total_calls: u64,
}

/// The concentration view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParetoReport {
    /// Top-ranked addresses.
    pub entries: Vec<ParetoEntry>,
    /// Concentration metrics over the full ranking.
    pub summary: ParetoSummary,
}

/// How a chain's length is derived from its linked incidents.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChainLengthMethod {
    /// `round(incidents_24h / 2)`, as reported by the reference dashboard.
    #[default]
    Heuristic,
    /// Size of the largest run of calls linked by 24-hour gaps.
    LongestRun,
}

/// Clustered incidents at a single address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainRecord {
    /// Location.
    pub address: String,
    /// Calls within 24 hours of a neighboring call at the address.
    pub incidents_24h: u64,
    /// Most severe priority among the linked calls.
    pub highest_priority: Priority,
    /// Chain length per the configured [`ChainLengthMethod`].
    pub chain_length: u64,
    /// Number of separate linked runs.
    pub segments: u64,
    /// Five or more linked incidents.
    pub requires_intervention: bool,
}

/// Headline indicators for the selected window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    /// Calls in the window.
    pub total_calls: u64,
    /// Change of the latest month against its predecessor.
    pub latest_mom_change_pct: f64,
    /// Calls with priority 1 or 2.
    pub severe_calls: u64,
    /// Severe calls as a percentage of all calls.
    pub severe_pct: f64,
    /// Calls per calendar day in the window.
    pub avg_daily_calls: f64,
    /// Scored locations above `high_risk_threshold`.
    pub high_risk_locations: u64,
    /// Risk score above which a location counts as high risk.
    pub high_risk_threshold: f64,
}

/// Computed data for one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", content = "data", rename_all = "snake_case")]
pub enum ViewPayload {
    /// See [`ViewName::Summary`].
    Summary(KpiSummary),
    /// See [`ViewName::Monthly`].
    Monthly(MonthlyReport),
    /// See [`ViewName::CallTypes`].
    CallTypes(Vec<CallTypeSummary>),
    /// See [`ViewName::Heatmap`].
    Heatmap(Vec<HeatmapCell>),
    /// See [`ViewName::RiskLocations`].
    RiskLocations(Vec<RiskRecord>),
    /// See [`ViewName::ResponseTimes`].
    ResponseTimes(ResponseTimeReport),
    /// See [`ViewName::Pareto`].
    Pareto(ParetoReport),
    /// See [`ViewName::IncidentChains`].
    IncidentChains(Vec<ChainRecord>),
}

impl ViewPayload {
    /// The view this payload belongs to.
    #[must_use]
    pub const fn view(&self) -> ViewName {
        match self {
            Self::Summary(_) => ViewName::Summary,
            Self::Monthly(_) => ViewName::Monthly,
            Self::CallTypes(_) => ViewName::CallTypes,
            Self::Heatmap(_) => ViewName::Heatmap,
            Self::RiskLocations(_) => ViewName::RiskLocations,
            Self::ResponseTimes(_) => ViewName::ResponseTimes,
            Self::Pareto(_) => ViewName::Pareto,
            Self::IncidentChains(_) => ViewName::IncidentChains,
        }
    }

    /// Whether the view has nothing to chart for the window.
    ///
    /// The heatmap always carries a full grid, so it counts as empty when
    /// every cell is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Summary(kpi) => kpi.total_calls == 0,
            Self::Monthly(report) => report.months.is_empty(),
            Self::CallTypes(rows) => rows.is_empty(),
            Self::Heatmap(cells) => cells.iter().all(|c| c.calls == 0),
            Self::RiskLocations(rows) => rows.is_empty(),
            Self::ResponseTimes(report) => report.rows.is_empty(),
            Self::Pareto(report) => report.entries.is_empty(),
            Self::IncidentChains(rows) => rows.is_empty(),
        }
    }
}

/// Outcome of producing a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum ViewState {
    /// The view has data.
    Ready(ViewPayload),
    /// The window contains no data for this view.
    Empty,
    /// The view could not be produced.
    Unavailable {
        /// Why the view is missing.
        reason: String,
    },
}

impl ViewState {
    /// Classifies a computed payload as ready or empty.
    #[must_use]
    pub fn from_payload(payload: ViewPayload) -> Self {
        if payload.is_empty() {
            Self::Empty
        } else {
            Self::Ready(payload)
        }
    }

    /// Whether the view could not be produced.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// A view together with its state, as rendered by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewReport {
    /// Which view.
    pub view: ViewName,
    /// Chart title.
    pub title: String,
    /// Result of producing the view.
    pub state: ViewState,
    /// Whether the result was served from cache.
    pub cached: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_bands_include_their_upper_edge() {
        assert_eq!(RiskCategory::from_score(0.0), RiskCategory::Lower);
        assert_eq!(RiskCategory::from_score(70.0), RiskCategory::Lower);
        assert_eq!(RiskCategory::from_score(70.01), RiskCategory::Moderate);
        assert_eq!(RiskCategory::from_score(80.0), RiskCategory::Moderate);
        assert_eq!(RiskCategory::from_score(80.5), RiskCategory::High);
        assert_eq!(RiskCategory::from_score(90.0), RiskCategory::High);
        assert_eq!(RiskCategory::from_score(90.01), RiskCategory::Critical);
        assert_eq!(RiskCategory::from_score(500.0), RiskCategory::Critical);
    }

    #[test]
    fn risk_bands_are_monotonic() {
        let mut previous = RiskCategory::Lower;
        for step in 0..=2000 {
            let score = f64::from(step) * 0.1;
            let category = RiskCategory::from_score(score);
            assert!(category >= previous, "{score} fell back to {category:?}");
            previous = category;
        }
        assert_eq!(previous, RiskCategory::Critical);
    }

    #[test]
    fn view_names_parse_from_snake_case() {
        for view in ViewName::all() {
            let parsed: ViewName = view.to_string().parse().unwrap();
            assert_eq!(parsed, *view);
        }
        assert_eq!(
            "incident_chains".parse::<ViewName>().unwrap(),
            ViewName::IncidentChains
        );
    }

    #[test]
    fn days_follow_chrono_weekdays() {
        assert_eq!(DayOfWeek::from(chrono::Weekday::Mon), DayOfWeek::Monday);
        assert_eq!(DayOfWeek::from(chrono::Weekday::Sun), DayOfWeek::Sunday);
        assert_eq!(DayOfWeek::Tuesday.to_string(), "Tuesday");
    }

    #[test]
    fn all_zero_heatmap_is_empty() {
        let cells = vec![HeatmapCell {
            hour: 3,
            day: DayOfWeek::Tuesday,
            calls: 0,
        }];
        assert!(ViewPayload::Heatmap(cells).is_empty());
    }

    #[test]
    fn view_state_serializes_with_status_tag() {
        let state = ViewState::Unavailable {
            reason: "timed out".to_string(),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["result"]["reason"], "timed out");

        let ready = ViewState::from_payload(ViewPayload::CallTypes(vec![CallTypeSummary {
            call_type: "ALARM".to_string(),
            total_calls: 3,
            avg_priority: 4.0,
            severe_calls: 0,
        }]));
        let json = serde_json::to_value(&ready).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["result"]["view"], "call_types");
        assert_eq!(json["result"]["data"][0]["callType"], "ALARM");
    }
}
