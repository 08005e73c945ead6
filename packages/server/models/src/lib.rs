#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the police call dashboard server.
//!
//! Query parameters arrive as raw strings so that malformed input can be
//! reported with a precise message instead of a generic deserialization
//! failure.

use chrono::{NaiveDate, NaiveDateTime};
use police_calls_analytics_models::ViewName;
use police_calls_call_models::{
    CallQuery, DateRange, InvalidDateRangeError, PriorityFilter, PriorityFilterError,
};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Call data source.
    pub source: String,
}

/// One entry of `GET /api/views`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiViewInfo {
    /// View identifier used in `/api/views/{view}`.
    pub name: ViewName,
    /// Chart title.
    pub title: String,
}

impl From<ViewName> for ApiViewInfo {
    fn from(view: ViewName) -> Self {
        Self {
            name: view,
            title: view.title().to_string(),
        }
    }
}

/// Response of `POST /api/refresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRefresh {
    /// Cached views dropped.
    pub cleared: usize,
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

/// Errors in dashboard query parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// A required parameter is absent.
    #[error("missing required parameter {0}")]
    Missing(&'static str),

    /// A date is not `YYYY-MM-DD`.
    #[error("{name} must be YYYY-MM-DD, got {value:?}")]
    InvalidDate {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: String,
    },

    /// `asOf` is not a timestamp.
    #[error("asOf must be YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD, got {0:?}")]
    InvalidAsOf(String),

    /// `refresh` is not a boolean.
    #[error("refresh must be true or false, got {0:?}")]
    InvalidRefresh(String),

    /// The window ends before it starts.
    #[error(transparent)]
    Range(#[from] InvalidDateRangeError),

    /// The priority list is malformed.
    #[error("priorities: {0}")]
    Priorities(#[from] PriorityFilterError),
}

/// Query parameters accepted by the dashboard endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardParams {
    /// First day of the window (`YYYY-MM-DD`, inclusive).
    pub start_date: Option<String>,
    /// Last day of the window (`YYYY-MM-DD`, inclusive).
    pub end_date: Option<String>,
    /// Comma-separated allowed priorities; all when absent.
    pub priorities: Option<String>,
    /// Reference time for recency.
    pub as_of: Option<String>,
    /// Drop cached views first.
    pub refresh: Option<String>,
}

impl DashboardParams {
    /// Builds the call query.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] if a date is missing or malformed, the window
    /// is inverted, or the priority list is invalid.
    pub fn query(&self) -> Result<CallQuery, ParamError> {
        let start = parse_date("startDate", self.start_date.as_deref())?;
        let end = parse_date("endDate", self.end_date.as_deref())?;
        let range = DateRange::new(start, end)?;

        let priorities = match self.priorities.as_deref().map(str::trim) {
            None | Some("") => PriorityFilter::all(),
            Some(list) => list.parse()?,
        };

        Ok(CallQuery::new(range).with_priorities(priorities))
    }

    /// Parses the reference time, if given. A bare date means midnight.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::InvalidAsOf`] if the value is malformed.
    pub fn as_of(&self) -> Result<Option<NaiveDateTime>, ParamError> {
        let Some(value) = self.as_of.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };

        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(value, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .map(Some)
            .ok_or_else(|| ParamError::InvalidAsOf(value.to_string()))
    }

    /// Parses the refresh flag; absent means `false`.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::InvalidRefresh`] for anything but a boolean.
    pub fn refresh(&self) -> Result<bool, ParamError> {
        match self.refresh.as_deref().map(str::trim) {
            None | Some("" | "false" | "0") => Ok(false),
            Some("true" | "1") => Ok(true),
            Some(other) => Err(ParamError::InvalidRefresh(other.to_string())),
        }
    }
}

fn parse_date(name: &'static str, value: Option<&str>) -> Result<NaiveDate, ParamError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ParamError::Missing(name))?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ParamError::InvalidDate {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use police_calls_call_models::Priority;

    fn params(start: &str, end: &str) -> DashboardParams {
        DashboardParams {
            start_date: Some(start.to_string()),
            end_date: Some(end.to_string()),
            ..DashboardParams::default()
        }
    }

    #[test]
    fn builds_a_query_with_all_priorities_by_default() {
        let query = params("2024-01-01", "2024-03-31").query().unwrap();
        assert!(query.priorities.is_all());
        assert_eq!(
            query.range.end(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
        );
    }

    #[test]
    fn parses_the_priority_list() {
        let mut p = params("2024-01-01", "2024-01-31");
        p.priorities = Some("1, 2".to_string());
        let query = p.query().unwrap();
        assert!(query.priorities.allows(Priority::P2));
        assert!(!query.priorities.allows(Priority::P3));

        p.priorities = Some("1,7".to_string());
        assert!(matches!(p.query(), Err(ParamError::Priorities(_))));
    }

    #[test]
    fn reports_missing_and_malformed_dates() {
        let missing = DashboardParams {
            end_date: Some("2024-01-31".to_string()),
            ..DashboardParams::default()
        };
        assert_eq!(missing.query(), Err(ParamError::Missing("startDate")));

        assert!(matches!(
            params("2024-13-01", "2024-01-31").query(),
            Err(ParamError::InvalidDate { name: "startDate", .. })
        ));
        assert!(matches!(
            params("2024-02-01", "2024-01-31").query(),
            Err(ParamError::Range(_))
        ));
    }

    #[test]
    fn parses_reference_time_forms() {
        let mut p = params("2024-01-01", "2024-01-31");
        assert_eq!(p.as_of(), Ok(None));

        p.as_of = Some("2024-02-01T06:30:00".to_string());
        assert_eq!(
            p.as_of().unwrap().unwrap().to_string(),
            "2024-02-01 06:30:00"
        );

        p.as_of = Some("2024-02-01".to_string());
        assert_eq!(
            p.as_of().unwrap().unwrap().to_string(),
            "2024-02-01 00:00:00"
        );

        p.as_of = Some("yesterday".to_string());
        assert!(matches!(p.as_of(), Err(ParamError::InvalidAsOf(_))));
    }

    #[test]
    fn parses_refresh_flags() {
        let mut p = DashboardParams::default();
        assert_eq!(p.refresh(), Ok(false));
        p.refresh = Some("true".to_string());
        assert_eq!(p.refresh(), Ok(true));
        p.refresh = Some("maybe".to_string());
        assert!(p.refresh().is_err());
    }

    #[test]
    fn view_info_uses_snake_case_names() {
        let json = serde_json::to_value(ApiViewInfo::from(ViewName::IncidentChains)).unwrap();
        assert_eq!(json["name"], "incident_chains");
    }
}
