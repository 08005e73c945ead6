#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Police call-for-service record types and request filters.
//!
//! A [`CallRecord`] is one reported call as read from the call log. Every
//! dashboard view is a projection of the records selected by a
//! [`CallQuery`]: an inclusive [`DateRange`] plus a [`PriorityFilter`].

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Dispatch priority of a call, from 1 (most severe) to 5 (least severe).
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
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    /// Priority 1: emergency, life-threatening
    P1 = 1,
    /// Priority 2: urgent, crime in progress
    P2 = 2,
    /// Priority 3: prompt response
    P3 = 3,
    /// Priority 4: routine
    P4 = 4,
    /// Priority 5: report-only or informational
    P5 = 5,
}

impl Priority {
    /// Returns the numeric value of this priority.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a priority from its numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-5.
    pub const fn from_value(value: i64) -> Result<Self, InvalidPriorityError> {
        match value {
            1 => Ok(Self::P1),
            2 => Ok(Self::P2),
            3 => Ok(Self::P3),
            4 => Ok(Self::P4),
            5 => Ok(Self::P5),
            _ => Err(InvalidPriorityError { value }),
        }
    }

    /// Whether this priority counts as a severe call (priority 1 or 2).
    #[must_use]
    pub const fn is_severe(self) -> bool {
        self.value() <= 2
    }

    /// Returns all variants of this enum, most severe first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::P1, Self::P2, Self::P3, Self::P4, Self::P5]
    }
}

impl TryFrom<u8> for Priority {
    type Error = InvalidPriorityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(i64::from(value))
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.value()
    }
}

/// Error returned when a numeric priority falls outside 1-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid priority value {value}: expected 1-5")]
pub struct InvalidPriorityError {
    /// The rejected value.
    pub value: i64,
}

/// One reported police call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    /// Unique call identifier.
    pub call_id: String,
    /// When the call was received.
    pub call_datetime: NaiveDateTime,
    /// When a unit was dispatched, if one ever was.
    pub dispatch_datetime: Option<NaiveDateTime>,
    /// Call type label (e.g. `DISTURBANCE`).
    pub call_type: Option<String>,
    /// Free-text location.
    pub address: Option<String>,
    /// Dispatch priority.
    pub priority: Priority,
}

impl CallRecord {
    /// Whether this call is severe (priority 1 or 2).
    #[must_use]
    pub const fn is_severe(&self) -> bool {
        self.priority.is_severe()
    }

    /// Minutes between the call and the dispatch, or `None` if the call
    /// was never dispatched. Negative when the dispatch timestamp precedes
    /// the call timestamp.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn response_minutes(&self) -> Option<f64> {
        self.dispatch_datetime
            .map(|dispatched| (dispatched - self.call_datetime).num_seconds() as f64 / 60.0)
    }

    /// The call type, treating blank labels as missing.
    #[must_use]
    pub fn call_type(&self) -> Option<&str> {
        self.call_type.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// The address, treating blank strings as missing.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Error returned when a date range ends before it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid date range: start {start} is after end {end}")]
pub struct InvalidDateRangeError {
    /// Requested start date.
    pub start: NaiveDate,
    /// Requested end date.
    pub end: NaiveDate,
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = InvalidDateRangeError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl DateRange {
    /// Creates a new range covering `start` through `end` inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDateRangeError`] if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidDateRangeError> {
        if start > end {
            return Err(InvalidDateRangeError { start, end });
        }
        Ok(Self { start, end })
    }

    /// First date in the range.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date in the range.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Midnight at the start of the range.
    #[must_use]
    pub fn start_datetime(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// Midnight after the last day of the range.
    #[must_use]
    pub fn end_exclusive(&self) -> NaiveDateTime {
        self.end
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX)
            .and_time(NaiveTime::MIN)
    }

    /// Whether the timestamp falls on a date within the range.
    #[must_use]
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        (self.start..=self.end).contains(&at.date())
    }

    /// Number of calendar days covered (always at least 1).
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Error returned when a priority filter string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriorityFilterError {
    /// No priorities were listed.
    #[error("priority filter must allow at least one priority")]
    Empty,
    /// A listed value was not a number.
    #[error("invalid priority '{0}': expected an integer 1-5")]
    NotANumber(String),
    /// A listed value was out of range.
    #[error(transparent)]
    OutOfRange(#[from] InvalidPriorityError),
}

/// The set of priorities a request wants to see.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorityFilter {
    allowed: BTreeSet<Priority>,
}

impl PriorityFilter {
    /// A filter that allows every priority.
    #[must_use]
    pub fn all() -> Self {
        Self {
            allowed: Priority::all().iter().copied().collect(),
        }
    }

    /// Creates a filter from an explicit set of priorities.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityFilterError::Empty`] if no priorities are given.
    pub fn new(allowed: impl IntoIterator<Item = Priority>) -> Result<Self, PriorityFilterError> {
        let allowed: BTreeSet<Priority> = allowed.into_iter().collect();
        if allowed.is_empty() {
            return Err(PriorityFilterError::Empty);
        }
        Ok(Self { allowed })
    }

    /// Whether calls with the given priority pass the filter.
    #[must_use]
    pub fn allows(&self, priority: Priority) -> bool {
        self.allowed.contains(&priority)
    }

    /// Whether every priority is allowed.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.allowed.len() == Priority::all().len()
    }

    /// Iterates the allowed priorities, most severe first.
    pub fn iter(&self) -> impl Iterator<Item = Priority> + '_ {
        self.allowed.iter().copied()
    }
}

impl Default for PriorityFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl FromStr for PriorityFilter {
    type Err = PriorityFilterError;

    /// Parses a comma-separated list such as `"1,2,3"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let allowed = s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| -> Result<Priority, PriorityFilterError> {
                let value: i64 = p
                    .parse()
                    .map_err(|_| PriorityFilterError::NotANumber(p.to_string()))?;
                Ok(Priority::from_value(value)?)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(allowed)
    }
}

impl std::fmt::Display for PriorityFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values: Vec<String> = self.iter().map(|p| p.value().to_string()).collect();
        f.write_str(&values.join(","))
    }
}

/// Request-scoped selection of call records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallQuery {
    /// Inclusive date window on `call_datetime`.
    pub range: DateRange,
    /// Allowed priorities.
    pub priorities: PriorityFilter,
}

impl CallQuery {
    /// A query over `range` that allows every priority.
    #[must_use]
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            priorities: PriorityFilter::all(),
        }
    }

    /// Replaces the priority filter.
    #[must_use]
    pub fn with_priorities(mut self, priorities: PriorityFilter) -> Self {
        self.priorities = priorities;
        self
    }

    /// Whether a record is selected by this query.
    #[must_use]
    pub fn matches(&self, record: &CallRecord) -> bool {
        self.range.contains(record.call_datetime) && self.priorities.allows(record.priority)
    }
}

/// Rows in the window that could not be turned into [`CallRecord`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRecords {
    /// Rows with no priority.
    pub missing_priority: u64,
    /// Rows whose priority is outside 1-5.
    pub invalid_priority: u64,
}

impl RejectedRecords {
    /// Total rejected rows.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.missing_priority + self.invalid_priority
    }
}

/// Immutable set of calls selected for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallSnapshot {
    /// Valid calls matching the query, ordered by time then call id.
    pub records: Vec<CallRecord>,
    /// Rows in the window dropped for data-quality reasons.
    pub rejected: RejectedRecords,
}
