//! Fixture builders shared by the aggregation tests.

use chrono::{NaiveDate, NaiveDateTime};
use police_calls_call_models::{CallRecord, DateRange, Priority};

pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn range(start: &str, end: &str) -> DateRange {
    DateRange::new(
        NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
        NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
    )
    .unwrap()
}

pub fn call(id: &str, when: &str, priority: Priority, address: &str) -> CallRecord {
    CallRecord {
        call_id: id.to_string(),
        call_datetime: at(when),
        dispatch_datetime: None,
        call_type: Some("DISTURBANCE".to_string()),
        address: Some(address.to_string()),
        priority,
    }
}

pub fn typed(id: &str, when: &str, priority: Priority, call_type: &str) -> CallRecord {
    CallRecord {
        call_id: id.to_string(),
        call_datetime: at(when),
        dispatch_datetime: None,
        call_type: Some(call_type.to_string()),
        address: None,
        priority,
    }
}

/// A call of `call_type` dispatched `seconds` after it was received.
pub fn dispatched(id: usize, call_type: &str, seconds: i64) -> CallRecord {
    let received = at("2024-05-01 12:00:00");
    CallRecord {
        call_id: format!("R{id}"),
        call_datetime: received,
        dispatch_datetime: Some(received + chrono::TimeDelta::seconds(seconds)),
        call_type: Some(call_type.to_string()),
        address: None,
        priority: Priority::P3,
    }
}
