//! Detection of temporally clustered incidents at a single address.
//!
//! Calls at an address are ordered by time (then call id). A call is
//! *linked* when the gap to its previous or next call is within the window.
//! Consecutive linked calls whose gaps are within the window form a run;
//! an address with at least `min_incidents` linked calls has an active
//! chain.

use std::collections::BTreeMap;

use chrono::TimeDelta;
use police_calls_analytics_models::{ChainLengthMethod, ChainRecord};
use police_calls_call_models::{CallRecord, Priority};

/// Minimum linked calls for an address to be reported.
pub const MIN_INCIDENTS: u64 = 3;
/// Linked calls at which an address is flagged for intervention.
pub const INTERVENTION_THRESHOLD: u64 = 5;
/// Number of addresses shown by default.
pub const TOP_CHAINS: usize = 15;
/// Maximum gap between neighboring calls in a chain.
pub const CHAIN_WINDOW_HOURS: i64 = 24;

/// Tuning for the incident chain view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainOptions {
    /// Maximum gap that links two neighboring calls, inclusive.
    pub window: TimeDelta,
    /// Minimum linked calls for an address to be reported.
    pub min_incidents: u64,
    /// Maximum rows to return.
    pub limit: usize,
    /// How `chain_length` is derived.
    pub length_method: ChainLengthMethod,
    /// Linked calls at which `requires_intervention` is set.
    pub intervention_threshold: u64,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            window: TimeDelta::hours(CHAIN_WINDOW_HOURS),
            min_incidents: MIN_INCIDENTS,
            limit: TOP_CHAINS,
            length_method: ChainLengthMethod::default(),
            intervention_threshold: INTERVENTION_THRESHOLD,
        }
    }
}

/// Linked calls at one address.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Linked {
    incidents: u64,
    highest_priority: Priority,
    segments: u64,
    longest_run: u64,
}

/// Scans one address's calls, already in time order.
fn link(calls: &[&CallRecord], window: TimeDelta) -> Option<Linked> {
    let within = |i: usize| calls[i + 1].call_datetime - calls[i].call_datetime <= window;

    let mut incidents = 0u64;
    let mut highest_priority: Option<Priority> = None;
    let mut segments = 0u64;
    let mut longest_run = 0u64;
    let mut run = 0u64;

    for (i, call) in calls.iter().enumerate() {
        let to_previous = i > 0 && within(i - 1);
        let to_next = i + 1 < calls.len() && within(i);

        if !(to_previous || to_next) {
            continue;
        }

        incidents += 1;
        highest_priority = Some(highest_priority.map_or(call.priority, |p| p.min(call.priority)));

        if to_previous {
            run += 1;
        } else {
            segments += 1;
            run = 1;
        }
        longest_run = longest_run.max(run);
    }

    Some(Linked {
        incidents,
        highest_priority: highest_priority?,
        segments,
        longest_run,
    })
}

/// Finds addresses with active incident chains, most linked calls first.
/// Ties are ordered by address. Calls without an address are skipped.
#[must_use]
pub fn detect_chains(calls: &[CallRecord], options: &ChainOptions) -> Vec<ChainRecord> {
    let mut by_address: BTreeMap<&str, Vec<&CallRecord>> = BTreeMap::new();
    for call in calls {
        if let Some(address) = call.address() {
            by_address.entry(address).or_default().push(call);
        }
    }

    let mut records: Vec<ChainRecord> = by_address
        .into_iter()
        .filter_map(|(address, mut calls)| {
            calls.sort_by(|a, b| {
                a.call_datetime
                    .cmp(&b.call_datetime)
                    .then_with(|| a.call_id.cmp(&b.call_id))
            });

            let linked = link(&calls, options.window)?;
            if linked.incidents < options.min_incidents {
                return None;
            }

            let chain_length = match options.length_method {
                ChainLengthMethod::Heuristic => linked.incidents.div_ceil(2),
                ChainLengthMethod::LongestRun => linked.longest_run,
            };

            Some(ChainRecord {
                address: address.to_string(),
                incidents_24h: linked.incidents,
                highest_priority: linked.highest_priority,
                chain_length,
                segments: linked.segments,
                requires_intervention: linked.incidents >= options.intervention_threshold,
            })
        })
        .collect();

    // Stable sort keeps address order for equal counts.
    records.sort_by(|a, b| b.incidents_24h.cmp(&a.incidents_24h));
    records.truncate(options.limit);
    records
}
