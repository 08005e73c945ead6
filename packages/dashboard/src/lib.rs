#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Produces the police call dashboard.
//!
//! A request fetches one immutable snapshot of the selected calls, bounded
//! by the query timeout, and then computes every requested view on the
//! blocking pool in parallel, each bounded by the view timeout. A view
//! that errors, panics, or times out is reported as unavailable without
//! affecting the others. Ready and empty views are cached for a short TTL,
//! keyed by view, query, and reference time.

pub mod cache;
pub mod config;

use std::sync::Arc;

use chrono::NaiveDateTime;
use futures::future::join_all;
use police_calls_analytics::{AnalysisSettings, compute_view};
use police_calls_analytics_models::{ViewName, ViewReport, ViewState};
use police_calls_call_models::{CallQuery, CallSnapshot, DateRange, PriorityFilter, RejectedRecords};
use police_calls_database::{CallSource, DbError};
use serde::{Deserialize, Serialize};

use crate::cache::TtlCache;
use crate::config::DashboardConfig;

/// Errors that can occur while producing the dashboard.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// The call source failed.
    #[error("Call data unavailable: {0}")]
    Source(#[from] DbError),

    /// The call source did not answer in time.
    #[error("Call data query timed out after {seconds}s")]
    Timeout {
        /// Configured bound in seconds.
        seconds: u64,
    },

    /// A configuration variable holds an unparseable value.
    #[error("Invalid value {value:?} for {name}")]
    InvalidConfig {
        /// Variable name.
        name: &'static str,
        /// Rejected value.
        value: String,
    },
}

/// One dashboard request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRequest {
    /// Calls to analyze.
    pub query: CallQuery,
    /// Reference time for recency; defaults to the end of the window.
    pub as_of: Option<NaiveDateTime>,
    /// Drop cached views before computing.
    pub refresh: bool,
}

impl DashboardRequest {
    /// A request over `query` with default reference time.
    #[must_use]
    pub const fn new(query: CallQuery) -> Self {
        Self {
            query,
            as_of: None,
            refresh: false,
        }
    }
}

/// Data-quality counts for the snapshot behind a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    /// Valid calls selected by the query.
    pub calls_analyzed: u64,
    /// Rows in the window that were dropped.
    pub rejected: RejectedRecords,
}

impl DataQuality {
    fn of(snapshot: &CallSnapshot) -> Self {
        Self {
            calls_analyzed: snapshot.records.len() as u64,
            rejected: snapshot.rejected,
        }
    }
}

/// Rendered dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    /// Selected window.
    pub range: DateRange,
    /// Allowed priorities.
    pub priorities: PriorityFilter,
    /// Reference time used for recency.
    pub as_of: NaiveDateTime,
    /// Requested views, in request order.
    pub views: Vec<ViewReport>,
    /// Snapshot counts; absent when every view came from cache or the
    /// snapshot could not be fetched.
    pub data_quality: Option<DataQuality>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    view: ViewName,
    query: CallQuery,
    as_of: NaiveDateTime,
}

/// Dashboard service over a [`CallSource`].
pub struct Dashboard {
    source: Arc<dyn CallSource>,
    config: DashboardConfig,
    cache: TtlCache<CacheKey, ViewState>,
}

impl Dashboard {
    /// Creates a dashboard reading from `source`.
    #[must_use]
    pub fn new(source: Arc<dyn CallSource>, config: DashboardConfig) -> Self {
        Self {
            source,
            cache: TtlCache::new(config.cache),
            config,
        }
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Description of the underlying source.
    #[must_use]
    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    /// Drops every cached view, returning how many were held.
    pub fn refresh(&self) -> usize {
        let dropped = self.cache.clear();
        log::info!("Dashboard cache cleared ({dropped} entries)");
        dropped
    }

    /// Renders every view.
    pub async fn render(&self, request: &DashboardRequest) -> DashboardReport {
        self.render_views(ViewName::all(), request).await
    }

    /// Renders a single view.
    pub async fn view(&self, view: ViewName, request: &DashboardRequest) -> ViewReport {
        let mut report = self.render_views(&[view], request).await;
        report.views.pop().unwrap_or_else(|| ViewReport {
            view,
            title: view.title().to_string(),
            state: ViewState::Unavailable {
                reason: "view was not rendered".to_string(),
            },
            cached: false,
        })
    }

    /// Renders `views` for `request`.
    pub async fn render_views(
        &self,
        views: &[ViewName],
        request: &DashboardRequest,
    ) -> DashboardReport {
        if request.refresh {
            self.refresh();
        }

        let mut settings = self.config.analysis.settings(request.query.range);
        if let Some(as_of) = request.as_of {
            settings = settings.with_as_of(as_of);
        }

        let key = |view: ViewName| CacheKey {
            view,
            query: request.query.clone(),
            as_of: settings.as_of,
        };

        let mut states: Vec<Option<(ViewState, bool)>> = views
            .iter()
            .map(|view| self.cache.get(&key(*view)).map(|state| (state, true)))
            .collect();

        let pending: Vec<ViewName> = views
            .iter()
            .zip(&states)
            .filter(|(_, state)| state.is_none())
            .map(|(view, _)| *view)
            .collect();

        let mut data_quality = None;

        if !pending.is_empty() {
            let computed = match self.fetch_snapshot(&request.query).await {
                Ok(snapshot) => {
                    data_quality = Some(DataQuality::of(&snapshot));
                    self.compute_all(&pending, &snapshot, settings.clone()).await
                }
                Err(e) => {
                    log::error!("Dashboard data unavailable for {}: {e}", request.query.range);
                    let reason = e.to_string();
                    pending
                        .iter()
                        .map(|_| ViewState::Unavailable {
                            reason: reason.clone(),
                        })
                        .collect()
                }
            };

            let mut computed = pending.iter().zip(computed);
            for slot in &mut states {
                if slot.is_none()
                    && let Some((view, state)) = computed.next()
                {
                    if !state.is_unavailable() {
                        self.cache.insert(key(*view), state.clone());
                    }
                    *slot = Some((state, false));
                }
            }
        }

        let views = views
            .iter()
            .zip(states)
            .map(|(view, state)| {
                let (state, cached) = state.unwrap_or_else(|| {
                    (
                        ViewState::Unavailable {
                            reason: "view was not rendered".to_string(),
                        },
                        false,
                    )
                });
                ViewReport {
                    view: *view,
                    title: view.title().to_string(),
                    state,
                    cached,
                }
            })
            .collect();

        DashboardReport {
            range: request.query.range,
            priorities: request.query.priorities.clone(),
            as_of: settings.as_of,
            views,
            data_quality,
        }
    }

    async fn fetch_snapshot(&self, query: &CallQuery) -> Result<Arc<CallSnapshot>, DashboardError> {
        let timeout = self.config.query_timeout;
        let snapshot = tokio::time::timeout(timeout, self.source.fetch_calls(query))
            .await
            .map_err(|_| DashboardError::Timeout {
                seconds: timeout.as_secs(),
            })??;

        log::info!(
            "Fetched {} calls for {} (priorities {})",
            snapshot.records.len(),
            query.range,
            query.priorities,
        );
        Ok(Arc::new(snapshot))
    }

    async fn compute_all(
        &self,
        views: &[ViewName],
        snapshot: &Arc<CallSnapshot>,
        settings: AnalysisSettings,
    ) -> Vec<ViewState> {
        let settings = Arc::new(settings);
        let timeout = self.config.view_timeout;

        join_all(views.iter().map(|view| {
            let view = *view;
            let snapshot = Arc::clone(snapshot);
            let settings = Arc::clone(&settings);
            async move { compute_isolated(view, snapshot, settings, timeout).await }
        }))
        .await
    }
}

/// Computes one view on the blocking pool, converting every failure into
/// an unavailable state. A timed-out computation keeps running in the
/// background; its result is discarded.
async fn compute_isolated(
    view: ViewName,
    snapshot: Arc<CallSnapshot>,
    settings: Arc<AnalysisSettings>,
    timeout: std::time::Duration,
) -> ViewState {
    let task = tokio::task::spawn_blocking(move || compute_view(view, &snapshot.records, &settings));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Ok(payload))) => ViewState::from_payload(payload),
        Ok(Ok(Err(e))) => {
            log::warn!("View {view} failed: {e}");
            ViewState::Unavailable {
                reason: e.to_string(),
            }
        }
        Ok(Err(e)) => {
            log::error!("View {view} panicked: {e}");
            ViewState::Unavailable {
                reason: format!("{view} computation failed"),
            }
        }
        Err(_) => {
            log::warn!("View {view} timed out after {}s", timeout.as_secs());
            ViewState::Unavailable {
                reason: format!("{view} timed out after {}s", timeout.as_secs()),
            }
        }
    }
}
