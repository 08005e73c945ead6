//! One-shot dashboard reports printed as JSON.

use std::sync::Arc;

use police_calls_analytics_models::ViewName;
use police_calls_dashboard::config::DashboardConfig;
use police_calls_dashboard::{Dashboard, DashboardRequest};
use police_calls_database::{DuckDbCallSource, calls_db, paths};
use police_calls_server_models::{DashboardParams, ParamError};

/// Window and filters of a report, as typed on the command line.
#[derive(Debug, Clone, Default)]
pub struct ReportArgs {
    pub start: String,
    pub end: String,
    pub priorities: Option<String>,
    pub as_of: Option<String>,
}

impl ReportArgs {
    /// Parses the arguments with the same rules as the REST API.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] for malformed dates, an inverted window, or an
    /// invalid priority list.
    pub fn request(&self) -> Result<DashboardRequest, ParamError> {
        let params = DashboardParams {
            start_date: Some(self.start.clone()),
            end_date: Some(self.end.clone()),
            priorities: self.priorities.clone(),
            as_of: self.as_of.clone(),
            refresh: None,
        };

        let mut request = DashboardRequest::new(params.query()?);
        request.as_of = params.as_of()?;
        Ok(request)
    }
}

/// Renders the dashboard, or a single view, as pretty-printed JSON.
///
/// # Errors
///
/// Returns a `serde_json` error if the report cannot be serialized.
pub async fn render_json(
    dashboard: &Dashboard,
    request: &DashboardRequest,
    view: Option<ViewName>,
) -> Result<String, serde_json::Error> {
    if let Some(view) = view {
        serde_json::to_string_pretty(&dashboard.view(view, request).await)
    } else {
        serde_json::to_string_pretty(&dashboard.render(request).await)
    }
}

/// Opens the configured call database and builds a dashboard over it.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the environment
/// configuration is invalid.
pub fn open_dashboard() -> Result<Dashboard, Box<dyn std::error::Error>> {
    let path = paths::calls_db_path();
    log::info!("Opening call database {}", path.display());
    let source = DuckDbCallSource::open_read_only(&path)?;
    let config = DashboardConfig::from_env()?;
    Ok(Dashboard::new(Arc::new(source), config))
}

/// Runs a report against the configured database and prints it.
///
/// # Errors
///
/// Returns an error if the arguments are invalid, the database cannot be
/// opened, or the report cannot be serialized.
pub async fn run(
    args: &ReportArgs,
    view: Option<ViewName>,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = args.request()?;
    let dashboard = open_dashboard()?;
    println!("{}", render_json(&dashboard, &request, view).await?);
    Ok(())
}

/// Prints the record count and date bounds of the configured database.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or queried.
pub async fn info() -> Result<(), Box<dyn std::error::Error>> {
    let path = paths::calls_db_path();
    let source = DuckDbCallSource::open_read_only(&path)?;
    let (count, bounds) = source
        .with_connection(|conn| {
            Ok((
                calls_db::get_record_count(conn)?,
                calls_db::get_date_bounds(conn)?,
            ))
        })
        .await?;

    println!("Database: {}", path.display());
    println!("Calls:    {count}");
    match bounds {
        Some((first, last)) => println!("Range:    {first} to {last}"),
        None => println!("Range:    (empty)"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use police_calls_call_models::{CallRecord, Priority};
    use police_calls_database::MemoryCallSource;

    fn args(start: &str, end: &str) -> ReportArgs {
        ReportArgs {
            start: start.to_string(),
            end: end.to_string(),
            ..ReportArgs::default()
        }
    }

    #[test]
    fn parses_like_the_api() {
        let mut a = args("2024-01-01", "2024-01-31");
        a.priorities = Some("1,2".to_string());
        a.as_of = Some("2024-02-15".to_string());
        let request = a.request().unwrap();

        assert!(request.query.priorities.allows(Priority::P1));
        assert!(!request.query.priorities.allows(Priority::P5));
        assert_eq!(request.as_of.unwrap().to_string(), "2024-02-15 00:00:00");
        assert!(!request.refresh);

        assert!(args("2024-02-01", "2024-01-01").request().is_err());
        assert!(args("Jan 1", "2024-01-01").request().is_err());
    }

    #[tokio::test]
    async fn prints_a_single_view() {
        let at =
            NaiveDateTime::parse_from_str("2024-01-10 09:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let source = MemoryCallSource::new(vec![CallRecord {
            call_id: "c1".to_string(),
            call_datetime: at,
            dispatch_datetime: None,
            call_type: Some("ALARM".to_string()),
            address: Some("1 PARK PL".to_string()),
            priority: Priority::P2,
        }]);
        let dashboard = Dashboard::new(Arc::new(source), DashboardConfig::default());
        let request = args("2024-01-01", "2024-01-31").request().unwrap();

        let json = render_json(&dashboard, &request, Some(ViewName::CallTypes))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["view"], "call_types");
        assert_eq!(value["state"]["status"], "ready");

        let json = render_json(&dashboard, &request, None).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["views"].as_array().unwrap().len(), 8);
    }
}
