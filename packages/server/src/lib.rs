#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the police call dashboard.
//!
//! Serves every dashboard view as JSON from a read-only `DuckDB` call
//! database. Views are computed per request and cached briefly by the
//! [`Dashboard`] service; `POST /api/refresh` drops the cache.

mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use police_calls_dashboard::Dashboard;
use police_calls_dashboard::config::DashboardConfig;
use police_calls_database::{DuckDbCallSource, paths};

/// Shared application state.
pub struct AppState {
    /// Dashboard service over the call database.
    pub dashboard: Arc<Dashboard>,
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/views", web::get().to(handlers::views))
            .route("/dashboard", web::get().to(handlers::dashboard))
            .route("/views/{view}", web::get().to(handlers::view))
            .route("/refresh", web::post().to(handlers::refresh)),
    );
}

/// Starts the dashboard API server.
///
/// Opens the call database named by `CALLS_DB_PATH` (default
/// `data/calls.duckdb`) read-only, loads the dashboard configuration from
/// the environment, and serves on `BIND_ADDR`:`PORT`. The caller provides
/// the async runtime and initializes logging.
///
/// # Errors
///
/// Returns an `std::io::Error` if the database cannot be opened, the
/// configuration is invalid, or the HTTP server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let db_path = paths::calls_db_path();
    log::info!("Opening call database {}...", db_path.display());
    let source = DuckDbCallSource::open_read_only(&db_path).map_err(|e| {
        std::io::Error::other(format!(
            "Failed to open call database {}: {e}",
            db_path.display()
        ))
    })?;

    let config = DashboardConfig::from_env().map_err(std::io::Error::other)?;
    let dashboard = Dashboard::new(Arc::new(source), config);

    let state = web::Data::new(AppState {
        dashboard: Arc::new(dashboard),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
