//! HTTP handler functions for the dashboard API.

use actix_web::{HttpResponse, web};
use police_calls_analytics_models::ViewName;
use police_calls_dashboard::DashboardRequest;
use police_calls_server_models::{
    ApiError, ApiHealth, ApiRefresh, ApiViewInfo, DashboardParams, ParamError,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        source: state.dashboard.source_description(),
    })
}

/// `GET /api/views`
///
/// Lists the available views in dashboard order.
pub async fn views() -> HttpResponse {
    let views: Vec<ApiViewInfo> = ViewName::all()
        .iter()
        .copied()
        .map(ApiViewInfo::from)
        .collect();

    HttpResponse::Ok().json(views)
}

/// `GET /api/dashboard`
///
/// Renders every view for the requested window.
pub async fn dashboard(
    state: web::Data<AppState>,
    params: web::Query<DashboardParams>,
) -> HttpResponse {
    let request = match dashboard_request(&params) {
        Ok(request) => request,
        Err(e) => return bad_request(&e),
    };

    let report = state.dashboard.render(&request).await;
    let unavailable = report
        .views
        .iter()
        .filter(|v| v.state.is_unavailable())
        .count();
    if unavailable > 0 {
        log::warn!(
            "Dashboard for {} rendered with {unavailable} unavailable views",
            report.range
        );
    }

    HttpResponse::Ok().json(report)
}

/// `GET /api/views/{view}`
///
/// Renders a single view.
pub async fn view(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<DashboardParams>,
) -> HttpResponse {
    let name = path.into_inner();
    let Ok(view) = name.parse::<ViewName>() else {
        return HttpResponse::NotFound().json(ApiError {
            error: format!("Unknown view '{name}'"),
        });
    };

    let request = match dashboard_request(&params) {
        Ok(request) => request,
        Err(e) => return bad_request(&e),
    };

    HttpResponse::Ok().json(state.dashboard.view(view, &request).await)
}

/// `POST /api/refresh`
///
/// Drops every cached view.
pub async fn refresh(state: web::Data<AppState>) -> HttpResponse {
    let cleared = state.dashboard.refresh();
    HttpResponse::Ok().json(ApiRefresh { cleared })
}

fn dashboard_request(params: &DashboardParams) -> Result<DashboardRequest, ParamError> {
    let mut request = DashboardRequest::new(params.query()?);
    request.as_of = params.as_of()?;
    request.refresh = params.refresh()?;
    Ok(request)
}

fn bad_request(e: &ParamError) -> HttpResponse {
    log::debug!("Rejected dashboard parameters: {e}");
    HttpResponse::BadRequest().json(ApiError {
        error: e.to_string(),
    })
}
