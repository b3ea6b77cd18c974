use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Datelike, Utc};
use tracing::instrument;

use heightcert_core::AppError;

use super::model::{DashboardSummary, MonthlyReport, ReportQuery};
use super::service::{DashboardService, MAX_REPORT_YEAR, MIN_REPORT_YEAR};
use crate::middleware::auth::{RequireViewDashboard, RequireViewReports};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Headline counts", body = DashboardSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires VIEW_DASHBOARD")
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    RequireViewDashboard(_auth): RequireViewDashboard,
) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(DashboardService::summary(&state.db).await?))
}

/// Monthly activity for one year
///
/// Months are calendar months in UTC.
#[utoipa::path(
    get,
    path = "/api/reports/monthly",
    params(ReportQuery),
    responses(
        (status = 200, description = "Twelve months of activity", body = MonthlyReport),
        (status = 400, description = "Year out of range"),
        (status = 403, description = "Forbidden - requires VIEW_REPORTS")
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_monthly_report(
    State(state): State<AppState>,
    RequireViewReports(_auth): RequireViewReports,
    Query(query): Query<ReportQuery>,
) -> Result<Json<MonthlyReport>, AppError> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    if !(MIN_REPORT_YEAR..=MAX_REPORT_YEAR).contains(&year) {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "year must be between {} and {}",
            MIN_REPORT_YEAR,
            MAX_REPORT_YEAR
        )));
    }

    Ok(Json(DashboardService::monthly_report(&state.db, year).await?))
}
