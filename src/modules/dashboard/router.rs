use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_dashboard, get_monthly_report};

pub fn init_dashboard_router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/reports/monthly", get(get_monthly_report))
}
