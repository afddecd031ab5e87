//! Defines the HTTP routes for reports.

use axum::routing::get;
use axum::Router;

use super::handlers::{dashboard, export, monthly, yearly};
use crate::state::AppState;

pub fn reports_router() -> Router<AppState> {
    Router::new()
        .route("/reports/dashboard", get(dashboard))
        .route("/reports/monthly", get(monthly))
        .route("/reports/yearly", get(yearly))
        .route("/reports/export", get(export))
}
