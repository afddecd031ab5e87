//! Handler functions for the reports API.
//!
//! These functions resolve the requested period, call into
//! `services::reports` for the aggregation, and format the responses.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::SessionContext;
use crate::errors::AppError;
use crate::services::ledger::ListQuery;
use crate::services::reports;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub async fn dashboard(
    State(app): State<AppState>,
    ctx: SessionContext,
) -> Result<Json<Value>, AppError> {
    let today = app.clock.now().date_naive();
    let dashboard = reports::dashboard(app.transactions.as_ref(), ctx.session.user_id, today).await?;
    Ok(Json(json!({
        "success": true,
        "user": ctx.session.user(),
        "dashboard": dashboard,
    })))
}

pub async fn monthly(
    State(app): State<AppState>,
    ctx: SessionContext,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Value>, AppError> {
    let (this_year, this_month) = reports::year_month(app.clock.now().date_naive());
    let report = reports::monthly(
        app.transactions.as_ref(),
        ctx.session.user_id,
        query.year.unwrap_or(this_year),
        query.month.unwrap_or(this_month),
    )
    .await?;
    Ok(Json(json!({ "success": true, "report": report })))
}

pub async fn yearly(
    State(app): State<AppState>,
    ctx: SessionContext,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Value>, AppError> {
    let (this_year, _) = reports::year_month(app.clock.now().date_naive());
    let report = reports::yearly(
        app.transactions.as_ref(),
        ctx.session.user_id,
        query.year.unwrap_or(this_year),
    )
    .await?;
    Ok(Json(json!({ "success": true, "report": report })))
}

pub async fn export(
    State(app): State<AppState>,
    ctx: SessionContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let range = query.range()?;
    let csv = reports::export_csv(app.transactions.as_ref(), ctx.session.user_id, range).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        csv,
    ))
}
