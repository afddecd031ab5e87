//! Handler functions for the transactions API.
//!
//! Every handler receives the caller's [`SessionContext`] and scopes all store
//! access to that user. A transaction owned by someone else is reported
//! exactly like a missing one.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Form, Json};
use finsight_store::TransactionId;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::SessionContext;
use crate::errors::AppError;
use crate::services::ledger::{ListQuery, TransactionForm};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: TransactionId,
}

pub async fn list_transactions(
    State(app): State<AppState>,
    ctx: SessionContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, AppError> {
    let filter = query.filter()?;
    let rows = app
        .transactions
        .list_transactions(ctx.session.user_id, filter)
        .await?;

    Ok(Json(json!({
        "success": true,
        "transactions": rows,
        "limit": filter.limit,
        "offset": filter.offset,
    })))
}

pub async fn show_transaction(
    State(app): State<AppState>,
    ctx: SessionContext,
    Query(IdQuery { id }): Query<IdQuery>,
) -> Result<Json<Value>, AppError> {
    let transaction = app
        .transactions
        .get_transaction(id, ctx.session.user_id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(json!({ "success": true, "transaction": transaction })))
}

pub async fn add_transaction(
    State(app): State<AppState>,
    ctx: SessionContext,
    Form(form): Form<TransactionForm>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let draft = form.validate()?;
    let user_id = ctx.session.user_id;
    let id = app
        .transactions
        .insert_transaction(user_id, &draft, app.clock.now())
        .await?;

    tracing::info!(user_id, transaction_id = id, kind = %draft.kind, "Transaction added");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Transaction added successfully", "id": id })),
    ))
}

pub async fn edit_transaction(
    State(app): State<AppState>,
    ctx: SessionContext,
    Query(IdQuery { id }): Query<IdQuery>,
    Form(form): Form<TransactionForm>,
) -> Result<Json<Value>, AppError> {
    let draft = form.validate()?;
    let user_id = ctx.session.user_id;
    if !app.transactions.update_transaction(id, user_id, &draft).await? {
        return Err(AppError::not_found());
    }

    tracing::info!(user_id, transaction_id = id, "Transaction updated");
    Ok(Json(json!({ "success": true, "message": "Transaction updated successfully" })))
}

pub async fn delete_transaction(
    State(app): State<AppState>,
    ctx: SessionContext,
    Query(IdQuery { id }): Query<IdQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = ctx.session.user_id;
    if !app.transactions.delete_transaction(id, user_id).await? {
        return Err(AppError::not_found());
    }

    tracing::info!(user_id, transaction_id = id, "Transaction deleted");
    Ok(Json(json!({ "success": true, "message": "Transaction deleted successfully" })))
}
