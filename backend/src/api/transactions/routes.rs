//! Defines the HTTP routes for a user's transactions.
//!
//! Reads are `GET`; every state-changing route is `POST` and therefore needs
//! the session's CSRF token.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{add_transaction, delete_transaction, edit_transaction, list_transactions, show_transaction};
use crate::state::AppState;

pub fn transactions_router() -> Router<AppState> {
    Router::new()
        .route("/transactions/list", get(list_transactions))
        .route("/transactions/add", post(add_transaction))
        .route("/transactions/edit", get(show_transaction).post(edit_transaction))
        .route("/transactions/delete", post(delete_transaction))
}
