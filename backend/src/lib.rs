//! FINSIGHT backend library.
//!
//! Exposes the Axum router and everything it is assembled from, so the binary
//! and the tests build the exact same application.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod middleware;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
mod test_support;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Full application router: public auth routes, the legacy dispatcher, and
/// every protected route behind the session gate.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::dispatch))
        .route("/index.php", get(api::dispatch))
        .nest("/auth", auth::auth_router())
        .merge(api::protected_router(state.clone()))
        .fallback(api::fallback)
        .layer(middleware::http_trace_layer())
        .with_state(state)
}
