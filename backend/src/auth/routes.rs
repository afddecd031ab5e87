//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle login, logout and registration. They are public and
//! are nested under `/auth` by the main router.

use axum::routing::get;
use axum::Router;

use super::handlers::{login, login_page, logout, register, register_page};
use crate::state::AppState;

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout).post(logout))
        .route("/register", get(register_page).post(register))
}
