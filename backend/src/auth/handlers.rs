//! Handler functions for authentication-related API endpoints.
//!
//! These functions process login, logout and registration requests, parse
//! form data, and delegate to the [`Authenticator`](super::Authenticator)
//! for the actual checks. The session cookie is set and cleared here.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;

use super::cookies::{clear_session_cookie, presented_session, session_cookie};
use super::errors::AuthError;
use super::models::{LoginRequest, RegisterRequest, SessionState};
use crate::api::DASHBOARD_PATH;
use crate::state::AppState;

pub const LOGGED_OUT_TARGET: &str = "/auth/login?message=logged_out";

#[derive(Debug, Default, Deserialize)]
pub struct LoginPageQuery {
    pub error: Option<String>,
    pub message: Option<String>,
}

/// User-facing text for the `error` code on the login page.
pub fn login_error_message(code: &str) -> &'static str {
    match code {
        "timeout" => "Session expired. Please log in again.",
        "unauthorized" => "Access denied. Please log in.",
        "access_denied" => "You do not have permission to access that resource.",
        _ => "Please log in to continue.",
    }
}

async fn has_live_session(app: &AppState, jar: &CookieJar) -> bool {
    let id = presented_session(jar, &app.config.session_cookie_name);
    matches!(
        app.authenticator.sessions().check(id.as_ref()).await,
        SessionState::Authenticated(_)
    )
}

pub async fn login_page(
    State(app): State<AppState>,
    jar: CookieJar,
    Query(query): Query<LoginPageQuery>,
) -> Response {
    if has_live_session(&app, &jar).await {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }

    let mut body = json!({ "page": "login" });
    if let Some(code) = query.error.as_deref() {
        body["error"] = login_error_message(code).into();
    }
    if query.message.as_deref() == Some("logged_out") {
        body["message"] = "You have been logged out.".into();
    }
    Json(body).into_response()
}

pub async fn login(
    State(app): State<AppState>,
    jar: CookieJar,
    Form(request): Form<LoginRequest>,
) -> Result<(CookieJar, Json<serde_json::Value>), AuthError> {
    let cookie_name = &app.config.session_cookie_name;
    let previous = presented_session(&jar, cookie_name);
    let outcome = app.authenticator.login(&request, previous.as_ref()).await?;

    let jar = jar.add(session_cookie(
        cookie_name,
        &outcome.session_id,
        app.config.secure_cookies(),
    ));
    let body = json!({
        "success": true,
        "message": "Login successful",
        "user": outcome.user,
        "csrf_token": outcome.session.csrf_token,
        "redirect": DASHBOARD_PATH,
    });
    Ok((jar, Json(body)))
}

pub async fn logout(State(app): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let cookie_name = &app.config.session_cookie_name;
    let presented = presented_session(&jar, cookie_name);
    if app.authenticator.logout(presented.as_ref()).await {
        tracing::info!("User logged out");
    }
    (
        jar.add(clear_session_cookie(cookie_name)),
        Redirect::to(LOGGED_OUT_TARGET),
    )
}

pub async fn register_page(State(app): State<AppState>, jar: CookieJar) -> Response {
    if has_live_session(&app, &jar).await {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }
    Json(json!({ "page": "register" })).into_response()
}

pub async fn register(
    State(app): State<AppState>,
    jar: CookieJar,
    Form(request): Form<RegisterRequest>,
) -> Result<Response, AuthError> {
    if has_live_session(&app, &jar).await {
        return Ok(Redirect::to(DASHBOARD_PATH).into_response());
    }

    app.authenticator.register(&request).await?;
    let body = json!({
        "success": true,
        "message": "Registration successful! You can now log in.",
    });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}
