//! Shared fixtures for unit and router tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use finsight_store::{MemoryStore, Role};
use tower::ServiceExt;

use crate::auth::{Clock, NewAccount};
use crate::config::AppConfig;
use crate::state::AppState;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2023, 10, 20, 9, 0, 0).unwrap()),
        }
    }
}

impl ManualClock {
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += TimeDelta::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub const PASSWORD: &str = "secret123";

/// App over an in-memory store with a manual clock and a 30 minute timeout.
pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemoryStore::new());
        let config = AppConfig::default()
            .with_session_timeout(Duration::from_secs(1800))
            .with_session_cookie_name("finsight_session");
        let state = AppState::new(config, store.clone(), store.clone(), clock.clone());
        Self { state, clock, store }
    }

    pub async fn user(&self, username: &str, role: Role) {
        self.state
            .authenticator
            .provision_user(NewAccount {
                username: username.into(),
                email: format!("{username}@example.com"),
                full_name: format!("{username} Tester"),
                password: PASSWORD.into(),
                role,
            })
            .await
            .unwrap();
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        crate::build_router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap()
    }

    /// Log in through the HTTP surface. Returns `(cookie header, csrf token)`.
    pub async fn login(&self, username: &str) -> (String, String) {
        let response = self
            .send(form_request("POST", "/auth/login", &format!("username={username}&password={PASSWORD}"), None))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response).expect("login sets the session cookie");
        let body = json_body(response).await;
        let csrf = body["csrf_token"].as_str().unwrap().to_string();
        (cookie, csrf)
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form_request(method: &str, uri: &str, body: &str, cookie: Option<(&str, &str)>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some((cookie, csrf)) = cookie {
        builder = builder
            .header(header::COOKIE, cookie)
            .header("x-csrf-token", csrf);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// `name=value` of the session cookie set by `response`, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("finsight_session=") && !v.starts_with("finsight_session=;"))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
