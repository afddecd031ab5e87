//! Middleware for protecting authenticated routes and handling authorization.
//!
//! [`require_role`] and [`require_access`] are the authorization checks.
//! [`session_gate`] runs in front of every protected route: it resolves the
//! session cookie, enforces the timeout and the active-user invariant,
//! applies the role requirement and the CSRF check, refreshes activity, and
//! hands the handler a [`SessionContext`].

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use finsight_store::Role;

use super::cookies::{clear_session_cookie, presented_session};
use super::errors::Denial;
use super::models::{Session, SessionId, SessionState};
use crate::errors::AppError;
use crate::state::AppState;
use crate::utils::constant_time_eq;

pub const CSRF_HEADER: &str = "x-csrf-token";

/// Grant iff authenticated with exactly `role`.
pub fn require_role(session: Option<&Session>, role: Role) -> Result<(), Denial> {
    match session {
        None => Err(Denial::Unauthorized),
        Some(s) if s.role == role => Ok(()),
        Some(_) => Err(Denial::AccessDenied),
    }
}

/// Grant iff authenticated with a role at or above `min_role`.
pub fn require_access(session: Option<&Session>, min_role: Role) -> Result<(), Denial> {
    match session {
        None => Err(Denial::Unauthorized),
        Some(s) if s.role.level() >= min_role.level() => Ok(()),
        Some(_) => Err(Denial::AccessDenied),
    }
}

/// The authenticated session of the current request.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: SessionId,
    pub session: Session,
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Denial;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or(Denial::Unauthorized)
    }
}

/// State of one [`session_gate`] layer.
#[derive(Clone)]
pub struct GateState {
    pub app: AppState,
    pub min_role: Role,
}

fn csrf_matches(headers: &HeaderMap, session: &Session) -> bool {
    headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|token| constant_time_eq(token.as_bytes(), session.csrf_token.as_bytes()))
}

fn is_state_changing(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Gate for routes that require a session.
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn session_gate(
    State(gate): State<GateState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let app = &gate.app;
    let cookie_name = &app.config.session_cookie_name;
    let sessions = app.authenticator.sessions();

    let Some(id) = presented_session(&jar, cookie_name) else {
        tracing::debug!(path = %request.uri().path(), "No session presented");
        return Denial::Unauthorized.into_response();
    };

    let session = match sessions.check(Some(&id)).await {
        SessionState::Authenticated(session) => session,
        SessionState::Expired => {
            return (jar.add(clear_session_cookie(cookie_name)), Denial::Timeout).into_response();
        }
        SessionState::Anonymous => {
            return (jar.add(clear_session_cookie(cookie_name)), Denial::Unauthorized)
                .into_response();
        }
    };

    match app.credentials.is_user_active(session.user_id).await {
        Ok(true) => {}
        Ok(false) => {
            sessions.destroy(&id).await;
            tracing::info!(user_id = session.user_id, "Session dropped: user no longer active");
            return (jar.add(clear_session_cookie(cookie_name)), Denial::Unauthorized)
                .into_response();
        }
        Err(e) => return AppError::from(e).into_response(),
    }

    if let Err(denial) = require_access(Some(&session), gate.min_role) {
        tracing::warn!(
            user_id = session.user_id,
            role = %session.role,
            required = %gate.min_role,
            reason = denial.reason(),
            "Access denied"
        );
        return denial.into_response();
    }

    if is_state_changing(request.method()) && !csrf_matches(request.headers(), &session) {
        tracing::warn!(
            user_id = session.user_id,
            method = %request.method(),
            reason = Denial::AccessDenied.reason(),
            "CSRF token missing or mismatched"
        );
        return Denial::AccessDenied.into_response();
    }

    sessions.touch(&id).await;
    request.extensions_mut().insert(SessionContext { id, session });
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn session(role: Role) -> Session {
        Session {
            user_id: 1,
            username: "u".into(),
            role,
            full_name: "U".into(),
            last_activity: Utc::now(),
            csrf_token: "abc123".into(),
        }
    }

    #[test]
    fn require_access_uses_role_levels() {
        assert_eq!(require_access(Some(&session(Role::Admin)), Role::Staff), Ok(()));
        assert_eq!(require_access(Some(&session(Role::Staff)), Role::Staff), Ok(()));
        assert_eq!(
            require_access(Some(&session(Role::Student)), Role::Staff),
            Err(Denial::AccessDenied)
        );
        assert_eq!(require_access(None, Role::Staff), Err(Denial::Unauthorized));
        assert_eq!(require_access(None, Role::Student), Err(Denial::Unauthorized));
    }

    #[test]
    fn require_role_is_exact() {
        assert_eq!(require_role(Some(&session(Role::Staff)), Role::Staff), Ok(()));
        assert_eq!(
            require_role(Some(&session(Role::Admin)), Role::Staff),
            Err(Denial::AccessDenied)
        );
        assert_eq!(require_role(None, Role::Admin), Err(Denial::Unauthorized));
    }

    #[test]
    fn csrf_header_must_match() {
        let s = session(Role::Student);
        let mut headers = HeaderMap::new();
        assert!(!csrf_matches(&headers, &s));
        headers.insert(CSRF_HEADER, "abc124".parse().unwrap());
        assert!(!csrf_matches(&headers, &s));
        headers.insert(CSRF_HEADER, "abc123".parse().unwrap());
        assert!(csrf_matches(&headers, &s));
    }

    #[test]
    fn only_unsafe_methods_need_csrf() {
        assert!(!is_state_changing(&Method::GET));
        assert!(!is_state_changing(&Method::HEAD));
        assert!(is_state_changing(&Method::POST));
        assert!(is_state_changing(&Method::DELETE));
    }
}
