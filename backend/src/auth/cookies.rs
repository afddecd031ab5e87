//! Session cookie construction and lookup.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use super::models::SessionId;

/// Session cookie: no `Max-Age`, so it ends with the browser session.
pub fn session_cookie(name: &str, id: &SessionId, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), id.as_str().to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .build()
}

/// Removal cookie for the session.
pub fn clear_session_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Session id presented in `jar`, if it is well formed.
pub fn presented_session(jar: &CookieJar, name: &str) -> Option<SessionId> {
    jar.get(name).and_then(|c| SessionId::parse(c.value()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_attributes() {
        let id = SessionId::generate();
        let cookie = session_cookie("finsight_session", &id, true);
        assert_eq!(cookie.value(), id.as_str());
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));

        let insecure = session_cookie("finsight_session", &id, false);
        assert_eq!(insecure.secure(), Some(false));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie("finsight_session");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }

    #[test]
    fn malformed_cookie_is_ignored() {
        let jar = CookieJar::new().add(Cookie::new("finsight_session", "not-an-id"));
        assert!(presented_session(&jar, "finsight_session").is_none());

        let id = SessionId::generate();
        let jar = CookieJar::new().add(session_cookie("finsight_session", &id, false));
        assert_eq!(presented_session(&jar, "finsight_session"), Some(id));
    }
}
