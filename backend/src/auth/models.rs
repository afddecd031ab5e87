//! Data structures for authentication-related entities.
//!
//! This module defines the login and registration forms, the sanitized user
//! view returned to clients, and the session record kept in the registry.

use std::fmt;

use chrono::{DateTime, Utc};
use finsight_store::{Role, User, UserId};
use serde::{Deserialize, Serialize};

use crate::utils;

/// Login form body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Self-registration form body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    /// Requested role; absent means `student`.
    #[serde(default)]
    pub role: Option<String>,
}

/// Account created out-of-band by an operator, any role.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub role: Role,
}

/// User as exposed to clients. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub full_name: String,
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            full_name: user.full_name.clone(),
        }
    }
}

const SESSION_ID_BYTES: usize = 32;

/// Opaque session identifier carried in the session cookie.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(utils::random_token::<SESSION_ID_BYTES>())
    }

    /// Accept a cookie value only if it has the shape of a generated id.
    pub fn parse(value: &str) -> Option<Self> {
        let well_formed = value.len() == SESSION_ID_BYTES * 2
            && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        well_formed.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Redacted: the id is a bearer credential.
impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({}..)", &self.0[..8.min(self.0.len())])
    }
}

/// Server-side state of one login.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    pub full_name: String,
    pub last_activity: DateTime<Utc>,
    /// Must accompany every state-changing request.
    pub csrf_token: String,
}

impl Session {
    pub fn new(user: &AuthenticatedUser, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            full_name: user.full_name.clone(),
            last_activity: now,
            csrf_token: utils::random_token::<16>(),
        }
    }

    pub fn user(&self) -> AuthenticatedUser {
        AuthenticatedUser {
            id: self.user_id,
            username: self.username.clone(),
            role: self.role,
            full_name: self.full_name.clone(),
        }
    }
}

/// Result of resolving a presented session id.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No id, or an id the registry does not know.
    Anonymous,
    /// The id was known but idle past the timeout; it has been destroyed.
    Expired,
    Authenticated(Session),
}

/// Successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session_id: SessionId,
    pub session: Session,
    pub user: AuthenticatedUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_round_trips_through_parse() {
        let id = SessionId::generate();
        assert_eq!(SessionId::parse(id.as_str()), Some(id.clone()));
        assert!(SessionId::parse("short").is_none());
        assert!(SessionId::parse(&"Z".repeat(64)).is_none());
        assert!(!format!("{id:?}").contains(id.as_str()));
    }

    #[test]
    fn user_view_serializes_without_hash() {
        let user = AuthenticatedUser {
            id: 3,
            username: "sari".into(),
            role: Role::Staff,
            full_name: "Sari Wulan".into(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 3, "username": "sari", "role": "staff", "full_name": "Sari Wulan"})
        );
    }
}
