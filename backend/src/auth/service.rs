//! Core business logic for the authentication system.
//!
//! The [`Authenticator`] verifies credentials against the [`CredentialStore`],
//! opens sessions through the [`SessionManager`], and performs
//! self-registration and operator provisioning. Passwords are stored as
//! argon2 PHC strings.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use finsight_store::{CredentialStore, NewUser, Role, UserId};

use super::errors::AuthError;
use super::models::{
    AuthenticatedUser, LoginOutcome, LoginRequest, NewAccount, RegisterRequest, SessionId,
};
use super::session::SessionManager;
use crate::utils::{validate_email, validate_not_empty};

const MIN_PASSWORD_LEN: usize = 6;

/// Hash `password` into a PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::System(format!("password hashing failed: {e}")))
}

/// Check `password` against a stored PHC string. An unparsable hash never verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

#[derive(Clone)]
pub struct Authenticator {
    credentials: Arc<dyn CredentialStore>,
    sessions: SessionManager,
}

impl Authenticator {
    pub fn new(credentials: Arc<dyn CredentialStore>, sessions: SessionManager) -> Self {
        Self {
            credentials,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Verify credentials and open a new session, destroying `previous`.
    pub async fn login(
        &self,
        request: &LoginRequest,
        previous: Option<&SessionId>,
    ) -> Result<LoginOutcome, AuthError> {
        let username = request.username.trim();
        if !validate_not_empty(username) || !validate_not_empty(&request.password) {
            return Err(AuthError::validation("Username and password are required"));
        }

        let Some(user) = self.credentials.find_active_user_by_username(username).await? else {
            tracing::info!(username, "Login rejected: unknown or inactive user");
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(&request.password, &user.password_hash) {
            tracing::info!(user_id = user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        // Recorded before the session exists.
        self.credentials
            .update_last_login(user.id, self.sessions.now())
            .await?;
        let view = AuthenticatedUser::from(&user);
        let (session_id, session) = self.sessions.start(&view, previous).await;

        tracing::info!(user_id = user.id, role = %user.role, "User logged in");
        Ok(LoginOutcome {
            session_id,
            session,
            user: view,
        })
    }

    /// Destroy the session, if any. Returns `true` if one was live.
    pub async fn logout(&self, id: Option<&SessionId>) -> bool {
        match id {
            Some(id) => self.sessions.destroy(id).await,
            None => false,
        }
    }

    /// Self-registration. Only students may register; other roles are
    /// provisioned with [`Authenticator::provision_user`].
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserId, AuthError> {
        let username = request.username.trim();
        let email = request.email.trim();
        let full_name = request.full_name.trim();

        if !validate_not_empty(username) {
            return Err(AuthError::validation("Username is required"));
        }
        if !validate_not_empty(email) || !validate_email(email) {
            return Err(AuthError::validation("Valid email is required"));
        }
        if !validate_not_empty(full_name) {
            return Err(AuthError::validation("Full name is required"));
        }
        if !validate_not_empty(&request.password) {
            return Err(AuthError::validation("Password is required"));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }
        if request.password != request.confirm_password {
            return Err(AuthError::validation("Passwords do not match"));
        }
        let requested = request.role.as_deref().map(str::trim).unwrap_or("student");
        if requested.parse::<Role>().ok() != Some(Role::Student) {
            return Err(AuthError::validation(
                "Registration is only available for students",
            ));
        }

        if self
            .credentials
            .username_or_email_exists(username, email)
            .await?
        {
            return Err(AuthError::Conflict);
        }

        let id = self
            .credentials
            .insert_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                full_name: full_name.to_string(),
                password_hash: hash_password(&request.password)?,
                role: Role::Student,
                is_active: true,
            })
            .await?;

        tracing::info!(user_id = id, username, "Student registered");
        Ok(id)
    }

    /// Create an active account with any role.
    pub async fn provision_user(&self, account: NewAccount) -> Result<UserId, AuthError> {
        let username = account.username.trim();
        let email = account.email.trim();
        if !validate_not_empty(username) {
            return Err(AuthError::validation("Username is required"));
        }
        if !validate_email(email) {
            return Err(AuthError::validation("Valid email is required"));
        }
        if account.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }

        let id = self
            .credentials
            .insert_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                full_name: account.full_name.trim().to_string(),
                password_hash: hash_password(&account.password)?,
                role: account.role,
                is_active: true,
            })
            .await?;

        tracing::info!(user_id = id, username, role = %account.role, "User provisioned");
        Ok(id)
    }

    /// Enable or disable login for `username`. Returns `false` if unknown.
    pub async fn set_active(&self, username: &str, active: bool) -> Result<bool, AuthError> {
        let found = self.credentials.set_user_active(username, active).await?;
        if found {
            tracing::info!(username, active, "User activation changed");
        }
        Ok(found)
    }
}
