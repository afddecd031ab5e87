//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the listen address, database URL, session timeout and cookie settings.
//! Values come from the environment via [`AppConfig::from_env`] and can be
//! overridden with the `with_*` builder methods.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use finsight_store::DatabaseConfig;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: impl Into<String>, reason: impl ToString) -> Self {
        Self::Invalid {
            var,
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Deployment environment. Only `production` changes behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" | "test" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Runtime configuration of the web server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub session_timeout: Duration,
    pub session_cookie_name: String,
    pub environment: Environment,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database_url: "sqlite:finsight.db?mode=rwc".into(),
            db_max_connections: 5,
            session_timeout: Duration::from_secs(1800),
            session_cookie_name: "finsight_session".into(),
            environment: Environment::Development,
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `FINSIGHT_BIND`: listen address (default `127.0.0.1:8080`)
    /// - `DATABASE_URL`: sqlx SQLite URL
    /// - `DB_MAX_CONNECTIONS`: pool size
    /// - `SESSION_TIMEOUT_SECS`: inactivity timeout in seconds
    /// - `SESSION_COOKIE_NAME`: name of the session cookie
    /// - `APP_ENV`: `production` enables `Secure` cookies
    /// - `LOG_FORMAT`: `pretty`, `compact` or `json`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for any value that fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("FINSIGHT_BIND") {
            let bind = value
                .parse()
                .map_err(|e| ConfigError::invalid("FINSIGHT_BIND", &value, e))?;
            config = config.with_bind(bind);
        }
        if let Some(value) = lookup("DATABASE_URL") {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid("DATABASE_URL", value, "must not be empty"));
            }
            config = config.with_database_url(value);
        }
        if let Some(value) = lookup("DB_MAX_CONNECTIONS") {
            let n: u32 = value
                .parse()
                .map_err(|e| ConfigError::invalid("DB_MAX_CONNECTIONS", &value, e))?;
            if n == 0 {
                return Err(ConfigError::invalid("DB_MAX_CONNECTIONS", value, "must be at least 1"));
            }
            config = config.with_db_max_connections(n);
        }
        if let Some(value) = lookup("SESSION_TIMEOUT_SECS") {
            let secs: u64 = value
                .parse()
                .map_err(|e| ConfigError::invalid("SESSION_TIMEOUT_SECS", &value, e))?;
            if secs == 0 {
                return Err(ConfigError::invalid("SESSION_TIMEOUT_SECS", value, "must be positive"));
            }
            config = config.with_session_timeout(Duration::from_secs(secs));
        }
        if let Some(value) = lookup("SESSION_COOKIE_NAME") {
            let valid = !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if !valid {
                return Err(ConfigError::invalid(
                    "SESSION_COOKIE_NAME",
                    value,
                    "use letters, digits, '_' or '-'",
                ));
            }
            config = config.with_session_cookie_name(value);
        }
        if let Some(value) = lookup("APP_ENV") {
            let env = value
                .parse()
                .map_err(|e: String| ConfigError::invalid("APP_ENV", &value, e))?;
            config = config.with_environment(env);
        }
        if let Some(value) = lookup("LOG_FORMAT") {
            let format = value
                .parse()
                .map_err(|e: String| ConfigError::invalid("LOG_FORMAT", &value, e))?;
            config = config.with_log_format(format);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    #[must_use]
    pub fn with_db_max_connections(mut self, n: u32) -> Self {
        self.db_max_connections = n;
        self
    }

    #[must_use]
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Whether cookies must carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database_url).max_connections(self.db_max_connections)
    }
}
