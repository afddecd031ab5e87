//! Custom error types specific to the `store` crate.
//!
//! Every store implementation reports failures through [`StoreError`], so the
//! backend can tell a uniqueness conflict apart from an unavailable database.

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint (username or email) was violated.
    #[error("username or email already exists")]
    Conflict,

    /// A value could not be parsed into its domain type.
    #[error("invalid {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    /// A running total left the representable range.
    #[error("{0} total overflowed")]
    Overflow(&'static str),

    /// The underlying database failed or is unreachable.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub(crate) fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }

    /// Map an insert failure, turning unique-constraint violations into [`StoreError::Conflict`].
    pub(crate) fn from_insert(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => Self::Conflict,
            other => Self::Database(other),
        }
    }
}
