//! Core `store` crate for abstracting FINSIGHT persistence.
//!
//! This crate defines the [`CredentialStore`] and [`TransactionStore`] traits,
//! which outline everything the backend needs from persistence, and provides
//! concrete implementations: [`SqliteStore`] for deployments and
//! [`MemoryStore`] for tests and embedding.
//!
//! # Example
//!
//! ```ignore
//! use finsight_store::{DatabaseConfig, SqliteStore};
//!
//! let store = SqliteStore::connect(&DatabaseConfig::new("sqlite::memory:").max_connections(1)).await?;
//! store.migrate().await?;
//! ```

mod errors;
mod memory;
mod models;
mod queries;
mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use errors::StoreError;
pub use memory::MemoryStore;
pub use models::{
    Amount, CategoryTotal, DateRange, NewUser, Role, Transaction, TransactionDraft,
    TransactionFilter, TransactionId, TransactionKind, TransactionStats, User, UserId,
};
pub use sqlite::{DatabaseConfig, SqliteStore};

/// Persisted user records.
///
/// Each method is a single atomic operation. Implementations must enforce
/// uniqueness of usernames and emails and report violations as
/// [`StoreError::Conflict`].
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by username, ignoring inactive accounts.
    async fn find_active_user_by_username(&self, username: &str)
        -> Result<Option<User>, StoreError>;

    /// Whether the user exists and is active.
    async fn is_user_active(&self, user_id: UserId) -> Result<bool, StoreError>;

    async fn update_last_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Insert a user and return its id.
    async fn insert_user(&self, user: NewUser) -> Result<UserId, StoreError>;

    async fn username_or_email_exists(&self, username: &str, email: &str)
        -> Result<bool, StoreError>;

    /// Enable or disable login for a user. Returns `false` if no such username exists.
    async fn set_user_active(&self, username: &str, active: bool) -> Result<bool, StoreError>;
}

/// Per-user income and expense records.
///
/// Every operation is scoped by `user_id`; a transaction owned by another user
/// behaves exactly like a missing one.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Transactions ordered newest first (date, then creation time).
    async fn list_transactions(
        &self,
        user_id: UserId,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, StoreError>;

    async fn get_transaction(
        &self,
        id: TransactionId,
        user_id: UserId,
    ) -> Result<Option<Transaction>, StoreError>;

    async fn insert_transaction(
        &self,
        user_id: UserId,
        draft: &TransactionDraft,
        created_at: DateTime<Utc>,
    ) -> Result<TransactionId, StoreError>;

    /// Returns `false` if nothing matched.
    async fn update_transaction(
        &self,
        id: TransactionId,
        user_id: UserId,
        draft: &TransactionDraft,
    ) -> Result<bool, StoreError>;

    /// Returns `false` if nothing matched.
    async fn delete_transaction(&self, id: TransactionId, user_id: UserId)
        -> Result<bool, StoreError>;

    async fn transaction_stats(
        &self,
        user_id: UserId,
        range: DateRange,
    ) -> Result<TransactionStats, StoreError>;

    /// Totals per category for one kind, largest first.
    async fn category_totals(
        &self,
        user_id: UserId,
        kind: TransactionKind,
        range: DateRange,
    ) -> Result<Vec<CategoryTotal>, StoreError>;
}
