//! SQLite store implementation.
//!
//! This file contains the concrete implementation of both store traits on top
//! of an sqlx connection pool, including connection configuration, schema
//! creation and row conversion.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::errors::StoreError;
use crate::models::{
    Amount, CategoryTotal, DateRange, NewUser, Transaction, TransactionDraft, TransactionFilter,
    TransactionId, TransactionKind, TransactionStats, User, UserId,
};
use crate::queries;
use crate::{CredentialStore, TransactionStore};

/// Connection settings for [`SqliteStore`].
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// sqlx SQLite URL, e.g. `sqlite:finsight.db?mode=rwc` or `sqlite::memory:`.
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:finsight.db?mode=rwc".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            max_lifetime: Duration::from_secs(1800),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl DatabaseConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn min_connections(mut self, n: u32) -> Self {
        self.min_connections = n;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}

/// SQLite-backed credential and transaction store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the connection pool. Does not create tables; see [`SqliteStore::migrate`].
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout);

        // An in-memory database lives exactly as long as its connection.
        pool_options = if config.is_in_memory() {
            pool_options.idle_timeout(None).max_lifetime(None)
        } else {
            pool_options
                .idle_timeout(config.idle_timeout)
                .max_lifetime(config.max_lifetime)
        };

        let pool = pool_options.connect_with(options).await?;
        tracing::debug!(max_connections = config.max_connections, "SQLite pool opened");
        Ok(Self { pool })
    }

    /// Create tables and indexes if they do not exist.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for statement in [
            queries::CREATE_USERS,
            queries::CREATE_TRANSACTIONS,
            queries::CREATE_TRANSACTIONS_INDEX,
        ] {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Close every pooled connection. Pending operations finish first.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("SQLite pool closed");
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("size", &self.pool.size())
            .field("closed", &self.pool.is_closed())
            .finish()
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    full_name: String,
    password_hash: String,
    role: String,
    is_active: bool,
    last_login: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            password_hash: row.password_hash,
            role: row.role.parse()?,
            is_active: row.is_active,
            last_login: row.last_login,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    user_id: i64,
    amount: i64,
    #[sqlx(rename = "type")]
    kind: String,
    category: String,
    description: String,
    transaction_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            id: row.id,
            user_id: row.user_id,
            amount: Amount::from_minor(row.amount),
            kind: row.kind.parse()?,
            category: row.category,
            description: row.description,
            transaction_date: row.transaction_date,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn find_active_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(queries::FIND_ACTIVE_USER_BY_USERNAME)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn is_user_active(&self, user_id: UserId) -> Result<bool, StoreError> {
        let active = sqlx::query_scalar::<_, bool>(queries::IS_USER_ACTIVE)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(active.unwrap_or(false))
    }

    async fn update_last_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query(queries::UPDATE_LAST_LOGIN)
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserId, StoreError> {
        let result = sqlx::query(queries::INSERT_USER)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.email)
            .bind(user.role.as_str())
            .bind(&user.full_name)
            .bind(user.is_active)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_insert)?;
        Ok(result.last_insert_rowid())
    }

    async fn username_or_email_exists(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, StoreError> {
        let hit = sqlx::query_scalar::<_, i64>(queries::USERNAME_OR_EMAIL_EXISTS)
            .bind(username)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(hit.is_some())
    }

    async fn set_user_active(&self, username: &str, active: bool) -> Result<bool, StoreError> {
        let result = sqlx::query(queries::SET_USER_ACTIVE)
            .bind(active)
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn list_transactions(
        &self,
        user_id: UserId,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, StoreError> {
        let DateRange { from, to } = filter.range;
        let limit = filter.limit.map_or(-1, i64::from);
        sqlx::query_as::<_, TransactionRow>(queries::LIST_TRANSACTIONS)
            .bind(user_id)
            .bind(from)
            .bind(from)
            .bind(to)
            .bind(to)
            .bind(limit)
            .bind(i64::from(filter.offset))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    async fn get_transaction(
        &self,
        id: TransactionId,
        user_id: UserId,
    ) -> Result<Option<Transaction>, StoreError> {
        sqlx::query_as::<_, TransactionRow>(queries::GET_TRANSACTION)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Transaction::try_from)
            .transpose()
    }

    async fn insert_transaction(
        &self,
        user_id: UserId,
        draft: &TransactionDraft,
        created_at: DateTime<Utc>,
    ) -> Result<TransactionId, StoreError> {
        let result = sqlx::query(queries::INSERT_TRANSACTION)
            .bind(user_id)
            .bind(draft.amount.minor())
            .bind(draft.kind.as_str())
            .bind(&draft.category)
            .bind(&draft.description)
            .bind(draft.transaction_date)
            .bind(created_at)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn update_transaction(
        &self,
        id: TransactionId,
        user_id: UserId,
        draft: &TransactionDraft,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(queries::UPDATE_TRANSACTION)
            .bind(draft.amount.minor())
            .bind(draft.kind.as_str())
            .bind(&draft.category)
            .bind(&draft.description)
            .bind(draft.transaction_date)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_transaction(
        &self,
        id: TransactionId,
        user_id: UserId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(queries::DELETE_TRANSACTION)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn transaction_stats(
        &self,
        user_id: UserId,
        range: DateRange,
    ) -> Result<TransactionStats, StoreError> {
        let (income, expense) = sqlx::query_as::<_, (i64, i64)>(queries::TRANSACTION_STATS)
            .bind(user_id)
            .bind(range.from)
            .bind(range.from)
            .bind(range.to)
            .bind(range.to)
            .fetch_one(&self.pool)
            .await?;
        Ok(TransactionStats::new(
            Amount::from_minor(income),
            Amount::from_minor(expense),
        ))
    }

    async fn category_totals(
        &self,
        user_id: UserId,
        kind: TransactionKind,
        range: DateRange,
    ) -> Result<Vec<CategoryTotal>, StoreError> {
        let rows = sqlx::query_as::<_, (String, i64)>(queries::CATEGORY_TOTALS)
            .bind(user_id)
            .bind(kind.as_str())
            .bind(range.from)
            .bind(range.from)
            .bind(range.to)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(category, total)| CategoryTotal {
                category,
                total: Amount::from_minor(total),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    async fn setup_test_db() -> SqliteStore {
        let config = DatabaseConfig::new("sqlite::memory:").max_connections(1);
        let store = SqliteStore::connect(&config).await.expect("Failed to connect");
        store.migrate().await.expect("Failed to create schema");
        store
    }

    fn new_user(username: &str, email: &str, role: Role) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            full_name: format!("{username} Example"),
            password_hash: "$argon2id$placeholder".to_string(),
            role,
            is_active: true,
        }
    }

    fn draft(amount: &str, kind: TransactionKind, category: &str, date: &str) -> TransactionDraft {
        TransactionDraft {
            amount: amount.parse().unwrap(),
            kind,
            category: category.to_string(),
            description: format!("{category} entry"),
            transaction_date: date.parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let store = setup_test_db().await;
        store.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let store = setup_test_db().await;
        let id = store
            .insert_user(new_user("dewi", "dewi@example.com", Role::Staff))
            .await
            .unwrap();

        let user = store.find_active_user_by_username("dewi").await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::Staff);
        assert!(user.is_active);
        assert!(user.last_login.is_none());
    }

    #[tokio::test]
    async fn test_unique_violation_maps_to_conflict() {
        let store = setup_test_db().await;
        store
            .insert_user(new_user("eko", "eko@example.com", Role::Student))
            .await
            .unwrap();

        let err = store
            .insert_user(new_user("eko", "eko2@example.com", Role::Student))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict), "got {err:?}");

        let err = store
            .insert_user(new_user("eko2", "eko@example.com", Role::Student))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict), "got {err:?}");
    }

    #[tokio::test]
    async fn test_username_or_email_exists() {
        let store = setup_test_db().await;
        store
            .insert_user(new_user("fajar", "fajar@example.com", Role::Student))
            .await
            .unwrap();

        assert!(store.username_or_email_exists("fajar", "x@example.com").await.unwrap());
        assert!(store.username_or_email_exists("x", "fajar@example.com").await.unwrap());
        assert!(!store.username_or_email_exists("x", "x@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_disabled_user_is_not_found() {
        let store = setup_test_db().await;
        let id = store
            .insert_user(new_user("gita", "gita@example.com", Role::Student))
            .await
            .unwrap();
        assert!(store.is_user_active(id).await.unwrap());

        assert!(store.set_user_active("gita", false).await.unwrap());
        assert!(store.find_active_user_by_username("gita").await.unwrap().is_none());
        assert!(!store.is_user_active(id).await.unwrap());
        assert!(!store.is_user_active(9999).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_last_login() {
        let store = setup_test_db().await;
        let id = store
            .insert_user(new_user("hadi", "hadi@example.com", Role::Admin))
            .await
            .unwrap();
        let at = Utc::now();
        store.update_last_login(id, at).await.unwrap();

        let user = store.find_active_user_by_username("hadi").await.unwrap().unwrap();
        assert_eq!(user.last_login.map(|t| t.timestamp()), Some(at.timestamp()));
    }

    #[tokio::test]
    async fn test_transaction_crud_is_owner_scoped() {
        let store = setup_test_db().await;
        let owner = store
            .insert_user(new_user("ina", "ina@example.com", Role::Student))
            .await
            .unwrap();
        let other = store
            .insert_user(new_user("joko", "joko@example.com", Role::Student))
            .await
            .unwrap();

        let id = store
            .insert_transaction(
                owner,
                &draft("350000", TransactionKind::Expense, "Food", "2023-10-19"),
                Utc::now(),
            )
            .await
            .unwrap();

        let fetched = store.get_transaction(id, owner).await.unwrap().unwrap();
        assert_eq!(fetched.amount.to_string(), "350000.00");
        assert_eq!(fetched.kind, TransactionKind::Expense);
        assert!(store.get_transaction(id, other).await.unwrap().is_none());

        let edited = draft("80000", TransactionKind::Expense, "Transport", "2023-10-18");
        assert!(!store.update_transaction(id, other, &edited).await.unwrap());
        assert!(store.update_transaction(id, owner, &edited).await.unwrap());
        let fetched = store.get_transaction(id, owner).await.unwrap().unwrap();
        assert_eq!(fetched.category, "Transport");

        assert!(!store.delete_transaction(id, other).await.unwrap());
        assert!(store.delete_transaction(id, owner).await.unwrap());
        assert!(store.get_transaction(id, owner).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listing_filters_and_orders() {
        let store = setup_test_db().await;
        let owner = store
            .insert_user(new_user("kiki", "kiki@example.com", Role::Student))
            .await
            .unwrap();
        for date in ["2023-10-18", "2023-10-20", "2023-10-19", "2023-11-01"] {
            store
                .insert_transaction(
                    owner,
                    &draft("1", TransactionKind::Income, "Misc", date),
                    Utc::now(),
                )
                .await
                .unwrap();
        }

        let october = DateRange::month(2023, 10).unwrap();
        let rows = store
            .list_transactions(
                owner,
                TransactionFilter {
                    range: october,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let dates: Vec<String> = rows.iter().map(|t| t.transaction_date.to_string()).collect();
        assert_eq!(dates, vec!["2023-10-20", "2023-10-19", "2023-10-18"]);

        let page = store
            .list_transactions(
                owner,
                TransactionFilter {
                    limit: Some(1),
                    offset: 1,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].transaction_date.to_string(), "2023-10-20");
    }

    #[tokio::test]
    async fn test_stats_and_category_totals() {
        let store = setup_test_db().await;
        let owner = store
            .insert_user(new_user("lina", "lina@example.com", Role::Student))
            .await
            .unwrap();
        for d in [
            draft("5000000", TransactionKind::Income, "Salary", "2023-10-20"),
            draft("350000", TransactionKind::Expense, "Food", "2023-10-19"),
            draft("80000", TransactionKind::Expense, "Transport", "2023-10-18"),
            draft("50000", TransactionKind::Expense, "Food", "2023-09-30"),
        ] {
            store.insert_transaction(owner, &d, Utc::now()).await.unwrap();
        }

        let october = DateRange::month(2023, 10).unwrap();
        let stats = store.transaction_stats(owner, october).await.unwrap();
        assert_eq!(stats.total_income.to_string(), "5000000.00");
        assert_eq!(stats.total_expense.to_string(), "430000.00");
        assert_eq!(stats.balance.to_string(), "4570000.00");

        let empty = store
            .transaction_stats(owner, DateRange::month(2020, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(empty, TransactionStats::default());

        let totals = store
            .category_totals(owner, TransactionKind::Expense, DateRange::all())
            .await
            .unwrap();
        let summary: Vec<(String, String)> = totals
            .into_iter()
            .map(|c| (c.category, c.total.to_string()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Food".to_string(), "400000.00".to_string()),
                ("Transport".to_string(), "80000.00".to_string()),
            ]
        );
    }
}
