//! Module for database connection setup and common utilities.
//!
//! This module opens the SQLite store at start-up, creates the schema, and
//! provides the single handle the rest of the application shares.

use finsight_store::{SqliteStore, StoreError};

use crate::config::AppConfig;

/// Connect to the configured database and make sure the schema exists.
pub async fn open(config: &AppConfig) -> Result<SqliteStore, StoreError> {
    let store = SqliteStore::connect(&config.database()).await?;
    store.migrate().await?;
    tracing::info!(max_connections = config.db_max_connections, "Database ready");
    Ok(store)
}
