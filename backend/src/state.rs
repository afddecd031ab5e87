//! Shared application state handed to every handler.

use std::sync::Arc;

use finsight_store::{CredentialStore, TransactionStore};

use crate::auth::{Authenticator, Clock, MemorySessionStore, SessionManager};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub authenticator: Authenticator,
    pub credentials: Arc<dyn CredentialStore>,
    pub transactions: Arc<dyn TransactionStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wire stores, a fresh in-process session registry and `clock` together.
    pub fn new(
        config: AppConfig,
        credentials: Arc<dyn CredentialStore>,
        transactions: Arc<dyn TransactionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sessions = SessionManager::new(
            Arc::new(MemorySessionStore::new()),
            config.session_timeout,
            clock.clone(),
        );
        Self {
            authenticator: Authenticator::new(credentials.clone(), sessions),
            config: Arc::new(config),
            credentials,
            transactions,
            clock,
        }
    }
}
