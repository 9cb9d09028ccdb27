//! QuickBooks synchronization
//!
//! Everything the sync endpoints do runs against a [`SyncContext`]: the
//! database pool, the QuickBooks client, the token manager and the file
//! store, all cheap to clone into each request.

pub mod attachments;
pub mod exporter;
pub mod handlers;
pub mod importer;
pub mod numbering;
pub mod token;
pub mod webhook;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::backend::error::BackendError;
use crate::backend::quickbooks::QuickBooksClient;
use crate::backend::storage::FileStore;
use crate::shared::config::QuickBooksSettings;

pub use token::TokenManager;
pub use webhook::WebhookDispatcher;

#[derive(Clone)]
pub struct SyncContext {
    pub pool: SqlitePool,
    pub client: QuickBooksClient,
    pub tokens: TokenManager,
    pub store: Arc<dyn FileStore>,
    pub settings: Arc<QuickBooksSettings>,
}

impl SyncContext {
    /// Build a context sharing one HTTP client between API and token calls
    pub fn new(
        pool: SqlitePool,
        settings: QuickBooksSettings,
        store: Arc<dyn FileStore>,
    ) -> Result<Self, BackendError> {
        let client = QuickBooksClient::new(&settings)?;
        let settings = Arc::new(settings);
        let tokens = TokenManager::new(pool.clone(), client.http().clone(), settings.clone());

        Ok(Self {
            pool,
            client,
            tokens,
            store,
            settings,
        })
    }
}
