/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct is the central state container, holding:
 * - the validated `Settings`
 * - the `SyncContext` every sync handler runs against (database pool,
 *   QuickBooks client, token manager, file store)
 * - the webhook dispatch table
 *
 * Nothing in it is mutated after startup; per-request state lives in the
 * database.
 *
 * # State Extraction
 *
 * The `FromRef` implementations let handlers extract only what they use:
 *
 * ```rust,ignore
 * use axum::extract::State;
 * use fieldops_sync::backend::sync::SyncContext;
 *
 * async fn handler(State(ctx): State<SyncContext>) {
 *     let status = ctx.tokens.status().await;
 * }
 * ```
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::backend::error::BackendError;
use crate::backend::storage::FileStore;
use crate::backend::sync::{SyncContext, WebhookDispatcher};
use crate::shared::Settings;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub sync: SyncContext,
    /// Webhook change handlers keyed by QuickBooks entity name
    pub webhooks: Arc<WebhookDispatcher>,
}

impl AppState {
    /// Assemble state with the default webhook handlers
    pub fn new(settings: Settings, pool: SqlitePool, store: Arc<dyn FileStore>) -> Result<Self, BackendError> {
        Self::with_dispatcher(settings, pool, store, WebhookDispatcher::default())
    }

    pub fn with_dispatcher(
        settings: Settings,
        pool: SqlitePool,
        store: Arc<dyn FileStore>,
        webhooks: WebhookDispatcher,
    ) -> Result<Self, BackendError> {
        let sync = SyncContext::new(pool, settings.quickbooks.clone(), store)?;
        Ok(Self {
            settings: Arc::new(settings),
            sync,
            webhooks: Arc::new(webhooks),
        })
    }
}

impl FromRef<AppState> for SyncContext {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sync.clone()
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sync.pool.clone()
    }
}

impl FromRef<AppState> for Arc<WebhookDispatcher> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.webhooks.clone()
    }
}
