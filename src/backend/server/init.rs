/**
 * Server Initialization
 *
 * This module handles the setup of the Axum HTTP server: opening the
 * database, preparing the attachment store, building `AppState` and
 * configuring the router.
 *
 * # Initialization Process
 *
 * 1. Open the database and run migrations
 * 2. Create the local attachment store under `Settings::attachment_dir`
 * 3. Build the sync context (HTTP client, token manager)
 * 4. Create and configure the router
 */

use std::sync::Arc;

use axum::Router;

use crate::backend::error::BackendError;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_database;
use crate::backend::server::state::AppState;
use crate::backend::storage::LocalFileStore;
use crate::shared::Settings;

/// Create and configure the Axum application
///
/// # Errors
///
/// Fails when the database cannot be opened or migrated, or the attachment
/// directory cannot be created.
pub async fn create_app(settings: Settings) -> Result<Router<()>, BackendError> {
    tracing::info!("Initializing fieldops-sync server");

    let pool = load_database(&settings).await?;

    tokio::fs::create_dir_all(&settings.attachment_dir).await?;
    let store = Arc::new(LocalFileStore::new(settings.attachment_dir.clone()));
    tracing::info!("Attachment store at {}", settings.attachment_dir.display());

    if settings.quickbooks.webhook_verifier_token.is_none() {
        tracing::warn!("QUICKBOOKS_WEBHOOK_VERIFIER_TOKEN not set, webhook deliveries will be rejected");
    }
    tracing::info!(
        environment = ?settings.quickbooks.environment,
        api_base = %settings.quickbooks.api_base,
        "QuickBooks client configured"
    );

    let app_state = AppState::new(settings, pool, store)?;
    let app = create_router(app_state);

    tracing::info!("Router configured");
    Ok(app)
}
