/**
 * Token Manager
 *
 * Hands out a usable QuickBooks access token. The stored token is refreshed
 * when it expires within [`REFRESH_WINDOW_SECS`]; every refresh persists the
 * rotated refresh token.
 *
 * The manager also owns the connection lifecycle: connecting with an
 * authorization code, disconnecting and reporting status.
 *
 * Two requests refreshing at the same moment both hit the token endpoint;
 * the later write wins.
 */

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::backend::db::sync_config::{self, SyncConfig};
use crate::backend::error::BackendError;
use crate::backend::quickbooks::{oauth, Connection};
use crate::shared::accounting::ConnectionStatus;
use crate::shared::config::QuickBooksSettings;

/// Tokens expiring within this many seconds are refreshed before use
pub const REFRESH_WINDOW_SECS: i64 = 5 * 60;

#[derive(Clone)]
pub struct TokenManager {
    pool: SqlitePool,
    http: reqwest::Client,
    settings: Arc<QuickBooksSettings>,
}

impl TokenManager {
    pub fn new(pool: SqlitePool, http: reqwest::Client, settings: Arc<QuickBooksSettings>) -> Self {
        Self { pool, http, settings }
    }

    async fn active_config(&self) -> Result<SyncConfig, BackendError> {
        match sync_config::load_sync_config(&self.pool).await? {
            Some(config) if config.is_connected => Ok(config),
            _ => Err(BackendError::NotConnected),
        }
    }

    /// Return a token valid for at least the refresh window
    ///
    /// # Errors
    ///
    /// - `NotConnected` when no active connection is stored
    /// - `TokenRefreshFailed` when the token endpoint rejects the refresh
    pub async fn get_valid_token(&self) -> Result<Connection, BackendError> {
        let config = self.active_config().await?;

        let refresh_at = config.token_expires_at - Duration::seconds(REFRESH_WINDOW_SECS);
        if Utc::now() < refresh_at {
            return Ok(Connection {
                access_token: config.access_token,
                realm_id: config.realm_id,
            });
        }

        tracing::info!(realm_id = %config.realm_id, "Access token expires at {}, refreshing", config.token_expires_at);

        let grant = oauth::refresh_access_token(&self.http, &self.settings, &config.refresh_token).await?;
        let expires_at = Utc::now() + Duration::seconds(grant.expires_in);

        sync_config::update_tokens(&self.pool, &grant.access_token, &grant.refresh_token, expires_at).await?;
        tracing::info!(realm_id = %config.realm_id, "Access token refreshed, valid until {}", expires_at);

        Ok(Connection {
            access_token: grant.access_token,
            realm_id: config.realm_id,
        })
    }

    /// Exchange an authorization code and store the new connection
    pub async fn connect(&self, code: &str, realm_id: &str) -> Result<ConnectionStatus, BackendError> {
        if code.trim().is_empty() || realm_id.trim().is_empty() {
            return Err(BackendError::invalid("code and realmId are required"));
        }

        let grant = oauth::exchange_authorization_code(&self.http, &self.settings, code).await?;
        let expires_at = Utc::now() + Duration::seconds(grant.expires_in);

        sync_config::save_connection(
            &self.pool,
            realm_id,
            &grant.access_token,
            &grant.refresh_token,
            expires_at,
        )
        .await?;

        tracing::info!(realm_id = %realm_id, "QuickBooks company connected");
        Ok(ConnectionStatus {
            connected: true,
            realm_id: Some(realm_id.to_string()),
            token_expires_at: Some(expires_at),
        })
    }

    /// Drop the stored tokens; returns whether a connection existed
    pub async fn disconnect(&self) -> Result<bool, BackendError> {
        let existed = sync_config::mark_disconnected(&self.pool).await?;
        if existed {
            tracing::info!("QuickBooks company disconnected");
        }
        Ok(existed)
    }

    pub async fn status(&self) -> Result<ConnectionStatus, BackendError> {
        let status = match sync_config::load_sync_config(&self.pool).await? {
            Some(config) if config.is_connected => ConnectionStatus {
                connected: true,
                realm_id: Some(config.realm_id),
                token_expires_at: Some(config.token_expires_at),
            },
            _ => ConnectionStatus {
                connected: false,
                realm_id: None,
                token_expires_at: None,
            },
        };
        Ok(status)
    }
}
