//! Database operations for the singleton QuickBooks connection row

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

/// The stored connection (`sync_config`, always `id = 1`)
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub realm_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_expires_at: DateTime<Utc>,
    pub is_connected: bool,
    pub connected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Load the connection row, if one was ever created
pub async fn load_sync_config(pool: &SqlitePool) -> Result<Option<SyncConfig>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT realm_id, access_token, refresh_token, token_expires_at,
               is_connected, connected_at, updated_at
        FROM sync_config
        WHERE id = 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| SyncConfig {
        realm_id: r.get("realm_id"),
        access_token: r.get("access_token"),
        refresh_token: r.get("refresh_token"),
        token_expires_at: r.get("token_expires_at"),
        is_connected: r.get("is_connected"),
        connected_at: r.get("connected_at"),
        updated_at: r.get("updated_at"),
    }))
}

/// Create or replace the connection after an OAuth connect
pub async fn save_connection(
    pool: &SqlitePool,
    realm_id: &str,
    access_token: &str,
    refresh_token: &str,
    token_expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO sync_config (id, realm_id, access_token, refresh_token, token_expires_at,
                                 is_connected, connected_at, updated_at)
        VALUES (1, ?, ?, ?, ?, 1, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            realm_id = excluded.realm_id,
            access_token = excluded.access_token,
            refresh_token = excluded.refresh_token,
            token_expires_at = excluded.token_expires_at,
            is_connected = 1,
            connected_at = excluded.connected_at,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(realm_id)
    .bind(access_token)
    .bind(refresh_token)
    .bind(token_expires_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Store a refreshed token pair
pub async fn update_tokens(
    pool: &SqlitePool,
    access_token: &str,
    refresh_token: &str,
    token_expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE sync_config
        SET access_token = ?, refresh_token = ?, token_expires_at = ?, updated_at = ?
        WHERE id = 1
        "#,
    )
    .bind(access_token)
    .bind(refresh_token)
    .bind(token_expires_at)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark the connection inactive and drop its tokens
///
/// Returns whether a connection row existed.
pub async fn mark_disconnected(pool: &SqlitePool) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE sync_config
        SET is_connected = 0, access_token = '', refresh_token = '', updated_at = ?
        WHERE id = 1
        "#,
    )
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
