//! Database operations for the append-only sync log

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::shared::accounting::{SyncLogEntry, SyncRunStatus};

/// Append one row to `quickbooks_sync_log`
pub async fn append_sync_log(
    pool: &SqlitePool,
    entity_type: &str,
    entity_id: Option<Uuid>,
    action: &str,
    status: SyncRunStatus,
    error_message: Option<&str>,
    details: Option<&serde_json::Value>,
) -> Result<SyncLogEntry, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let details_text = details.map(|d| d.to_string());

    sqlx::query(
        r#"
        INSERT INTO quickbooks_sync_log (id, entity_type, entity_id, action, status, error_message, details, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(entity_type)
    .bind(entity_id)
    .bind(action)
    .bind(status.as_str())
    .bind(error_message)
    .bind(details_text)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(SyncLogEntry {
        id,
        entity_type: entity_type.to_string(),
        entity_id,
        action: action.to_string(),
        status,
        error_message: error_message.map(|s| s.to_string()),
        details: details.cloned(),
        created_at: now,
    })
}

/// Newest log rows first
pub async fn recent_sync_log(pool: &SqlitePool, limit: i64) -> Result<Vec<SyncLogEntry>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, entity_type, entity_id, action, status, error_message, details, created_at
        FROM quickbooks_sync_log
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| SyncLogEntry {
            id: r.get("id"),
            entity_type: r.get("entity_type"),
            entity_id: r.get("entity_id"),
            action: r.get("action"),
            status: SyncRunStatus::from_str(r.get::<String, _>("status").as_str())
                .unwrap_or(SyncRunStatus::Failed),
            error_message: r.get("error_message"),
            details: r
                .get::<Option<String>, _>("details")
                .and_then(|d| serde_json::from_str(&d).ok()),
            created_at: r.get("created_at"),
        })
        .collect())
}
