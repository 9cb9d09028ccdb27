//! Database operations for local <-> QuickBooks id mappings
//!
//! Every entity type has its own `<entity>_mappings` table with the same
//! columns, so each query is formatted with the table name from
//! [`EntityType::mapping_table`]. Table names never come from user input.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::shared::accounting::{EntityMapping, EntityType, MappingStatus};

const COLUMNS: &str =
    "id, local_id, remote_id, remote_name, sync_status, last_synced_at, created_at";

fn from_row(entity_type: EntityType, row: SqliteRow) -> EntityMapping {
    EntityMapping {
        id: row.get("id"),
        entity_type,
        local_id: row.get("local_id"),
        remote_id: row.get("remote_id"),
        remote_name: row.get("remote_name"),
        sync_status: MappingStatus::from_str(row.get::<String, _>("sync_status").as_str())
            .unwrap_or_default(),
        last_synced_at: row.get("last_synced_at"),
        created_at: row.get("created_at"),
    }
}

/// Find the mapping of a local record
pub async fn find_by_local<'e, E>(
    executor: E,
    entity_type: EntityType,
    local_id: Uuid,
) -> Result<Option<EntityMapping>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM {} WHERE local_id = ?",
        COLUMNS,
        entity_type.mapping_table()
    );
    let row = sqlx::query(&sql).bind(local_id).fetch_optional(executor).await?;
    Ok(row.map(|r| from_row(entity_type, r)))
}

/// Find the mapping of a remote record
///
/// If several local rows point at the same remote id, the oldest link wins.
pub async fn find_by_remote<'e, E>(
    executor: E,
    entity_type: EntityType,
    remote_id: &str,
) -> Result<Option<EntityMapping>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM {} WHERE remote_id = ? ORDER BY created_at ASC LIMIT 1",
        COLUMNS,
        entity_type.mapping_table()
    );
    let row = sqlx::query(&sql).bind(remote_id).fetch_optional(executor).await?;
    Ok(row.map(|r| from_row(entity_type, r)))
}

/// Create or refresh the mapping of a local record
///
/// The row is keyed by `local_id`; an existing row gets the new remote id and
/// name, `sync_status = synced` and `last_synced_at = synced_at`.
pub async fn upsert_mapping<'e, E>(
    executor: E,
    entity_type: EntityType,
    local_id: Uuid,
    remote_id: &str,
    remote_name: Option<&str>,
    synced_at: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"
        INSERT INTO {} (id, local_id, remote_id, remote_name, sync_status, last_synced_at, created_at)
        VALUES (?, ?, ?, ?, 'synced', ?, ?)
        ON CONFLICT (local_id) DO UPDATE SET
            remote_id = excluded.remote_id,
            remote_name = COALESCE(excluded.remote_name, remote_name),
            sync_status = 'synced',
            last_synced_at = excluded.last_synced_at
        "#,
        entity_type.mapping_table()
    );

    sqlx::query(&sql)
        .bind(Uuid::new_v4())
        .bind(local_id)
        .bind(remote_id)
        .bind(remote_name)
        .bind(synced_at)
        .bind(Utc::now())
        .execute(executor)
        .await?;

    Ok(())
}

/// Mark a mapping as synced at `synced_at`
pub async fn touch_mapping<'e, E>(
    executor: E,
    entity_type: EntityType,
    mapping_id: Uuid,
    synced_at: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "UPDATE {} SET sync_status = 'synced', last_synced_at = ? WHERE id = ?",
        entity_type.mapping_table()
    );
    sqlx::query(&sql)
        .bind(synced_at)
        .bind(mapping_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Set the status of every mapping pointing at a remote record
///
/// Returns the number of mappings changed.
pub async fn set_status_by_remote(
    pool: &SqlitePool,
    entity_type: EntityType,
    remote_id: &str,
    status: MappingStatus,
) -> Result<u64, sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET sync_status = ? WHERE remote_id = ?",
        entity_type.mapping_table()
    );
    let result = sqlx::query(&sql)
        .bind(status.as_str())
        .bind(remote_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Number of mappings of an entity type
pub async fn count_mappings(pool: &SqlitePool, entity_type: EntityType) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) AS n FROM {}", entity_type.mapping_table());
    let row = sqlx::query(&sql).fetch_one(pool).await?;
    Ok(row.get("n"))
}
