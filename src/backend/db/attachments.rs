//! Database operations for vendor bill attachments

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::shared::accounting::BillAttachment;

/// Whether the bill already has an attachment with this file name
pub async fn attachment_exists(
    pool: &SqlitePool,
    bill_id: Uuid,
    file_name: &str,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        "SELECT 1 AS found FROM vendor_bill_attachments WHERE bill_id = ? AND file_name = ? LIMIT 1",
    )
    .bind(bill_id)
    .bind(file_name)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

pub async fn insert_attachment(pool: &SqlitePool, attachment: &BillAttachment) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO vendor_bill_attachments (id, bill_id, file_name, file_path, file_size,
                                             content_type, remote_attachable_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(attachment.id)
    .bind(attachment.bill_id)
    .bind(&attachment.file_name)
    .bind(&attachment.file_path)
    .bind(attachment.file_size)
    .bind(&attachment.content_type)
    .bind(&attachment.remote_attachable_id)
    .bind(attachment.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_attachments(pool: &SqlitePool, bill_id: Uuid) -> Result<Vec<BillAttachment>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, bill_id, file_name, file_path, file_size, content_type, remote_attachable_id, created_at
        FROM vendor_bill_attachments
        WHERE bill_id = ?
        ORDER BY created_at ASC
        "#,
    )
    .bind(bill_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| BillAttachment {
            id: r.get("id"),
            bill_id: r.get("bill_id"),
            file_name: r.get("file_name"),
            file_path: r.get("file_path"),
            file_size: r.get("file_size"),
            content_type: r.get("content_type"),
            remote_attachable_id: r.get("remote_attachable_id"),
            created_at: r.get("created_at"),
        })
        .collect())
}
