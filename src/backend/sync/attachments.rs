//! Attachment Puller
//!
//! Copies the files attached to a bill in QuickBooks into the file store.
//! A bill attachment whose file name is already stored locally is skipped,
//! so pulling twice never duplicates rows.

use chrono::Utc;
use uuid::Uuid;

use super::SyncContext;
use crate::backend::db::attachments::{attachment_exists, insert_attachment};
use crate::backend::db::mappings::find_by_local;
use crate::backend::db::purchasing::get_vendor_bill;
use crate::backend::db::sync_log::append_sync_log;
use crate::backend::error::BackendError;
use crate::backend::quickbooks::types::QbAttachable;
use crate::backend::quickbooks::Connection;
use crate::backend::storage::sanitize_file_name;
use crate::shared::accounting::{AttachmentPullSummary, BillAttachment, EntityType, SyncRunStatus};

/// Storage path of an attachment: `vendor-bills/<bill_id>/<uuid>-<name>`
pub fn storage_path(bill_id: Uuid, file_name: &str) -> String {
    format!("vendor-bills/{}/{}-{}", bill_id, Uuid::new_v4(), sanitize_file_name(file_name))
}

/// Download every attachment linked to the bill's QuickBooks counterpart
///
/// # Errors
///
/// - `NotFound` when the bill does not exist locally
/// - `UnmappedReference` when the bill was never pushed
/// - token and query errors abort the pull; per-file failures are tallied
pub async fn pull_bill_attachments(ctx: &SyncContext, bill_id: Uuid) -> Result<AttachmentPullSummary, BackendError> {
    let bill = get_vendor_bill(&ctx.pool, bill_id)
        .await?
        .ok_or_else(|| BackendError::not_found("vendor bill", bill_id))?;
    let mapping = find_by_local(&ctx.pool, EntityType::Bill, bill_id)
        .await?
        .ok_or_else(|| BackendError::UnmappedReference {
            entity: "bill",
            name: bill.bill_number.clone(),
        })?;

    let conn = ctx.tokens.get_valid_token().await?;
    let query = format!(
        "SELECT * FROM Attachable WHERE AttachableRef.EntityRef.Type = 'Bill' AND AttachableRef.EntityRef.Value = '{}'",
        mapping.remote_id
    );
    let mut response = ctx.client.query(&conn, &query).await?;
    let attachables = response.take_attachables();
    tracing::debug!("Bill {} has {} remote attachment(s)", mapping.remote_id, attachables.len());

    let mut summary = AttachmentPullSummary::default();
    for value in attachables {
        let attachable: QbAttachable = match serde_json::from_value(value) {
            Ok(a) => a,
            Err(e) => {
                summary.failed += 1;
                summary.errors.push(format!("Unreadable attachment: {}", e));
                continue;
            }
        };
        let file_name = attachable
            .file_name
            .clone()
            .unwrap_or_else(|| format!("attachment-{}", attachable.id));

        if attachment_exists(&ctx.pool, bill_id, &file_name).await? {
            tracing::debug!("Attachment {} already stored for bill {}", file_name, bill_id);
            summary.skipped += 1;
            continue;
        }

        match store_attachment(ctx, &conn, bill_id, &file_name, &attachable).await {
            Ok(()) => summary.imported += 1,
            Err(e) => {
                tracing::error!("Attachment {} of bill {} failed: {}", file_name, bill_id, e);
                summary.failed += 1;
                summary.errors.push(format!("{}: {}", file_name, e.message()));
            }
        }
    }

    let status = SyncRunStatus::for_batch(summary.failed);
    let details = serde_json::to_value(&summary)?;
    append_sync_log(
        &ctx.pool,
        EntityType::Bill.as_str(),
        Some(bill_id),
        "pull_attachments",
        status,
        (summary.failed > 0).then(|| format!("{} attachment(s) failed", summary.failed)).as_deref(),
        Some(&details),
    )
    .await?;

    tracing::info!(
        %bill_id,
        imported = summary.imported,
        skipped = summary.skipped,
        failed = summary.failed,
        "Attachment pull finished"
    );
    Ok(summary)
}

async fn store_attachment(
    ctx: &SyncContext,
    conn: &Connection,
    bill_id: Uuid,
    file_name: &str,
    attachable: &QbAttachable,
) -> Result<(), BackendError> {
    let url = match attachable.temp_download_uri.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => url.to_string(),
        None => ctx.client.attachment_download_url(conn, &attachable.id).await?,
    };
    let data = ctx.client.download(&url).await?;

    let path = storage_path(bill_id, file_name);
    let size = ctx.store.put(&path, data, attachable.content_type.as_deref()).await?;

    insert_attachment(
        &ctx.pool,
        &BillAttachment {
            id: Uuid::new_v4(),
            bill_id,
            file_name: file_name.to_string(),
            file_path: path,
            file_size: size as i64,
            content_type: attachable.content_type.clone(),
            remote_attachable_id: Some(attachable.id.clone()),
            created_at: Utc::now(),
        },
    )
    .await?;
    Ok(())
}
