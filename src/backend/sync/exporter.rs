//! Entity Exporter
//!
//! Pushes vendors, purchase orders and vendor bills to QuickBooks and records
//! the resulting remote id in the entity's mapping table.
//!
//! Purchase orders and bills are create-only: a mapped document is reported
//! as `already_synced` without a remote call. Their vendor is pushed first
//! when it has no mapping yet. Every push, successful or not, is written to
//! the sync log.

use std::future::Future;

use chrono::Utc;
use uuid::Uuid;

use super::SyncContext;
use crate::backend::db::directory::get_vendor;
use crate::backend::db::mappings::{find_by_local, upsert_mapping};
use crate::backend::db::purchasing::{get_purchase_order, get_vendor_bill};
use crate::backend::db::sync_log::append_sync_log;
use crate::backend::error::BackendError;
use crate::backend::quickbooks::types::{
    BillPayload, CreatedTxn, EmailAddress, ExpenseLine, PhoneNumber, PhysicalAddress,
    PurchaseOrderPayload, QbVendor, Ref, VendorPayload,
};
use crate::shared::accounting::{EntityType, LineItem, PushOutcome, SyncRunStatus, Vendor};

pub const ACTION_CREATED: &str = "created";
pub const ACTION_UPDATED: &str = "updated";
pub const ACTION_ALREADY_SYNCED: &str = "already_synced";

/// Run a push and record its outcome in the sync log
async fn logged<F>(ctx: &SyncContext, entity: EntityType, local_id: Uuid, push: F) -> Result<PushOutcome, BackendError>
where
    F: Future<Output = Result<PushOutcome, BackendError>>,
{
    match push.await {
        Ok(outcome) => {
            let details = serde_json::json!({ "remoteId": outcome.remote_id });
            append_sync_log(
                &ctx.pool,
                entity.as_str(),
                Some(local_id),
                &outcome.action,
                SyncRunStatus::Success,
                None,
                Some(&details),
            )
            .await?;
            tracing::info!(entity = %entity, %local_id, remote_id = %outcome.remote_id, "Push {}", outcome.action);
            Ok(outcome)
        }
        Err(err) => {
            tracing::error!(entity = %entity, %local_id, "Push failed: {}", err);
            let message = err.message();
            if let Err(log_err) = append_sync_log(
                &ctx.pool,
                entity.as_str(),
                Some(local_id),
                "push",
                SyncRunStatus::Failed,
                Some(&message),
                None,
            )
            .await
            {
                tracing::error!("Failed to write sync log: {}", log_err);
            }
            Err(err)
        }
    }
}

fn vendor_payload(vendor: &Vendor) -> VendorPayload {
    let has_address = vendor.address_line1.is_some()
        || vendor.city.is_some()
        || vendor.state.is_some()
        || vendor.postal_code.is_some();

    VendorPayload {
        display_name: vendor.name.clone(),
        company_name: vendor.company_name.clone(),
        primary_email_addr: vendor.email.clone().map(|address| EmailAddress { address }),
        primary_phone: vendor
            .phone
            .clone()
            .map(|free_form_number| PhoneNumber { free_form_number }),
        bill_addr: has_address.then(|| PhysicalAddress {
            line1: vendor.address_line1.clone(),
            city: vendor.city.clone(),
            country_sub_division_code: vendor.state.clone(),
            postal_code: vendor.postal_code.clone(),
        }),
        tax_identifier: vendor.tax_id.clone(),
        vendor_1099: vendor.is_1099,
        ..Default::default()
    }
}

/// Create the vendor remotely, or sparse-update it when already mapped
pub async fn push_vendor(ctx: &SyncContext, vendor_id: Uuid) -> Result<PushOutcome, BackendError> {
    logged(ctx, EntityType::Vendor, vendor_id, push_vendor_inner(ctx, vendor_id)).await
}

async fn push_vendor_inner(ctx: &SyncContext, vendor_id: Uuid) -> Result<PushOutcome, BackendError> {
    let vendor = get_vendor(&ctx.pool, vendor_id)
        .await?
        .ok_or_else(|| BackendError::not_found("vendor", vendor_id))?;
    let conn = ctx.tokens.get_valid_token().await?;
    let payload = vendor_payload(&vendor);

    let (remote, action) = match find_by_local(&ctx.pool, EntityType::Vendor, vendor_id).await? {
        None => {
            let created: QbVendor = ctx.client.post_entity(&conn, EntityType::Vendor, &payload).await?;
            (created, ACTION_CREATED)
        }
        Some(mapping) => {
            let current: QbVendor = ctx
                .client
                .get_entity(&conn, EntityType::Vendor, &mapping.remote_id)
                .await?;
            let update = VendorPayload {
                id: Some(current.id),
                sync_token: Some(current.sync_token),
                sparse: Some(true),
                ..payload
            };
            let updated: QbVendor = ctx.client.post_entity(&conn, EntityType::Vendor, &update).await?;
            (updated, ACTION_UPDATED)
        }
    };

    let remote_name = remote.display_name.as_deref().unwrap_or(&vendor.name);
    upsert_mapping(&ctx.pool, EntityType::Vendor, vendor_id, &remote.id, Some(remote_name), Utc::now()).await?;

    Ok(PushOutcome {
        local_id: vendor_id,
        remote_id: remote.id,
        action: action.to_string(),
    })
}

/// Remote id of a vendor, pushing the vendor first if it has no mapping
async fn ensure_vendor_mapped(ctx: &SyncContext, vendor_id: Uuid) -> Result<String, BackendError> {
    if let Some(mapping) = find_by_local(&ctx.pool, EntityType::Vendor, vendor_id).await? {
        return Ok(mapping.remote_id);
    }
    tracing::info!(%vendor_id, "Vendor not in QuickBooks yet, pushing it first");
    Ok(push_vendor(ctx, vendor_id).await?.remote_id)
}

/// Expense lines for a purchase order or bill
///
/// Lines with a mapped product reference the QuickBooks item; all others are
/// booked against the configured expense account. A document without lines
/// becomes a single line for its total.
async fn expense_lines(
    ctx: &SyncContext,
    items: &[LineItem],
    total: f64,
    fallback_description: Option<String>,
) -> Result<Vec<ExpenseLine>, BackendError> {
    let account_id = ctx.settings.expense_account_id.as_str();

    if items.is_empty() {
        return Ok(vec![ExpenseLine::account(total, fallback_description, account_id)]);
    }

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let description = item.description.clone().or_else(|| item.item_name.clone());
        let item_mapping = match item.product_id {
            Some(product_id) => find_by_local(&ctx.pool, EntityType::Product, product_id).await?,
            None => None,
        };
        let line = match item_mapping {
            Some(mapping) => ExpenseLine::item(
                item.amount,
                description,
                &mapping.remote_id,
                item.quantity,
                item.unit_price,
            ),
            None => ExpenseLine::account(item.amount, description, account_id),
        };
        lines.push(line);
    }
    Ok(lines)
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Create a purchase order remotely unless it is already mapped
pub async fn push_purchase_order(ctx: &SyncContext, po_id: Uuid) -> Result<PushOutcome, BackendError> {
    logged(ctx, EntityType::PurchaseOrder, po_id, push_purchase_order_inner(ctx, po_id)).await
}

async fn push_purchase_order_inner(ctx: &SyncContext, po_id: Uuid) -> Result<PushOutcome, BackendError> {
    let po = get_purchase_order(&ctx.pool, po_id)
        .await?
        .ok_or_else(|| BackendError::not_found("purchase order", po_id))?;

    if let Some(mapping) = find_by_local(&ctx.pool, EntityType::PurchaseOrder, po_id).await? {
        return Ok(PushOutcome {
            local_id: po_id,
            remote_id: mapping.remote_id,
            action: ACTION_ALREADY_SYNCED.to_string(),
        });
    }

    let vendor_remote_id = ensure_vendor_mapped(ctx, po.vendor_id).await?;
    let conn = ctx.tokens.get_valid_token().await?;

    let payload = PurchaseOrderPayload {
        vendor_ref: Ref::to(vendor_remote_id),
        doc_number: non_empty(&po.po_number),
        txn_date: po.order_date,
        memo: po.notes.clone(),
        line: expense_lines(ctx, &po.line_items, po.total, po.notes.clone()).await?,
    };

    let created: CreatedTxn = ctx
        .client
        .post_entity(&conn, EntityType::PurchaseOrder, &payload)
        .await?;

    let remote_name = created.doc_number.clone().unwrap_or_else(|| po.po_number.clone());
    upsert_mapping(&ctx.pool, EntityType::PurchaseOrder, po_id, &created.id, Some(&remote_name), Utc::now()).await?;

    Ok(PushOutcome {
        local_id: po_id,
        remote_id: created.id,
        action: ACTION_CREATED.to_string(),
    })
}

/// Create a vendor bill remotely unless it is already mapped
pub async fn push_vendor_bill(ctx: &SyncContext, bill_id: Uuid) -> Result<PushOutcome, BackendError> {
    logged(ctx, EntityType::Bill, bill_id, push_vendor_bill_inner(ctx, bill_id)).await
}

async fn push_vendor_bill_inner(ctx: &SyncContext, bill_id: Uuid) -> Result<PushOutcome, BackendError> {
    let bill = get_vendor_bill(&ctx.pool, bill_id)
        .await?
        .ok_or_else(|| BackendError::not_found("vendor bill", bill_id))?;

    if let Some(mapping) = find_by_local(&ctx.pool, EntityType::Bill, bill_id).await? {
        return Ok(PushOutcome {
            local_id: bill_id,
            remote_id: mapping.remote_id,
            action: ACTION_ALREADY_SYNCED.to_string(),
        });
    }

    let vendor_remote_id = ensure_vendor_mapped(ctx, bill.vendor_id).await?;
    let conn = ctx.tokens.get_valid_token().await?;

    let payload = BillPayload {
        vendor_ref: Ref::to(vendor_remote_id),
        doc_number: non_empty(&bill.bill_number),
        txn_date: bill.bill_date,
        due_date: bill.due_date,
        line: expense_lines(ctx, &bill.line_items, bill.total, None).await?,
    };

    let created: CreatedTxn = ctx.client.post_entity(&conn, EntityType::Bill, &payload).await?;

    let remote_name = created.doc_number.clone().unwrap_or_else(|| bill.bill_number.clone());
    upsert_mapping(&ctx.pool, EntityType::Bill, bill_id, &created.id, Some(&remote_name), Utc::now()).await?;

    Ok(PushOutcome {
        local_id: bill_id,
        remote_id: created.id,
        action: ACTION_CREATED.to_string(),
    })
}
