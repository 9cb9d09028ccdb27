/**
 * Entity Importer
 *
 * Pulls invoices, estimates and customers from QuickBooks into the local
 * tables.
 *
 * # Per-record rules
 *
 * - Mapped record: financial fields and status are overwritten and the
 *   mapping's `last_synced_at` is touched. Estimates also get their line items
 *   replaced; invoice lines are left alone.
 * - Unmapped record: the customer is resolved through `customer_mappings`.
 *   Without a mapped customer the record is skipped and the remote customer
 *   name is reported. Otherwise the row, its lines and its mapping are
 *   inserted in one transaction.
 *
 * A failing record is reported in `errors` and the run continues. Every run
 * appends one summary row to the sync log.
 *
 * Lookups that need the pool happen before a transaction begins, so the
 * transaction never waits on a second connection.
 */

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::SyncContext;
use crate::backend::db::directory::{find_customer_by_name, insert_customer, update_customer};
use crate::backend::db::documents::{
    insert_estimate, insert_invoice, update_estimate_financials, update_invoice_financials,
};
use crate::backend::db::line_items::{insert_line_items, replace_line_items, LineItemOwner};
use crate::backend::db::mappings::{find_by_remote, touch_mapping, upsert_mapping};
use crate::backend::db::sync_log::append_sync_log;
use crate::backend::error::BackendError;
use crate::backend::quickbooks::types::{QbCustomer, QbEstimate, QbInvoice, SalesDocument, SalesLine};
use crate::shared::accounting::{
    EntityMapping, EntityType, Estimate, EstimateStatus, ImportKind, ImportSummary, Invoice,
    InvoiceStatus, LineItem, MappingStatus,
};

/// Upper bound of records fetched per import run
pub const IMPORT_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordOutcome {
    Imported,
    Updated,
    Skipped,
}

impl ImportSummary {
    fn count(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Imported => self.imported += 1,
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Run the import selected by `kind`
pub async fn run_import(ctx: &SyncContext, kind: ImportKind) -> Result<ImportSummary, BackendError> {
    match kind {
        ImportKind::Invoices => import_invoices(ctx).await,
        ImportKind::Estimates => import_estimates(ctx).await,
        ImportKind::Customers => import_customers(ctx).await,
    }
}

async fn fetch_all(ctx: &SyncContext, entity: EntityType, filter: &str) -> Result<Vec<serde_json::Value>, BackendError> {
    let conn = ctx.tokens.get_valid_token().await?;
    let query = format!(
        "SELECT * FROM {}{} MAXRESULTS {}",
        entity.remote_name(),
        filter,
        IMPORT_LIMIT
    );
    let mut response = ctx.client.query(&conn, &query).await?;
    Ok(response.take(entity))
}

/// Label used in error messages: document number if present, else remote id
fn record_label(value: &serde_json::Value) -> String {
    value
        .get("DocNumber")
        .or_else(|| value.get("DisplayName"))
        .or_else(|| value.get("Id"))
        .and_then(|v| v.as_str())
        .unwrap_or("?")
        .to_string()
}

async fn finish_run(ctx: &SyncContext, entity: EntityType, summary: ImportSummary) -> Result<ImportSummary, BackendError> {
    let summary = summary.finish();
    let error_message = (!summary.errors.is_empty())
        .then(|| format!("{} record(s) failed", summary.errors.len()));
    let details = serde_json::to_value(&summary)?;

    append_sync_log(
        &ctx.pool,
        entity.as_str(),
        None,
        "import",
        summary.status,
        error_message.as_deref(),
        Some(&details),
    )
    .await?;

    tracing::info!(
        entity = %entity,
        imported = summary.imported,
        updated = summary.updated,
        skipped = summary.skipped,
        errors = summary.errors.len(),
        "Import finished"
    );
    Ok(summary)
}

pub async fn import_invoices(ctx: &SyncContext) -> Result<ImportSummary, BackendError> {
    let values = fetch_all(ctx, EntityType::Invoice, "").await?;
    let mut summary = ImportSummary::default();

    for value in values {
        let label = record_label(&value);
        let result = match serde_json::from_value::<QbInvoice>(value) {
            Ok(invoice) => import_invoice(ctx, &invoice, &mut summary).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(outcome) => summary.count(outcome),
            Err(e) => {
                tracing::error!("Invoice {} failed to import: {}", label, e);
                summary.errors.push(format!("Invoice {}: {}", label, e));
            }
        }
    }

    finish_run(ctx, EntityType::Invoice, summary).await
}

pub async fn import_estimates(ctx: &SyncContext) -> Result<ImportSummary, BackendError> {
    let values = fetch_all(ctx, EntityType::Estimate, "").await?;
    let mut summary = ImportSummary::default();

    for value in values {
        let label = record_label(&value);
        let result = match serde_json::from_value::<QbEstimate>(value) {
            Ok(estimate) => import_estimate(ctx, &estimate, &mut summary).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(outcome) => summary.count(outcome),
            Err(e) => {
                tracing::error!("Estimate {} failed to import: {}", label, e);
                summary.errors.push(format!("Estimate {}: {}", label, e));
            }
        }
    }

    finish_run(ctx, EntityType::Estimate, summary).await
}

/// Pull active customers, linking them to local customers by name
pub async fn import_customers(ctx: &SyncContext) -> Result<ImportSummary, BackendError> {
    let values = fetch_all(ctx, EntityType::Customer, " WHERE Active = true").await?;
    let mut summary = ImportSummary::default();

    for value in values {
        let label = record_label(&value);
        let result = match serde_json::from_value::<QbCustomer>(value) {
            Ok(customer) => import_customer(ctx, &customer).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(outcome) => summary.count(outcome),
            Err(e) => {
                tracing::error!("Customer {} failed to import: {}", label, e);
                summary.errors.push(format!("Customer {}: {}", label, e));
            }
        }
    }

    finish_run(ctx, EntityType::Customer, summary).await
}

async fn import_customer(ctx: &SyncContext, remote: &QbCustomer) -> Result<RecordOutcome, BackendError> {
    let now = Utc::now();
    let email = remote.primary_email_addr.as_ref().map(|e| e.address.as_str());
    let name = remote.display_name.trim();
    if name.is_empty() {
        return Ok(RecordOutcome::Skipped);
    }

    if let Some(mapping) = find_by_remote(&ctx.pool, EntityType::Customer, &remote.id).await? {
        let mut tx = ctx.pool.begin().await?;
        update_customer(&mut *tx, mapping.local_id, name, email).await?;
        upsert_mapping(&mut *tx, EntityType::Customer, mapping.local_id, &remote.id, Some(name), now).await?;
        tx.commit().await?;
        return Ok(RecordOutcome::Updated);
    }

    let mut tx = ctx.pool.begin().await?;
    let customer = match find_customer_by_name(&mut *tx, name).await? {
        Some(existing) => existing,
        None => insert_customer(&mut *tx, name, email).await?,
    };
    upsert_mapping(&mut *tx, EntityType::Customer, customer.id, &remote.id, Some(name), now).await?;
    tx.commit().await?;

    tracing::debug!("Linked QuickBooks customer {} to local customer {}", remote.id, customer.id);
    Ok(RecordOutcome::Imported)
}

/// Local customer of a remote document, noting the name when unmapped
async fn resolve_customer<D: SalesDocument>(
    ctx: &SyncContext,
    doc: &D,
    summary: &mut ImportSummary,
) -> Result<Option<Uuid>, BackendError> {
    let Some(customer_ref) = doc.customer_ref() else {
        summary.note_unmapped_customer("(no customer)");
        return Ok(None);
    };

    match find_by_remote(&ctx.pool, EntityType::Customer, &customer_ref.value).await? {
        Some(mapping) => Ok(Some(mapping.local_id)),
        None => {
            let name = customer_ref.name.as_deref().unwrap_or(&customer_ref.value);
            let err = BackendError::UnmappedReference {
                entity: "customer",
                name: name.to_string(),
            };
            tracing::warn!("Skipping {} {}: {}", doc.doc_number().unwrap_or("?"), doc.remote_id(), err);
            summary.note_unmapped_customer(name);
            Ok(None)
        }
    }
}

/// Convert remote item lines, resolving products through `product_mappings`
///
/// Lines whose item has no mapping keep the remote item name in `item_name`.
pub(crate) async fn build_line_items(
    ctx: &SyncContext,
    lines: &[SalesLine],
) -> Result<Vec<LineItem>, BackendError> {
    let mut items = Vec::new();

    for (index, line) in lines.iter().filter(|l| l.is_item_line()).enumerate() {
        let Some(detail) = line.sales_item_line_detail.as_ref() else {
            continue;
        };

        let product_id = match detail.item_ref.as_ref() {
            Some(item_ref) => find_by_remote(&ctx.pool, EntityType::Product, &item_ref.value)
                .await?
                .map(|m| m.local_id),
            None => None,
        };

        let quantity = detail.qty.unwrap_or(1.0);
        let unit_price = detail.unit_price.unwrap_or(if quantity != 0.0 {
            line.amount / quantity
        } else {
            line.amount
        });

        items.push(LineItem {
            id: Uuid::new_v4(),
            product_id,
            item_name: detail.item_ref.as_ref().and_then(|r| r.name.clone()),
            description: line.description.clone(),
            quantity,
            unit_price,
            amount: line.amount,
            sort_order: line.line_num.unwrap_or(index as i64 + 1),
        });
    }

    Ok(items)
}

fn document_number(doc: &impl SalesDocument) -> String {
    doc.doc_number()
        .map(str::to_string)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("QB-{}", doc.remote_id()))
}

async fn import_invoice(
    ctx: &SyncContext,
    remote: &QbInvoice,
    summary: &mut ImportSummary,
) -> Result<RecordOutcome, BackendError> {
    let synced_at = Utc::now();
    let status = InvoiceStatus::from_balance(remote.total(), remote.balance);
    let amount_paid = (remote.total() - remote.balance).max(0.0);

    if let Some(mapping) = find_by_remote(&ctx.pool, EntityType::Invoice, &remote.id).await? {
        if mapping.sync_status == MappingStatus::Voided {
            return Ok(RecordOutcome::Skipped);
        }
        if resolve_customer(ctx, remote, summary).await?.is_none() {
            return Ok(RecordOutcome::Skipped);
        }
        let mut tx = ctx.pool.begin().await?;
        update_invoice_financials(
            &mut *tx,
            mapping.local_id,
            remote.subtotal(),
            remote.tax(),
            remote.total(),
            amount_paid,
            status.as_str(),
        )
        .await?;
        touch_mapping(&mut *tx, EntityType::Invoice, mapping.id, synced_at).await?;
        tx.commit().await?;
        return Ok(RecordOutcome::Updated);
    }

    let Some(customer_id) = resolve_customer(ctx, remote, summary).await? else {
        return Ok(RecordOutcome::Skipped);
    };
    let lines = build_line_items(ctx, &remote.line).await?;

    let invoice = Invoice {
        id: Uuid::new_v4(),
        invoice_number: document_number(remote),
        customer_id,
        invoice_date: remote.txn_date,
        due_date: remote.due_date,
        subtotal: remote.subtotal(),
        tax_amount: remote.tax(),
        total: remote.total(),
        amount_paid,
        status: status.as_str().to_string(),
        created_at: synced_at,
        updated_at: synced_at,
    };

    let mut tx = ctx.pool.begin().await?;
    insert_invoice(&mut tx, &invoice).await?;
    insert_line_items(&mut tx, LineItemOwner::Invoice, invoice.id, &lines).await?;
    upsert_mapping(
        &mut *tx,
        EntityType::Invoice,
        invoice.id,
        &remote.id,
        remote.doc_number.as_deref(),
        synced_at,
    )
    .await?;
    tx.commit().await?;

    tracing::debug!("Imported invoice {} as {}", invoice.invoice_number, invoice.id);
    Ok(RecordOutcome::Imported)
}

async fn import_estimate(
    ctx: &SyncContext,
    remote: &QbEstimate,
    summary: &mut ImportSummary,
) -> Result<RecordOutcome, BackendError> {
    let synced_at = Utc::now();

    if let Some(mapping) = find_by_remote(&ctx.pool, EntityType::Estimate, &remote.id).await? {
        if mapping.sync_status == MappingStatus::Voided {
            return Ok(RecordOutcome::Skipped);
        }
        if resolve_customer(ctx, remote, summary).await?.is_none() {
            return Ok(RecordOutcome::Skipped);
        }
        apply_remote_estimate(ctx, &mapping, remote, synced_at).await?;
        return Ok(RecordOutcome::Updated);
    }

    let Some(customer_id) = resolve_customer(ctx, remote, summary).await? else {
        return Ok(RecordOutcome::Skipped);
    };
    let lines = build_line_items(ctx, &remote.line).await?;

    let estimate = Estimate {
        id: Uuid::new_v4(),
        estimate_number: document_number(remote),
        customer_id,
        estimate_date: remote.txn_date,
        expiration_date: remote.expiration_date,
        subtotal: remote.subtotal(),
        tax_amount: remote.tax(),
        total: remote.total(),
        status: EstimateStatus::from_remote(remote.txn_status.as_deref()).as_str().to_string(),
        created_at: synced_at,
        updated_at: synced_at,
    };

    let mut tx = ctx.pool.begin().await?;
    insert_estimate(&mut tx, &estimate).await?;
    insert_line_items(&mut tx, LineItemOwner::Estimate, estimate.id, &lines).await?;
    upsert_mapping(
        &mut *tx,
        EntityType::Estimate,
        estimate.id,
        &remote.id,
        remote.doc_number.as_deref(),
        synced_at,
    )
    .await?;
    tx.commit().await?;

    tracing::debug!("Imported estimate {} as {}", estimate.estimate_number, estimate.id);
    Ok(RecordOutcome::Imported)
}

/// Overwrite a mapped estimate with the remote version
///
/// Financial fields, status and line items change together in one
/// transaction; the mapping ends up `synced` at `synced_at`.
pub(crate) async fn apply_remote_estimate(
    ctx: &SyncContext,
    mapping: &EntityMapping,
    remote: &QbEstimate,
    synced_at: DateTime<Utc>,
) -> Result<(), BackendError> {
    let lines = build_line_items(ctx, &remote.line).await?;
    let status = EstimateStatus::from_remote(remote.txn_status.as_deref());

    let mut tx = ctx.pool.begin().await?;
    update_estimate_financials(
        &mut *tx,
        mapping.local_id,
        remote.subtotal(),
        remote.tax(),
        remote.total(),
        status.as_str(),
    )
    .await?;
    replace_line_items(&mut tx, LineItemOwner::Estimate, mapping.local_id, &lines).await?;
    touch_mapping(&mut *tx, EntityType::Estimate, mapping.id, synced_at).await?;
    tx.commit().await?;

    Ok(())
}
