//! Database operations for sales documents (invoices, estimates)
//! and document-number lookups across all numbered documents

use chrono::Utc;
use sqlx::{Executor, Row, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::shared::accounting::{DocumentKind, Estimate, Invoice};

pub async fn insert_invoice(conn: &mut SqliteConnection, invoice: &Invoice) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO invoices (id, invoice_number, customer_id, invoice_date, due_date, subtotal,
                              tax_amount, total, amount_paid, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(invoice.id)
    .bind(&invoice.invoice_number)
    .bind(invoice.customer_id)
    .bind(invoice.invoice_date)
    .bind(invoice.due_date)
    .bind(invoice.subtotal)
    .bind(invoice.tax_amount)
    .bind(invoice.total)
    .bind(invoice.amount_paid)
    .bind(&invoice.status)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn get_invoice(pool: &SqlitePool, id: Uuid) -> Result<Option<Invoice>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, invoice_number, customer_id, invoice_date, due_date, subtotal, tax_amount,
               total, amount_paid, status, created_at, updated_at
        FROM invoices
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Invoice {
        id: r.get("id"),
        invoice_number: r.get("invoice_number"),
        customer_id: r.get("customer_id"),
        invoice_date: r.get("invoice_date"),
        due_date: r.get("due_date"),
        subtotal: r.get("subtotal"),
        tax_amount: r.get("tax_amount"),
        total: r.get("total"),
        amount_paid: r.get("amount_paid"),
        status: r.get("status"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }))
}

/// Overwrite the financial fields of an invoice
pub async fn update_invoice_financials<'e, E>(
    executor: E,
    id: Uuid,
    subtotal: f64,
    tax_amount: f64,
    total: f64,
    amount_paid: f64,
    status: &str,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE invoices
        SET subtotal = ?, tax_amount = ?, total = ?, amount_paid = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(subtotal)
    .bind(tax_amount)
    .bind(total)
    .bind(amount_paid)
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn insert_estimate(conn: &mut SqliteConnection, estimate: &Estimate) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO estimates (id, estimate_number, customer_id, estimate_date, expiration_date,
                               subtotal, tax_amount, total, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(estimate.id)
    .bind(&estimate.estimate_number)
    .bind(estimate.customer_id)
    .bind(estimate.estimate_date)
    .bind(estimate.expiration_date)
    .bind(estimate.subtotal)
    .bind(estimate.tax_amount)
    .bind(estimate.total)
    .bind(&estimate.status)
    .bind(estimate.created_at)
    .bind(estimate.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn get_estimate(pool: &SqlitePool, id: Uuid) -> Result<Option<Estimate>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, estimate_number, customer_id, estimate_date, expiration_date, subtotal,
               tax_amount, total, status, created_at, updated_at
        FROM estimates
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Estimate {
        id: r.get("id"),
        estimate_number: r.get("estimate_number"),
        customer_id: r.get("customer_id"),
        estimate_date: r.get("estimate_date"),
        expiration_date: r.get("expiration_date"),
        subtotal: r.get("subtotal"),
        tax_amount: r.get("tax_amount"),
        total: r.get("total"),
        status: r.get("status"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }))
}

/// Overwrite the financial fields and status of an estimate
pub async fn update_estimate_financials<'e, E>(
    executor: E,
    id: Uuid,
    subtotal: f64,
    tax_amount: f64,
    total: f64,
    status: &str,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE estimates
        SET subtotal = ?, tax_amount = ?, total = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(subtotal)
    .bind(tax_amount)
    .bind(total)
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Most recent local document numbers of a kind, newest first
pub async fn recent_document_numbers(
    pool: &SqlitePool,
    kind: DocumentKind,
    limit: i64,
) -> Result<Vec<String>, sqlx::Error> {
    let (table, column) = match kind {
        DocumentKind::Invoice => ("invoices", "invoice_number"),
        DocumentKind::Estimate => ("estimates", "estimate_number"),
        DocumentKind::PurchaseOrder => ("purchase_orders", "po_number"),
        DocumentKind::Bill => ("vendor_bills", "bill_number"),
    };
    let sql = format!(
        "SELECT {column} AS number FROM {table} WHERE {column} <> '' ORDER BY created_at DESC LIMIT ?"
    );

    let rows = sqlx::query(&sql).bind(limit).fetch_all(pool).await?;
    Ok(rows.into_iter().map(|r| r.get("number")).collect())
}
