//! Database operations for purchase orders and vendor bills

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::line_items::{insert_line_items, list_line_items, LineItemOwner};
use crate::shared::accounting::{PurchaseOrder, VendorBill};

/// Load a purchase order with its lines
pub async fn get_purchase_order(
    pool: &SqlitePool,
    id: Uuid,
) -> Result<Option<PurchaseOrder>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, po_number, vendor_id, order_date, total, status, notes
        FROM purchase_orders
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(r) = row else {
        return Ok(None);
    };

    let line_items = list_line_items(pool, LineItemOwner::PurchaseOrder, id).await?;
    Ok(Some(PurchaseOrder {
        id: r.get("id"),
        po_number: r.get("po_number"),
        vendor_id: r.get("vendor_id"),
        order_date: r.get("order_date"),
        total: r.get("total"),
        status: r.get("status"),
        notes: r.get("notes"),
        line_items,
    }))
}

/// Store a purchase order and its lines in one transaction
pub async fn insert_purchase_order(pool: &SqlitePool, po: &PurchaseOrder) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO purchase_orders (id, po_number, vendor_id, order_date, total, status, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(po.id)
    .bind(&po.po_number)
    .bind(po.vendor_id)
    .bind(po.order_date)
    .bind(po.total)
    .bind(&po.status)
    .bind(&po.notes)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    insert_line_items(&mut tx, LineItemOwner::PurchaseOrder, po.id, &po.line_items).await?;
    tx.commit().await
}

/// Load a vendor bill with its lines
pub async fn get_vendor_bill(pool: &SqlitePool, id: Uuid) -> Result<Option<VendorBill>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, bill_number, vendor_id, bill_date, due_date, total, status
        FROM vendor_bills
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(r) = row else {
        return Ok(None);
    };

    let line_items = list_line_items(pool, LineItemOwner::Bill, id).await?;
    Ok(Some(VendorBill {
        id: r.get("id"),
        bill_number: r.get("bill_number"),
        vendor_id: r.get("vendor_id"),
        bill_date: r.get("bill_date"),
        due_date: r.get("due_date"),
        total: r.get("total"),
        status: r.get("status"),
        line_items,
    }))
}

/// Store a vendor bill and its lines in one transaction
pub async fn insert_vendor_bill(pool: &SqlitePool, bill: &VendorBill) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO vendor_bills (id, bill_number, vendor_id, bill_date, due_date, total, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(bill.id)
    .bind(&bill.bill_number)
    .bind(bill.vendor_id)
    .bind(bill.bill_date)
    .bind(bill.due_date)
    .bind(bill.total)
    .bind(&bill.status)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    insert_line_items(&mut tx, LineItemOwner::Bill, bill.id, &bill.line_items).await?;
    tx.commit().await
}
