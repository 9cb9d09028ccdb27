//! Database operations for document line items
//!
//! Invoices, estimates, purchase orders and bills each keep their lines in a
//! child table of the same shape. Lines are never edited in place: a sync
//! deletes them and inserts the new set inside the caller's transaction.

use sqlx::{Executor, Row, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::shared::accounting::LineItem;

/// Document that owns a set of line items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineItemOwner {
    Invoice,
    Estimate,
    PurchaseOrder,
    Bill,
}

impl LineItemOwner {
    fn table(&self) -> &'static str {
        match self {
            LineItemOwner::Invoice => "invoice_line_items",
            LineItemOwner::Estimate => "estimate_line_items",
            LineItemOwner::PurchaseOrder => "purchase_order_line_items",
            LineItemOwner::Bill => "vendor_bill_line_items",
        }
    }

    fn parent_column(&self) -> &'static str {
        match self {
            LineItemOwner::Invoice => "invoice_id",
            LineItemOwner::Estimate => "estimate_id",
            LineItemOwner::PurchaseOrder => "purchase_order_id",
            LineItemOwner::Bill => "bill_id",
        }
    }
}

/// Lines of a document in display order
pub async fn list_line_items<'e, E>(
    executor: E,
    owner: LineItemOwner,
    parent_id: Uuid,
) -> Result<Vec<LineItem>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"
        SELECT id, product_id, item_name, description, quantity, unit_price, amount, sort_order
        FROM {}
        WHERE {} = ?
        ORDER BY sort_order ASC
        "#,
        owner.table(),
        owner.parent_column()
    );

    let rows = sqlx::query(&sql).bind(parent_id).fetch_all(executor).await?;

    Ok(rows
        .into_iter()
        .map(|r| LineItem {
            id: r.get("id"),
            product_id: r.get("product_id"),
            item_name: r.get("item_name"),
            description: r.get("description"),
            quantity: r.get("quantity"),
            unit_price: r.get("unit_price"),
            amount: r.get("amount"),
            sort_order: r.get("sort_order"),
        })
        .collect())
}

/// Insert lines for a document
pub async fn insert_line_items(
    conn: &mut SqliteConnection,
    owner: LineItemOwner,
    parent_id: Uuid,
    items: &[LineItem],
) -> Result<(), sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO {} (id, {}, product_id, item_name, description, quantity, unit_price, amount, sort_order)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        owner.table(),
        owner.parent_column()
    );

    for item in items {
        sqlx::query(&sql)
            .bind(item.id)
            .bind(parent_id)
            .bind(item.product_id)
            .bind(&item.item_name)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.amount)
            .bind(item.sort_order)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Delete all lines of a document and insert `items` in their place
///
/// Run this on a transaction so readers never see a document without lines.
pub async fn replace_line_items(
    conn: &mut SqliteConnection,
    owner: LineItemOwner,
    parent_id: Uuid,
    items: &[LineItem],
) -> Result<(), sqlx::Error> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        owner.table(),
        owner.parent_column()
    );
    sqlx::query(&sql).bind(parent_id).execute(&mut *conn).await?;

    insert_line_items(conn, owner, parent_id, items).await
}
