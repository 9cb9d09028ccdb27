//! Database test fixtures
//!
//! Every test gets its own in-memory SQLite database with the full schema.
//! The pool holds a single connection, so helpers never keep a connection
//! checked out across calls.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use fieldops_sync::backend::db::directory::{insert_customer, insert_vendor};
use fieldops_sync::backend::db::documents::{insert_estimate, insert_invoice};
use fieldops_sync::backend::db::mappings::upsert_mapping;
use fieldops_sync::backend::db::purchasing::{insert_purchase_order, insert_vendor_bill};
use fieldops_sync::backend::db::sync_config::save_connection;
use fieldops_sync::backend::server::config::load_in_memory_database;
use fieldops_sync::shared::accounting::{
    Customer, EntityType, Estimate, Invoice, LineItem, PurchaseOrder, Vendor, VendorBill,
};

/// Company id used by every fixture connection
pub const REALM: &str = "9130357";

/// Create a fresh in-memory database
pub async fn create_test_pool() -> SqlitePool {
    load_in_memory_database()
        .await
        .expect("Failed to create in-memory database")
}

/// Store an active connection whose access token expires after `valid_for`
pub async fn seed_connection(pool: &SqlitePool, valid_for: Duration) {
    save_connection(pool, REALM, "access-1", "refresh-1", Utc::now() + valid_for)
        .await
        .expect("Failed to seed connection");
}

pub async fn seed_customer(pool: &SqlitePool, name: &str) -> Customer {
    insert_customer(pool, name, None)
        .await
        .expect("Failed to insert customer")
}

pub async fn seed_vendor(pool: &SqlitePool, name: &str) -> Vendor {
    let vendor = Vendor {
        id: Uuid::new_v4(),
        name: name.to_string(),
        company_name: None,
        email: Some("ap@vendor.example".to_string()),
        phone: None,
        address_line1: None,
        city: None,
        state: None,
        postal_code: None,
        tax_id: None,
        is_1099: false,
    };
    insert_vendor(pool, &vendor).await.expect("Failed to insert vendor");
    vendor
}

/// Link a local row to a remote id, synced at `synced_at`
pub async fn seed_mapping(
    pool: &SqlitePool,
    entity_type: EntityType,
    local_id: Uuid,
    remote_id: &str,
    synced_at: DateTime<Utc>,
) {
    upsert_mapping(pool, entity_type, local_id, remote_id, None, synced_at)
        .await
        .expect("Failed to insert mapping");
}

pub fn line(description: &str, quantity: f64, unit_price: f64, sort_order: i64) -> LineItem {
    LineItem {
        id: Uuid::new_v4(),
        product_id: None,
        item_name: None,
        description: Some(description.to_string()),
        quantity,
        unit_price,
        amount: quantity * unit_price,
        sort_order,
    }
}

pub async fn seed_invoice(pool: &SqlitePool, customer_id: Uuid, number: &str) -> Invoice {
    let now = Utc::now();
    let invoice = Invoice {
        id: Uuid::new_v4(),
        invoice_number: number.to_string(),
        customer_id,
        invoice_date: None,
        due_date: None,
        subtotal: 100.0,
        tax_amount: 0.0,
        total: 100.0,
        amount_paid: 0.0,
        status: "sent".to_string(),
        created_at: now,
        updated_at: now,
    };
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    insert_invoice(&mut conn, &invoice).await.expect("Failed to insert invoice");
    invoice
}

pub async fn seed_estimate(pool: &SqlitePool, customer_id: Uuid, number: &str, total: f64) -> Estimate {
    let now = Utc::now();
    let estimate = Estimate {
        id: Uuid::new_v4(),
        estimate_number: number.to_string(),
        customer_id,
        estimate_date: None,
        expiration_date: None,
        subtotal: total,
        tax_amount: 0.0,
        total,
        status: "pending".to_string(),
        created_at: now,
        updated_at: now,
    };
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    insert_estimate(&mut conn, &estimate).await.expect("Failed to insert estimate");
    estimate
}

pub async fn seed_purchase_order(pool: &SqlitePool, vendor_id: Uuid, number: &str, lines: Vec<LineItem>) -> PurchaseOrder {
    let po = PurchaseOrder {
        id: Uuid::new_v4(),
        po_number: number.to_string(),
        vendor_id,
        order_date: None,
        total: lines.iter().map(|l| l.amount).sum(),
        status: "open".to_string(),
        notes: Some("Rough-in materials".to_string()),
        line_items: lines,
    };
    insert_purchase_order(pool, &po).await.expect("Failed to insert purchase order");
    po
}

pub async fn seed_bill(pool: &SqlitePool, vendor_id: Uuid, number: &str, lines: Vec<LineItem>) -> VendorBill {
    let bill = VendorBill {
        id: Uuid::new_v4(),
        bill_number: number.to_string(),
        vendor_id,
        bill_date: None,
        due_date: None,
        total: lines.iter().map(|l| l.amount).sum(),
        status: "open".to_string(),
        line_items: lines,
    };
    insert_vendor_bill(pool, &bill).await.expect("Failed to insert vendor bill");
    bill
}

/// Row count of a table
pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query(&format!("SELECT COUNT(*) AS n FROM {}", table))
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
        .get("n")
}
