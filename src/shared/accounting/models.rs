//! Local accounting records
//!
//! Rows of the local domain tables as the sync code reads and writes them.
//! Money is kept as `f64` in the same units QuickBooks reports.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::EntityType;
use super::status::{MappingStatus, SyncRunStatus};

/// Link between a local row and a QuickBooks record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityMapping {
    pub id: Uuid,
    pub entity_type: EntityType,
    pub local_id: Uuid,
    pub remote_id: String,
    /// Display name or document number on the remote side
    pub remote_name: Option<String>,
    pub sync_status: MappingStatus,
    pub last_synced_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: Uuid,
    pub name: String,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub tax_id: Option<String>,
    /// Contractors receive a 1099 and are flagged as such remotely
    pub is_1099: bool,
}

/// A line of an invoice, estimate, purchase order or bill
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: Uuid,
    /// Local product, when the remote item is mapped
    pub product_id: Option<Uuid>,
    /// Remote item name, kept as free text when the item is unmapped
    pub item_name: Option<String>,
    pub description: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub amount_paid: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub id: Uuid,
    pub estimate_number: String,
    pub customer_id: Uuid,
    pub estimate_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub po_number: String,
    pub vendor_id: Uuid,
    pub order_date: Option<NaiveDate>,
    pub total: f64,
    pub status: String,
    pub notes: Option<String>,
    pub line_items: Vec<LineItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VendorBill {
    pub id: Uuid,
    pub bill_number: String,
    pub vendor_id: Uuid,
    pub bill_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub total: f64,
    pub status: String,
    pub line_items: Vec<LineItem>,
}

/// A file attached to a vendor bill
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BillAttachment {
    pub id: Uuid,
    pub bill_id: Uuid,
    pub file_name: String,
    /// Path inside the file store
    pub file_path: String,
    pub file_size: i64,
    pub content_type: Option<String>,
    pub remote_attachable_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only audit record of a sync attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncLogEntry {
    pub id: Uuid,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub action: String,
    pub status: SyncRunStatus,
    pub error_message: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
