//! QuickBooks Online JSON shapes
//!
//! Only the fields the sync reads or writes are modelled; everything else in
//! the API payloads is ignored. Field names follow the API's PascalCase.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::accounting::EntityType;

/// Reference to another QuickBooks record (`CustomerRef`, `ItemRef`, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ref {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Ref {
    pub fn to(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct MetaData {
    pub last_updated_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SalesItemLineDetail {
    pub item_ref: Option<Ref>,
    pub unit_price: Option<f64>,
    pub qty: Option<f64>,
}

/// One line of a sales document
///
/// Only `SalesItemLineDetail` lines carry items; subtotal and discount lines
/// are skipped by the importer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SalesLine {
    pub id: Option<String>,
    pub line_num: Option<i64>,
    pub description: Option<String>,
    #[serde(default)]
    pub amount: f64,
    pub detail_type: Option<String>,
    pub sales_item_line_detail: Option<SalesItemLineDetail>,
}

impl SalesLine {
    pub fn is_item_line(&self) -> bool {
        self.detail_type.as_deref() == Some("SalesItemLineDetail")
            && self.sales_item_line_detail.is_some()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct TxnTaxDetail {
    #[serde(default)]
    pub total_tax: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QbInvoice {
    pub id: String,
    pub doc_number: Option<String>,
    pub txn_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub customer_ref: Option<Ref>,
    #[serde(default)]
    pub line: Vec<SalesLine>,
    pub txn_tax_detail: Option<TxnTaxDetail>,
    #[serde(default)]
    pub total_amt: f64,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub meta_data: MetaData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QbEstimate {
    pub id: String,
    pub doc_number: Option<String>,
    pub txn_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub txn_status: Option<String>,
    pub customer_ref: Option<Ref>,
    #[serde(default)]
    pub line: Vec<SalesLine>,
    pub txn_tax_detail: Option<TxnTaxDetail>,
    #[serde(default)]
    pub total_amt: f64,
    #[serde(default)]
    pub meta_data: MetaData,
}

/// Fields shared by invoices and estimates, as the importer consumes them
pub trait SalesDocument {
    fn remote_id(&self) -> &str;
    fn doc_number(&self) -> Option<&str>;
    fn customer_ref(&self) -> Option<&Ref>;
    fn lines(&self) -> &[SalesLine];
    fn total(&self) -> f64;

    fn tax(&self) -> f64;

    /// Sum of item line amounts
    fn subtotal(&self) -> f64 {
        self.lines()
            .iter()
            .filter(|l| l.is_item_line())
            .map(|l| l.amount)
            .sum()
    }
}

impl SalesDocument for QbInvoice {
    fn remote_id(&self) -> &str {
        &self.id
    }
    fn doc_number(&self) -> Option<&str> {
        self.doc_number.as_deref()
    }
    fn customer_ref(&self) -> Option<&Ref> {
        self.customer_ref.as_ref()
    }
    fn lines(&self) -> &[SalesLine] {
        &self.line
    }
    fn total(&self) -> f64 {
        self.total_amt
    }
    fn tax(&self) -> f64 {
        self.txn_tax_detail.as_ref().map(|t| t.total_tax).unwrap_or(0.0)
    }
}

impl SalesDocument for QbEstimate {
    fn remote_id(&self) -> &str {
        &self.id
    }
    fn doc_number(&self) -> Option<&str> {
        self.doc_number.as_deref()
    }
    fn customer_ref(&self) -> Option<&Ref> {
        self.customer_ref.as_ref()
    }
    fn lines(&self) -> &[SalesLine] {
        &self.line
    }
    fn total(&self) -> f64 {
        self.total_amt
    }
    fn tax(&self) -> f64 {
        self.txn_tax_detail.as_ref().map(|t| t.total_tax).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct EmailAddress {
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PhoneNumber {
    pub free_form_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PhysicalAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_sub_division_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QbCustomer {
    pub id: String,
    pub display_name: String,
    pub primary_email_addr: Option<EmailAddress>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Vendor as returned by QuickBooks
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QbVendor {
    pub id: String,
    pub sync_token: String,
    pub display_name: Option<String>,
}

/// Vendor create / sparse update body
///
/// `Id`, `SyncToken` and `sparse` are only set for updates.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct VendorPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(rename = "sparse", skip_serializing_if = "Option::is_none")]
    pub sparse: Option<bool>,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_email_addr: Option<EmailAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_phone: Option<PhoneNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_addr: Option<PhysicalAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_identifier: Option<String>,
    pub vendor_1099: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct AccountBasedExpenseLineDetail {
    pub account_ref: Ref,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ItemBasedExpenseLineDetail {
    pub item_ref: Ref,
    pub qty: f64,
    pub unit_price: f64,
}

/// One expense line of a purchase order or bill
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ExpenseLine {
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub detail_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_based_expense_line_detail: Option<AccountBasedExpenseLineDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_based_expense_line_detail: Option<ItemBasedExpenseLineDetail>,
}

impl ExpenseLine {
    /// Line booked against an expense account
    pub fn account(amount: f64, description: Option<String>, account_id: &str) -> Self {
        Self {
            amount,
            description,
            detail_type: "AccountBasedExpenseLineDetail",
            account_based_expense_line_detail: Some(AccountBasedExpenseLineDetail {
                account_ref: Ref::to(account_id),
            }),
            item_based_expense_line_detail: None,
        }
    }

    /// Line referencing a mapped QuickBooks item
    pub fn item(amount: f64, description: Option<String>, item_id: &str, qty: f64, unit_price: f64) -> Self {
        Self {
            amount,
            description,
            detail_type: "ItemBasedExpenseLineDetail",
            account_based_expense_line_detail: None,
            item_based_expense_line_detail: Some(ItemBasedExpenseLineDetail {
                item_ref: Ref::to(item_id),
                qty,
                unit_price,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PurchaseOrderPayload {
    pub vendor_ref: Ref,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub line: Vec<ExpenseLine>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct BillPayload {
    pub vendor_ref: Ref,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub line: Vec<ExpenseLine>,
}

/// Id and document number of a created transaction
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatedTxn {
    pub id: String,
    pub doc_number: Option<String>,
}

/// Row of a `SELECT DocNumber FROM ...` query
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DocNumberRow {
    pub doc_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QbAttachable {
    pub id: String,
    pub file_name: Option<String>,
    pub temp_download_uri: Option<String>,
    pub size: Option<f64>,
    pub content_type: Option<String>,
}

/// Body of a `/query` response
///
/// The API names the result array after the queried entity, so every entity
/// the sync queries gets its own optional field.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub invoice: Vec<serde_json::Value>,
    #[serde(default)]
    pub estimate: Vec<serde_json::Value>,
    #[serde(default)]
    pub customer: Vec<serde_json::Value>,
    #[serde(default)]
    pub vendor: Vec<serde_json::Value>,
    #[serde(default)]
    pub purchase_order: Vec<serde_json::Value>,
    #[serde(default)]
    pub bill: Vec<serde_json::Value>,
    #[serde(default)]
    pub attachable: Vec<serde_json::Value>,
}

impl QueryResponse {
    /// Move out the result rows of `entity`
    pub fn take(&mut self, entity: EntityType) -> Vec<serde_json::Value> {
        match entity {
            EntityType::Invoice => std::mem::take(&mut self.invoice),
            EntityType::Estimate => std::mem::take(&mut self.estimate),
            EntityType::Customer => std::mem::take(&mut self.customer),
            EntityType::Vendor => std::mem::take(&mut self.vendor),
            EntityType::PurchaseOrder => std::mem::take(&mut self.purchase_order),
            EntityType::Bill => std::mem::take(&mut self.bill),
            EntityType::Product => Vec::new(),
        }
    }

    pub fn take_attachables(&mut self) -> Vec<serde_json::Value> {
        std::mem::take(&mut self.attachable)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct QueryEnvelope {
    #[serde(rename = "QueryResponse", default)]
    pub query_response: QueryResponse,
}
