//! Entity and document kinds
//!
//! Names used on both sides of the sync: the local string stored in mapping
//! and log tables, the QuickBooks entity name, and the mapping table that
//! links the two.

use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;

/// Entity types that can be linked to a QuickBooks record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Customer,
    Vendor,
    Product,
    Invoice,
    Estimate,
    Bill,
    PurchaseOrder,
}

impl EntityType {
    pub const ALL: [EntityType; 7] = [
        EntityType::Customer,
        EntityType::Vendor,
        EntityType::Product,
        EntityType::Invoice,
        EntityType::Estimate,
        EntityType::Bill,
        EntityType::PurchaseOrder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Customer => "customer",
            EntityType::Vendor => "vendor",
            EntityType::Product => "product",
            EntityType::Invoice => "invoice",
            EntityType::Estimate => "estimate",
            EntityType::Bill => "bill",
            EntityType::PurchaseOrder => "purchase_order",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, SharedError> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "customer" => Ok(EntityType::Customer),
            "vendor" => Ok(EntityType::Vendor),
            "product" | "item" => Ok(EntityType::Product),
            "invoice" => Ok(EntityType::Invoice),
            "estimate" => Ok(EntityType::Estimate),
            "bill" | "vendor_bill" => Ok(EntityType::Bill),
            "purchase_order" | "purchaseorder" => Ok(EntityType::PurchaseOrder),
            _ => Err(SharedError::unknown_kind("entity type", s)),
        }
    }

    /// Entity name as used by the QuickBooks API
    pub fn remote_name(&self) -> &'static str {
        match self {
            EntityType::Customer => "Customer",
            EntityType::Vendor => "Vendor",
            EntityType::Product => "Item",
            EntityType::Invoice => "Invoice",
            EntityType::Estimate => "Estimate",
            EntityType::Bill => "Bill",
            EntityType::PurchaseOrder => "PurchaseOrder",
        }
    }

    /// Table holding local id <-> remote id links for this entity type
    pub fn mapping_table(&self) -> &'static str {
        match self {
            EntityType::Customer => "customer_mappings",
            EntityType::Vendor => "vendor_mappings",
            EntityType::Product => "product_mappings",
            EntityType::Invoice => "invoice_mappings",
            EntityType::Estimate => "estimate_mappings",
            EntityType::Bill => "bill_mappings",
            EntityType::PurchaseOrder => "purchase_order_mappings",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numbered transaction documents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    Estimate,
    PurchaseOrder,
    Bill,
}

impl DocumentKind {
    pub fn from_str(s: &str) -> Result<Self, SharedError> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "invoice" | "invoices" => Ok(DocumentKind::Invoice),
            "estimate" | "estimates" => Ok(DocumentKind::Estimate),
            "purchase_order" | "purchase_orders" | "po" => Ok(DocumentKind::PurchaseOrder),
            "bill" | "bills" | "vendor_bill" => Ok(DocumentKind::Bill),
            _ => Err(SharedError::unknown_kind("document type", s)),
        }
    }

    /// Prefix used when no existing number dictates a style
    pub fn default_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "INV-",
            DocumentKind::Estimate => "EST-",
            DocumentKind::PurchaseOrder => "PO-",
            DocumentKind::Bill => "BILL-",
        }
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            DocumentKind::Invoice => EntityType::Invoice,
            DocumentKind::Estimate => EntityType::Estimate,
            DocumentKind::PurchaseOrder => EntityType::PurchaseOrder,
            DocumentKind::Bill => EntityType::Bill,
        }
    }
}
