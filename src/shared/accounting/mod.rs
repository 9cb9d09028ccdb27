//! Accounting Data Model
//!
//! Types describing the local side of the QuickBooks sync: which entity kinds
//! exist, how their status is spelled, the local rows the sync code touches and
//! the summaries sync operations return.

/// Entity and document kinds
pub mod entity;

/// Status vocabularies and remote-to-local status translation
pub mod status;

/// Local rows (documents, line items, mappings, sync log)
pub mod models;

/// Operation result payloads
pub mod summary;

pub use entity::{DocumentKind, EntityType};
pub use models::{
    BillAttachment, Customer, EntityMapping, Estimate, Invoice, LineItem, PurchaseOrder,
    SyncLogEntry, Vendor, VendorBill,
};
pub use status::{EstimateStatus, InvoiceStatus, MappingStatus, SyncRunStatus};
pub use summary::{AttachmentPullSummary, ConnectionStatus, ImportKind, ImportSummary, PushOutcome};
