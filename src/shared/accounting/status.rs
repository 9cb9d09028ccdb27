//! Status vocabularies
//!
//! Mapping rows, sync runs and local documents each carry a status string in
//! the database. Remote QuickBooks state is translated into local document
//! status here and nowhere else.

use serde::{Deserialize, Serialize};

/// Status of a local <-> remote link
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MappingStatus {
    #[default]
    Synced,
    /// Deleted or voided on the remote side; the local row is kept
    Voided,
    Error,
}

impl MappingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingStatus::Synced => "synced",
            MappingStatus::Voided => "voided",
            MappingStatus::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "synced" => Some(MappingStatus::Synced),
            "voided" => Some(MappingStatus::Voided),
            "error" => Some(MappingStatus::Error),
            _ => None,
        }
    }
}

/// Outcome of one sync attempt as written to the sync log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    Success,
    /// Some records failed while others went through
    Partial,
    Failed,
    Skipped,
}

impl SyncRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncRunStatus::Success => "success",
            SyncRunStatus::Partial => "partial",
            SyncRunStatus::Failed => "failed",
            SyncRunStatus::Skipped => "skipped",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "success" => Some(SyncRunStatus::Success),
            "partial" => Some(SyncRunStatus::Partial),
            "failed" => Some(SyncRunStatus::Failed),
            "skipped" => Some(SyncRunStatus::Skipped),
            _ => None,
        }
    }

    /// Status of a batch given how many records failed
    pub fn for_batch(error_count: usize) -> Self {
        if error_count == 0 {
            SyncRunStatus::Success
        } else {
            SyncRunStatus::Partial
        }
    }
}

/// Local invoice status derived from remote balances
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Sent,
    PartiallyPaid,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Paid => "paid",
        }
    }

    /// `balance == 0 && total > 0` is paid, `0 < paid < total` is partially paid,
    /// everything else is sent.
    pub fn from_balance(total: f64, balance: f64) -> Self {
        let paid = total - balance;
        if balance == 0.0 && total > 0.0 {
            InvoiceStatus::Paid
        } else if paid > 0.0 && paid < total {
            InvoiceStatus::PartiallyPaid
        } else {
            InvoiceStatus::Sent
        }
    }
}

/// Local estimate status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EstimateStatus {
    Draft,
    Sent,
    Approved,
    Rejected,
}

impl EstimateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimateStatus::Draft => "draft",
            EstimateStatus::Sent => "sent",
            EstimateStatus::Approved => "approved",
            EstimateStatus::Rejected => "rejected",
        }
    }

    /// Translate a QuickBooks `TxnStatus`
    pub fn from_remote(txn_status: Option<&str>) -> Self {
        match txn_status.map(str::trim) {
            Some("Accepted") | Some("Closed") => EstimateStatus::Approved,
            Some("Rejected") => EstimateStatus::Rejected,
            Some("Pending") => EstimateStatus::Sent,
            _ => EstimateStatus::Draft,
        }
    }
}
