//! Result payloads of sync operations
//!
//! These are the JSON bodies the sync endpoints hand back to the browser, so
//! field names are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::SyncRunStatus;
use crate::shared::error::SharedError;

/// What a bulk import pulls
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Invoices,
    Estimates,
    Customers,
}

impl ImportKind {
    pub fn from_str(s: &str) -> Result<Self, SharedError> {
        match s.trim().to_lowercase().as_str() {
            "invoice" | "invoices" => Ok(ImportKind::Invoices),
            "estimate" | "estimates" => Ok(ImportKind::Estimates),
            "customer" | "customers" => Ok(ImportKind::Customers),
            _ => Err(SharedError::unknown_kind("import type", s)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Invoices => "invoices",
            ImportKind::Estimates => "estimates",
            ImportKind::Customers => "customers",
        }
    }
}

/// Tally of one bulk import run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    /// Remote customer names with no local counterpart, for operator follow-up
    pub unmapped_customers: Vec<String>,
    pub status: SyncRunStatus,
}

impl Default for ImportSummary {
    fn default() -> Self {
        Self {
            imported: 0,
            updated: 0,
            skipped: 0,
            errors: Vec::new(),
            unmapped_customers: Vec::new(),
            status: SyncRunStatus::Success,
        }
    }
}

impl ImportSummary {
    /// Record an unmapped customer name once
    pub fn note_unmapped_customer(&mut self, name: &str) {
        if !self.unmapped_customers.iter().any(|n| n == name) {
            self.unmapped_customers.push(name.to_string());
        }
    }

    /// Settle the batch status from the collected errors
    pub fn finish(mut self) -> Self {
        self.status = SyncRunStatus::for_batch(self.errors.len());
        self
    }
}

/// Result of pushing one local record to QuickBooks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PushOutcome {
    pub local_id: Uuid,
    pub remote_id: String,
    /// `created`, `updated` or `already_synced`
    pub action: String,
}

/// Tally of an attachment pull
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPullSummary {
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Connection state reported to the settings screen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    pub realm_id: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
}
