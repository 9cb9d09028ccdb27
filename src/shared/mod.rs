//! Shared Module
//!
//! This module contains types and logic that do not depend on the server
//! stack: the accounting data model, the document number reconciler,
//! settings and shared error types. Everything here is plain data or pure
//! functions and can be used from any client of the crate.

/// Accounting data model (entities, statuses, records, summaries)
pub mod accounting;

/// Document number reconciliation
pub mod numbering;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use error::SharedError;
pub use config::{ConfigError, Settings, SettingsBuilder};
pub use numbering::extract_next_number;
