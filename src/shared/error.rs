//! Shared Error Types
//!
//! This module defines error types that are shared between the sync backend and
//! any client of the shared data model. These errors represent failures that do
//! not depend on the database or the remote accounting API.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - Data validation failures (bad request bodies, bad settings)
//! - `UnknownKind` - A string did not name a known entity/document/import kind
//!
//! # Usage
//!
//! ```rust
//! use fieldops_sync::shared::error::SharedError;
//!
//! let error = SharedError::validation("billId", "must be a UUID");
//! assert!(error.to_string().contains("billId"));
//! ```
use thiserror::Error;

/// Shared error types that can occur anywhere in the crate
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// A kind string (entity type, document type, import type) was not recognised
    #[error("Unknown {what}: '{value}'")]
    UnknownKind {
        /// What was being parsed ("entity type", "import type", ...)
        what: &'static str,
        /// The rejected input
        value: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new unknown-kind error
    pub fn unknown_kind(what: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownKind {
            what,
            value: value.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
