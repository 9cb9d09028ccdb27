/**
 * Backend Error Types
 *
 * This module defines the error taxonomy of the sync backend. Every sync
 * operation returns `Result<_, BackendError>`; handlers turn the error either
 * into a JSON error response or into the `{success: false}` sync envelope.
 *
 * # Error Categories
 *
 * ## Connection Errors
 *
 * - `NotConnected` - no QuickBooks company is linked; nothing will work until
 *   an operator reconnects
 * - `TokenRefreshFailed` - the OAuth endpoint rejected a refresh; worth
 *   retrying later
 *
 * ## Remote Errors
 *
 * - `RemoteApi` - QuickBooks answered with a non-2xx status
 * - `UnmappedReference` - a remote record points at something with no local
 *   counterpart (the record is skipped and reported)
 *
 * ## Infrastructure Errors
 *
 * Database, migration, HTTP transport, serialization, storage and
 * configuration failures wrap their source error.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::{ConfigError, SharedError};

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use fieldops_sync::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "missing billId");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
///
/// let err = BackendError::not_found("vendor", "42");
/// assert_eq!(err.kind(), "not_found");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// No active QuickBooks connection
    #[error("QuickBooks is not connected")]
    NotConnected,

    /// The OAuth token endpoint rejected a refresh or code exchange
    #[error("Token refresh failed ({status}): {message}")]
    TokenRefreshFailed {
        /// HTTP status returned by the token endpoint
        status: u16,
        /// Response body or transport error text
        message: String,
    },

    /// QuickBooks returned a non-success status
    #[error("QuickBooks API error ({status}): {body}")]
    RemoteApi {
        /// HTTP status returned by QuickBooks
        status: u16,
        /// Raw response body
        body: String,
    },

    /// A remote record references an entity with no local mapping
    #[error("No local {entity} mapped for '{name}'")]
    UnmappedReference {
        /// Entity kind of the missing reference ("customer", "vendor", ...)
        entity: &'static str,
        /// Remote display name or id of the reference
        name: String,
    },

    /// A local record does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind ("vendor bill", "purchase order", ...)
        entity: &'static str,
        /// Requested identifier
        id: String,
    },

    /// A request body or parameter is unusable
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Handler error with an explicit status code
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Shared error (from shared module)
    #[error(transparent)]
    Shared(#[from] SharedError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Create a not-found error for a local record
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create an invalid-request error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `NotConnected` - 409 Conflict
    /// - `TokenRefreshFailed`, `RemoteApi`, `Http` - 502 Bad Gateway
    /// - `UnmappedReference` - 422 Unprocessable Entity
    /// - `NotFound` - 404
    /// - `InvalidRequest`, validation/kind errors - 400
    /// - everything else - 500
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotConnected => StatusCode::CONFLICT,
            Self::TokenRefreshFailed { .. } | Self::RemoteApi { .. } | Self::Http(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::UnmappedReference { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::HandlerError { status, .. } => *status,
            Self::Shared(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } | SharedError::UnknownKind { .. } => {
                    StatusCode::BAD_REQUEST
                }
            },
            Self::Database(_)
            | Self::Migration(_)
            | Self::Serialization(_)
            | Self::Storage(_)
            | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::InvalidRequest(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Stable machine-readable name of the error category
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConnected => "not_connected",
            Self::TokenRefreshFailed { .. } => "token_refresh_failed",
            Self::RemoteApi { .. } => "remote_api",
            Self::UnmappedReference { .. } => "unmapped_reference",
            Self::NotFound { .. } => "not_found",
            Self::InvalidRequest(_) | Self::Shared(_) => "invalid_request",
            Self::HandlerError { .. } => "handler",
            Self::Database(_) | Self::Migration(_) => "database",
            Self::Http(_) => "http",
            Self::Serialization(_) => "serialization",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
        }
    }

    /// Whether retrying the same operation later could succeed
    ///
    /// `NotConnected` needs an operator to reconnect first, so it is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TokenRefreshFailed { .. } | Self::Http(_) => true,
            Self::RemoteApi { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
