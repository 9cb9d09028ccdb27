//! Backend Module
//!
//! All server-side code of the sync service: the Axum HTTP server, the
//! QuickBooks API client and the sync operations built on it.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - server initialization, application state, database loading
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`sync`** - token manager, number reconciler, importer, exporter,
//!   webhook handler and attachment puller, plus their HTTP handlers
//! - **`quickbooks`** - REST client, OAuth token calls and wire types
//! - **`db`** - SQLite queries, one file per table group
//! - **`storage`** - attachment file store
//! - **`error`** - backend error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── sync/           - Sync operations and handlers
//! ├── quickbooks/     - QuickBooks API client
//! ├── db/             - Database access
//! ├── storage.rs      - File store
//! └── error/          - Error types
//! ```
//!
//! # Request Flow
//!
//! An HTTP trigger reaches a handler in `sync::handlers`, the token manager
//! supplies a valid bearer token, the operation talks to QuickBooks, and
//! results land in the local tables and the sync log. QuickBooks calls the
//! webhook handler on its own schedule.
//!
//! # Error Handling
//!
//! - `BackendError` for every failure, with `kind()` for the sync envelope
//! - sync endpoints answer 200 with `{success: false, error, errorKind}`
//! - other routes map `BackendError` to a status code and JSON body

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// QuickBooks synchronization
pub mod sync;

/// QuickBooks REST and OAuth client
pub mod quickbooks;

/// Database access
pub mod db;

/// Attachment file storage
pub mod storage;

/// Backend error types
pub mod error;

pub use error::BackendError;
pub use server::create_app;
pub use sync::SyncContext;
