//! fieldops-sync
//!
//! Two-way QuickBooks Online synchronization for a field-services platform.
//! The service keeps local invoices, estimates, customers, vendors, purchase
//! orders and vendor bills aligned with the accounting system, tracking every
//! linked pair in per-entity mapping tables and every attempt in a sync log.
//!
//! # Module Structure
//!
//! - **`shared`** - types usable without the server stack
//!   - accounting models, statuses and sync summaries
//!   - document number reconciliation
//!   - settings and error types
//!
//! - **`backend`** - the sync service (only compiled with `ssr`)
//!   - Axum HTTP server and routes
//!   - token manager, importer, exporter, webhook handler, attachment puller
//!   - SQLite persistence via sqlx
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - enables the backend, its HTTP server and database
//!
//! # Usage
//!
//! ```rust,no_run
//! use fieldops_sync::backend::server::create_app;
//! use fieldops_sync::shared::Settings;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::from_env()?;
//! let port = settings.server_port;
//! let app = create_app(settings).await?;
//! let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! The numbering logic runs without the backend:
//!
//! ```rust
//! use fieldops_sync::shared::extract_next_number;
//!
//! assert_eq!(extract_next_number(&["INV-0041", "INV-0007"], "INV-"), "INV-0042");
//! ```

/// Types shared between the backend and other consumers
pub mod shared;

/// Server-side sync service
#[cfg(feature = "ssr")]
pub mod backend;
