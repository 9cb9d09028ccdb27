//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation, CORS and tracing layers
//! └── api_routes.rs   - Sync endpoint wiring
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use fieldops_sync::backend::routes::create_router;
//!
//! let router = create_router(app_state);
//! ```

/// Main router creation
pub mod router;

/// Sync endpoint wiring
pub mod api_routes;

pub use router::create_router;
