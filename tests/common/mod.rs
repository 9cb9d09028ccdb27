//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - In-memory database and record fixtures
//! - A QuickBooks mock server built on wiremock
//! - A ready-to-use sync environment and router
//! - Custom assertion macros

pub mod database;
pub mod mock_server;

// Re-export commonly used utilities
pub use database::*;
pub use environment::*;
pub use mock_server::*;
