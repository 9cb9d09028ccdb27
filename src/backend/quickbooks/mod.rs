//! QuickBooks Online integration
//!
//! - **`client`** - accounting REST API calls (query, get, create, download)
//! - **`oauth`** - token endpoint grants (refresh, authorization code)
//! - **`types`** - JSON shapes of the records the sync touches

pub mod client;
pub mod oauth;
pub mod types;

pub use client::{Connection, QuickBooksClient};
