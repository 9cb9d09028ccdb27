//! Database access
//!
//! Plain async functions over a `SqlitePool` (or any sqlx executor when the
//! call has to join a transaction). Each submodule owns one group of tables.

pub mod attachments;
pub mod directory;
pub mod documents;
pub mod line_items;
pub mod mappings;
pub mod purchasing;
pub mod sync_config;
pub mod sync_log;

pub use line_items::LineItemOwner;
pub use sync_config::SyncConfig;
