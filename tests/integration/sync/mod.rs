//! Sync operation tests

mod attachments_test;
mod importer_test;
mod token_test;
