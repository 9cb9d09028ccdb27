//! Test suite for fieldops-sync
//!
//! This module organizes all tests: shared helpers in `common`, sync and
//! HTTP behaviour in `integration`, generated inputs in `property`.

pub mod common;
