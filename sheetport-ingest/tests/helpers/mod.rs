//! Test Helper Utilities
//!
//! Shared utilities for testing sheetport-ingest

#![allow(dead_code)]

pub mod db_utils;
pub mod fixtures;
pub mod stubs;

pub use db_utils::{create_test_store, seed_customer};
pub use fixtures::{csv_upload, product_rows, xlsx_upload};
pub use stubs::{FailingCorrector, FixedCompletion, SlowCompletion};
