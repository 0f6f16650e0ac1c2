//! # Sheetport Common Library
//!
//! Shared code for the sheetport services:
//! - Error and result types
//! - TOML configuration loading
//! - Root folder resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
