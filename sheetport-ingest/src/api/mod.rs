//! HTTP API handlers for sheetport-ingest

pub mod health;
pub mod import;

pub use health::health_routes;
pub use import::import_routes;
