//! sheetport-ingest library interface
//!
//! Bulk spreadsheet import: template registry, reader, header correction,
//! row validation, preview and commit orchestration, plus the SQLite store
//! and HTTP boundary the binary serves.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod templates;

pub use crate::error::{ApiError, ApiResult, ImportError};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::db::EntityStore;
use crate::services::{CommitOrchestrator, HeaderCorrector, PreviewOrchestrator};

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub preview: Arc<PreviewOrchestrator>,
    pub commit: Arc<CommitOrchestrator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last batch-fatal error, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        corrector: Arc<dyn HeaderCorrector>,
        store: Arc<dyn EntityStore>,
        commit_concurrency: usize,
    ) -> Self {
        Self {
            preview: Arc::new(PreviewOrchestrator::new(corrector)),
            commit: Arc::new(CommitOrchestrator::new(store, commit_concurrency)),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::import_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
