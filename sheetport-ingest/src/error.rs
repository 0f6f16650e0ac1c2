//! Error types for sheetport-ingest
//!
//! Two layers:
//! - [`ImportError`]: the batch-fatal pipeline failures. Any of these aborts a
//!   preview before a single row is examined.
//! - [`ApiError`]: the one place where results are mapped to HTTP status codes.
//!
//! Row-scoped failures are not errors here; they are recorded in
//! `RowValidationVerdict::errors` and `CommitResult::failures`.

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::header_correction::CorrectionError;
use crate::services::spreadsheet_reader::ReaderError;

/// Batch-fatal import failure
#[derive(Debug, Error)]
pub enum ImportError {
    /// No column template registered for the entity type
    #[error("Unknown entity type: '{0}'")]
    UnknownEntityType(String),

    /// File could not be opened as tabular data
    #[error("Unreadable file: {0}")]
    UnreadableFile(String),

    /// No worksheet, or a worksheet without any populated cells
    #[error("Empty worksheet: {0}")]
    EmptyWorksheet(String),

    /// Header correction failed; column mapping is unknown
    #[error("Header correction failed: {0}")]
    HeaderCorrectionFailed(#[source] CorrectionError),
}

impl ImportError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::UnknownEntityType(_) => "UNKNOWN_ENTITY_TYPE",
            ImportError::UnreadableFile(_) => "UNREADABLE_FILE",
            ImportError::EmptyWorksheet(_) => "EMPTY_WORKSHEET",
            ImportError::HeaderCorrectionFailed(_) => "HEADER_CORRECTION_FAILED",
        }
    }
}

impl From<ReaderError> for ImportError {
    fn from(err: ReaderError) -> Self {
        match err {
            ReaderError::UnreadableFile { .. } => ImportError::UnreadableFile(err.to_string()),
            ReaderError::EmptyWorksheet(_) => ImportError::EmptyWorksheet(err.to_string()),
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Pipeline failure, status depends on the variant
    #[error(transparent)]
    Import(#[from] ImportError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(format!("Invalid multipart body: {}", rejection.body_text()))
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Import(err) => {
                let status = match err {
                    ImportError::UnknownEntityType(_) => StatusCode::BAD_REQUEST,
                    ImportError::UnreadableFile(_) | ImportError::EmptyWorksheet(_) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    ImportError::HeaderCorrectionFailed(_) => StatusCode::BAD_GATEWAY,
                };
                (status, err.code())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
