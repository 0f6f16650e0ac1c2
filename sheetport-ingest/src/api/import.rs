//! Import API handlers
//!
//! GET /import/templates/:entity_type, POST /import/:entity_type/preview,
//! POST /import/:entity_type/commit

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, Path, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    models::{CommitResult, PreviewResult, RowValidationVerdict},
    services::UploadedFile,
    templates::{get_template, EntityKind},
    AppState,
};

/// Multipart field carrying the spreadsheet
pub const FILE_FIELD: &str = "file";

/// GET /import/templates response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    pub entity_type: EntityKind,
    pub canonical_headers: Vec<String>,
    pub required_fields: Vec<String>,
}

/// POST /import/:entity_type/preview response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    #[serde(flatten)]
    pub result: PreviewResult,
    pub total: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
}

impl From<PreviewResult> for PreviewResponse {
    fn from(result: PreviewResult) -> Self {
        Self {
            total: result.total(),
            valid_count: result.valid_count(),
            invalid_count: result.invalid_count(),
            result,
        }
    }
}

/// POST /import/:entity_type/commit request
#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub rows: Vec<RowValidationVerdict>,
}

/// GET /import/templates/:entity_type
///
/// Canonical headers, so users can start from a blank template.
pub async fn get_import_template(
    Path(entity_type): Path<String>,
) -> ApiResult<Json<TemplateResponse>> {
    let template = get_template(&entity_type)?;

    Ok(Json(TemplateResponse {
        entity_type: template.kind,
        canonical_headers: template.canonical_headers(),
        required_fields: template
            .required_headers
            .iter()
            .map(|h| h.to_string())
            .collect(),
    }))
}

/// POST /import/:entity_type/preview
///
/// Multipart upload with the spreadsheet in field `file`. Nothing is persisted.
pub async fn preview_import(
    State(state): State<AppState>,
    Path(entity_type): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PreviewResponse>> {
    // Reject unknown types before buffering the upload
    get_template(&entity_type)?;
    let mut multipart = multipart?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.xlsx").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some(UploadedFile::new(file_name, bytes.to_vec()));
        break;
    }

    let upload = upload.ok_or_else(|| {
        ApiError::BadRequest(format!("Multipart field '{}' is required", FILE_FIELD))
    })?;

    match state.preview.preview(&upload, &entity_type).await {
        Ok(result) => Ok(Json(result.into())),
        Err(e) => {
            *state.last_error.write().await = Some(e.to_string());
            Err(e.into())
        }
    }
}

/// POST /import/:entity_type/commit
///
/// Persists previously previewed rows; per-row failures are in the result.
pub async fn commit_import(
    State(state): State<AppState>,
    Path(entity_type): Path<String>,
    request: Result<Json<CommitRequest>, JsonRejection>,
) -> ApiResult<Json<CommitResult>> {
    let Json(request) = request?;
    let result = state.commit.commit(&entity_type, request.rows).await?;
    Ok(Json(result))
}

/// Build import routes
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/import/templates/:entity_type", get(get_import_template))
        .route("/import/:entity_type/preview", post(preview_import))
        .route("/import/:entity_type/commit", post(commit_import))
}
