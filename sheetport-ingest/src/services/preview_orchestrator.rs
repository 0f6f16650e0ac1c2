//! Preview Orchestrator
//!
//! Reader → header correction → row validation, producing a partitioned
//! preview. Nothing is written to storage here.

use std::sync::Arc;

use crate::error::ImportError;
use crate::models::{ImportSession, ImportStage, PreviewResult};
use crate::services::header_correction::HeaderCorrector;
use crate::services::row_validator::validator_for;
use crate::services::spreadsheet_reader::{SpreadsheetReader, UploadedFile};
use crate::templates::get_template;

/// First data row; row 1 holds the headers
const FIRST_DATA_ROW: u32 = 2;

pub struct PreviewOrchestrator {
    corrector: Arc<dyn HeaderCorrector>,
}

impl PreviewOrchestrator {
    pub fn new(corrector: Arc<dyn HeaderCorrector>) -> Self {
        Self { corrector }
    }

    pub fn corrector_name(&self) -> &'static str {
        self.corrector.name()
    }

    /// Partition every data row of `file` into valid and invalid verdicts
    pub async fn preview(
        &self,
        file: &UploadedFile,
        entity_type: &str,
    ) -> Result<PreviewResult, ImportError> {
        let template = get_template(entity_type)?;
        let mut session = ImportSession::new(template.kind);

        tracing::info!(
            session_id = %session.session_id,
            entity = %template.kind,
            file_name = %file.file_name,
            bytes = file.bytes.len(),
            "Preview started"
        );

        let reader = match SpreadsheetReader::open(file) {
            Ok(reader) => reader,
            Err(e) => return Err(fail(&mut session, e.into())),
        };

        let raw_headers = reader.read_headers();
        if raw_headers.is_empty() {
            return Err(fail(
                &mut session,
                ImportError::EmptyWorksheet(format!("'{}' has no header row", file.file_name)),
            ));
        }
        advance(&mut session, ImportStage::HeadersExtracted);
        tracing::debug!(session_id = %session.session_id, headers = ?raw_headers, "Headers extracted");

        let canonical_headers = template.canonical_headers();
        let correction = match self
            .corrector
            .correct_columns(&raw_headers, &canonical_headers)
            .await
        {
            Ok(correction) => correction,
            Err(e) => return Err(fail(&mut session, ImportError::HeaderCorrectionFailed(e))),
        };
        advance(&mut session, ImportStage::HeadersCorrected);

        let unmapped = correction.unmapped_canonical();
        let unmapped_required: Vec<&str> = unmapped
            .iter()
            .copied()
            .filter(|header| template.required_headers.contains(header))
            .collect();
        if !unmapped.is_empty() {
            tracing::debug!(session_id = %session.session_id, unmapped = ?unmapped, "Canonical headers without a column");
        }
        if !unmapped_required.is_empty() {
            tracing::warn!(
                session_id = %session.session_id,
                missing = ?unmapped_required,
                "Required headers not present after correction"
            );
        }
        tracing::info!(
            session_id = %session.session_id,
            corrector = self.corrector.name(),
            was_corrected = correction.was_corrected,
            report = %correction.changes_report,
            "Headers corrected"
        );

        let rows = match reader.read_rows(&correction.corrected_columns, FIRST_DATA_ROW) {
            Ok(rows) => rows,
            Err(e) => {
                // Headers were read, so the sheet is populated; this is unexpected
                tracing::error!(session_id = %session.session_id, error = %e, "Row read failed");
                return Err(e.into());
            }
        };

        let validator = validator_for(template.kind);
        let (valid_rows, invalid_rows): (Vec<_>, Vec<_>) = rows
            .into_iter()
            .map(|row| validator.validate(row))
            .partition(|verdict| verdict.is_valid);

        advance(&mut session, ImportStage::PreviewReady);

        let result = PreviewResult {
            session_id: session.session_id,
            entity_type: template.kind,
            header_correction: correction,
            valid_rows,
            invalid_rows,
        };

        tracing::info!(
            session_id = %session.session_id,
            total = result.total(),
            valid = result.valid_count(),
            invalid = result.invalid_count(),
            "Preview ready"
        );

        Ok(result)
    }
}

fn advance(session: &mut ImportSession, stage: ImportStage) {
    if let Err(e) = session.transition_to(stage) {
        tracing::warn!(session_id = %session.session_id, error = %e, "Stage transition rejected");
    }
}

fn fail(session: &mut ImportSession, error: ImportError) -> ImportError {
    advance(session, ImportStage::Failed);
    tracing::error!(
        session_id = %session.session_id,
        code = error.code(),
        error = %error,
        "Preview failed"
    );
    error
}
