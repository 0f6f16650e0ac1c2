//! Row-level data carried through preview and commit

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::HeaderCorrectionResult;
use crate::templates::EntityKind;

/// One spreadsheet data row keyed by corrected header name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRecord {
    /// 1-based sheet row; the header is row 1, so data starts at 2
    pub row_number: u32,
    /// Header → trimmed cell text. Missing cells are empty strings.
    pub data: BTreeMap<String, String>,
}

impl RowRecord {
    pub fn new(row_number: u32, data: BTreeMap<String, String>) -> Self {
        Self { row_number, data }
    }

    /// Cell text for a header, matched case-insensitively
    pub fn get(&self, header: &str) -> Option<&str> {
        if let Some(value) = self.data.get(header) {
            return Some(value.as_str());
        }
        self.data
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(header))
            .map(|(_, value)| value.as_str())
    }

    /// Non-blank cell text for a header
    pub fn non_empty(&self, header: &str) -> Option<&str> {
        self.get(header).map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Validation outcome for one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowValidationVerdict {
    pub row_number: u32,
    pub is_valid: bool,
    pub row_data: BTreeMap<String, String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl RowValidationVerdict {
    /// Build a verdict; validity is derived from `errors`
    pub fn from_errors(row: RowRecord, errors: Vec<String>) -> Self {
        Self {
            row_number: row.row_number,
            is_valid: errors.is_empty(),
            row_data: row.data,
            errors,
        }
    }
}

/// Partitioned preview of an upload; nothing has been persisted
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub session_id: Uuid,
    pub entity_type: EntityKind,
    pub header_correction: HeaderCorrectionResult,
    pub valid_rows: Vec<RowValidationVerdict>,
    pub invalid_rows: Vec<RowValidationVerdict>,
}

impl PreviewResult {
    pub fn total(&self) -> usize {
        self.valid_rows.len() + self.invalid_rows.len()
    }

    pub fn valid_count(&self) -> usize {
        self.valid_rows.len()
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid_rows.len()
    }
}

/// Why a row was not inserted at commit time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitFailureReason {
    /// Submitted row was not marked valid by preview
    NotValidated,
    /// Cell text could not be coerced into the entity field
    RowConstructionFailed,
    /// Storage rejected or failed the create
    StorageWriteFailed,
}

/// Per-row commit failure detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitFailure {
    pub row_number: u32,
    pub reason: CommitFailureReason,
    pub message: String,
}

/// Outcome of a bulk commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResult {
    pub inserted_count: usize,
    /// Rows attempted and failed, in submission order
    pub failed_rows: Vec<u32>,
    /// Rows never issued because the commit was cancelled
    #[serde(default)]
    pub skipped_rows: Vec<u32>,
    #[serde(default)]
    pub failures: Vec<CommitFailure>,
}

impl CommitResult {
    /// Every submitted row is accounted for exactly once
    pub fn accounted_rows(&self) -> usize {
        self.inserted_count + self.failed_rows.len() + self.skipped_rows.len()
    }

    pub(crate) fn record_failure(&mut self, failure: CommitFailure) {
        self.failed_rows.push(failure.row_number);
        self.failures.push(failure);
    }
}
