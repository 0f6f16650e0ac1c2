//! Header correction result

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reconciliation of a file's headers against canonical headers
///
/// `corrected_columns` is positional: entry `i` names file column `i`, and
/// always has the same length as `original_headers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderCorrectionResult {
    pub original_headers: Vec<String>,
    pub canonical_headers: Vec<String>,
    pub corrected_columns: Vec<String>,
    pub was_corrected: bool,
    pub changes_report: String,
}

impl HeaderCorrectionResult {
    /// Header → column index; the first column wins on duplicate names
    pub fn column_index_map(&self) -> BTreeMap<String, usize> {
        let mut map = BTreeMap::new();
        for (index, header) in self.corrected_columns.iter().enumerate() {
            map.entry(header.clone()).or_insert(index);
        }
        map
    }

    /// Canonical headers that no file column was mapped to
    pub fn unmapped_canonical(&self) -> Vec<&str> {
        self.canonical_headers
            .iter()
            .filter(|canonical| {
                !self
                    .corrected_columns
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(canonical))
            })
            .map(String::as_str)
            .collect()
    }
}
