//! Header Correction
//!
//! Reconciles the headers of an uploaded file against a template's canonical
//! headers. Two strategies share one contract:
//! - [`AiHeaderCorrector`]: asks an external text-completion service
//! - [`SimilarityMatcher`]: deterministic normalized-string similarity
//!
//! Whatever a strategy proposes goes through [`reconcile`], which enforces the
//! positional cardinality of `correctedColumns` and keeps every entry either a
//! canonical header or the original file header.

mod ai_corrector;
mod reply_parser;
mod similarity_matcher;

pub use ai_corrector::{AiHeaderCorrector, ChatCompletionClient, TextCompletion};
pub use reply_parser::{json_objects, parse_reply, ParsedReply};
pub use similarity_matcher::SimilarityMatcher;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::models::HeaderCorrectionResult;

/// Correction failures; all of them are batch-fatal for a preview
#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error("Correction service unreachable: {0}")]
    Transport(String),

    #[error("Correction service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Correction service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Malformed correction reply: {0}")]
    MalformedReply(String),
}

/// Header correction strategy
#[async_trait]
pub trait HeaderCorrector: Send + Sync {
    /// Strategy name for logs
    fn name(&self) -> &'static str;

    /// Map `real_headers` positionally onto `canonical_headers`
    async fn correct_columns(
        &self,
        real_headers: &[String],
        canonical_headers: &[String],
    ) -> Result<HeaderCorrectionResult, CorrectionError>;
}

/// Build a [`HeaderCorrectionResult`] from a strategy's proposal
///
/// Position `i` of the result is the canonical spelling of `proposed[i]` when
/// that entry names a canonical header (case-insensitive) not already claimed
/// by an earlier column; otherwise it is `real_headers[i]` unchanged. Missing
/// or surplus proposals are ignored, so the result always has exactly
/// `real_headers.len()` entries.
pub fn reconcile(
    real_headers: &[String],
    canonical_headers: &[String],
    proposed: &[String],
    report: Option<String>,
) -> HeaderCorrectionResult {
    let mut claimed = vec![false; canonical_headers.len()];
    let mut corrected_columns = Vec::with_capacity(real_headers.len());

    for (index, original) in real_headers.iter().enumerate() {
        let candidate = proposed.get(index).map(|p| p.trim()).unwrap_or_default();
        let matched = canonical_headers
            .iter()
            .position(|canonical| canonical.eq_ignore_ascii_case(candidate));

        match matched {
            Some(slot) if !claimed[slot] => {
                claimed[slot] = true;
                corrected_columns.push(canonical_headers[slot].clone());
            }
            _ => corrected_columns.push(original.clone()),
        }
    }

    let changes: Vec<String> = real_headers
        .iter()
        .zip(&corrected_columns)
        .filter(|(original, corrected)| original != corrected)
        .map(|(original, corrected)| format!("{} → {}", original, corrected))
        .collect();

    let overridden = proposed.len() > real_headers.len()
        || proposed
            .iter()
            .zip(&corrected_columns)
            .any(|(p, corrected)| !p.trim().eq_ignore_ascii_case(corrected));

    let was_corrected = !changes.is_empty();
    let changes_report = match report.map(|r| r.trim().to_string()) {
        Some(text) if !text.is_empty() && !overridden => text,
        _ if was_corrected => changes.join("; "),
        _ => "No changes".to_string(),
    };

    HeaderCorrectionResult {
        original_headers: real_headers.to_vec(),
        canonical_headers: canonical_headers.to_vec(),
        corrected_columns,
        was_corrected,
        changes_report,
    }
}
