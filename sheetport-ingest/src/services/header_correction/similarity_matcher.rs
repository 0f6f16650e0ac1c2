//! Deterministic header matcher
//!
//! Offline alternative to the AI corrector. Headers are normalized (lowercase,
//! accents folded, non-alphanumerics removed) and scored pairwise; pairs are
//! then assigned greedily, best score first, each side used at most once.

use async_trait::async_trait;
use strsim::jaro_winkler;

use super::{reconcile, CorrectionError, HeaderCorrector};
use crate::models::HeaderCorrectionResult;

/// Default minimum score for a match
pub const DEFAULT_THRESHOLD: f64 = 0.80;

/// Minimum normalized length for substring containment to count
const MIN_CONTAINED_LEN: usize = 3;

pub struct SimilarityMatcher {
    threshold: f64,
}

impl Default for SimilarityMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl SimilarityMatcher {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Proposed canonical name per real header; unmatched headers stay as is
    pub fn propose(&self, real_headers: &[String], canonical_headers: &[String]) -> Vec<String> {
        let real: Vec<String> = real_headers.iter().map(|h| normalize(h)).collect();
        let canonical: Vec<String> = canonical_headers.iter().map(|h| normalize(h)).collect();

        let mut candidates = Vec::new();
        for (r, real_name) in real.iter().enumerate() {
            for (c, canonical_name) in canonical.iter().enumerate() {
                let score = similarity(real_name, canonical_name);
                if score >= self.threshold {
                    candidates.push((score, r, c));
                }
            }
        }

        // Best score first; ties resolved by file order, then template order
        candidates.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });

        let mut proposal = real_headers.to_vec();
        let mut real_taken = vec![false; real_headers.len()];
        let mut canonical_taken = vec![false; canonical_headers.len()];

        for (score, r, c) in candidates {
            if real_taken[r] || canonical_taken[c] {
                continue;
            }
            real_taken[r] = true;
            canonical_taken[c] = true;
            proposal[r] = canonical_headers[c].clone();
            tracing::trace!(
                real = %real_headers[r],
                canonical = %canonical_headers[c],
                score,
                "Header matched"
            );
        }

        proposal
    }
}

#[async_trait]
impl HeaderCorrector for SimilarityMatcher {
    fn name(&self) -> &'static str {
        "similarity"
    }

    async fn correct_columns(
        &self,
        real_headers: &[String],
        canonical_headers: &[String],
    ) -> Result<HeaderCorrectionResult, CorrectionError> {
        let proposal = self.propose(real_headers, canonical_headers);
        Ok(reconcile(real_headers, canonical_headers, &proposal, None))
    }
}

/// Lowercase, fold common accents, keep only alphanumerics
fn normalize(header: &str) -> String {
    header
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Score in 0.0..=1.0
fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let containment = if short.chars().count() >= MIN_CONTAINED_LEN && long.contains(short) {
        0.8 + 0.2 * short.chars().count() as f64 / long.chars().count() as f64
    } else {
        0.0
    };

    jaro_winkler(a, b).max(containment)
}
