//! Service wiring from configuration
//!
//! Loading and validation live in `sheetport_common::config`; this module
//! turns the validated `[correction]` section into a header corrector.

use sheetport_common::config::{CorrectionConfig, CorrectionStrategy};
use sheetport_common::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::services::header_correction::{
    AiHeaderCorrector, ChatCompletionClient, HeaderCorrector, SimilarityMatcher,
};

/// Build the configured header corrector
pub fn build_corrector(config: &CorrectionConfig) -> Result<Arc<dyn HeaderCorrector>> {
    match config.effective_strategy() {
        CorrectionStrategy::Similarity => {
            tracing::info!(
                threshold = config.similarity_threshold,
                "Header correction: similarity matcher"
            );
            Ok(Arc::new(SimilarityMatcher::new(config.similarity_threshold)))
        }
        CorrectionStrategy::Ai => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                Error::Config("correction.strategy = \"ai\" requires correction.endpoint".into())
            })?;
            let timeout = Duration::from_secs(config.timeout_secs);

            let client =
                ChatCompletionClient::new(endpoint, &config.model, config.resolve_api_key(), timeout)
                    .map_err(|e| Error::Config(format!("AI client setup failed: {}", e)))?;

            tracing::info!(
                endpoint = %endpoint,
                model = %config.model,
                timeout_secs = config.timeout_secs,
                "Header correction: AI service"
            );
            Ok(Arc::new(AiHeaderCorrector::new(client, timeout, config.max_tokens)))
        }
    }
}
