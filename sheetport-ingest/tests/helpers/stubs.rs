//! Deterministic stand-ins for the correction collaborator

use async_trait::async_trait;
use sheetport_ingest::models::HeaderCorrectionResult;
use sheetport_ingest::services::{CorrectionError, HeaderCorrector, TextCompletion};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Completion backend returning a fixed reply
#[derive(Clone)]
pub struct FixedCompletion {
    reply: String,
    calls: Arc<AtomicUsize>,
}

impl FixedCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextCompletion for FixedCompletion {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, CorrectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Completion backend that never answers in time
pub struct SlowCompletion {
    pub delay: Duration,
}

#[async_trait]
impl TextCompletion for SlowCompletion {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, CorrectionError> {
        tokio::time::sleep(self.delay).await;
        Ok("{}".to_string())
    }
}

/// Corrector that always fails with a transport error
pub struct FailingCorrector;

#[async_trait]
impl HeaderCorrector for FailingCorrector {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn correct_columns(
        &self,
        _real_headers: &[String],
        _canonical_headers: &[String],
    ) -> Result<HeaderCorrectionResult, CorrectionError> {
        Err(CorrectionError::Transport("connection refused".to_string()))
    }
}
