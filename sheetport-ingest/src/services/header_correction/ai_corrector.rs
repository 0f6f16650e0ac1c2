//! AI-backed header correction
//!
//! One completion request per import covering every header. The request is
//! bounded by a timeout and never retried here; the caller owns retry policy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::{reconcile, reply_parser::parse_reply, CorrectionError, HeaderCorrector};
use crate::models::HeaderCorrectionResult;

const USER_AGENT: &str = concat!("sheetport-ingest/", env!("CARGO_PKG_VERSION"));

/// Text-completion backend
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Complete `prompt` with at most `max_tokens` tokens of output
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, CorrectionError>;
}

/// Chat-completions request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint
pub struct ChatCompletionClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatCompletionClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CorrectionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| CorrectionError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }
}

#[async_trait]
impl TextCompletion for ChatCompletionClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, CorrectionError> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens,
            temperature: 0.0,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut request = self.http_client.post(self.completions_url()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!(url = %self.completions_url(), model = %self.model, "Requesting header correction");

        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CorrectionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| CorrectionError::MalformedReply(e.to_string()))?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CorrectionError::MalformedReply("reply has no message content".to_string()))
    }
}

fn map_transport_error(err: reqwest::Error) -> CorrectionError {
    if err.is_timeout() {
        CorrectionError::Timeout(Duration::ZERO)
    } else {
        CorrectionError::Transport(err.to_string())
    }
}

/// Header corrector delegating the matching to a [`TextCompletion`] backend
pub struct AiHeaderCorrector<C> {
    backend: C,
    timeout: Duration,
    max_tokens: u32,
}

impl<C: TextCompletion> AiHeaderCorrector<C> {
    pub fn new(backend: C, timeout: Duration, max_tokens: u32) -> Self {
        Self {
            backend,
            timeout,
            max_tokens,
        }
    }
}

#[async_trait]
impl<C: TextCompletion> HeaderCorrector for AiHeaderCorrector<C> {
    fn name(&self) -> &'static str {
        "ai"
    }

    async fn correct_columns(
        &self,
        real_headers: &[String],
        canonical_headers: &[String],
    ) -> Result<HeaderCorrectionResult, CorrectionError> {
        let prompt = build_prompt(real_headers, canonical_headers);

        let raw = tokio::time::timeout(self.timeout, self.backend.complete(&prompt, self.max_tokens))
            .await
            .map_err(|_| CorrectionError::Timeout(self.timeout))?
            .map_err(|e| match e {
                CorrectionError::Timeout(_) => CorrectionError::Timeout(self.timeout),
                other => other,
            })?;

        let reply = parse_reply(&raw)?;
        if reply.columns.len() != real_headers.len() {
            tracing::warn!(
                expected = real_headers.len(),
                received = reply.columns.len(),
                "Correction reply has wrong column count, reconciling positionally"
            );
        }

        let result = reconcile(real_headers, canonical_headers, &reply.columns, reply.changes_report);
        if reply.was_corrected.is_some_and(|claimed| claimed != result.was_corrected) {
            tracing::debug!(
                claimed = ?reply.was_corrected,
                derived = result.was_corrected,
                "Ignoring wasCorrected flag from reply"
            );
        }

        Ok(result)
    }
}

/// Instruction sent to the completion service
pub(crate) fn build_prompt(real_headers: &[String], canonical_headers: &[String]) -> String {
    let real = json!(real_headers);
    let canonical = json!(canonical_headers);

    format!(
        "You map spreadsheet column headers onto a fixed schema.\n\
         Spreadsheet headers, in file order: {real}\n\
         Canonical headers: {canonical}\n\n\
         For each spreadsheet header, in the same order, give the canonical header it \
         corresponds to, tolerating differences in casing, accents, spacing and abbreviations. \
         If a header matches nothing, repeat it unchanged. Use each canonical header at most once.\n\
         correctedColumns must contain exactly {count} entries.\n\n\
         Reply with a single JSON object and nothing else:\n\
         {{\"correctedColumns\": [...], \"wasCorrected\": true|false, \"changesReport\": \"...\"}}",
        count = real_headers.len(),
    )
}
