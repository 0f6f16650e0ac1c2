//! Import session state machine
//!
//! One session per preview or commit request:
//! UPLOADED → HEADERS_EXTRACTED → HEADERS_CORRECTED → PREVIEW_READY → COMMITTED
//!
//! FAILED is reachable only from UPLOADED and HEADERS_EXTRACTED. There is no
//! way back into HEADERS_CORRECTED short of starting a new session, so header
//! corrections are never reused across requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::templates::EntityKind;

/// Import stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStage {
    /// File received, nothing read yet
    Uploaded,
    /// Row 1 read
    HeadersExtracted,
    /// Headers reconciled against the template
    HeadersCorrected,
    /// Rows partitioned into valid/invalid
    PreviewReady,
    /// Valid rows handed to storage
    Committed,
    /// Batch-fatal error
    Failed,
}

impl ImportStage {
    pub fn can_transition_to(self, next: ImportStage) -> bool {
        use ImportStage::*;
        matches!(
            (self, next),
            (Uploaded, HeadersExtracted)
                | (Uploaded, Failed)
                | (HeadersExtracted, HeadersCorrected)
                | (HeadersExtracted, Failed)
                | (HeadersCorrected, PreviewReady)
                | (PreviewReady, Committed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ImportStage::Committed | ImportStage::Failed)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Illegal import stage transition {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: ImportStage,
    pub to: ImportStage,
}

/// Stage transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTransition {
    pub session_id: Uuid,
    pub old_stage: ImportStage,
    pub new_stage: ImportStage,
    pub transitioned_at: DateTime<Utc>,
}

/// In-memory session, owned by one request
#[derive(Debug, Clone)]
pub struct ImportSession {
    pub session_id: Uuid,
    pub entity_kind: EntityKind,
    pub stage: ImportStage,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ImportSession {
    /// Session for a freshly uploaded file
    pub fn new(entity_kind: EntityKind) -> Self {
        Self::starting_at(entity_kind, ImportStage::Uploaded)
    }

    /// Session for a commit request: the caller confirmed a prior preview
    pub fn for_commit(entity_kind: EntityKind) -> Self {
        Self::starting_at(entity_kind, ImportStage::PreviewReady)
    }

    fn starting_at(entity_kind: EntityKind, stage: ImportStage) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            entity_kind,
            stage,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn transition_to(
        &mut self,
        new_stage: ImportStage,
    ) -> Result<StageTransition, IllegalTransition> {
        if !self.stage.can_transition_to(new_stage) {
            return Err(IllegalTransition {
                from: self.stage,
                to: new_stage,
            });
        }

        let transition = StageTransition {
            session_id: self.session_id,
            old_stage: self.stage,
            new_stage,
            transitioned_at: Utc::now(),
        };
        self.stage = new_stage;

        if new_stage.is_terminal() {
            self.ended_at = Some(transition.transitioned_at);
        }

        tracing::debug!(
            session_id = %self.session_id,
            entity = %self.entity_kind,
            from = ?transition.old_stage,
            to = ?transition.new_stage,
            "Import stage transition"
        );

        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut session = ImportSession::new(EntityKind::Product);
        for stage in [
            ImportStage::HeadersExtracted,
            ImportStage::HeadersCorrected,
            ImportStage::PreviewReady,
            ImportStage::Committed,
        ] {
            session.transition_to(stage).unwrap();
        }
        assert!(session.stage.is_terminal());
        assert!(session.ended_at.is_some());
    }

    #[test]
    fn test_failure_only_from_early_stages() {
        assert!(ImportStage::Uploaded.can_transition_to(ImportStage::Failed));
        assert!(ImportStage::HeadersExtracted.can_transition_to(ImportStage::Failed));
        assert!(!ImportStage::HeadersCorrected.can_transition_to(ImportStage::Failed));
        assert!(!ImportStage::PreviewReady.can_transition_to(ImportStage::Failed));
    }

    #[test]
    fn test_cannot_reenter_headers_corrected() {
        let mut session = ImportSession::for_commit(EntityKind::Customer);
        let err = session
            .transition_to(ImportStage::HeadersCorrected)
            .unwrap_err();
        assert_eq!(err.from, ImportStage::PreviewReady);
        assert_eq!(session.stage, ImportStage::PreviewReady);
    }
}
