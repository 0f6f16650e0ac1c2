//! Bulk Commit Orchestrator
//!
//! Persists previously validated rows one entity at a time. A failing row is
//! recorded and the batch continues. Writes run as spawned tasks, at most
//! `concurrency` in flight, and results are collected in submission order so
//! every outcome stays attached to its row number.
//!
//! Cancelling stops further rows from being issued; writes already spawned
//! finish on their own and are still counted.

use futures::{future, stream, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::db::EntityStore;
use crate::error::ImportError;
use crate::models::{
    CommitFailure, CommitFailureReason, CommitResult, Entity, ImportSession, ImportStage,
    RowValidationVerdict,
};
use crate::templates::{get_template, ColumnTemplate};

/// Default number of concurrent storage writes
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Outcome of one row
enum RowOutcome {
    Inserted,
    Failed(CommitFailure),
}

pub struct CommitOrchestrator {
    store: Arc<dyn EntityStore>,
    concurrency: usize,
}

impl CommitOrchestrator {
    pub fn new(store: Arc<dyn EntityStore>, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Persist `rows`; individual failures never abort the batch
    pub async fn commit(
        &self,
        entity_type: &str,
        rows: Vec<RowValidationVerdict>,
    ) -> Result<CommitResult, ImportError> {
        self.commit_with_cancellation(entity_type, rows, CancellationToken::new())
            .await
    }

    /// As [`commit`](Self::commit), stopping early once `cancel` fires
    pub async fn commit_with_cancellation(
        &self,
        entity_type: &str,
        rows: Vec<RowValidationVerdict>,
        cancel: CancellationToken,
    ) -> Result<CommitResult, ImportError> {
        let template = get_template(entity_type)?;
        let mut session = ImportSession::for_commit(template.kind);
        let row_numbers: Vec<u32> = rows.iter().map(|r| r.row_number).collect();

        tracing::info!(
            session_id = %session.session_id,
            entity = %template.kind,
            rows = rows.len(),
            concurrency = self.concurrency,
            "Commit started"
        );

        let outcomes: Vec<RowOutcome> = stream::iter(rows)
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|row| self.commit_row(template, row))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut result = CommitResult::default();
        let processed = outcomes.len();
        for outcome in outcomes {
            match outcome {
                RowOutcome::Inserted => result.inserted_count += 1,
                RowOutcome::Failed(failure) => result.record_failure(failure),
            }
        }
        result.skipped_rows = row_numbers[processed..].to_vec();

        if let Err(e) = session.transition_to(ImportStage::Committed) {
            tracing::warn!(session_id = %session.session_id, error = %e, "Stage transition rejected");
        }

        if !result.skipped_rows.is_empty() {
            tracing::warn!(
                session_id = %session.session_id,
                skipped = result.skipped_rows.len(),
                "Commit cancelled before all rows were issued"
            );
        }
        tracing::info!(
            session_id = %session.session_id,
            inserted = result.inserted_count,
            failed = result.failed_rows.len(),
            skipped = result.skipped_rows.len(),
            "Commit finished"
        );

        Ok(result)
    }

    async fn commit_row(&self, template: &ColumnTemplate, row: RowValidationVerdict) -> RowOutcome {
        let row_number = row.row_number;

        if !row.is_valid {
            return failed(
                row_number,
                CommitFailureReason::NotValidated,
                "Row was not marked valid by preview".to_string(),
            );
        }

        let entity = match Entity::from_row(template, &row.row_data) {
            Ok(entity) => entity,
            Err(e) => {
                return failed(row_number, CommitFailureReason::RowConstructionFailed, e.to_string())
            }
        };

        // Spawned so an issued write completes even if this commit is dropped
        let store = Arc::clone(&self.store);
        let write = tokio::spawn(async move { store.create(entity).await });

        match write.await {
            Ok(Ok(_)) => {
                tracing::debug!(row = row_number, "Row inserted");
                RowOutcome::Inserted
            }
            Ok(Err(e)) => failed(row_number, CommitFailureReason::StorageWriteFailed, e.to_string()),
            Err(e) => failed(
                row_number,
                CommitFailureReason::StorageWriteFailed,
                format!("Write task failed: {}", e),
            ),
        }
    }
}

fn failed(row_number: u32, reason: CommitFailureReason, message: String) -> RowOutcome {
    tracing::warn!(row = row_number, reason = ?reason, error = %message, "Row not committed");
    RowOutcome::Failed(CommitFailure {
        row_number,
        reason,
        message,
    })
}
