//! Data models for sheetport-ingest
//!
//! - Import session state machine
//! - Header correction result
//! - Row records, verdicts, preview and commit results
//! - Importable entities

pub mod entity;
pub mod header_correction;
pub mod import_session;
pub mod rows;

pub use entity::{Entity, NewCustomer, NewProduct, RowConstructionError};
pub use header_correction::HeaderCorrectionResult;
pub use import_session::{ImportSession, ImportStage, StageTransition};
pub use rows::{
    CommitFailure, CommitFailureReason, CommitResult, PreviewResult, RowRecord,
    RowValidationVerdict,
};
