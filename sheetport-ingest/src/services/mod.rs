//! Import pipeline services
//!
//! Leaf-first: reader, header correction, row validation, then the two
//! orchestrators composing them.

pub mod commit_orchestrator;
pub mod header_correction;
pub mod preview_orchestrator;
pub mod row_validator;
pub mod spreadsheet_reader;

pub use commit_orchestrator::CommitOrchestrator;
pub use header_correction::{
    AiHeaderCorrector, ChatCompletionClient, CorrectionError, HeaderCorrector, SimilarityMatcher,
    TextCompletion,
};
pub use preview_orchestrator::PreviewOrchestrator;
pub use row_validator::{validator_for, RowValidator};
pub use spreadsheet_reader::{ReaderError, SpreadsheetReader, UploadedFile};
