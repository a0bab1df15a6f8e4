//! Engine error types.
//!
//! [`EngineError`] is what callers of the engine see; [`PolicyError`] never escapes a turn,
//! it only switches prompt assembly to the degraded path.

use llm_client::GenerationError;
use storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

/// Summarization attempt failed; the turn continues without a new summary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("summary generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("summary generation returned empty text")]
    EmptySummary,
}
