//! Error types for orchestrator operations.

use thiserror::Error;
use troupe_database::{DatabaseError, ValidationError};

/// Errors surfaced to callers of the orchestrator.
///
/// Completion failures never appear here: selection falls back
/// deterministically and generation failures stay inside their worker.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The request was rejected before anything was written.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The room has no participant marked as the user.
    #[error("room {0} has no user participant")]
    NoUserParticipant(i64),

    /// Regenerate was requested for a room without any user turn.
    #[error("room {0} has no user message to regenerate")]
    NothingToRegenerate(i64),

    /// Persistence failed.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<ValidationError> for OrchestratorError {
    fn from(err: ValidationError) -> Self {
        OrchestratorError::InvalidInput(err.to_string())
    }
}
