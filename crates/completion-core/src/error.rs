//! Error types for completion calls.

use thiserror::Error;

/// Errors that can occur while calling a completion backend.
///
/// None of these are retried by the orchestrator; retry policy, if any,
/// belongs to the backend implementation.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The backend is misconfigured (missing key, bad endpoint, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request could not be delivered.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with an error status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The backend answered but the body was not usable.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The backend returned no choices.
    #[error("empty response from backend")]
    Empty,
}
