//! Error types for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::{DatabaseError, ValidationError};
use orchestrator::OrchestratorError;
use thiserror::Error;

/// Errors returned by handlers.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Database error.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Orchestration rejected the request.
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    /// Field validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),
}

fn database_status(err: &DatabaseError) -> StatusCode {
    match err {
        DatabaseError::NotFound { .. } => StatusCode::NOT_FOUND,
        DatabaseError::AlreadyExists { .. } | DatabaseError::InUse { .. } => StatusCode::CONFLICT,
        DatabaseError::Sqlx(_) | DatabaseError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Database(err) => database_status(err),
            ServerError::Orchestrator(err) => match err {
                OrchestratorError::InvalidInput(_) | OrchestratorError::NoUserParticipant(_) => {
                    StatusCode::BAD_REQUEST
                }
                OrchestratorError::NothingToRegenerate(_) => StatusCode::NOT_FOUND,
                OrchestratorError::Database(err) => database_status(err),
            },
            ServerError::Validation(_) | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ServerError>;
