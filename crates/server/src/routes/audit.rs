//! Decision trail for a triggering turn.

use axum::extract::{Path, State};
use axum::Json;
use database::{call_log, decision, message, DecisionWithCall, LlmCallLog};

use crate::error::Result;
use crate::state::AppState;

/// Completion calls made for a turn, oldest first.
pub async fn llm_logs(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
) -> Result<Json<Vec<LlmCallLog>>> {
    message::get_message(state.db.pool(), message_id).await?;
    Ok(Json(call_log::list_call_logs(state.db.pool(), message_id).await?))
}

/// Steps taken for a turn in step order, each with its call.
pub async fn decisions(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
) -> Result<Json<Vec<DecisionWithCall>>> {
    message::get_message(state.db.pool(), message_id).await?;
    Ok(Json(decision::list_decisions_with_calls(state.db.pool(), message_id).await?))
}
