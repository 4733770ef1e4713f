//! Turn submission and turn editing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::MessageView;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::AppState;

/// Request carrying turn text.
#[derive(Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

/// Reply to an accepted turn. Character replies arrive on the event stream.
#[derive(Serialize)]
pub struct TurnAccepted {
    pub status: &'static str,
    pub message: MessageView,
    /// AI turns deleted before regenerating.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<i64>,
}

pub async fn send(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Json(req): Json<ContentRequest>,
) -> Result<(StatusCode, Json<TurnAccepted>)> {
    let handle = state.orchestrator.submit_turn(room_id, &req.content).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(TurnAccepted {
            status: "message sent",
            message: handle.message,
            removed: handle.removed,
        }),
    ))
}

pub async fn regenerate(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
) -> Result<(StatusCode, Json<TurnAccepted>)> {
    let handle = state.orchestrator.regenerate(room_id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(TurnAccepted {
            status: "regenerating",
            message: handle.message,
            removed: handle.removed,
        }),
    ))
}

pub async fn edit(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    Json(req): Json<ContentRequest>,
) -> Result<Json<MessageView>> {
    Ok(Json(state.orchestrator.edit_message(message_id, &req.content).await?))
}

pub async fn delete(State(state): State<AppState>, Path(message_id): Path<i64>) -> Result<StatusCode> {
    state.orchestrator.delete_message(message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
