//! Room, participant and message listing routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::validation::validate_room;
use database::{
    character, message, participant, room, MessageView, ParticipantType, Room, RoomInput,
    RoomParticipant, RoomSummary,
};
use serde::Deserialize;
use tracing::info;

use crate::error::Result;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<RoomSummary>>> {
    Ok(Json(room::list_rooms(state.db.pool()).await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Room>> {
    Ok(Json(room::get_room(state.db.pool(), id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<RoomInput>,
) -> Result<(StatusCode, Json<Room>)> {
    validate_room(&input)?;
    let created = room::create_room(state.db.pool(), &input).await?;
    info!(room_id = created.id, name = %created.name, "Room created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<RoomInput>,
) -> Result<Json<Room>> {
    validate_room(&input)?;
    Ok(Json(room::update_room(state.db.pool(), id, &input).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    room::delete_room(state.db.pool(), id).await?;
    info!(room_id = id, "Room deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_participants(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
) -> Result<Json<Vec<RoomParticipant>>> {
    room::get_room(state.db.pool(), room_id).await?;
    Ok(Json(participant::list_participants(state.db.pool(), room_id).await?))
}

/// Request to put a character into a room.
#[derive(Deserialize)]
pub struct AddParticipantRequest {
    pub character_id: i64,
    pub participant_type: ParticipantType,
    #[serde(default)]
    pub is_user: bool,
}

pub async fn add_participant(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Json(req): Json<AddParticipantRequest>,
) -> Result<(StatusCode, Json<RoomParticipant>)> {
    let pool = state.db.pool();
    room::get_room(pool, room_id).await?;
    character::get_character(pool, req.character_id).await?;

    let added =
        participant::add_participant(pool, room_id, req.character_id, req.participant_type, req.is_user)
            .await?;
    info!(
        room_id,
        participant_id = added.id,
        participant_type = req.participant_type.as_str(),
        "Participant added"
    );
    Ok((StatusCode::CREATED, Json(added)))
}

pub async fn remove_participant(
    State(state): State<AppState>,
    Path((room_id, participant_id)): Path<(i64, i64)>,
) -> Result<StatusCode> {
    participant::remove_participant(state.db.pool(), room_id, participant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_messages(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
) -> Result<Json<Vec<MessageView>>> {
    room::get_room(state.db.pool(), room_id).await?;
    Ok(Json(message::list_messages(state.db.pool(), room_id).await?))
}

/// Remove every turn in a room.
pub async fn reset(State(state): State<AppState>, Path(room_id): Path<i64>) -> Result<StatusCode> {
    room::get_room(state.db.pool(), room_id).await?;
    let removed = message::clear_room(state.db.pool(), room_id).await?;
    info!(room_id, removed, "Room chat reset");
    Ok(StatusCode::NO_CONTENT)
}
