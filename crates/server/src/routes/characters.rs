//! Character routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::validation::validate_character;
use database::{character, Character, CharacterInput};
use tracing::info;

use crate::error::Result;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Character>>> {
    Ok(Json(character::list_characters(state.db.pool()).await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Character>> {
    Ok(Json(character::get_character(state.db.pool(), id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CharacterInput>,
) -> Result<(StatusCode, Json<Character>)> {
    validate_character(&input)?;
    let created = character::create_character(state.db.pool(), &input).await?;
    info!(character_id = created.id, name = %created.name, "Character created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CharacterInput>,
) -> Result<Json<Character>> {
    validate_character(&input)?;
    Ok(Json(character::update_character(state.db.pool(), id, &input).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    character::delete_character(state.db.pool(), id).await?;
    info!(character_id = id, "Character deleted");
    Ok(StatusCode::NO_CONTENT)
}
