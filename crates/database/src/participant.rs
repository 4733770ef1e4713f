//! Room membership operations.

use sqlx::SqlitePool;

use crate::error::{unique_violation, DatabaseError, Result};
use crate::models::{ParticipantProfile, ParticipantType, RoomParticipant};

const SELECT_PROFILE: &str = r#"
    SELECT rp.id, rp.room_id, rp.character_id, c.name, c.avatar, c.prompt,
           rp.participant_type, rp.is_user, c.model_name, c.temperature, c.max_tokens
    FROM room_participants rp
    JOIN characters c ON rp.character_id = c.id
"#;

/// Add a character to a room.
pub async fn add_participant(
    pool: &SqlitePool,
    room_id: i64,
    character_id: i64,
    participant_type: ParticipantType,
    is_user: bool,
) -> Result<RoomParticipant> {
    let result = sqlx::query(
        r#"
        INSERT INTO room_participants (room_id, character_id, participant_type, is_user)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(room_id)
    .bind(character_id)
    .bind(participant_type)
    .bind(is_user)
    .execute(pool)
    .await
    .map_err(|e| unique_violation(e, "Participant", format!("{room_id}/{character_id}")))?;

    get_participant(pool, result.last_insert_rowid()).await
}

/// Get a participant listing row by ID.
pub async fn get_participant(pool: &SqlitePool, id: i64) -> Result<RoomParticipant> {
    sqlx::query_as::<_, RoomParticipant>(
        r#"
        SELECT rp.id, rp.room_id, rp.character_id, c.name AS character_name,
               c.avatar AS character_avatar, rp.participant_type, rp.is_user, rp.created_at
        FROM room_participants rp
        JOIN characters c ON rp.character_id = c.id
        WHERE rp.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Participant",
        id: id.to_string(),
    })
}

/// List the participants of a room in join order.
pub async fn list_participants(pool: &SqlitePool, room_id: i64) -> Result<Vec<RoomParticipant>> {
    let rows = sqlx::query_as::<_, RoomParticipant>(
        r#"
        SELECT rp.id, rp.room_id, rp.character_id, c.name AS character_name,
               c.avatar AS character_avatar, rp.participant_type, rp.is_user, rp.created_at
        FROM room_participants rp
        JOIN characters c ON rp.character_id = c.id
        WHERE rp.room_id = ?
        ORDER BY rp.id
        "#,
    )
    .bind(room_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Remove a participant from a room.
pub async fn remove_participant(pool: &SqlitePool, room_id: i64, participant_id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM room_participants
        WHERE id = ? AND room_id = ?
        "#,
    )
    .bind(participant_id)
    .bind(room_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Participant",
            id: participant_id.to_string(),
        });
    }

    Ok(())
}

/// AI participants of a room with their persona and model settings, in join order.
pub async fn ai_participants(pool: &SqlitePool, room_id: i64) -> Result<Vec<ParticipantProfile>> {
    let rows = sqlx::query_as::<_, ParticipantProfile>(&format!(
        "{SELECT_PROFILE} WHERE rp.room_id = ? AND rp.participant_type = 'ai' ORDER BY rp.id"
    ))
    .bind(room_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// The participant the human user speaks through, if the room has one.
pub async fn user_participant(
    pool: &SqlitePool,
    room_id: i64,
) -> Result<Option<ParticipantProfile>> {
    let row = sqlx::query_as::<_, ParticipantProfile>(&format!(
        "{SELECT_PROFILE} WHERE rp.room_id = ? AND rp.is_user = 1 ORDER BY rp.id LIMIT 1"
    ))
    .bind(room_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
