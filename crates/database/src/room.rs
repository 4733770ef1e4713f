//! Room CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Room, RoomInput, RoomSummary};

/// Create a new room.
pub async fn create_room(pool: &SqlitePool, input: &RoomInput) -> Result<Room> {
    let result = sqlx::query(
        r#"
        INSERT INTO rooms (name, description, setting)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.setting)
    .execute(pool)
    .await?;

    get_room(pool, result.last_insert_rowid()).await
}

/// Get a room by ID.
pub async fn get_room(pool: &SqlitePool, id: i64) -> Result<Room> {
    sqlx::query_as::<_, Room>(
        r#"
        SELECT id, name, description, setting, created_at, updated_at
        FROM rooms
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Room",
        id: id.to_string(),
    })
}

/// List rooms with participant counts and last activity, newest first.
pub async fn list_rooms(pool: &SqlitePool) -> Result<Vec<RoomSummary>> {
    let rooms = sqlx::query_as::<_, RoomSummary>(
        r#"
        SELECT r.id, r.name, r.description, r.setting, r.created_at, r.updated_at,
               (SELECT COUNT(*) FROM room_participants WHERE room_id = r.id) AS participant_count,
               (SELECT MAX(created_at) FROM messages WHERE room_id = r.id) AS last_activity
        FROM rooms r
        ORDER BY r.created_at DESC, r.id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rooms)
}

/// Update an existing room.
pub async fn update_room(pool: &SqlitePool, id: i64, input: &RoomInput) -> Result<Room> {
    let result = sqlx::query(
        r#"
        UPDATE rooms
        SET name = ?, description = ?, setting = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.setting)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Room",
            id: id.to_string(),
        });
    }

    get_room(pool, id).await
}

/// Delete a room and, through cascades, everything that belongs to it.
pub async fn delete_room(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM rooms
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Room",
            id: id.to_string(),
        });
    }

    Ok(())
}
