//! Turn persistence and history queries.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{HistoryEntry, Message, MessageView};

const SELECT_VIEW: &str = r#"
    SELECT m.id, m.room_id, m.participant_id, c.name AS participant_name,
           c.avatar AS participant_avatar, m.content,
           rp.participant_type = 'ai' AS is_ai, m.created_at
    FROM messages m
    JOIN room_participants rp ON m.participant_id = rp.id
    JOIN characters c ON rp.character_id = c.id
"#;

/// Persist a new turn.
pub async fn insert_message(
    pool: &SqlitePool,
    room_id: i64,
    participant_id: i64,
    content: &str,
) -> Result<Message> {
    let result = sqlx::query(
        r#"
        INSERT INTO messages (room_id, participant_id, content)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(room_id)
    .bind(participant_id)
    .bind(content)
    .execute(pool)
    .await?;

    get_message(pool, result.last_insert_rowid()).await
}

/// Get a stored turn by ID.
pub async fn get_message(pool: &SqlitePool, id: i64) -> Result<Message> {
    sqlx::query_as::<_, Message>(
        r#"
        SELECT id, room_id, participant_id, content, created_at, updated_at
        FROM messages
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Message",
        id: id.to_string(),
    })
}

/// Get a turn joined with its author.
pub async fn get_message_view(pool: &SqlitePool, id: i64) -> Result<MessageView> {
    sqlx::query_as::<_, MessageView>(&format!("{SELECT_VIEW} WHERE m.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Message",
            id: id.to_string(),
        })
}

/// All turns of a room, oldest first.
pub async fn list_messages(pool: &SqlitePool, room_id: i64) -> Result<Vec<MessageView>> {
    let rows = sqlx::query_as::<_, MessageView>(&format!(
        "{SELECT_VIEW} WHERE m.room_id = ? ORDER BY m.id"
    ))
    .bind(room_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// The most recent `limit` turns of a room, oldest first.
pub async fn recent_history(pool: &SqlitePool, room_id: i64, limit: i64) -> Result<Vec<HistoryEntry>> {
    let mut rows = sqlx::query_as::<_, HistoryEntry>(
        r#"
        SELECT m.id AS message_id, c.name AS participant_name, rp.participant_type, m.content
        FROM messages m
        JOIN room_participants rp ON m.participant_id = rp.id
        JOIN characters c ON rp.character_id = c.id
        WHERE m.room_id = ?
        ORDER BY m.id DESC
        LIMIT ?
        "#,
    )
    .bind(room_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.reverse();
    Ok(rows)
}

/// Replace the content of a turn.
pub async fn update_message_content(pool: &SqlitePool, id: i64, content: &str) -> Result<Message> {
    let result = sqlx::query(
        r#"
        UPDATE messages
        SET content = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(content)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Message",
            id: id.to_string(),
        });
    }

    get_message(pool, id).await
}

/// Delete a turn and return what was removed.
pub async fn delete_message(pool: &SqlitePool, id: i64) -> Result<Message> {
    let message = get_message(pool, id).await?;

    sqlx::query(
        r#"
        DELETE FROM messages
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(message)
}

/// Delete every turn in a room. Returns the number of turns removed.
pub async fn clear_room(pool: &SqlitePool, room_id: i64) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM messages
        WHERE room_id = ?
        "#,
    )
    .bind(room_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// The latest turn written through the room's user participant.
pub async fn latest_user_message(pool: &SqlitePool, room_id: i64) -> Result<Option<Message>> {
    let row = sqlx::query_as::<_, Message>(
        r#"
        SELECT m.id, m.room_id, m.participant_id, m.content, m.created_at, m.updated_at
        FROM messages m
        JOIN room_participants rp ON m.participant_id = rp.id
        WHERE m.room_id = ? AND rp.is_user = 1
        ORDER BY m.id DESC
        LIMIT 1
        "#,
    )
    .bind(room_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Delete AI turns written after `after_id`. Returns the deleted IDs in order.
pub async fn delete_ai_messages_after(
    pool: &SqlitePool,
    room_id: i64,
    after_id: i64,
) -> Result<Vec<i64>> {
    let mut tx = pool.begin().await?;

    let ids = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT m.id
        FROM messages m
        JOIN room_participants rp ON m.participant_id = rp.id
        WHERE m.room_id = ? AND m.id > ? AND rp.participant_type = 'ai'
        ORDER BY m.id
        "#,
    )
    .bind(room_id)
    .bind(after_id)
    .fetch_all(&mut *tx)
    .await?;

    for id in &ids {
        sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(ids)
}
