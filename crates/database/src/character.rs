//! Character CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Character, CharacterInput};

const SELECT_CHARACTER: &str = r#"
    SELECT id, name, avatar, prompt, is_user_playable, model_name, temperature,
           max_tokens, created_at, updated_at
    FROM characters
"#;

/// Create a new character.
pub async fn create_character(pool: &SqlitePool, input: &CharacterInput) -> Result<Character> {
    let result = sqlx::query(
        r#"
        INSERT INTO characters (name, avatar, prompt, is_user_playable, model_name, temperature, max_tokens)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.name)
    .bind(&input.avatar)
    .bind(&input.prompt)
    .bind(input.is_user_playable)
    .bind(&input.model_name)
    .bind(input.temperature)
    .bind(input.max_tokens)
    .execute(pool)
    .await?;

    get_character(pool, result.last_insert_rowid()).await
}

/// Get a character by ID.
pub async fn get_character(pool: &SqlitePool, id: i64) -> Result<Character> {
    sqlx::query_as::<_, Character>(&format!("{SELECT_CHARACTER} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Character",
            id: id.to_string(),
        })
}

/// List all characters, newest first.
pub async fn list_characters(pool: &SqlitePool) -> Result<Vec<Character>> {
    let characters = sqlx::query_as::<_, Character>(&format!(
        "{SELECT_CHARACTER} ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(characters)
}

/// Update an existing character.
pub async fn update_character(
    pool: &SqlitePool,
    id: i64,
    input: &CharacterInput,
) -> Result<Character> {
    let result = sqlx::query(
        r#"
        UPDATE characters
        SET name = ?, avatar = ?, prompt = ?, is_user_playable = ?, model_name = ?,
            temperature = ?, max_tokens = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(&input.name)
    .bind(&input.avatar)
    .bind(&input.prompt)
    .bind(input.is_user_playable)
    .bind(&input.model_name)
    .bind(input.temperature)
    .bind(input.max_tokens)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Character",
            id: id.to_string(),
        });
    }

    get_character(pool, id).await
}

/// Delete a character by ID.
///
/// Characters that still take part in a room are refused with `InUse`.
pub async fn delete_character(pool: &SqlitePool, id: i64) -> Result<()> {
    let rooms = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM room_participants WHERE character_id = ?
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    if rooms > 0 {
        return Err(DatabaseError::InUse {
            entity: "Character",
            id: id.to_string(),
        });
    }

    let result = sqlx::query(
        r#"
        DELETE FROM characters
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Character",
            id: id.to_string(),
        });
    }

    Ok(())
}
