//! Completion call records.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{LlmCallLog, NewCallLog};

const SELECT_CALL_LOG: &str = r#"
    SELECT id, message_id, room_id, call_type, model_name, temperature, max_tokens,
           request_body, response_body, prompt_tokens, completion_tokens, latency_ms,
           error_message, created_at
    FROM llm_call_logs
"#;

/// Insert a completion call record and return its ID.
pub async fn insert_call_log(pool: &SqlitePool, log: &NewCallLog<'_>) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO llm_call_logs (
            message_id, room_id, call_type, model_name, temperature, max_tokens,
            request_body, response_body, prompt_tokens, completion_tokens, latency_ms,
            error_message
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(log.message_id)
    .bind(log.room_id)
    .bind(log.call_type)
    .bind(log.model_name)
    .bind(log.temperature)
    .bind(log.max_tokens)
    .bind(log.request_body)
    .bind(log.response_body)
    .bind(log.prompt_tokens)
    .bind(log.completion_tokens)
    .bind(log.latency_ms)
    .bind(log.error_message)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Get a completion call record by ID.
pub async fn get_call_log(pool: &SqlitePool, id: i64) -> Result<LlmCallLog> {
    sqlx::query_as::<_, LlmCallLog>(&format!("{SELECT_CALL_LOG} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "LlmCallLog",
            id: id.to_string(),
        })
}

/// Completion calls made for a triggering turn, in creation order.
pub async fn list_call_logs(pool: &SqlitePool, message_id: i64) -> Result<Vec<LlmCallLog>> {
    let rows = sqlx::query_as::<_, LlmCallLog>(&format!(
        "{SELECT_CALL_LOG} WHERE message_id = ? ORDER BY created_at, id"
    ))
    .bind(message_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
