//! Orchestration audit trail.
//!
//! Steps are only ever inserted; nothing here updates or deletes them.

use std::collections::HashMap;

use sqlx::SqlitePool;

use crate::call_log::list_call_logs;
use crate::error::{unique_violation, Result};
use crate::models::{DecisionWithCall, NewDecision, OrchestratorDecision};

/// Insert a decision step and return its ID.
pub async fn insert_decision(pool: &SqlitePool, decision: &NewDecision<'_>) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO orchestrator_decisions (
            message_id, room_id, step_order, step_type, input_data, output_data,
            llm_call_log_id, reason
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(decision.message_id)
    .bind(decision.room_id)
    .bind(decision.step_order)
    .bind(decision.step_type)
    .bind(decision.input_data)
    .bind(decision.output_data)
    .bind(decision.llm_call_log_id)
    .bind(decision.reason)
    .execute(pool)
    .await
    .map_err(|e| {
        unique_violation(
            e,
            "decision step",
            format!("{}#{}", decision.message_id, decision.step_order),
        )
    })?;

    Ok(result.last_insert_rowid())
}

/// Decision steps for a triggering turn, in step order.
pub async fn list_decisions(pool: &SqlitePool, message_id: i64) -> Result<Vec<OrchestratorDecision>> {
    let rows = sqlx::query_as::<_, OrchestratorDecision>(
        r#"
        SELECT id, message_id, room_id, step_order, step_type, input_data, output_data,
               llm_call_log_id, reason, created_at
        FROM orchestrator_decisions
        WHERE message_id = ?
        ORDER BY step_order
        "#,
    )
    .bind(message_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Highest step order recorded for a turn, or 0 if none.
pub async fn max_step_order(pool: &SqlitePool, message_id: i64) -> Result<i64> {
    let max = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(MAX(step_order), 0)
        FROM orchestrator_decisions
        WHERE message_id = ?
        "#,
    )
    .bind(message_id)
    .fetch_one(pool)
    .await?;

    Ok(max)
}

/// Decision steps for a turn, each joined with the call record it references.
pub async fn list_decisions_with_calls(
    pool: &SqlitePool,
    message_id: i64,
) -> Result<Vec<DecisionWithCall>> {
    let decisions = list_decisions(pool, message_id).await?;
    let mut calls: HashMap<i64, _> = list_call_logs(pool, message_id)
        .await?
        .into_iter()
        .map(|log| (log.id, log))
        .collect();

    Ok(decisions
        .into_iter()
        .map(|decision| {
            let llm_call = decision.llm_call_log_id.and_then(|id| calls.remove(&id));
            DecisionWithCall { decision, llm_call }
        })
        .collect())
}
