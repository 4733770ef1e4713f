//! Per-turn decision trail.

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use troupe_database::{decision, DatabaseError, NewDecision, SqlitePool};

/// Kind of orchestration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepType {
    ParseMentions,
    ApplyForceInclude,
    ApplyForceExclude,
    IntentAnalysis,
    FallbackSelection,
    CharacterSelection,
    ResponseGeneration,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::ParseMentions => "parse_mentions",
            StepType::ApplyForceInclude => "apply_force_include",
            StepType::ApplyForceExclude => "apply_force_exclude",
            StepType::IntentAnalysis => "intent_analysis",
            StepType::FallbackSelection => "fallback_selection",
            StepType::CharacterSelection => "character_selection",
            StepType::ResponseGeneration => "response_generation",
        }
    }
}

/// Records the steps taken for one triggering turn.
///
/// Step orders start after the highest order already stored for the turn
/// and advance by one per successful write, so the stored sequence has no
/// gaps even when some writes fail. Write failures are logged and dropped.
pub struct DecisionRecorder {
    pool: SqlitePool,
    message_id: i64,
    room_id: i64,
    last_order: Mutex<i64>,
}

impl DecisionRecorder {
    /// A recorder for a turn with no recorded steps.
    pub fn new(pool: SqlitePool, message_id: i64, room_id: i64) -> Self {
        Self::starting_after(pool, message_id, room_id, 0)
    }

    /// A recorder that continues after the turn's existing steps.
    pub async fn resume(pool: SqlitePool, message_id: i64, room_id: i64) -> Self {
        let last = match decision::max_step_order(&pool, message_id).await {
            Ok(last) => last,
            Err(e) => {
                warn!(message_id, error = %e, "Could not read existing steps, starting at 1");
                0
            }
        };
        Self::starting_after(pool, message_id, room_id, last)
    }

    fn starting_after(pool: SqlitePool, message_id: i64, room_id: i64, last: i64) -> Self {
        Self {
            pool,
            message_id,
            room_id,
            last_order: Mutex::new(last),
        }
    }

    pub fn message_id(&self) -> i64 {
        self.message_id
    }

    /// Persist a step. Returns its step order, or `None` if the write failed.
    pub async fn record(
        &self,
        step_type: StepType,
        input: Value,
        output: Value,
        call_ref: Option<i64>,
        reason: &str,
    ) -> Option<i64> {
        // Held across the write so orders are handed out one at a time.
        let mut last = self.last_order.lock().await;

        let input = input.to_string();
        let output = output.to_string();
        let mut step = NewDecision {
            message_id: self.message_id,
            room_id: self.room_id,
            step_order: *last + 1,
            step_type: step_type.as_str(),
            input_data: &input,
            output_data: &output,
            llm_call_log_id: call_ref,
            reason,
        };

        let mut result = decision::insert_decision(&self.pool, &step).await;

        // Another recorder for the same turn took this order; move past it once.
        if let Err(DatabaseError::AlreadyExists { .. }) = result {
            match decision::max_step_order(&self.pool, self.message_id).await {
                Ok(stored) => {
                    warn!(
                        message_id = self.message_id,
                        step_order = step.step_order,
                        stored,
                        "Step order already taken, continuing after stored steps"
                    );
                    *last = (*last).max(stored);
                    step.step_order = *last + 1;
                    result = decision::insert_decision(&self.pool, &step).await;
                }
                Err(e) => result = Err(e),
            }
        }

        match result {
            Ok(_) => {
                *last = step.step_order;
                debug!(
                    message_id = self.message_id,
                    step_order = step.step_order,
                    step_type = step_type.as_str(),
                    "Recorded decision step"
                );
                Some(step.step_order)
            }
            Err(e) => {
                warn!(
                    message_id = self.message_id,
                    step_order = step.step_order,
                    step_type = step_type.as_str(),
                    error = %e,
                    "Failed to record decision step"
                );
                None
            }
        }
    }

    /// Highest step order written by or before this recorder.
    pub async fn last_step_order(&self) -> i64 {
        *self.last_order.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use troupe_database::{character, message, participant, room, CharacterInput, Database, ParticipantType, RoomInput};

    async fn turn_fixture() -> (Database, i64, i64) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let pool = db.pool();
        let tavern = room::create_room(pool, &RoomInput::new("Tavern")).await.unwrap();
        let tester = character::create_character(pool, &CharacterInput::new("Tester", "")).await.unwrap();
        let user = participant::add_participant(pool, tavern.id, tester.id, ParticipantType::Human, true)
            .await
            .unwrap();
        let turn = message::insert_message(pool, tavern.id, user.id, "hello").await.unwrap();
        (db, tavern.id, turn.id)
    }

    #[tokio::test]
    async fn test_orders_start_at_one_and_advance() {
        let (db, room_id, message_id) = turn_fixture().await;
        let recorder = DecisionRecorder::new(db.pool().clone(), message_id, room_id);

        let first = recorder
            .record(StepType::ParseMentions, json!({}), json!({}), None, "")
            .await;
        let second = recorder
            .record(StepType::CharacterSelection, json!({}), json!({}), None, "")
            .await;

        assert_eq!((first, second), (Some(1), Some(2)));
        assert_eq!(recorder.last_step_order().await, 2);
    }

    #[tokio::test]
    async fn test_resume_continues_after_stored_steps() {
        let (db, room_id, message_id) = turn_fixture().await;
        let first = DecisionRecorder::new(db.pool().clone(), message_id, room_id);
        first.record(StepType::ParseMentions, json!({}), json!({}), None, "").await;

        let resumed = DecisionRecorder::resume(db.pool().clone(), message_id, room_id).await;
        let order = resumed
            .record(StepType::ParseMentions, json!({}), json!({}), None, "")
            .await;
        assert_eq!(order, Some(2));
    }

    #[tokio::test]
    async fn test_concurrent_recorders_for_one_turn_keep_writing() {
        let (db, room_id, message_id) = turn_fixture().await;
        let pool = db.pool().clone();
        let a = DecisionRecorder::resume(pool.clone(), message_id, room_id).await;
        let b = DecisionRecorder::resume(pool.clone(), message_id, room_id).await;

        let mut from_b = Vec::new();
        for _ in 0..3 {
            a.record(StepType::ResponseGeneration, json!({}), json!({}), None, "").await;
            from_b.push(
                b.record(StepType::ResponseGeneration, json!({}), json!({}), None, "")
                    .await,
            );
        }

        assert!(from_b.iter().all(Option::is_some));
        let orders: Vec<i64> = decision::list_decisions(&pool, message_id)
            .await
            .unwrap()
            .iter()
            .map(|d| d.step_order)
            .collect();
        assert_eq!(orders, (1..=6).collect::<Vec<_>>());
    }
}
