//! Read side of the decision trail.

use troupe_database::{call_log, decision, DecisionWithCall, LlmCallLog, Result, SqlitePool};

use crate::recorder::StepType;

/// Everything recorded for one triggering turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnAudit {
    pub message_id: i64,
    /// Steps in step order, each with the call it references.
    pub decisions: Vec<DecisionWithCall>,
    /// Calls in creation order.
    pub call_logs: Vec<LlmCallLog>,
}

impl TurnAudit {
    pub async fn load(pool: &SqlitePool, message_id: i64) -> Result<Self> {
        Ok(Self {
            message_id,
            decisions: decision::list_decisions_with_calls(pool, message_id).await?,
            call_logs: call_log::list_call_logs(pool, message_id).await?,
        })
    }

    /// Whether step orders run 1, 2, 3, ... without gaps.
    pub fn is_contiguous(&self) -> bool {
        self.decisions
            .iter()
            .zip(1..)
            .all(|(d, expected)| d.decision.step_order == expected)
    }

    /// Steps of one type, in step order.
    pub fn steps(&self, step_type: StepType) -> impl Iterator<Item = &DecisionWithCall> {
        self.decisions
            .iter()
            .filter(move |d| d.decision.step_type == step_type.as_str())
    }

    /// Calls of one type, in creation order.
    pub fn calls(&self, call_type: &str) -> impl Iterator<Item = &LlmCallLog> + '_ {
        let call_type = call_type.to_string();
        self.call_logs.iter().filter(move |c| c.call_type == call_type)
    }
}
