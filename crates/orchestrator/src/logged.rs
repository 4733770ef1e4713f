//! Completion calls with an unconditional call record.

use std::sync::Arc;
use std::time::Instant;

use completion_core::{Completion, CompletionClient, CompletionError, CompletionRequest};
use tracing::{debug, warn};
use troupe_database::{call_log, NewCallLog, SqlitePool};

/// Purpose of a completion call, stored on its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    IntentAnalysis,
    FallbackSelection,
    ResponseGeneration,
}

impl CallType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::IntentAnalysis => "intent_analysis",
            CallType::FallbackSelection => "fallback_selection",
            CallType::ResponseGeneration => "response_generation",
        }
    }
}

/// Which turn a call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallScope {
    pub message_id: i64,
    pub room_id: i64,
}

/// Result of a logged call.
#[derive(Debug)]
pub struct LoggedCall {
    pub result: Result<Completion, CompletionError>,
    /// ID of the call record, if it could be written.
    pub log_id: Option<i64>,
    pub latency_ms: i64,
}

/// Wraps a completion client so every call leaves an `llm_call_logs` row.
///
/// The record is written before `complete` returns, whatever the outcome
/// of the call, and whatever the caller does afterwards.
#[derive(Clone)]
pub struct LoggedCompletion {
    client: Arc<dyn CompletionClient>,
    pool: SqlitePool,
}

impl LoggedCompletion {
    pub fn new(client: Arc<dyn CompletionClient>, pool: SqlitePool) -> Self {
        Self { client, pool }
    }

    /// Name of the wrapped backend.
    pub fn backend_name(&self) -> &str {
        self.client.name()
    }

    /// Run one completion call and record it.
    pub async fn complete(
        &self,
        scope: CallScope,
        call_type: CallType,
        request: CompletionRequest,
    ) -> LoggedCall {
        let request_body = request.to_json();
        let model = request.model.clone();
        let temperature = request.temperature;
        let max_tokens = i64::from(request.max_tokens);

        let started = Instant::now();
        let result = self.client.complete(request).await;
        let latency_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

        let error_text = result.as_ref().err().map(ToString::to_string);
        let (response_body, usage) = match &result {
            Ok(completion) => (Some(completion.content.as_str()), completion.usage.unwrap_or_default()),
            Err(_) => (None, Default::default()),
        };

        let record = NewCallLog {
            message_id: scope.message_id,
            room_id: scope.room_id,
            call_type: call_type.as_str(),
            model_name: &model,
            temperature,
            max_tokens,
            request_body: &request_body,
            response_body,
            prompt_tokens: i64::from(usage.prompt_tokens),
            completion_tokens: i64::from(usage.completion_tokens),
            latency_ms,
            error_message: error_text.as_deref(),
        };

        let log_id = match call_log::insert_call_log(&self.pool, &record).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(
                    message_id = scope.message_id,
                    call_type = call_type.as_str(),
                    error = %e,
                    "Failed to record completion call"
                );
                None
            }
        };

        debug!(
            message_id = scope.message_id,
            call_type = call_type.as_str(),
            model = %model,
            latency_ms,
            ok = result.is_ok(),
            "Completion call finished"
        );

        LoggedCall {
            result,
            log_id,
            latency_ms,
        }
    }
}
