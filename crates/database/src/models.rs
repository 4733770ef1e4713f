//! Database models.
//!
//! Timestamps are stored as RFC 3339 UTC text with millisecond precision.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Whether a room participant is driven by a model or a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ParticipantType {
    Ai,
    Human,
}

impl ParticipantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantType::Ai => "ai",
            ParticipantType::Human => "human",
        }
    }
}

/// A reusable persona definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Character {
    pub id: i64,
    /// Display name, e.g. "Dr. Alice Smith".
    pub name: String,
    pub avatar: String,
    /// Persona text injected into the system prompt.
    pub prompt: String,
    pub is_user_playable: bool,
    pub model_name: String,
    pub temperature: f64,
    pub max_tokens: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields accepted when creating or updating a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterInput {
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub is_user_playable: bool,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i64,
}

fn default_model_name() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> i64 {
    1000
}

impl CharacterInput {
    /// Input with defaults for everything except the name and persona.
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: String::new(),
            prompt: prompt.into(),
            is_user_playable: false,
            model_name: default_model_name(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// A conversation space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Scene description shared by every AI participant.
    pub setting: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Room listing row with activity information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RoomSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub room: Room,
    pub participant_count: i64,
    /// Timestamp of the latest message, if any.
    pub last_activity: Option<String>,
}

/// Fields accepted when creating or updating a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub setting: String,
}

impl RoomInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            setting: String::new(),
        }
    }
}

/// A character's membership in a room, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RoomParticipant {
    pub id: i64,
    pub room_id: i64,
    pub character_id: i64,
    pub character_name: String,
    pub character_avatar: String,
    pub participant_type: ParticipantType,
    pub is_user: bool,
    pub created_at: String,
}

/// Everything the orchestrator needs to know about one participant.
///
/// `id` is the room participant id, which is what turns reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ParticipantProfile {
    pub id: i64,
    pub room_id: i64,
    pub character_id: i64,
    pub name: String,
    pub avatar: String,
    pub prompt: String,
    pub participant_type: ParticipantType,
    pub is_user: bool,
    pub model_name: String,
    pub temperature: f64,
    pub max_tokens: i64,
}

impl ParticipantProfile {
    pub fn is_ai(&self) -> bool {
        self.participant_type == ParticipantType::Ai
    }
}

/// A stored turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub room_id: i64,
    pub participant_id: i64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A turn joined with its author, as delivered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MessageView {
    pub id: i64,
    pub room_id: i64,
    pub participant_id: i64,
    pub participant_name: String,
    pub participant_avatar: String,
    pub content: String,
    pub is_ai: bool,
    pub created_at: String,
}

/// One prior turn used to build conversation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HistoryEntry {
    pub message_id: i64,
    pub participant_name: String,
    pub participant_type: ParticipantType,
    pub content: String,
}

/// Runtime settings for the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Settings {
    pub api_endpoint: String,
    #[serde(default)]
    pub api_key: String,
    pub default_model: String,
}

/// A record of one completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LlmCallLog {
    pub id: i64,
    /// The triggering turn.
    pub message_id: i64,
    pub room_id: i64,
    /// intent_analysis, fallback_selection or response_generation.
    pub call_type: String,
    pub model_name: String,
    pub temperature: f64,
    pub max_tokens: i64,
    pub request_body: String,
    pub response_body: Option<String>,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub latency_ms: i64,
    pub error_message: Option<String>,
    pub created_at: String,
}

/// Values for a new completion call record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCallLog<'a> {
    pub message_id: i64,
    pub room_id: i64,
    pub call_type: &'a str,
    pub model_name: &'a str,
    pub temperature: f64,
    pub max_tokens: i64,
    pub request_body: &'a str,
    pub response_body: Option<&'a str>,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub latency_ms: i64,
    pub error_message: Option<&'a str>,
}

/// One persisted orchestration step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OrchestratorDecision {
    pub id: i64,
    pub message_id: i64,
    pub room_id: i64,
    pub step_order: i64,
    pub step_type: String,
    /// JSON document.
    pub input_data: String,
    /// JSON document.
    pub output_data: String,
    pub llm_call_log_id: Option<i64>,
    pub reason: String,
    pub created_at: String,
}

/// Values for a new decision step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDecision<'a> {
    pub message_id: i64,
    pub room_id: i64,
    pub step_order: i64,
    pub step_type: &'a str,
    pub input_data: &'a str,
    pub output_data: &'a str,
    pub llm_call_log_id: Option<i64>,
    pub reason: &'a str,
}

/// A decision step with the completion call it references, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionWithCall {
    #[serde(flatten)]
    pub decision: OrchestratorDecision,
    pub llm_call: Option<LlmCallLog>,
}
