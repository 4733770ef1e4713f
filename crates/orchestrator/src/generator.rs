//! One reply from one character.

use std::sync::Arc;

use broadcaster::{LiveBroadcaster, RoomEvent};
use completion_core::{ChatMessage, CompletionError, CompletionRequest};
use serde_json::json;
use tracing::{error, info, warn};
use troupe_database::{message, MessageView, ParticipantProfile, SqlitePool};

use crate::context::build_context;
use crate::logged::{CallScope, CallType, LoggedCompletion};
use crate::recorder::{DecisionRecorder, StepType};

/// Shown when a room has no setting.
pub const NO_SETTING: &str = "No specific setting defined.";

/// Shown when a room has no user participant.
pub const NO_USER_PERSONA: &str = "A user is speaking to you.";

/// Room-level facts shared by every reply to one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    pub setting: String,
    /// Name and persona of the character the human plays.
    pub user: Option<(String, String)>,
}

/// System prompt for one character.
pub fn system_prompt(participant: &ParticipantProfile, scene: &Scene) -> String {
    let setting = if scene.setting.trim().is_empty() {
        NO_SETTING
    } else {
        scene.setting.as_str()
    };
    let user = match &scene.user {
        Some((name, persona)) => format!("Name: {}\n{}", name, persona),
        None => NO_USER_PERSONA.to_string(),
    };

    format!(
        "[AI Persona]\nYou are {}.\n{}\n\n[Setting]\n{}\n\n[User Persona]\n{}",
        participant.name, participant.prompt, setting, user
    )
}

/// What happened for one responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// A reply was persisted and published.
    Generated {
        participant_id: i64,
        message: MessageView,
    },
    /// No reply was persisted.
    Failed { participant_id: i64, error: String },
}

impl Generation {
    pub fn participant_id(&self) -> i64 {
        match self {
            Generation::Generated { participant_id, .. } | Generation::Failed { participant_id, .. } => {
                *participant_id
            }
        }
    }
}

/// Produces replies for one triggering turn.
///
/// Shared by the turn's workers; each call to [`generate`](Self::generate)
/// is independent of the others.
pub struct ResponseGenerator {
    pub(crate) pool: SqlitePool,
    pub(crate) completion: LoggedCompletion,
    pub(crate) broadcaster: LiveBroadcaster,
    pub(crate) recorder: Arc<DecisionRecorder>,
    pub(crate) scene: Scene,
    pub(crate) scope: CallScope,
    pub(crate) history_limit: i64,
}

impl ResponseGenerator {
    /// Generate, persist and publish one character's reply.
    ///
    /// Failures are recorded and returned, never retried.
    pub async fn generate(&self, participant: &ParticipantProfile) -> Generation {
        let step_input = json!({
            "character_id": participant.id,
            "character_name": participant.name,
            "model": participant.model_name,
        });

        let context = match build_context(
            &self.pool,
            self.scope.room_id,
            &participant.name,
            self.history_limit,
        )
        .await
        {
            Ok(context) => context,
            Err(e) => {
                return self
                    .fail(participant, step_input, None, format!("context unavailable: {e}"))
                    .await;
            }
        };

        let mut messages = Vec::with_capacity(context.len() + 1);
        messages.push(ChatMessage::system(system_prompt(participant, &self.scene)));
        messages.extend(context);

        let request = CompletionRequest::new(
            participant.model_name.clone(),
            messages,
            participant.temperature,
            u32::try_from(participant.max_tokens.max(1)).unwrap_or(u32::MAX),
        );

        let call = self
            .completion
            .complete(self.scope, CallType::ResponseGeneration, request)
            .await;

        let content = match call.result {
            Ok(completion) if !completion.content.trim().is_empty() => completion.content,
            Ok(_) => {
                return self
                    .fail(participant, step_input, call.log_id, CompletionError::Empty.to_string())
                    .await;
            }
            Err(e) => {
                return self.fail(participant, step_input, call.log_id, e.to_string()).await;
            }
        };

        let stored = match message::insert_message(
            &self.pool,
            self.scope.room_id,
            participant.id,
            &content,
        )
        .await
        {
            Ok(stored) => stored,
            Err(e) => {
                error!(
                    room_id = self.scope.room_id,
                    participant_id = participant.id,
                    error = %e,
                    "Failed to store reply"
                );
                self.recorder
                    .record(
                        StepType::ResponseGeneration,
                        step_input,
                        json!({
                            "status": "store_failed",
                            "content_length": content.chars().count(),
                            "error": e.to_string(),
                        }),
                        call.log_id,
                        "reply generated but not stored",
                    )
                    .await;
                return Generation::Failed {
                    participant_id: participant.id,
                    error: e.to_string(),
                };
            }
        };

        let view = MessageView {
            id: stored.id,
            room_id: stored.room_id,
            participant_id: participant.id,
            participant_name: participant.name.clone(),
            participant_avatar: participant.avatar.clone(),
            content: stored.content,
            is_ai: true,
            created_at: stored.created_at,
        };

        self.broadcaster.publish(
            self.scope.room_id,
            RoomEvent::Message {
                message: view.clone(),
            },
        );

        self.recorder
            .record(
                StepType::ResponseGeneration,
                step_input,
                json!({
                    "status": "generated",
                    "content_length": view.content.chars().count(),
                    "message_id": view.id,
                }),
                call.log_id,
                "reply generated",
            )
            .await;

        info!(
            room_id = self.scope.room_id,
            participant_id = participant.id,
            message_id = view.id,
            latency_ms = call.latency_ms,
            "Reply published"
        );

        Generation::Generated {
            participant_id: participant.id,
            message: view,
        }
    }

    async fn fail(
        &self,
        participant: &ParticipantProfile,
        step_input: serde_json::Value,
        call_ref: Option<i64>,
        error: String,
    ) -> Generation {
        warn!(
            room_id = self.scope.room_id,
            participant_id = participant.id,
            error = %error,
            "Reply generation failed"
        );

        self.recorder
            .record(
                StepType::ResponseGeneration,
                step_input,
                json!({ "status": "failed", "content_length": 0, "error": error }),
                call_ref,
                "reply generation failed",
            )
            .await;

        Generation::Failed {
            participant_id: participant.id,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::tests::profile;

    #[test]
    fn test_system_prompt_sections() {
        let alice = profile(3, "Alice");
        let scene = Scene {
            setting: "A rainy harbor town.".to_string(),
            user: Some(("Player".to_string(), "A wandering bard.".to_string())),
        };

        assert_eq!(
            system_prompt(&alice, &scene),
            "[AI Persona]\nYou are Alice.\nAlice persona\n\n\
             [Setting]\nA rainy harbor town.\n\n\
             [User Persona]\nName: Player\nA wandering bard."
        );
    }

    #[test]
    fn test_system_prompt_defaults() {
        let scene = Scene {
            setting: "  ".to_string(),
            user: None,
        };
        let prompt = system_prompt(&profile(4, "Bob"), &scene);
        assert!(prompt.contains(&format!("[Setting]\n{NO_SETTING}")));
        assert!(prompt.ends_with(&format!("[User Persona]\n{NO_USER_PERSONA}")));
    }
}
