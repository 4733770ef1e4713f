//! Turn intake and the per-turn pipeline.

use std::sync::Arc;

use broadcaster::{LiveBroadcaster, RoomEvent};
use chrono::{DateTime, Utc};
use completion_core::CompletionClient;
use serde_json::json;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};
use troupe_database::validation::validate_message_content;
use troupe_database::{
    call_log, decision, message, participant, room, settings, Database, LlmCallLog, Message,
    MessageView, OrchestratorDecision, ParticipantProfile,
};

use crate::audit::TurnAudit;
use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::generator::{Generation, ResponseGenerator, Scene};
use crate::intent::{IntentDecision, IntentSelector};
use crate::logged::{CallScope, LoggedCompletion};
use crate::mentions;
use crate::recorder::{DecisionRecorder, StepType};
use crate::selection::{merge, Provenance, Selected};

/// What a finished turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// The triggering turn.
    pub message_id: i64,
    /// Intent label from classification, if it ran and succeeded.
    pub intent: Option<String>,
    /// Final responder set, in participant order.
    pub selected: Vec<Selected>,
    /// Replies persisted and published, in completion order.
    pub generated: Vec<MessageView>,
    /// Participants whose reply failed.
    pub failed: Vec<i64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TurnOutcome {
    fn new(message_id: i64) -> Self {
        let now = Utc::now();
        Self {
            message_id,
            intent: None,
            selected: Vec::new(),
            generated: Vec::new(),
            failed: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        info!(
            message_id = self.message_id,
            selected = self.selected.len(),
            generated = self.generated.len(),
            failed = self.failed.len(),
            elapsed_ms = (self.finished_at - self.started_at).num_milliseconds(),
            "Turn finished"
        );
        self
    }
}

/// An accepted turn whose replies are being produced in the background.
#[derive(Debug)]
pub struct TurnHandle {
    /// The human turn that triggered orchestration.
    pub message: MessageView,
    /// AI turns removed before re-running (regenerate only).
    pub removed: Vec<i64>,
    /// Resolves when every reply worker has returned.
    pub task: JoinHandle<TurnOutcome>,
}

impl TurnHandle {
    /// Wait for orchestration to finish.
    pub async fn finished(self) -> Option<TurnOutcome> {
        match self.task.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(message_id = self.message.id, error = %e, "Turn task failed");
                None
            }
        }
    }
}

/// Coordinates who answers a human turn and produces their replies.
///
/// Cloning is cheap; clones share the database pool, completion client and
/// broadcaster.
#[derive(Clone)]
pub struct Orchestrator {
    db: Database,
    completion: LoggedCompletion,
    broadcaster: LiveBroadcaster,
    config: Arc<OrchestratorConfig>,
}

impl Orchestrator {
    pub fn new(
        db: Database,
        client: Arc<dyn CompletionClient>,
        broadcaster: LiveBroadcaster,
        config: OrchestratorConfig,
    ) -> Self {
        let completion = LoggedCompletion::new(client, db.pool().clone());
        info!(
            backend = completion.backend_name(),
            history_limit = config.history_limit,
            "Orchestrator ready"
        );
        Self {
            db,
            completion,
            broadcaster,
            config: Arc::new(config),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn broadcaster(&self) -> &LiveBroadcaster {
        &self.broadcaster
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Accept a human turn.
    ///
    /// Validates the request, stores the turn as the room's user
    /// participant, publishes it, and starts orchestration in the
    /// background. Nothing is written if validation fails.
    pub async fn submit_turn(&self, room_id: i64, content: &str) -> Result<TurnHandle, OrchestratorError> {
        if room_id <= 0 {
            return Err(OrchestratorError::InvalidInput(format!("malformed room id {room_id}")));
        }
        validate_message_content(content)?;

        let pool = self.db.pool();
        room::get_room(pool, room_id).await?;
        let user = participant::user_participant(pool, room_id)
            .await?
            .ok_or(OrchestratorError::NoUserParticipant(room_id))?;

        let stored = message::insert_message(pool, room_id, user.id, content.trim()).await?;
        let view = MessageView {
            id: stored.id,
            room_id,
            participant_id: user.id,
            participant_name: user.name.clone(),
            participant_avatar: user.avatar.clone(),
            content: stored.content.clone(),
            is_ai: user.is_ai(),
            created_at: stored.created_at.clone(),
        };
        self.broadcaster.publish(
            room_id,
            RoomEvent::Message {
                message: view.clone(),
            },
        );

        info!(room_id, message_id = stored.id, "Turn accepted");

        Ok(TurnHandle {
            message: view,
            removed: Vec::new(),
            task: self.dispatch(stored),
        })
    }

    /// Replace the replies to the room's latest user turn.
    ///
    /// AI turns after it are deleted (publishing `message_deleted` for each)
    /// and orchestration runs again. New decision steps continue after the
    /// turn's existing ones.
    pub async fn regenerate(&self, room_id: i64) -> Result<TurnHandle, OrchestratorError> {
        if room_id <= 0 {
            return Err(OrchestratorError::InvalidInput(format!("malformed room id {room_id}")));
        }

        let pool = self.db.pool();
        room::get_room(pool, room_id).await?;
        let turn = message::latest_user_message(pool, room_id)
            .await?
            .ok_or(OrchestratorError::NothingToRegenerate(room_id))?;

        // TODO: a turn still generating for this message can write replies after this delete.
        let removed = message::delete_ai_messages_after(pool, room_id, turn.id).await?;
        for id in &removed {
            self.broadcaster
                .publish(room_id, RoomEvent::MessageDeleted { message_id: *id });
        }

        let view = message::get_message_view(pool, turn.id).await?;
        info!(room_id, message_id = turn.id, removed = removed.len(), "Regenerating replies");

        Ok(TurnHandle {
            message: view,
            removed,
            task: self.dispatch(turn),
        })
    }

    /// Replace a turn's content and publish `message_edited`.
    pub async fn edit_message(&self, message_id: i64, content: &str) -> Result<MessageView, OrchestratorError> {
        validate_message_content(content)?;
        let pool = self.db.pool();

        let updated = message::update_message_content(pool, message_id, content.trim()).await?;
        self.broadcaster.publish(
            updated.room_id,
            RoomEvent::MessageEdited {
                message_id,
                content: updated.content.clone(),
            },
        );

        Ok(message::get_message_view(pool, message_id).await?)
    }

    /// Delete a turn and publish `message_deleted`.
    pub async fn delete_message(&self, message_id: i64) -> Result<(), OrchestratorError> {
        let removed = message::delete_message(self.db.pool(), message_id).await?;
        self.broadcaster
            .publish(removed.room_id, RoomEvent::MessageDeleted { message_id });
        Ok(())
    }

    /// Decision steps for a triggering turn, in step order.
    pub async fn decisions(&self, message_id: i64) -> Result<Vec<OrchestratorDecision>, OrchestratorError> {
        Ok(decision::list_decisions(self.db.pool(), message_id).await?)
    }

    /// Completion calls for a triggering turn, in creation order.
    pub async fn call_logs(&self, message_id: i64) -> Result<Vec<LlmCallLog>, OrchestratorError> {
        Ok(call_log::list_call_logs(self.db.pool(), message_id).await?)
    }

    /// Steps joined with their calls, plus every call.
    pub async fn audit(&self, message_id: i64) -> Result<TurnAudit, OrchestratorError> {
        Ok(TurnAudit::load(self.db.pool(), message_id).await?)
    }

    fn dispatch(&self, turn: Message) -> JoinHandle<TurnOutcome> {
        let this = self.clone();
        tokio::spawn(async move { this.run_turn(&turn).await })
    }

    /// Run the full pipeline for a stored human turn and wait for every reply.
    pub async fn run_turn(&self, turn: &Message) -> TurnOutcome {
        let pool = self.db.pool();
        let mut outcome = TurnOutcome::new(turn.id);
        let scope = CallScope {
            message_id: turn.id,
            room_id: turn.room_id,
        };
        let recorder = Arc::new(DecisionRecorder::resume(pool.clone(), turn.id, turn.room_id).await);

        let mentions = mentions::extract(&turn.content);
        recorder
            .record(
                StepType::ParseMentions,
                json!({ "user_message": turn.content }),
                json!(mentions),
                None,
                "",
            )
            .await;

        let participants = match participant::ai_participants(pool, turn.room_id).await {
            Ok(participants) => participants,
            Err(e) => {
                error!(room_id = turn.room_id, error = %e, "Failed to load participants");
                return outcome.finish();
            }
        };

        if participants.is_empty() {
            recorder
                .record(
                    StepType::CharacterSelection,
                    json!({ "all_participants": [] }),
                    json!({ "selected_ids": [], "excluded_ids": [] }),
                    None,
                    "no AI participants in room",
                )
                .await;
            return outcome.finish();
        }

        let pre = merge(
            &[],
            Provenance::DefaultAll,
            &mentions.include,
            &mentions.exclude,
            &participants,
        );
        if !mentions.include.is_empty() {
            recorder
                .record(
                    StepType::ApplyForceInclude,
                    json!({ "force_include_names": mentions.include }),
                    json!({ "added_ids": pre.forced_ids(), "final_ids": pre.ids() }),
                    None,
                    "",
                )
                .await;
        }
        if !mentions.exclude.is_empty() {
            recorder
                .record(
                    StepType::ApplyForceExclude,
                    json!({ "force_exclude_names": mentions.exclude }),
                    json!({ "removed_ids": pre.force_excluded, "final_ids": pre.ids() }),
                    None,
                    "",
                )
                .await;
        }

        let decision = if participants.len() < 2 {
            IntentDecision {
                candidates: pre.ids(),
                provenance: Provenance::DefaultAll,
                intent: None,
            }
        } else {
            let model = self.selection_model().await;
            IntentSelector::new(&self.completion, &recorder, &self.config, &model, scope)
                .select(&turn.content, &participants, &pre)
                .await
        };

        let selection = merge(
            &decision.candidates,
            decision.provenance,
            &mentions.include,
            &mentions.exclude,
            &participants,
        );
        let excluded: Vec<i64> = participants
            .iter()
            .map(|p| p.id)
            .filter(|id| !selection.contains(*id))
            .collect();
        let reason = if participants.len() < 2 {
            "single AI participant, intent analysis skipped"
        } else {
            "forced directives applied to selection"
        };
        recorder
            .record(
                StepType::CharacterSelection,
                json!({ "all_participants": participants.iter().map(|p| &p.name).collect::<Vec<_>>() }),
                json!({
                    "selected_ids": selection.ids(),
                    "excluded_ids": excluded,
                    "intent": decision.intent,
                    "selected": selection.selected,
                }),
                None,
                reason,
            )
            .await;

        info!(
            room_id = turn.room_id,
            message_id = turn.id,
            selected = ?selection.ids(),
            "Responders chosen"
        );
        outcome.intent = decision.intent;
        outcome.selected = selection.selected.clone();

        let responders: Vec<ParticipantProfile> = participants
            .into_iter()
            .filter(|p| selection.contains(p.id))
            .collect();
        if responders.is_empty() {
            return outcome.finish();
        }

        let generator = Arc::new(ResponseGenerator {
            pool: pool.clone(),
            completion: self.completion.clone(),
            broadcaster: self.broadcaster.clone(),
            recorder,
            scene: self.scene(turn.room_id).await,
            scope,
            history_limit: self.config.history_limit,
        });

        let mut workers = JoinSet::new();
        for responder in responders {
            let generator = Arc::clone(&generator);
            workers.spawn(async move { generator.generate(&responder).await });
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Generation::Generated { message, .. }) => outcome.generated.push(message),
                Ok(Generation::Failed { participant_id, .. }) => outcome.failed.push(participant_id),
                Err(e) => error!(message_id = turn.id, error = %e, "Reply worker aborted"),
            }
        }

        outcome.finish()
    }

    async fn selection_model(&self) -> String {
        match settings::get_settings(self.db.pool()).await {
            Ok(s) if !s.default_model.trim().is_empty() => s.default_model,
            Ok(_) => self.config.default_model.clone(),
            Err(e) => {
                warn!(error = %e, "Could not read settings, using default selection model");
                self.config.default_model.clone()
            }
        }
    }

    async fn scene(&self, room_id: i64) -> Scene {
        let pool = self.db.pool();
        let setting = match room::get_room(pool, room_id).await {
            Ok(room) => room.setting,
            Err(e) => {
                warn!(room_id, error = %e, "Could not load room setting");
                String::new()
            }
        };
        let user = match participant::user_participant(pool, room_id).await {
            Ok(user) => user.map(|u| (u.name, u.prompt)),
            Err(e) => {
                warn!(room_id, error = %e, "Could not load user persona");
                None
            }
        };
        Scene { setting, user }
    }
}
