//! Choosing responders with the completion service.
//!
//! The model is asked who the user is addressing. If that reply names no
//! known participant a simpler "pick the most relevant" request follows,
//! and if that also fails the first AI participant is chosen. Every ID the
//! model returns is checked against the room's participants.

use std::sync::LazyLock;

use completion_core::{hash_prompt, ChatMessage, CompletionRequest};
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use troupe_database::ParticipantProfile;

use crate::config::OrchestratorConfig;
use crate::logged::{CallScope, CallType, LoggedCompletion};
use crate::recorder::{DecisionRecorder, StepType};
use crate::selection::{Provenance, SelectionResult};

static ID_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+\b").expect("valid regex"));

/// Intent labels the classifier is asked to use.
pub const INTENT_LABELS: &[&str] = &["direct", "question", "group"];

/// Parsed intent classification reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentReply {
    /// Lowercased first word of the `intent:` line.
    pub intent: Option<String>,
    /// IDs from the `characters:` line, deduplicated, unvalidated.
    pub ids: Vec<i64>,
}

/// Candidates produced by the selection calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentDecision {
    pub candidates: Vec<i64>,
    pub provenance: Provenance,
    pub intent: Option<String>,
}

fn roster(participants: &[ParticipantProfile]) -> String {
    participants
        .iter()
        .map(|p| format!("- {} (ID: {})\n", p.name, p.id))
        .collect()
}

fn roster_json(participants: &[ParticipantProfile]) -> Value {
    participants
        .iter()
        .map(|p| json!({ "id": p.id, "name": p.name }))
        .collect()
}

/// Prompt for the intent classification call.
pub fn intent_prompt(
    participants: &[ParticipantProfile],
    user_message: &str,
    forced: &[&ParticipantProfile],
) -> String {
    let mut prompt = format!(
        "You are deciding which characters in a group chat should answer the user's latest message.\n\n\
         Characters:\n{}\n\
         User message: \"{}\"\n",
        roster(participants),
        user_message
    );

    if !forced.is_empty() {
        let names: Vec<String> = forced.iter().map(|p| format!("{} (ID: {})", p.name, p.id)).collect();
        prompt.push_str(&format!(
            "\nThe user explicitly called on {}. They will answer anyway; decide who else, if anyone, should reply.\n",
            names.join(", ")
        ));
    }

    prompt.push_str(
        "\nClassify how the user is addressing the room:\n\
         - direct: speaking to one or more specific characters (\"Alice, how are you?\")\n\
         - question: asking something one character is best placed to answer\n\
         - group: speaking to everyone (\"How is everyone?\")\n\n\
         A name used only as a reference or comparison does not mean that character should reply. \
         In \"You are like Alice, aren't you?\" the user is talking to someone else about Alice.\n\n\
         Answer in exactly this format:\n\
         INTENT: direct | question | group\n\
         CHARACTERS: comma-separated IDs, or none",
    );

    prompt
}

/// Prompt for the fallback selection call.
pub fn fallback_prompt(participants: &[ParticipantProfile], user_message: &str) -> String {
    format!(
        "Pick the 1-2 characters best suited to reply to: \"{}\"\n\n\
         Characters:\n{}\n\
         Reply with IDs only, for example: 3 or 3,4",
        user_message,
        roster(participants)
    )
}

/// Value of a `key: value` line, ignoring case and light markdown.
fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let (head, rest) = line.split_once(':')?;
    let head = head.trim_matches(|c: char| !c.is_alphanumeric());
    head.eq_ignore_ascii_case(key)
        .then(|| rest.trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '_' | '`')))
}

/// Integer tokens in `text`, deduplicated, in order of appearance.
pub fn parse_id_list(text: &str) -> Vec<i64> {
    let mut ids = Vec::new();
    for id in ID_TOKEN.find_iter(text).filter_map(|m| m.as_str().parse::<i64>().ok()) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Parse an intent classification reply.
///
/// The `intent:` and `characters:` lines are read independently, in any
/// order and any case. Missing lines leave the field empty.
pub fn parse_intent_reply(text: &str) -> IntentReply {
    let mut reply = IntentReply::default();

    for line in text.lines() {
        if let Some(value) = field(line, "intent") {
            reply.intent = value
                .split(|c: char| !c.is_alphabetic())
                .find(|w| !w.is_empty())
                .map(str::to_lowercase);
        } else if let Some(value) = field(line, "characters") {
            if !value.to_lowercase().starts_with("none") {
                reply.ids = parse_id_list(value);
            }
        }
    }

    reply
}

/// Keep the IDs that belong to known participants.
pub fn validate_ids(ids: &[i64], participants: &[ParticipantProfile]) -> Vec<i64> {
    ids.iter()
        .copied()
        .filter(|id| participants.iter().any(|p| p.id == *id))
        .collect()
}

/// Runs the selection calls for one turn.
pub struct IntentSelector<'a> {
    completion: &'a LoggedCompletion,
    recorder: &'a DecisionRecorder,
    config: &'a OrchestratorConfig,
    model: &'a str,
    scope: CallScope,
}

impl<'a> IntentSelector<'a> {
    pub fn new(
        completion: &'a LoggedCompletion,
        recorder: &'a DecisionRecorder,
        config: &'a OrchestratorConfig,
        model: &'a str,
        scope: CallScope,
    ) -> Self {
        Self {
            completion,
            recorder,
            config,
            model,
            scope,
        }
    }

    fn request(&self, prompt: String, max_tokens: u32) -> CompletionRequest {
        CompletionRequest::new(
            self.model,
            vec![ChatMessage::system(prompt)],
            self.config.intent_temperature,
            max_tokens,
        )
    }

    /// Choose candidate responders. Never fails; the worst case is the
    /// first participant.
    ///
    /// `seed` is the directive pass over all participants; its forced
    /// includes that survived exclusion are named in the prompt.
    pub async fn select(
        &self,
        user_message: &str,
        participants: &[ParticipantProfile],
        seed: &SelectionResult,
    ) -> IntentDecision {
        if participants.is_empty() {
            return IntentDecision {
                candidates: Vec::new(),
                provenance: Provenance::DefaultAll,
                intent: None,
            };
        }

        let forced_ids = seed.forced_ids();
        let forced: Vec<&ParticipantProfile> =
            participants.iter().filter(|p| forced_ids.contains(&p.id)).collect();

        let prompt = intent_prompt(participants, user_message, &forced);
        debug!(
            message_id = self.scope.message_id,
            prompt_hash = %hash_prompt(&prompt),
            "Intent prompt"
        );

        let input = json!({
            "user_message": user_message,
            "available_chars": roster_json(participants),
            "force_include": forced.iter().map(|p| p.id).collect::<Vec<_>>(),
        });

        let call = self
            .completion
            .complete(
                self.scope,
                CallType::IntentAnalysis,
                self.request(prompt, self.config.intent_max_tokens),
            )
            .await;

        let completion = match call.result {
            Ok(completion) => completion,
            Err(e) => {
                warn!(message_id = self.scope.message_id, error = %e, "Intent analysis call failed");
                self.recorder
                    .record(
                        StepType::IntentAnalysis,
                        input,
                        json!({ "intent": null, "raw_response": null, "selected_ids": [], "error": e.to_string() }),
                        call.log_id,
                        "intent call failed",
                    )
                    .await;
                return self.first_participant(participants, "intent call failed").await;
            }
        };

        let reply = parse_intent_reply(&completion.content);
        let selected = validate_ids(&reply.ids, participants);
        let reason = if !selected.is_empty() {
            format!("intent classified as {}", reply.intent.as_deref().unwrap_or("unknown"))
        } else if reply.ids.is_empty() {
            "no character IDs in intent reply".to_string()
        } else {
            "intent reply named only unknown IDs".to_string()
        };

        self.recorder
            .record(
                StepType::IntentAnalysis,
                input,
                json!({
                    "intent": reply.intent,
                    "raw_response": completion.content,
                    "parsed_ids": reply.ids,
                    "selected_ids": selected,
                }),
                call.log_id,
                &reason,
            )
            .await;

        if !selected.is_empty() {
            info!(
                message_id = self.scope.message_id,
                intent = reply.intent.as_deref().unwrap_or("unknown"),
                selected = ?selected,
                "Intent selection"
            );
            return IntentDecision {
                candidates: selected,
                provenance: Provenance::IntentSelected,
                intent: reply.intent,
            };
        }

        self.fallback(user_message, participants).await
    }

    async fn fallback(&self, user_message: &str, participants: &[ParticipantProfile]) -> IntentDecision {
        let input = json!({
            "user_message": user_message,
            "available_chars": roster_json(participants),
        });

        let call = self
            .completion
            .complete(
                self.scope,
                CallType::FallbackSelection,
                self.request(
                    fallback_prompt(participants, user_message),
                    self.config.fallback_max_tokens,
                ),
            )
            .await;

        let completion = match call.result {
            Ok(completion) => completion,
            Err(e) => {
                warn!(message_id = self.scope.message_id, error = %e, "Fallback selection call failed");
                self.recorder
                    .record(
                        StepType::FallbackSelection,
                        input,
                        json!({ "raw_response": null, "selected_ids": [], "error": e.to_string() }),
                        call.log_id,
                        "fallback call failed",
                    )
                    .await;
                return self.first_participant(participants, "fallback call failed").await;
            }
        };

        let parsed = parse_id_list(&completion.content);
        let selected = validate_ids(&parsed, participants);
        let reason = if selected.is_empty() {
            "no known character IDs in fallback reply"
        } else {
            "fallback selection"
        };

        self.recorder
            .record(
                StepType::FallbackSelection,
                input,
                json!({
                    "raw_response": completion.content,
                    "parsed_ids": parsed,
                    "selected_ids": selected,
                }),
                call.log_id,
                reason,
            )
            .await;

        if selected.is_empty() {
            return self.first_participant(participants, "fallback reply unusable").await;
        }

        info!(message_id = self.scope.message_id, selected = ?selected, "Fallback selection");
        IntentDecision {
            candidates: selected,
            provenance: Provenance::FallbackSelected,
            intent: None,
        }
    }

    async fn first_participant(&self, participants: &[ParticipantProfile], cause: &str) -> IntentDecision {
        let candidates: Vec<i64> = participants.iter().take(1).map(|p| p.id).collect();

        self.recorder
            .record(
                StepType::FallbackSelection,
                json!({ "available_chars": roster_json(participants), "cause": cause }),
                json!({ "strategy": "first_participant", "selected_ids": candidates }),
                None,
                "deterministic fallback to the first AI participant",
            )
            .await;

        info!(
            message_id = self.scope.message_id,
            selected = ?candidates,
            cause,
            "Deterministic selection"
        );

        IntentDecision {
            candidates,
            provenance: Provenance::FallbackSelected,
            intent: None,
        }
    }
}
