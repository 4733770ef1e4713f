//! Turn orchestration for multi-character rooms.
//!
//! This crate provides the [`Orchestrator`] type which decides which AI
//! characters answer a human turn, produces their replies concurrently,
//! publishes them to live viewers, and records every decision.
//!
//! # Architecture
//!
//! ```text
//! Human turn (stored + published by submit_turn)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ORCHESTRATOR                           │
//! │                                                             │
//! │  1. Extract @include / !exclude directives                  │
//! │         ↓                                                   │
//! │  2. Merge directives with all AI participants               │
//! │         ↓                                                   │
//! │  3. Intent selection (2+ AI participants only)              │
//! │     • classification call                                   │
//! │     • fallback call if no usable IDs                        │
//! │     • first participant if both fail                        │
//! │         ↓                                                   │
//! │  4. Merge directives again; exclude always wins             │
//! │         ↓                                                   │
//! │  5. One worker per responder, joined before returning:      │
//! │     context → completion → store → publish                  │
//! └─────────────────────────────────────────────────────────────┘
//!     every step → DecisionRecorder, every call → llm_call_logs
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use broadcaster::LiveBroadcaster;
//! use orchestrator::{Orchestrator, OrchestratorConfig};
//!
//! let orchestrator = Orchestrator::new(db, Arc::new(client), LiveBroadcaster::new(), OrchestratorConfig::from_env());
//! let handle = orchestrator.submit_turn(room_id, "@Alice how are you? !Bob").await?;
//! let outcome = handle.finished().await;
//! ```

mod audit;
mod config;
mod context;
mod error;
mod generator;
mod intent;
mod logged;
mod matcher;
mod mentions;
mod orchestrator;
mod recorder;
mod selection;

pub use audit::TurnAudit;
pub use config::{OrchestratorConfig, DEFAULT_SELECTION_MODEL};
pub use context::{build_context, label_history};
pub use error::OrchestratorError;
pub use generator::{system_prompt, Generation, Scene, NO_SETTING, NO_USER_PERSONA};
pub use intent::{
    fallback_prompt, intent_prompt, parse_id_list, parse_intent_reply, validate_ids, IntentDecision,
    IntentReply, INTENT_LABELS,
};
pub use logged::{CallScope, CallType, LoggedCall, LoggedCompletion};
pub use matcher::{match_rule, matches, normalize_token, MatchRule};
pub use mentions::{extract, Mentions};
pub use orchestrator::{Orchestrator, TurnHandle, TurnOutcome};
pub use recorder::{DecisionRecorder, StepType};
pub use selection::{merge, resolve, Provenance, Selected, SelectionResult};
