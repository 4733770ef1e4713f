//! Application state shared across handlers.

use std::sync::Arc;

use broadcaster::LiveBroadcaster;
use database::{Database, Settings};
use orchestrator::Orchestrator;

/// Receives runtime completion settings when they change.
pub trait SettingsSink: Send + Sync {
    fn apply(&self, settings: &Settings);
}

impl SettingsSink for openai_completion::OpenAiCompletion {
    fn apply(&self, settings: &Settings) {
        self.update_endpoint(&settings.api_endpoint, &settings.api_key);
        self.update_default_model(&settings.default_model);
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Live event registry.
    pub broadcaster: LiveBroadcaster,
    /// Turn orchestration.
    pub orchestrator: Orchestrator,
    /// Completion client that follows the settings row.
    pub settings_sink: Arc<dyn SettingsSink>,
}

impl AppState {
    /// Create new application state.
    pub fn new(orchestrator: Orchestrator, settings_sink: Arc<dyn SettingsSink>) -> Self {
        Self {
            db: orchestrator.database().clone(),
            broadcaster: orchestrator.broadcaster().clone(),
            orchestrator,
            settings_sink,
        }
    }
}
