//! Orchestrator tuning.

use std::env;
use std::str::FromStr;

use tracing::warn;

/// Model used for selection calls when runtime settings cannot be read.
pub const DEFAULT_SELECTION_MODEL: &str = "gpt-3.5-turbo";

/// Tuning knobs for turn orchestration.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Number of recent turns fed to each responder.
    pub history_limit: i64,
    /// Sampling temperature for both selection calls.
    pub intent_temperature: f64,
    /// Token budget for the intent classification call.
    pub intent_max_tokens: u32,
    /// Token budget for the fallback selection call.
    pub fallback_max_tokens: u32,
    /// Selection model used when runtime settings are unavailable.
    pub default_model: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            history_limit: 20,
            intent_temperature: 0.1,
            intent_max_tokens: 100,
            fallback_max_tokens: 50,
            default_model: DEFAULT_SELECTION_MODEL.to_string(),
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from environment variables.
    ///
    /// - `TROUPE_HISTORY_LIMIT` (default 20)
    /// - `TROUPE_INTENT_TEMPERATURE` (default 0.1)
    /// - `TROUPE_INTENT_MAX_TOKENS` (default 100)
    /// - `TROUPE_FALLBACK_MAX_TOKENS` (default 50)
    ///
    /// Unparsable values are logged and replaced by the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            history_limit: positive_env_or("TROUPE_HISTORY_LIMIT", defaults.history_limit),
            intent_temperature: env_or("TROUPE_INTENT_TEMPERATURE", defaults.intent_temperature),
            intent_max_tokens: env_or("TROUPE_INTENT_MAX_TOKENS", defaults.intent_max_tokens),
            fallback_max_tokens: env_or("TROUPE_FALLBACK_MAX_TOKENS", defaults.fallback_max_tokens),
            default_model: defaults.default_model,
        }
    }

    /// Set the number of history turns. Values below 1 become 1.
    pub fn with_history_limit(mut self, limit: i64) -> Self {
        self.history_limit = limit.max(1);
        self
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring unparsable setting");
            default
        }),
        Err(_) => default,
    }
}

/// Like [`env_or`], but zero and negative values fall back to the default.
/// SQLite reads a negative `LIMIT` as no limit at all.
fn positive_env_or(key: &str, default: i64) -> i64 {
    let value = env_or(key, default);
    if value < 1 {
        warn!(key, value, default, "Setting must be at least 1, using default");
        return default;
    }
    value
}
