//! Configuration for the OpenAI-compatible client.

use completion_core::CompletionError;
use std::env;
use std::time::Duration;

/// Default endpoint when none is configured.
pub const DEFAULT_API_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default model used for orchestration calls.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Configuration for [`crate::OpenAiCompletion`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL; `/chat/completions` is appended.
    pub api_endpoint: String,

    /// Bearer token. May be empty for local gateways.
    pub api_key: String,

    /// Model used when callers do not name one.
    pub default_model: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            api_key: String::new(),
            default_model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl OpenAiConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `LLM_API_ENDPOINT` - Base URL (default: https://api.openai.com/v1)
    /// - `LLM_API_KEY` - Bearer token (default: empty)
    /// - `LLM_DEFAULT_MODEL` - Default model (default: gpt-3.5-turbo)
    /// - `LLM_TIMEOUT_SECS` - Request timeout in seconds (default: 120)
    pub fn from_env() -> Result<Self, CompletionError> {
        let api_endpoint =
            env::var("LLM_API_ENDPOINT").unwrap_or_else(|_| DEFAULT_API_ENDPOINT.to_string());

        if !api_endpoint.starts_with("http://") && !api_endpoint.starts_with("https://") {
            return Err(CompletionError::Configuration(format!(
                "LLM_API_ENDPOINT must be an http(s) URL, got {}",
                api_endpoint
            )));
        }

        let api_key = env::var("LLM_API_KEY").unwrap_or_default();

        let default_model =
            env::var("LLM_DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout = env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(120));

        Ok(Self {
            api_endpoint,
            api_key,
            default_model,
            timeout,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> OpenAiConfigBuilder {
        OpenAiConfigBuilder::default()
    }

    /// Full URL of the chat completions route.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_endpoint.trim_end_matches('/'))
    }
}

/// Builder for OpenAiConfig.
#[derive(Debug, Default)]
pub struct OpenAiConfigBuilder {
    config: OpenAiConfig,
}

impl OpenAiConfigBuilder {
    /// Set the API endpoint.
    pub fn api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.api_endpoint = endpoint.into();
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the default model.
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.config.default_model = model.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OpenAiConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAiConfig::default();

        assert_eq!(config.api_endpoint, "https://api.openai.com/v1");
        assert!(config.api_key.is_empty());
        assert_eq!(config.default_model, "gpt-3.5-turbo");
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_builder() {
        let config = OpenAiConfig::builder()
            .api_endpoint("http://localhost:11434/v1")
            .api_key("sk-test")
            .default_model("llama3")
            .timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.api_endpoint, "http://localhost:11434/v1");
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.default_model, "llama3");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_completions_url_trims_trailing_slash() {
        let config = OpenAiConfig::builder()
            .api_endpoint("http://localhost:8000/v1/")
            .build();
        assert_eq!(config.completions_url(), "http://localhost:8000/v1/chat/completions");
    }
}
