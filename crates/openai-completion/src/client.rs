//! OpenAiCompletion implementation.

use std::sync::{PoisonError, RwLock};

use completion_core::{
    async_trait, Completion, CompletionClient, CompletionError, CompletionRequest, TokenUsage,
};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse};
use crate::config::OpenAiConfig;

/// A [`CompletionClient`] for OpenAI-compatible HTTP endpoints.
///
/// The endpoint and key sit behind a lock so the settings page can repoint
/// the client without restarting the process. In-flight requests keep the
/// settings they started with.
pub struct OpenAiCompletion {
    client: Client,
    config: RwLock<OpenAiConfig>,
}

impl OpenAiCompletion {
    /// Create a new client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self, CompletionError> {
        let client = Client::builder().build().map_err(|e| {
            CompletionError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        info!(
            endpoint = %config.api_endpoint,
            default_model = %config.default_model,
            "OpenAiCompletion initialized"
        );

        Ok(Self {
            client,
            config: RwLock::new(config),
        })
    }

    /// Create a client from environment variables.
    ///
    /// See [`OpenAiConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, CompletionError> {
        Self::new(OpenAiConfig::from_env()?)
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> OpenAiConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Point the client at a different endpoint and key.
    pub fn update_endpoint(&self, api_endpoint: &str, api_key: &str) {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        config.api_endpoint = api_endpoint.to_string();
        config.api_key = api_key.to_string();
        info!(endpoint = %api_endpoint, "Completion endpoint updated");
    }

    /// Change the default model.
    pub fn update_default_model(&self, model: &str) {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        config.default_model = model.to_string();
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        let config = self.config();
        let url = config.completions_url();
        let model = if request.model.is_empty() {
            config.default_model.as_str()
        } else {
            request.model.as_str()
        };

        let body = ChatCompletionRequest {
            model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: (request.max_tokens > 0).then_some(request.max_tokens),
            stream: false,
        };

        debug!(model = %model, messages = request.messages.len(), "Sending completion request");

        let mut builder = self
            .client
            .post(&url)
            .timeout(config.timeout)
            .header("Content-Type", "application/json")
            .json(&body);

        if !config.api_key.is_empty() {
            builder = builder.header("Authorization", format!("Bearer {}", config.api_key));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CompletionError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Try to parse as API error
            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|api_error| api_error.error.message)
                .unwrap_or(error_text);

            warn!(status = status.as_u16(), "Completion API returned an error");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            CompletionError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        let content = completion
            .choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone())
            .ok_or(CompletionError::Empty)?;

        let usage = completion.usage.map(|usage| {
            debug!(
                "Token usage - prompt: {}, completion: {}",
                usage.prompt_tokens, usage.completion_tokens
            );
            TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
            }
        });

        Ok(Completion { content, usage })
    }

    fn name(&self) -> &str {
        "OpenAiCompletion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use completion_core::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiCompletion {
        let config = OpenAiConfig::builder()
            .api_endpoint(format!("{}/v1", server.uri()))
            .api_key("sk-test")
            .build();
        OpenAiCompletion::new(config).unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new(
            "gpt-4o-mini",
            vec![ChatMessage::system("be brief"), ChatMessage::user("hi")],
            0.2,
            32,
        )
    }

    #[tokio::test]
    async fn test_complete_success_with_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "max_tokens": 32,
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Hello!"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = client_for(&server).complete(request()).await.unwrap();
        assert_eq!(completion.content, "Hello!");
        assert_eq!(
            completion.usage,
            Some(TokenUsage {
                prompt_tokens: 12,
                completion_tokens: 3
            })
        );
    }

    #[tokio::test]
    async fn test_complete_api_error_message_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "invalid api key", "type": "auth"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).complete(request()).await.unwrap_err();
        match err {
            CompletionError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid api key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_no_choices_is_empty_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).complete(request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Empty));
    }

    #[tokio::test]
    async fn test_update_endpoint_redirects_requests() {
        let first = MockServer::start().await;
        let second = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "from second"}}]
            })))
            .expect(1)
            .mount(&second)
            .await;

        let client = client_for(&first);
        client.update_endpoint(&format!("{}/v1", second.uri()), "");

        let completion = client.complete(request()).await.unwrap();
        assert_eq!(completion.content, "from second");
        assert!(client.config().api_key.is_empty());
    }

    #[test]
    fn test_client_name() {
        let client = OpenAiCompletion::new(OpenAiConfig::default()).unwrap();
        assert_eq!(client.name(), "OpenAiCompletion");
    }
}
