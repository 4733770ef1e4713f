//! Echo backend - echoes the last message back.

use completion_core::{async_trait, Completion, CompletionClient, CompletionError, CompletionRequest};

/// A backend that answers with the content of the last message.
///
/// Useful for exercising the pipeline without any model.
#[derive(Debug, Clone, Default)]
pub struct EchoCompletion {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoCompletion {
    /// Create a new EchoCompletion with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoCompletion with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl CompletionClient for EchoCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        let last = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let content = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, last),
            None => last,
        };

        Ok(Completion::text(content))
    }

    fn name(&self) -> &str {
        "EchoCompletion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use completion_core::ChatMessage;

    #[tokio::test]
    async fn test_echo_no_prefix() {
        let backend = EchoCompletion::new();
        let request = CompletionRequest::new(
            "m",
            vec![ChatMessage::system("sys"), ChatMessage::user("Hello!")],
            0.0,
            10,
        );

        let completion = backend.complete(request).await.unwrap();
        assert_eq!(completion.content, "Hello!");
    }

    #[tokio::test]
    async fn test_echo_with_prefix() {
        let backend = EchoCompletion::with_prefix("Echo: ");
        let request = CompletionRequest::new("m", vec![ChatMessage::user("Hello!")], 0.0, 10);

        let completion = backend.complete(request).await.unwrap();
        assert_eq!(completion.content, "Echo: Hello!");
    }

    #[test]
    fn test_backend_name() {
        assert_eq!(EchoCompletion::new().name(), "EchoCompletion");
    }
}
