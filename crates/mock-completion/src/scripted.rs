//! Scripted backend - answers by rule and records every request.

use std::sync::{Mutex, PoisonError};

use completion_core::{async_trait, Completion, CompletionClient, CompletionError, CompletionRequest};

/// What a scripted rule answers with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Return this text.
    Text(String),
    /// Fail with this message.
    Fail(String),
}

impl Reply {
    /// A successful reply.
    pub fn text(content: impl Into<String>) -> Self {
        Reply::Text(content.into())
    }

    /// A failing reply.
    pub fn fail(message: impl Into<String>) -> Self {
        Reply::Fail(message.into())
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    PromptContains(String),
    Model(String),
}

impl Matcher {
    fn matches(&self, request: &CompletionRequest) -> bool {
        match self {
            Matcher::PromptContains(needle) => request
                .system_prompt()
                .is_some_and(|prompt| prompt.contains(needle.as_str())),
            Matcher::Model(model) => request.model == *model,
        }
    }
}

/// A backend whose answers are set up by the test.
///
/// Rules are checked in the order they were added; the first match wins.
/// Requests that match no rule get the default reply.
#[derive(Debug)]
pub struct ScriptedCompletion {
    rules: Vec<(Matcher, Reply)>,
    default: Reply,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl Default for ScriptedCompletion {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedCompletion {
    /// Create a backend that answers "ok" to everything.
    pub fn new() -> Self {
        Self::with_default(Reply::text("ok"))
    }

    /// Create a backend with a custom default reply.
    pub fn with_default(default: Reply) -> Self {
        Self {
            rules: Vec::new(),
            default,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer requests whose system prompt contains `needle`.
    pub fn when_prompt_contains(mut self, needle: impl Into<String>, reply: Reply) -> Self {
        self.rules.push((Matcher::PromptContains(needle.into()), reply));
        self
    }

    /// Answer requests for `model`.
    pub fn when_model(mut self, model: impl Into<String>, reply: Reply) -> Self {
        self.rules.push((Matcher::Model(model.into()), reply));
        self
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn reply_for(&self, request: &CompletionRequest) -> &Reply {
        self.rules
            .iter()
            .find(|(matcher, _)| matcher.matches(request))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.default)
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        let reply = self.reply_for(&request).clone();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        match reply {
            Reply::Text(content) => Ok(Completion::text(content)),
            Reply::Fail(message) => Err(CompletionError::Api {
                status: 500,
                message,
            }),
        }
    }

    fn name(&self) -> &str {
        "ScriptedCompletion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use completion_core::ChatMessage;

    fn request(model: &str, system: &str) -> CompletionRequest {
        CompletionRequest::new(model, vec![ChatMessage::system(system)], 0.5, 10)
    }

    #[tokio::test]
    async fn test_first_matching_rule_wins() {
        let backend = ScriptedCompletion::new()
            .when_prompt_contains("classify", Reply::text("first"))
            .when_model("m", Reply::text("second"));

        let completion = backend.complete(request("m", "please classify")).await.unwrap();
        assert_eq!(completion.content, "first");

        let completion = backend.complete(request("m", "other")).await.unwrap();
        assert_eq!(completion.content, "second");
    }

    #[tokio::test]
    async fn test_default_and_failure_replies() {
        let backend = ScriptedCompletion::with_default(Reply::text("fallback"))
            .when_model("broken", Reply::fail("upstream down"));

        let ok = backend.complete(request("fine", "x")).await.unwrap();
        assert_eq!(ok.content, "fallback");

        let err = backend.complete(request("broken", "x")).await.unwrap_err();
        assert!(err.to_string().contains("upstream down"));
    }

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let backend = ScriptedCompletion::new();
        backend.complete(request("a", "x")).await.unwrap();
        backend.complete(request("b", "y")).await.unwrap();

        let calls = backend.calls();
        assert_eq!(backend.call_count(), 2);
        assert_eq!(calls[0].model, "a");
        assert_eq!(calls[1].model, "b");
    }
}
