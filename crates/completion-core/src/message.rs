//! Request and response types for completion calls.

use serde::{Deserialize, Serialize};

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single role-labeled message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Everything a backend needs for one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Model identifier.
    pub model: String,
    /// Ordered messages, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Create a request.
    pub fn new(
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
        temperature: f64,
        max_tokens: u32,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature,
            max_tokens,
        }
    }

    /// Content of the first system message, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// Serialize the request body for audit records.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Token accounting reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Output of a successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Generated text.
    pub content: String,
    /// Usage, when the backend reports it.
    pub usage: Option<TokenUsage>,
}

impl Completion {
    /// A completion with text only.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }

    /// A completion with usage information.
    pub fn with_usage(content: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            content: content.into(),
            usage: Some(usage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn test_system_prompt_lookup() {
        let request = CompletionRequest::new(
            "gpt-4o-mini",
            vec![ChatMessage::system("be brief"), ChatMessage::user("hello")],
            0.7,
            256,
        );
        assert_eq!(request.system_prompt(), Some("be brief"));

        let no_system = CompletionRequest::new("m", vec![ChatMessage::user("x")], 0.0, 1);
        assert_eq!(no_system.system_prompt(), None);
    }

    #[test]
    fn test_request_json_carries_parameters() {
        let request = CompletionRequest::new("m", vec![ChatMessage::user("x")], 0.1, 100);
        let value: serde_json::Value = serde_json::from_str(&request.to_json()).unwrap();
        assert_eq!(value["model"], "m");
        assert_eq!(value["max_tokens"], 100);
        assert_eq!(value["messages"][0]["role"], "user");
    }
}
