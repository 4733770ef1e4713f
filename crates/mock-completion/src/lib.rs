//! Mock completion backends for orchestration tests.
//!
//! This crate provides mock implementations of the `CompletionClient` trait:
//! - `EchoCompletion` - Echoes the last message back
//! - `ScriptedCompletion` - Answers by rule (prompt text, model) and records every request
//! - `DelayedCompletion` - Wraps another backend with artificial delay
//!
//! For real model output, use the `openai-completion` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_completion::{ChatMessage, CompletionClient, CompletionRequest, Reply, ScriptedCompletion};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = ScriptedCompletion::new()
//!         .when_prompt_contains("INTENT:", Reply::text("INTENT: direct\nCHARACTERS: 3"));
//!
//!     let request = CompletionRequest::new(
//!         "gpt-4o-mini",
//!         vec![ChatMessage::system("Reply with INTENT: ...")],
//!         0.1,
//!         100,
//!     );
//!     let completion = backend.complete(request).await.unwrap();
//!     assert_eq!(completion.content, "INTENT: direct\nCHARACTERS: 3");
//!     assert_eq!(backend.call_count(), 1);
//! }
//! ```

mod delayed;
mod echo;
mod scripted;

// Re-export completion-core types for convenience
pub use completion_core::{
    async_trait, ChatMessage, Completion, CompletionClient, CompletionError, CompletionRequest,
};

// Export mock implementations
pub use delayed::DelayedCompletion;
pub use echo::EchoCompletion;
pub use scripted::{Reply, ScriptedCompletion};
