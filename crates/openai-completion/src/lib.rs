//! OpenAI-compatible chat completion client.
//!
//! This crate provides a [`CompletionClient`] implementation that talks to any
//! endpoint speaking the `/chat/completions` dialect (OpenAI, OpenRouter,
//! local gateways, ...).
//!
//! # Features
//!
//! - Non-streaming completions with model, temperature and token budget per call
//! - Endpoint and API key can be swapped at runtime (settings edited in the UI)
//! - Token usage forwarded to callers for audit records
//! - Configurable via environment variables
//!
//! # Usage
//!
//! ```rust,no_run
//! use openai_completion::OpenAiCompletion;
//! use completion_core::{ChatMessage, CompletionClient, CompletionRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAiCompletion::from_env()?;
//!     let request = CompletionRequest::new(
//!         "gpt-4o-mini",
//!         vec![ChatMessage::user("Say hello")],
//!         0.7,
//!         64,
//!     );
//!     let completion = client.complete(request).await?;
//!     println!("{}", completion.content);
//!     Ok(())
//! }
//! ```

mod api_types;
mod client;
mod config;

pub use client::OpenAiCompletion;
pub use config::{OpenAiConfig, OpenAiConfigBuilder};

// Re-export completion-core types for convenience
pub use completion_core::{
    async_trait, ChatMessage, Completion, CompletionClient, CompletionError, CompletionRequest,
};
