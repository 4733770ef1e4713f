//! Core trait and types for chat completion backends.
//!
//! This crate provides the shared interface between the turn orchestrator
//! and whatever service produces model output. It defines:
//!
//! - [`CompletionClient`] - The trait that all completion backends implement
//! - [`ChatMessage`] / [`CompletionRequest`] / [`Completion`] - Request and response types
//! - [`CompletionError`] - Error types for completion calls
//!
//! # Example
//!
//! ```rust
//! use completion_core::{async_trait, Completion, CompletionClient, CompletionError, CompletionRequest};
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl CompletionClient for Canned {
//!     async fn complete(&self, _request: CompletionRequest) -> Result<Completion, CompletionError> {
//!         Ok(Completion::text("Hello!"))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Canned"
//!     }
//! }
//! ```

mod error;
mod message;
mod prompt;
mod trait_def;

pub use error::CompletionError;
pub use message::{ChatMessage, Completion, CompletionRequest, Role, TokenUsage};
pub use prompt::hash_prompt;
pub use trait_def::CompletionClient;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
