//! The CompletionClient trait definition.

use async_trait::async_trait;

use crate::error::CompletionError;
use crate::message::{Completion, CompletionRequest};

/// A backend that turns an ordered list of chat messages into model output.
///
/// The call is a single synchronous round trip: it either returns the full
/// text or fails. This trait is object-safe and is normally shared as
/// `Arc<dyn CompletionClient>`.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one completion.
    ///
    /// # Arguments
    ///
    /// * `request` - Messages, model identifier, temperature and token budget.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError>;

    /// Get a human-readable name for this backend.
    fn name(&self) -> &str;
}
