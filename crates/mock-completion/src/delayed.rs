//! Delayed backend - wraps another backend with artificial delay.

use std::time::Duration;

use completion_core::{async_trait, Completion, CompletionClient, CompletionError, CompletionRequest};
use tokio::time::sleep;

/// A backend that wraps another backend and adds artificial delay.
///
/// Useful for simulating slow model calls and checking that one slow
/// participant does not hold up the others.
pub struct DelayedCompletion<C: CompletionClient> {
    inner: C,
    delay: Duration,
}

impl<C: CompletionClient> DelayedCompletion<C> {
    /// Wrap the given backend with the specified delay.
    pub fn new(inner: C, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Wrap with a delay in milliseconds.
    pub fn with_millis(inner: C, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// Access the wrapped backend.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: CompletionClient> CompletionClient for DelayedCompletion<C> {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        sleep(self.delay).await;
        self.inner.complete(request).await
    }

    fn name(&self) -> &str {
        "DelayedCompletion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EchoCompletion;
    use completion_core::ChatMessage;
    use std::time::Instant;

    #[tokio::test]
    async fn test_delayed_completion() {
        let backend = DelayedCompletion::with_millis(EchoCompletion::new(), 100);
        let request = CompletionRequest::new("m", vec![ChatMessage::user("test")], 0.0, 10);

        let start = Instant::now();
        let completion = backend.complete(request).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(completion.content, "test");
        assert!(elapsed >= Duration::from_millis(100));
    }

    #[test]
    fn test_backend_name() {
        let backend = DelayedCompletion::with_millis(EchoCompletion::new(), 0);
        assert_eq!(backend.name(), "DelayedCompletion");
    }
}
