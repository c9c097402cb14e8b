//! Chat-completion service contract.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ChatMessage;

/// A chat-completion endpoint: one synchronous request per call.
///
/// Implementations return the assistant text unmodified and map timeouts,
/// non-2xx statuses and malformed bodies to
/// [`Error::CompletionService`](crate::Error::CompletionService).
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> Result<String>;
}
