//! Completion service trait for chat completion backends.

use crate::{ApiError, CompletionRequest, CompletionResponse};
use std::future::Future;
use std::pin::Pin;

/// A remote service that produces assistant replies for a conversation.
///
/// One call is one attempt; retrying is the caller's concern. Dyn-compatible
/// so sessions can hold an `Arc<dyn CompletionService>`.
pub trait CompletionService: Send + Sync {
    /// Request a completion for the full conversation in `request`.
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, ApiError>> + Send + 'a>>;

    /// Service name for logging/display (e.g., "openai-compatible").
    fn name(&self) -> &str;
}
