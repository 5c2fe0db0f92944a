//! OpenAI-compatible completion service implementation.

use crate::client::ApiClient;
use chunkchat_types::{ApiError, CompletionRequest, CompletionResponse, CompletionService};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Completion service for any OpenAI-compatible endpoint (DashScope, vLLM, ...).
///
/// Wraps `ApiClient` and implements the `CompletionService` trait.
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    client: ApiClient,
}

impl OpenAiCompatProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::new(api_key, base_url)?,
        })
    }

    pub fn with_timeout(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::with_timeout(api_key, base_url, timeout)?,
        })
    }
}

impl CompletionService for OpenAiCompatProvider {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, ApiError>> + Send + 'a>> {
        Box::pin(self.client.create_chat_completion(request))
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}
