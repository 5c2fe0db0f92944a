//! Stateful chat session over a completion service.

use std::sync::Arc;

use chunkchat_types::{ApiError, CompletionRequest, CompletionService, Role, Turn, Usage};

use crate::error::SessionError;
use crate::retry::RetryPolicy;

/// Per-session settings, fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub model: String,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
    /// Bound on non-system turns kept after each exchange; `None` keeps all.
    pub max_history_turns: Option<usize>,
}

impl SessionConfig {
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            system_prompt: None,
            max_history_turns: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_history_turns(mut self, turns: usize) -> Self {
        self.max_history_turns = Some(turns);
        self
    }
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub model: String,
    /// Turns currently in history, including the system turn.
    pub turn_count: usize,
    /// Successful `send` calls.
    pub exchanges: u64,
    /// `send` calls that exhausted their retries.
    pub failed_sends: u64,
    /// Token usage summed over successful replies that reported it.
    pub usage: Usage,
}

/// A conversation with a remote model.
///
/// History starts with the configured system turn (if any) and then
/// alternates user and assistant turns. Only [`send`](Self::send) appends and
/// only [`reset`](Self::reset) clears.
pub struct ChatSession {
    service: Arc<dyn CompletionService>,
    config: SessionConfig,
    retry: RetryPolicy,
    history: Vec<Turn>,
    exchanges: u64,
    failed_sends: u64,
    usage: Usage,
}

impl ChatSession {
    pub fn new(service: Arc<dyn CompletionService>, config: SessionConfig) -> Self {
        let history = config
            .system_prompt
            .iter()
            .map(|prompt| Turn::system(prompt.as_str()))
            .collect();
        Self {
            service,
            config,
            retry: RetryPolicy::default(),
            history,
            exchanges: 0,
            failed_sends: 0,
            usage: Usage::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            model: self.config.model.clone(),
            turn_count: self.history.len(),
            exchanges: self.exchanges,
            failed_sends: self.failed_sends,
            usage: self.usage.clone(),
        }
    }

    /// Send a user message and return the assistant's reply.
    ///
    /// The whole history goes out as context. If every attempt fails the
    /// user turn is removed again, leaving history as it was before the call.
    pub async fn send(&mut self, user_text: impl Into<String>) -> Result<String, SessionError> {
        self.history.push(Turn::user(user_text));

        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages: self.history.clone(),
            max_tokens: self.config.max_tokens,
        };
        let service = self.service.as_ref();
        let request = &request;

        let result = self
            .retry
            .run(|_| async move {
                let response = service.complete(request).await?;
                let reply = response
                    .best_reply()
                    .ok_or(ApiError::EmptyResponse)?
                    .to_string();
                Ok::<_, ApiError>((reply, response.usage))
            })
            .await;

        match result {
            Ok((reply, usage)) => {
                self.history.push(Turn::assistant(reply.as_str()));
                if let Some(usage) = usage {
                    self.usage.add(&usage);
                }
                self.exchanges += 1;
                self.truncate_history();
                Ok(reply)
            }
            Err(err) => {
                self.history.pop();
                self.failed_sends += 1;
                Err(err)
            }
        }
    }

    /// Clear the whole history, including the system turn.
    ///
    /// The system prompt is not restored; the session behaves as if it had
    /// been created without one.
    pub fn reset(&mut self) {
        tracing::info!("Resetting session ({} turns dropped)", self.history.len());
        self.history.clear();
    }

    /// Drop the oldest user/assistant pairs beyond `max_history_turns`.
    ///
    /// The system turn and the latest exchange always survive.
    fn truncate_history(&mut self) {
        let Some(limit) = self.config.max_history_turns else {
            return;
        };
        let offset = usize::from(
            self.history
                .first()
                .is_some_and(|turn| turn.role == Role::System),
        );
        let conversation = self.history.len() - offset;
        if conversation <= limit.max(2) {
            return;
        }
        let excess = conversation - limit.max(2);
        // Round up to whole pairs so history still starts with a user turn.
        let drop = excess.div_ceil(2) * 2;
        self.history.drain(offset..offset + drop);
        tracing::info!("Dropped {drop} oldest turns to stay within {limit}");
    }
}
