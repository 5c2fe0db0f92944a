//! OpenAI-compatible chat completions client for Chunkchat.

mod client;
mod provider;

pub use client::{ApiClient, DEFAULT_TIMEOUT};
pub use provider::OpenAiCompatProvider;
