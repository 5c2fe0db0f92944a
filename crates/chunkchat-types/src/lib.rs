//! Shared conversation types and error hierarchy for Chunkchat.

pub mod error;
pub mod message;
pub mod provider;

pub use error::{ApiError, ChunkError, ConfigError};
pub use message::*;
pub use provider::CompletionService;
