//! Error hierarchy for Chunkchat.

use thiserror::Error;

/// Errors from a completion service call.
///
/// Every variant is treated as transient by the session's retry policy.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Server error: {status} {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response contained no reply")]
    EmptyResponse,
}

/// Errors from text chunking.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("Invalid chunk parameters: overlap ({overlap}) must be less than max_words ({max_words})")]
    InvalidArgument { max_words: usize, overlap: usize },
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_error_message_names_both_values() {
        let err = ChunkError::InvalidArgument {
            max_words: 3,
            overlap: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("overlap (3)"), "{msg}");
        assert!(msg.contains("max_words (3)"), "{msg}");
    }

    #[test]
    fn api_error_display() {
        let err = ApiError::Server {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "Server error: 503 unavailable");
    }
}
