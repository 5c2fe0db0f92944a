//! Session-specific error types.

use chunkchat_types::ApiError;
use thiserror::Error;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Every attempt failed; `source` is the error from the final attempt.
    #[error("Completion failed after {attempts} attempts: {source}")]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        source: ApiError,
    },
}
