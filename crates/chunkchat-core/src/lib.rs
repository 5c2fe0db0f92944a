//! Chat session state and retry orchestration for Chunkchat.

pub mod error;
pub mod retry;
pub mod session;

pub use error::SessionError;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use session::{ChatSession, SessionConfig, SessionStats};
