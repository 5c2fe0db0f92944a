//! Retry with randomized exponential backoff for completion requests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chunkchat_types::ApiError;
use rand::Rng;

use crate::error::SessionError;

/// Something that can wait for a duration.
///
/// Injected into [`RetryPolicy`] so backoff can be observed in tests without
/// real delays.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Retry policy for completion requests.
///
/// Every error is retried until `max_attempts` calls have been made. After the
/// n-th failure the policy waits a random duration between `min_delay` and
/// `multiplier * 2^(n-1)`, the latter clamped to `[min_delay, max_delay]`.
#[derive(Clone)]
pub struct RetryPolicy {
    min_delay: Duration,
    max_delay: Duration,
    max_attempts: u32,
    multiplier: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60), 20)
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("min_delay", &self.min_delay)
            .field("max_delay", &self.max_delay)
            .field("max_attempts", &self.max_attempts)
            .field("multiplier", &self.multiplier)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` counts the first call; zero is raised
    /// to one and `max_delay` is raised to `min_delay` if smaller.
    pub fn new(min_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            min_delay,
            max_delay: max_delay.max(min_delay),
            max_attempts: max_attempts.max(1),
            multiplier: Duration::from_secs(1),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Set the base of the exponential ceiling (default one second).
    pub fn with_multiplier(mut self, multiplier: Duration) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Upper bound of the wait after the `failed_attempt`-th failure (1-based).
    pub fn backoff_ceiling(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(63) as i32;
        let secs = self.multiplier.as_secs_f64() * 2f64.powi(exponent);
        let ceiling = secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(ceiling).clamp(self.min_delay, self.max_delay)
    }

    /// Wait after the `failed_attempt`-th failure for a uniform draw in `[0, 1]`.
    pub fn delay_for(&self, failed_attempt: u32, draw: f64) -> Duration {
        let ceiling = self.backoff_ceiling(failed_attempt);
        let span = ceiling.saturating_sub(self.min_delay);
        self.min_delay + span.mul_f64(draw.clamp(0.0, 1.0))
    }

    /// Run `op` until it succeeds or `max_attempts` calls have failed.
    ///
    /// `op` receives the 1-based attempt number. The last error is returned
    /// inside [`SessionError::ExhaustedRetries`].
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, SessionError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 1;
        loop {
            tracing::debug!("Completion attempt {attempt}/{}", self.max_attempts);

            let err = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if attempt >= self.max_attempts {
                tracing::warn!("Giving up after {attempt} attempts: {err}");
                return Err(SessionError::ExhaustedRetries {
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = self.delay_for(attempt, rand::rng().random_range(0.0..=1.0));
            tracing::warn!(
                "Completion failed (attempt {attempt}/{}): {err}. Retrying in {}ms...",
                self.max_attempts,
                delay.as_millis(),
            );
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}
