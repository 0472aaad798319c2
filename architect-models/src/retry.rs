//! Retry policy for rate-limited generation calls.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{ErrorKind, GenerationResult, QuotaKind};

/// Default number of attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay; the wait before attempt `n + 1` is `n * base`.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Linear backoff policy that only retries transient quota failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Wait after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number. Only
    /// `QuotaExceeded(Transient)` is retried. When the last attempt is still
    /// rate limited the final message is returned as
    /// `QuotaExceeded(Exhausted)`.
    pub async fn execute<F, Fut>(&self, mut op: F) -> GenerationResult
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = GenerationResult>,
    {
        let mut attempt = 1;
        loop {
            let err = match op(attempt).await {
                Ok(text) => return Ok(text),
                Err(err) => err,
            };

            if !err.kind.is_transient() {
                debug!(attempt, kind = %err.kind, "not retrying permanent failure");
                return Err(err);
            }

            if attempt >= self.max_attempts {
                warn!(attempts = attempt, "rate limit persisted, giving up");
                let mut err = err;
                err.kind = ErrorKind::QuotaExceeded(QuotaKind::Exhausted);
                return Err(err);
            }

            let delay = self.delay_for(attempt);
            warn!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "rate limited, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
