//! Retry policy for remote calls
//!
//! The default policy retries forever with no delay: a permanently failing id
//! keeps its worker busy and the phase barrier never completes. Bounded
//! policies exist for tests and for operators who prefer a partial corpus.
//!
//! **Backoff:** delay before attempt `n + 1` is
//! `initial_delay * multiplier^(n - 1)`, capped at `max_delay`.

use crate::source::SourceError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Consecutive failures between warn-level log lines
const WARN_EVERY: u32 = 10;

/// Retry gave up
#[derive(Debug, Clone, Error)]
#[error("gave up after {attempts} attempts: {last_error}")]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: SourceError,
}

/// How many times, and how patiently, a remote call is retried
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// `None` retries until success
    pub max_attempts: Option<u32>,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl RetryPolicy {
    /// Retry until success, no delay between attempts
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 2.0,
        }
    }

    /// Give up after `max_attempts`, no delay between attempts
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            ..Self::unbounded()
        }
    }

    /// Exponential backoff between attempts
    pub fn with_backoff(mut self, initial_delay: Duration, max_delay: Duration, multiplier: f64) -> Self {
        self.initial_delay = initial_delay;
        self.max_delay = max_delay;
        self.multiplier = multiplier;
        self
    }

    /// Delay after the `failed_attempts`-th consecutive failure (1-based)
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        if self.initial_delay.is_zero() || failed_attempts == 0 {
            return Duration::ZERO;
        }

        let cap = self.max_delay.max(self.initial_delay).as_nanos() as f64;
        let exponent = (failed_attempts - 1).min(64) as i32;
        let scaled = self.initial_delay.as_nanos() as f64 * self.multiplier.powi(exponent);

        Duration::from_nanos(scaled.min(cap).round() as u64)
    }

    /// Run `operation` until it succeeds or the policy gives up
    pub async fn run<F, Fut, T>(
        &self,
        operation_name: &str,
        id: u32,
        mut operation: F,
    ) -> Result<T, RetryExhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut attempt = 0u32;

        loop {
            attempt = attempt.saturating_add(1);

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(operation = operation_name, id, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    if self.max_attempts.is_some_and(|max| attempt >= max) {
                        tracing::warn!(
                            operation = operation_name,
                            id,
                            attempt,
                            error = %err,
                            "Giving up on remote call"
                        );
                        return Err(RetryExhausted {
                            attempts: attempt,
                            last_error: err,
                        });
                    }

                    if attempt % WARN_EVERY == 0 {
                        tracing::warn!(
                            operation = operation_name,
                            id,
                            attempt,
                            error = %err,
                            "Remote call still failing, retrying"
                        );
                    } else {
                        tracing::debug!(
                            operation = operation_name,
                            id,
                            attempt,
                            error = %err,
                            "Remote call failed, retrying"
                        );
                    }

                    let delay = self.delay_after(attempt);
                    if delay.is_zero() {
                        // Still yield so a hot retry loop cannot starve other workers
                        tokio::task::yield_now().await;
                    } else {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}
