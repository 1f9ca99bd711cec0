//! Bounded exponential-backoff execution of external calls
//!
//! Every external call in the pipeline goes through [`RetryExecutor::execute`].
//! Transient failures are retried after `d, 2d, 4d, ...` with no sleep after
//! the final attempt; permanent failures and cancellation end the call at once.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use shared::ApiFailure;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Rate limiter shared by every worker of a run
pub type SharedRateLimiter = Arc<DefaultDirectRateLimiter>;

/// Build a limiter admitting `requests_per_minute` calls per minute
pub fn rate_limiter(requests_per_minute: NonZeroU32) -> SharedRateLimiter {
    Arc::new(RateLimiter::direct(Quota::per_minute(requests_per_minute)))
}

/// Attempt budget and timing of a retried call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first, at least 1
    pub max_attempts: u32,

    /// Sleep after the first failed attempt, doubled after each further failure
    pub initial_delay: Duration,

    /// Upper bound on a single attempt; expiry counts as a transient failure
    pub call_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(5),
            call_timeout: Some(Duration::from_secs(120)),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            call_timeout: None,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = Some(call_timeout);
        self
    }

    /// Sleeps taken between attempts when every attempt fails
    pub fn backoff_schedule(&self) -> Vec<Duration> {
        let retries = self.max_attempts.max(1) - 1;
        std::iter::successors(Some(self.initial_delay), |delay| Some(delay.saturating_mul(2)))
            .take(retries as usize)
            .collect()
    }
}

/// Terminal failure of a retried call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    #[error("{operation} failed after {attempts} attempts: {last}")]
    Exhausted {
        operation: String,
        attempts: u32,
        last: ApiFailure,
    },

    #[error("{operation} failed permanently: {failure}")]
    Permanent { operation: String, failure: ApiFailure },

    #[error("{operation} cancelled")]
    Cancelled { operation: String },
}

impl RetryError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }
}

/// Runs fallible async operations under a [`RetryPolicy`]
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    cancel: CancellationToken,
    limiter: Option<SharedRateLimiter>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy, cancel: CancellationToken) -> Self {
        Self {
            policy,
            cancel,
            limiter: None,
        }
    }

    /// Await a permit from `limiter` before every attempt
    pub fn with_rate_limiter(mut self, limiter: SharedRateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Run `operation` until it succeeds, fails permanently, runs out of
    /// attempts, or the run is cancelled
    pub async fn execute<T, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiFailure>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut backoff = self.policy.backoff_schedule().into_iter();
        let cancelled = || RetryError::Cancelled {
            operation: operation_name.to_string(),
        };

        for attempt in 1..=max_attempts {
            if self.cancel.is_cancelled() {
                return Err(cancelled());
            }

            if let Some(limiter) = &self.limiter {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Err(cancelled()),
                    _ = limiter.until_ready() => {}
                }
            }

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(cancelled()),
                result = self.attempt(&mut operation) => result,
            };

            let failure = match result {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = operation_name, attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            if !failure.is_transient() {
                warn!(operation = operation_name, attempt, error = %failure, "Permanent failure, not retrying");
                return Err(RetryError::Permanent {
                    operation: operation_name.to_string(),
                    failure,
                });
            }

            let Some(delay) = backoff.next() else {
                warn!(
                    operation = operation_name,
                    attempt,
                    error = %failure,
                    "Retry budget exhausted"
                );
                return Err(RetryError::Exhausted {
                    operation: operation_name.to_string(),
                    attempts: attempt,
                    last: failure,
                });
            };

            warn!(
                operation = operation_name,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "Attempt failed, retrying"
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(cancelled()),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        // Loop always returns; max_attempts is at least 1
        Err(cancelled())
    }

    async fn attempt<T, F, Fut>(&self, operation: &mut F) -> Result<T, ApiFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiFailure>>,
    {
        match self.policy.call_timeout {
            Some(limit) => tokio::time::timeout(limit, operation())
                .await
                .unwrap_or(Err(ApiFailure::Timeout)),
            None => operation().await,
        }
    }
}
