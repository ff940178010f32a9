//! Retry policy and the shared bounded-retry helper.
//!
//! [`RetryPolicy`] decides *whether* and *how long* to wait; [`with_retry`]
//! drives an async operation through it. The two are kept apart so the
//! classification can be tested without sleeping.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::warn;

use crate::Result;
use crate::telemetry;

/// Bounded retry with linear backoff.
///
/// After failed attempt `k` (1-indexed) the caller sleeps `k * backoff_step`
/// before trying again, so the defaults give 1s then 2s.
///
/// ```rust
/// # use vcloud_provider::RetryPolicy;
/// # use std::time::Duration;
/// let policy = RetryPolicy::new()
///     .max_attempts(5)
///     .backoff_step(Duration::from_millis(200));
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 3.
    pub max_attempts: u32,
    /// Backoff unit multiplied by the attempt number. Default: 1s.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single attempt, no retries.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    pub fn backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    /// Delay to wait after failed attempt `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt)
    }

    /// Whether a response status warrants another attempt.
    ///
    /// Only server errors are retried; 4xx responses are terminal and are
    /// interpreted by the caller (404 in particular).
    pub fn is_retryable_status(status: StatusCode) -> bool {
        status.as_u16() >= 500
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Execute an async operation with bounded retries.
///
/// An attempt is retried when it fails with a transient error (as classified
/// by [`VCloudError::is_transient()`](crate::VCloudError::is_transient)) or
/// when it succeeds with a value for which `should_retry` returns true.
/// Once attempts are exhausted the last value or error is returned as-is.
/// Permanent errors are returned immediately.
pub(crate) async fn with_retry<F, Fut, T, R>(
    policy: &RetryPolicy,
    operation: &str,
    should_retry: R,
    f: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
    R: Fn(&T) -> bool,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        let reason = match f().await {
            Ok(value) if attempt < max_attempts && should_retry(&value) => {
                "retryable response".to_string()
            }
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && e.is_transient() => e.to_string(),
            Err(e) => return Err(e),
        };

        metrics::counter!(telemetry::API_RETRIES_TOTAL, "method" => operation.to_owned())
            .increment(1);
        let delay = policy.delay_for_attempt(attempt);
        warn!(
            operation,
            attempt,
            max_attempts,
            delay = ?delay,
            reason = %reason,
            "retrying request"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
