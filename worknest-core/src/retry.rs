//! Bounded retry with linear backoff.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::{WorknestError, WorknestResult};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    max_attempts: usize,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay before retry number `retry` (1-based): base * retry.
    pub fn delay_for(&self, retry: usize) -> Duration {
        self.base_delay.saturating_mul(retry as u32)
    }

    /// Only server-side failures are retried.
    pub fn should_retry(&self, err: &WorknestError) -> bool {
        err.is_server_error()
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget runs out. Attempts never overlap.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> WorknestResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = WorknestResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && self.should_retry(&err) => {
                    let delay = self.delay_for(attempt);
                    debug!(attempt, ?delay, error = %err, "retrying after server error");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(
            crate::constants::DEFAULT_VERIFY_MAX_ATTEMPTS,
            Duration::from_millis(crate::constants::DEFAULT_VERIFY_BASE_DELAY_MS),
        )
    }
}
