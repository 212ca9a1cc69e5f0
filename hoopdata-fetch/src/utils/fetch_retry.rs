//! Fetch Retry Logic
//!
//! Implements bounded exponential backoff for the primary source. Exhausting
//! every attempt is not an error for the caller: the result degrades to
//! `FetchOutcome::Error` and the run continues.

use crate::error::FetchError;
use crate::types::FetchOutcome;
use std::future::Future;
use std::time::Duration;

/// Bounded exponential-backoff retry policy
///
/// **Algorithm:**
/// 1. Attempt operation
/// 2. If successful, return `FetchOutcome::Success`
/// 3. On failure of attempt k (0-based): log WARN, sleep `base * 2^k`
/// 4. After `max_attempts` failures, return `FetchOutcome::Error` with the last error
///
/// The backoff also follows the final failed attempt, so an exhausted fetch
/// consumes exactly `max_attempts` intervals: `base, 2*base, 4*base, …`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one attempt
    pub fn new(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff after the failed attempt with 0-based index `attempt`
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `operation` until it succeeds or attempts run out
    ///
    /// # Arguments
    /// * `operation_name` - Name for logging (e.g., "shot chart 0022300061")
    /// * `operation` - Async closure that performs one fetch attempt
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> FetchOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                tracing::debug!(operation = operation_name, attempt = attempt + 1, "Retrying fetch");
            }

            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        tracing::info!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            "Fetch succeeded after retry"
                        );
                    }
                    return FetchOutcome::Success(result);
                }
                Err(err) => {
                    let wait = self.backoff_for(attempt);
                    tracing::warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        backoff_secs = wait.as_secs_f64(),
                        error = %err,
                        "Retry {}/{} after {:?}",
                        attempt + 1,
                        self.max_attempts,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    last_error = Some(err);
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts made".to_string());
        tracing::warn!(
            operation = operation_name,
            max_attempts = self.max_attempts,
            error = %message,
            "Fetch failed on every attempt, continuing without data"
        );
        FetchOutcome::Error(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_first_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let start = Instant::now();

        let result = policy.execute("test_op", || async { Ok::<i32, FetchError>(42) }).await;

        assert_eq!(result, FetchOutcome::Success(42));
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_transient_errors() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let mut attempts = 0;
        let start = Instant::now();

        let result = policy
            .execute("test_op", || {
                attempts += 1;
                let current = attempts;
                async move {
                    if current < 3 {
                        Err(FetchError::Timeout)
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result, FetchOutcome::Success(42));
        assert_eq!(attempts, 3);
        // Backoffs after attempts 1 and 2: 2s + 4s
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(6));
        assert!(elapsed < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_degrades_to_error_outcome() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let mut attempts = 0;
        let start = Instant::now();

        let result = policy
            .execute("test_op", || {
                attempts += 1;
                async { Err::<i32, FetchError>(FetchError::Api(503, "busy".to_string())) }
            })
            .await;

        assert_eq!(attempts, 3);
        match result {
            FetchOutcome::Error(msg) => assert!(msg.contains("503")),
            other => panic!("expected error outcome, got {:?}", other),
        }
        // 2s + 4s + 8s
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(14));
        assert!(elapsed < Duration::from_secs(15));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(4, Duration::from_millis(500));
        assert_eq!(policy.backoff_for(0), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(4));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }
}
