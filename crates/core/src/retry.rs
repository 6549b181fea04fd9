//! Retry engine for transient remote failures
//!
//! A single generic wrapper shared by every backend: fixed attempt budget,
//! fixed inter-attempt delay, pluggable error classifier. Each backend
//! instantiates its own policy and classifier; there is no global retry
//! configuration.

use std::time::Duration;

use crate::error::{Error, Result};

/// Fixed-budget, fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempt budget (not "retries after the first attempt").
    pub max_attempts: u32,

    /// Constant delay between attempts. No backoff, no jitter: retries
    /// block the calling task for exactly this long.
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Retry a fallible async operation with a fixed delay between attempts.
///
/// The classifier decides per error: transient errors sleep the delay and
/// consume one unit of budget; terminal errors return immediately. An
/// exhausted budget returns the last error; callers that must not let a
/// failure escape map it to a boolean/empty outcome themselves.
///
/// # Example
/// ```ignore
/// let result = retry_fixed(
///     &policy,
///     || async { storage.head(key).await },
///     is_transient_storage,
/// ).await;
/// ```
pub async fn retry_fixed<T, F, Fut, C>(
    policy: &RetryPolicy,
    mut operation: F,
    is_transient: C,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
    C: Fn(&Error) -> bool,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= policy.max_attempts || !is_transient(&e) {
                    return Err(e);
                }

                tracing::debug!(
                    attempt = attempt,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %e,
                    "Retrying after transient error"
                );

                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let mut calls = 0;

        let result = retry_fixed(
            &fast_policy(3),
            || {
                calls += 1;
                async { Ok::<_, Error>(42) }
            },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_success_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_op = calls.clone();

        let result = retry_fixed(
            &fast_policy(3),
            || {
                let calls = calls_in_op.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(Error::Network("connection reset".into()))
                    } else {
                        Ok(42)
                    }
                }
            },
            |e| !e.is_terminal(),
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_budget_of_three_makes_exactly_three_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let mut calls = 0;
        let started = Instant::now();

        let result: Result<()> = retry_fixed(
            &policy,
            || {
                calls += 1;
                async { Err(Error::Network("always fails".into())) }
            },
            |_| true,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 3);
        // Two inter-attempt sleeps of the fixed delay.
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_terminal_error_returns_without_retry() {
        let mut calls = 0;

        let result: Result<()> = retry_fixed(
            &fast_policy(3),
            || {
                calls += 1;
                async { Err(Error::NotFound("gone".into())) }
            },
            |e| !e.is_terminal(),
        )
        .await;

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(calls, 1);
    }
}
