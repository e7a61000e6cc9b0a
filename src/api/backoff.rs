// src/api/backoff.rs
//! Bounded exponential backoff for rate-limited API operations.
//!
//! Only rate-limit failures are retried — everything else is treated as
//! non-transient and rethrown immediately. Each call wraps exactly one
//! network operation so retry boundaries stay fine-grained; wrapping a
//! batch would replay already-successful calls.

use crate::constants::{BACKOFF_BASE_DELAY_MS, BACKOFF_JITTER_MS, BACKOFF_MAX_RETRIES};
use crate::error::AppError;
use rand::Rng;
use std::time::Duration;

/// How a rate-limited operation is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound of the random jitter added to each sleep. Zero
    /// disables jitter (tests).
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: BACKOFF_MAX_RETRIES,
            base_delay: Duration::from_millis(BACKOFF_BASE_DELAY_MS),
            jitter: Duration::from_millis(BACKOFF_JITTER_MS),
        }
    }
}

impl RetryPolicy {
    /// The sleep before retry `attempt` (0-based): `base * 2^attempt`
    /// plus random jitter.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay * 2u32.saturating_pow(attempt);
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            backoff
        } else {
            backoff + Duration::from_millis(rand::rng().random_range(0..jitter_ms))
        }
    }
}

/// Retries a single async API operation on rate-limit failures.
///
/// On a rate-limit classification with retries remaining, sleeps with
/// exponential backoff and retries. On exhaustion, or on any other
/// failure, the original error is rethrown.
pub async fn with_backoff<T, F, Fut>(
    mut operation: F,
    policy: &RetryPolicy,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_rate_limited() && attempt < policy.max_retries => {
                let delay = policy.delay_for_attempt(attempt);
                log::warn!(
                    "Rate limit hit. Retrying in {}ms (attempt {}/{})",
                    delay.as_millis(),
                    attempt + 1,
                    policy.max_retries + 1
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotionErrorCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn rate_limited() -> AppError {
        AppError::NotionService {
            code: NotionErrorCode::RateLimited,
            message: "rate limited".to_string(),
            status: 429,
        }
    }

    fn validation_failed() -> AppError {
        AppError::NotionService {
            code: NotionErrorCode::ValidationFailed,
            message: "bad body".to_string(),
            status: 400,
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            jitter: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt_after_two_rate_limits() {
        let attempts = AtomicU32::new(0);
        let result = with_backoff(
            || async {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(rate_limited())
                } else {
                    Ok("done")
                }
            },
            &fast_policy(),
        )
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_rate_limit_errors_are_not_retried() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = with_backoff(
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(validation_failed())
            },
            &fast_policy(),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_rethrows_the_rate_limit_error() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = with_backoff(
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(rate_limited())
            },
            &fast_policy(),
        )
        .await;
        // max_retries retries plus the initial attempt.
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert!(result.unwrap_err().is_rate_limited());
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            jitter: Duration::ZERO,
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
    }

    #[test]
    fn jitter_stays_within_bound() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            jitter: Duration::from_millis(50),
        };
        for _ in 0..20 {
            let delay = policy.delay_for_attempt(0);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay < Duration::from_millis(150));
        }
    }
}
