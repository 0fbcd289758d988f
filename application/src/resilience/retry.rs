//! Retry with exponential backoff and jitter
//!
//! The delay before retry `n` (0-based) is
//! `min(base_delay * 2^n, max_delay) * (1 + jitter)` with `jitter` drawn
//! uniformly from `[0, 0.25)`. Errors the predicate rejects surface on the
//! first failure; otherwise the last error is returned once the attempt
//! budget is spent.

use crate::ports::transport::TransportError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use strix_domain::ErrorKind;
use tracing::{debug, warn};

const JITTER_FACTOR: f64 = 0.25;

/// Message fragments that indicate a transient failure.
const RETRYABLE_PATTERNS: &[&str] = &[
    "timeout",
    "timed out",
    "connection reset",
    "connection refused",
    "connection closed",
    "unavailable",
    "resource exhausted",
    "deadline exceeded",
];

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Backoff before the retry following failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter = rand::thread_rng().gen_range(0.0..JITTER_FACTOR);
        self.capped_delay(attempt).mul_f64(1.0 + jitter)
    }

    fn capped_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(31));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Errors that know whether another attempt might succeed.
pub trait RetryableError: std::fmt::Display {
    fn is_retryable(&self) -> bool;
}

impl RetryableError for TransportError {
    fn is_retryable(&self) -> bool {
        if matches!(
            self.kind,
            ErrorKind::Unauthorized
                | ErrorKind::NotFound
                | ErrorKind::InvalidArguments
                | ErrorKind::ExecutionError
        ) {
            return false;
        }
        if self.status.is_some_and(|s| s.is_retryable()) {
            return true;
        }
        matches!(self.kind, ErrorKind::Unavailable | ErrorKind::Timeout)
            || is_retryable_message(&self.message)
    }
}

/// Case-insensitive match against the transient-failure patterns.
pub fn is_retryable_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    RETRYABLE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Retry `operation` using the error's own retryability.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    E: RetryableError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_with_backoff(policy, operation, |e: &E| e.is_retryable()).await
}

/// Retry `operation` up to `policy.max_attempts` times.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: P,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.attempts();
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if !is_retryable(&error) {
                    debug!(error = %error, "Non-retryable error, giving up");
                    return Err(error);
                }
                if attempt + 1 >= max_attempts {
                    warn!(attempts = max_attempts, error = %error, "Retry budget exhausted");
                    return Err(error);
                }
                let delay = policy.delay_for(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Retrying in {:.2}s (attempt {}/{})",
                    delay.as_secs_f64(),
                    attempt + 1,
                    max_attempts
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::transport::{RpcCode, WireStatus};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_retryable_error_uses_whole_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), TransportError> = retry(&fast_policy(4), || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Err(TransportError::unavailable(format!("attempt {} unavailable", n))) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(result.unwrap_err().message, "attempt 4 unavailable");
    }

    #[tokio::test]
    async fn test_non_retryable_called_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), TransportError> = retry(&fast_policy(5), || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(TransportError::with_status(WireStatus::Http(401), "Unauthorized")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap_err().kind, ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_success_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = retry(&fast_policy(3), || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(TransportError::with_status(
                        WireStatus::Rpc(RpcCode::Unavailable),
                        "upstream connect error",
                    ))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_treated_as_one() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let _: Result<(), TransportError> = retry(&fast_policy(0), || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(TransportError::unavailable("down")) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_predicate() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), String> = retry_with_backoff(
            &fast_policy(3),
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err("flaky".to_string()) }
            },
            |e: &String| e == "flaky",
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_delay_is_capped_and_jittered() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1), Duration::from_secs(60));
        for attempt in 0..10 {
            let base = Duration::from_secs(1 << attempt).min(Duration::from_secs(60));
            let delay = policy.delay_for(attempt);
            assert!(delay >= base, "attempt {}: {:?} < {:?}", attempt, delay, base);
            assert!(delay <= base.mul_f64(1.25), "attempt {}: {:?}", attempt, delay);
        }
        assert!(policy.delay_for(40) <= Duration::from_secs(75));
    }

    #[test]
    fn test_message_patterns() {
        assert!(is_retryable_message("Connection refused (os error 111)"));
        assert!(is_retryable_message("DEADLINE EXCEEDED"));
        assert!(!is_retryable_message("permission denied"));

        let plain = TransportError::new(ErrorKind::ServerError, "internal panic");
        assert!(!plain.is_retryable());
        let reset = TransportError::new(ErrorKind::ServerError, "connection reset by peer");
        assert!(reset.is_retryable());
        let overloaded = TransportError::with_status(WireStatus::Http(502), "bad gateway");
        assert!(overloaded.is_retryable());
    }
}
