//! Per-endpoint circuit breaker
//!
//! ```text
//! Closed   --(failures >= failure_threshold)-->  Open
//! Open     --(elapsed >= timeout)------------->  HalfOpen
//! HalfOpen --(successes >= success_threshold)->  Closed
//! HalfOpen --(any failure)-------------------->  Open
//! ```
//!
//! Failures are counted consecutively: a success while `Closed` resets the
//! counter. There is no rolling time window.
//!
//! The state lock is held only while checking or recording; the wrapped
//! operation always runs outside it.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use strix_domain::ErrorKind;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::ports::transport::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => f.write_str("closed"),
            CircuitState::Open => f.write_str("open"),
            CircuitState::HalfOpen => f.write_str("half_open"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    /// Cooldown after the last failure before a trial call is allowed
    pub timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Rejection raised while the breaker is open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Circuit breaker for {endpoint} is OPEN. Service unavailable. Will retry after {}s timeout.",
    .timeout.as_secs_f64()
)]
pub struct CircuitOpen {
    pub endpoint: String,
    pub timeout: Duration,
}

impl From<CircuitOpen> for TransportError {
    fn from(err: CircuitOpen) -> Self {
        TransportError::new(ErrorKind::Unavailable, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitStats {
    pub endpoint: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    /// Seconds since the most recent failure
    pub last_failure_secs_ago: Option<f64>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure: Option<Instant>,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure: None,
        }
    }
}

#[derive(Debug)]
pub struct CircuitBreaker {
    endpoint: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(endpoint: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            config,
            inner: Mutex::new(BreakerState::closed()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run `operation` through the breaker.
    ///
    /// Rejected with [`CircuitOpen`] (converted into `E`) without calling
    /// `operation` while the circuit is open.
    pub async fn call<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        E: From<CircuitOpen>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.try_acquire()?;
        let result = operation().await;
        match &result {
            Ok(_) => self.record_success(),
            Err(_) => self.record_failure(),
        }
        result
    }

    /// Check whether a call may proceed, moving `Open` to `HalfOpen` once
    /// the cooldown has elapsed.
    pub fn try_acquire(&self) -> Result<(), CircuitOpen> {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Open {
            return Ok(());
        }

        let cooled_down = inner
            .last_failure
            .is_none_or(|at| at.elapsed() >= self.config.timeout);
        if cooled_down {
            inner.state = CircuitState::HalfOpen;
            inner.success_count = 0;
            info!(endpoint = %self.endpoint, "Circuit breaker half-open, allowing trial call");
            Ok(())
        } else {
            Err(CircuitOpen {
                endpoint: self.endpoint.clone(),
                timeout: self.config.timeout,
            })
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                    inner.success_count = 0;
                    info!(endpoint = %self.endpoint, "Circuit breaker closed, service recovered");
                }
            }
            CircuitState::Closed => inner.failure_count = 0,
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.failure_count += 1;
        inner.last_failure = Some(Instant::now());

        let should_open = match inner.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => inner.failure_count >= self.config.failure_threshold,
            CircuitState::Open => false,
        };
        if should_open {
            inner.state = CircuitState::Open;
            inner.success_count = 0;
            warn!(
                endpoint = %self.endpoint,
                failures = inner.failure_count,
                "Circuit breaker opened"
            );
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn stats(&self) -> CircuitStats {
        let inner = self.inner.lock();
        CircuitStats {
            endpoint: self.endpoint.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            last_failure_secs_ago: inner.last_failure.map(|at| at.elapsed().as_secs_f64()),
        }
    }

    pub fn reset(&self) {
        *self.inner.lock() = BreakerState::closed();
        info!(endpoint = %self.endpoint, "Circuit breaker reset");
    }
}

/// Lazily populated map of one breaker per endpoint.
#[derive(Debug, Default)]
pub struct CircuitBreakerRegistry {
    config: CircuitBreakerConfig,
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl CircuitBreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, endpoint: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .lock()
            .entry(endpoint.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(endpoint, self.config.clone())))
            .clone()
    }

    pub fn snapshot(&self) -> Vec<CircuitStats> {
        let breakers: Vec<Arc<CircuitBreaker>> = self.breakers.lock().values().cloned().collect();
        let mut stats: Vec<CircuitStats> = breakers.iter().map(|b| b.stats()).collect();
        stats.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
        stats
    }

    pub fn reset_all(&self) {
        let breakers: Vec<Arc<CircuitBreaker>> = self.breakers.lock().values().cloned().collect();
        for breaker in breakers {
            breaker.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn breaker(failure_threshold: u32, success_threshold: u32, timeout_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(
            "grpc://worker:50051",
            CircuitBreakerConfig {
                failure_threshold,
                success_threshold,
                timeout: Duration::from_millis(timeout_ms),
            },
        )
    }

    async fn fail(b: &CircuitBreaker, calls: &AtomicU32) -> Result<(), TransportError> {
        b.call(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::unavailable("connection refused"))
        })
        .await
    }

    async fn succeed(b: &CircuitBreaker, calls: &AtomicU32) -> Result<(), TransportError> {
        b.call(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_state_cycle() {
        let b = breaker(3, 2, 60_000);
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            assert!(fail(&b, &calls).await.is_err());
        }
        assert_eq!(b.state(), CircuitState::Open);

        let rejected = succeed(&b, &calls).await.unwrap_err();
        assert_eq!(rejected.kind, ErrorKind::Unavailable);
        assert!(rejected.message.contains("OPEN"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        tokio::time::advance(Duration::from_secs(61)).await;
        succeed(&b, &calls).await.unwrap();
        assert_eq!(b.state(), CircuitState::HalfOpen);
        succeed(&b, &calls).await.unwrap();
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_fail_then_trial_after_cooldown() {
        let b = breaker(2, 2, 200);
        let calls = AtomicU32::new(0);

        fail(&b, &calls).await.unwrap_err();
        fail(&b, &calls).await.unwrap_err();
        let third = fail(&b, &calls).await.unwrap_err();
        assert_eq!(third.kind, ErrorKind::Unavailable);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_millis(300)).await;
        fail(&b, &calls).await.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens_and_restarts_clock() {
        let b = breaker(1, 2, 100);
        let calls = AtomicU32::new(0);

        fail(&b, &calls).await.unwrap_err();
        tokio::time::advance(Duration::from_millis(150)).await;
        fail(&b, &calls).await.unwrap_err();
        assert_eq!(b.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(b.try_acquire().is_err());
        tokio::time::advance(Duration::from_millis(60)).await;
        assert!(b.try_acquire().is_ok());
        assert_eq!(b.state(), CircuitState::HalfOpen);
    }

    #[tokio::test]
    async fn test_success_in_closed_resets_failures() {
        let b = breaker(3, 1, 1000);
        let calls = AtomicU32::new(0);

        fail(&b, &calls).await.unwrap_err();
        fail(&b, &calls).await.unwrap_err();
        succeed(&b, &calls).await.unwrap();
        fail(&b, &calls).await.unwrap_err();
        fail(&b, &calls).await.unwrap_err();
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(b.stats().failure_count, 2);
    }

    #[test]
    fn test_never_double_opens() {
        let b = breaker(1, 1, 60_000);
        b.record_failure();
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Open);
        assert_eq!(b.stats().failure_count, 2);
        b.reset();
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(b.stats().failure_count, 0);
    }

    #[test]
    fn test_registry_returns_same_breaker_per_endpoint() {
        let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig {
            failure_threshold: 1,
            ..Default::default()
        });
        registry.get("a:1").record_failure();
        assert_eq!(registry.get("a:1").state(), CircuitState::Open);
        assert_eq!(registry.get("b:2").state(), CircuitState::Closed);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].endpoint, "a:1");

        registry.reset_all();
        assert_eq!(registry.get("a:1").state(), CircuitState::Closed);
    }
}
