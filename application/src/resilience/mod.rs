//! Failure handling for remote calls: retry with backoff and circuit breaking.

pub mod circuit_breaker;
pub mod retry;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitOpen, CircuitState,
    CircuitStats,
};
pub use retry::{RetryPolicy, RetryableError, is_retryable_message, retry, retry_with_backoff};
