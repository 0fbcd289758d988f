//! Worker-side execution parameters.

use std::time::Duration;

/// Controls the local tool executor's worker pool.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorParams {
    /// Maximum tools running at once across all callers
    pub pool_size: usize,
    /// Per-invocation timeout when the request carries none
    pub default_timeout: Duration,
    /// Upper bound on concurrently running elements of one batch
    pub batch_cap: usize,
}

impl Default for ExecutorParams {
    fn default() -> Self {
        Self {
            pool_size: 10,
            default_timeout: Duration::from_secs(60),
            batch_cap: 64,
        }
    }
}

impl ExecutorParams {
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_batch_cap(mut self, cap: usize) -> Self {
        self.batch_cap = cap.max(1);
        self
    }
}
