//! Caller-side parameters for the remote client pipeline.

use std::time::Duration;

/// Used when neither the call nor the client configures a timeout.
pub const FALLBACK_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientParams {
    /// Default per-call timeout; batches get twice this
    pub default_timeout: Option<Duration>,
    pub health_timeout: Duration,
}

impl Default for ClientParams {
    fn default() -> Self {
        Self {
            default_timeout: None,
            health_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientParams {
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Effective timeout: call override, then client default, then fallback.
    pub fn effective_timeout(&self, call_timeout: Option<Duration>) -> Duration {
        call_timeout
            .or(self.default_timeout)
            .unwrap_or(FALLBACK_TIMEOUT)
    }

    pub fn batch_timeout(&self) -> Duration {
        self.effective_timeout(None) * 2
    }
}
