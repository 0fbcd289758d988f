//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application-layer
//! parameter types by the `to_*` methods on each section.

mod client;
mod logging;
mod resilience;
mod server;

pub use client::FileClientConfig;
pub use logging::FileLoggingConfig;
pub use resilience::{FileCacheConfig, FileCircuitBreakerConfig, FilePoolConfig, FileRetryConfig};
pub use server::{FileExecutorConfig, FileServerConfig};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use strix_domain::ConfigIssue;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Listening address, transport and auth policy
    pub server: FileServerConfig,
    /// Local worker pool
    pub executor: FileExecutorConfig,
    /// Remote server used by client commands
    pub client: FileClientConfig,
    pub cache: FileCacheConfig,
    pub circuit_breaker: FileCircuitBreakerConfig,
    pub pool: FilePoolConfig,
    pub retry: FileRetryConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        self.server.validate(&mut issues);
        self.executor.validate(&mut issues);
        self.client.validate(&mut issues);
        self.cache.validate(&mut issues);
        self.circuit_breaker.validate(&mut issues);
        self.pool.validate(&mut issues);
        self.retry.validate(&mut issues);
        issues
    }

    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(|i| i.is_error())
    }
}

/// Seconds as a duration, or `fallback` when not a positive finite number.
pub(crate) fn secs_or(secs: f64, fallback: Duration) -> Duration {
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).unwrap_or(fallback)
    } else {
        fallback
    }
}

fn check_positive_secs(field: &str, secs: f64, issues: &mut Vec<ConfigIssue>) {
    if !(secs.is_finite() && secs > 0.0) {
        issues.push(ConfigIssue::error(
            field,
            format!("must be a positive number of seconds, got {}", secs),
        ));
    }
}
