//! Resilience configuration from TOML
//!
//! Covers the `[cache]`, `[circuit_breaker]`, `[pool]` and `[retry]`
//! sections. Defaults mirror the component defaults in the application
//! layer.

use serde::{Deserialize, Serialize};
use strix_application::{CacheConfig, CircuitBreakerConfig, PoolConfig, RetryPolicy};
use strix_domain::ConfigIssue;

use super::{check_positive_secs, secs_or};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCacheConfig {
    pub enabled: bool,
    pub ttl_secs: f64,
    pub max_size: usize,
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        let cache = CacheConfig::default();
        Self {
            enabled: true,
            ttl_secs: cache.default_ttl.as_secs_f64(),
            max_size: cache.max_size,
        }
    }
}

impl FileCacheConfig {
    /// A disabled cache is a cache of size zero.
    pub fn to_cache_config(&self) -> CacheConfig {
        let defaults = CacheConfig::default();
        CacheConfig {
            default_ttl: secs_or(self.ttl_secs, defaults.default_ttl),
            max_size: if self.enabled { self.max_size } else { 0 },
        }
    }

    pub(super) fn validate(&self, issues: &mut Vec<ConfigIssue>) {
        check_positive_secs("cache.ttl_secs", self.ttl_secs, issues);
        if self.enabled && self.max_size == 0 {
            issues.push(ConfigIssue::warning(
                "cache.max_size",
                "max_size = 0 disables caching; set enabled = false instead",
            ));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub timeout_secs: f64,
}

impl Default for FileCircuitBreakerConfig {
    fn default() -> Self {
        let config = CircuitBreakerConfig::default();
        Self {
            failure_threshold: config.failure_threshold,
            success_threshold: config.success_threshold,
            timeout_secs: config.timeout.as_secs_f64(),
        }
    }
}

impl FileCircuitBreakerConfig {
    pub fn to_breaker_config(&self) -> CircuitBreakerConfig {
        let defaults = CircuitBreakerConfig::default();
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold.max(1),
            success_threshold: self.success_threshold.max(1),
            timeout: secs_or(self.timeout_secs, defaults.timeout),
        }
    }

    pub(super) fn validate(&self, issues: &mut Vec<ConfigIssue>) {
        if self.failure_threshold == 0 {
            issues.push(ConfigIssue::error("circuit_breaker.failure_threshold", "must be at least 1"));
        }
        if self.success_threshold == 0 {
            issues.push(ConfigIssue::error("circuit_breaker.success_threshold", "must be at least 1"));
        }
        check_positive_secs("circuit_breaker.timeout_secs", self.timeout_secs, issues);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePoolConfig {
    pub max_connections: usize,
    pub idle_timeout_secs: f64,
    /// How often idle channels are pruned
    pub cleanup_interval_secs: f64,
}

impl Default for FilePoolConfig {
    fn default() -> Self {
        let pool = PoolConfig::default();
        Self {
            max_connections: pool.max_connections,
            idle_timeout_secs: pool.idle_timeout.as_secs_f64(),
            cleanup_interval_secs: 60.0,
        }
    }
}

impl FilePoolConfig {
    pub fn to_pool_config(&self) -> PoolConfig {
        let defaults = PoolConfig::default();
        PoolConfig {
            max_connections: self.max_connections,
            idle_timeout: secs_or(self.idle_timeout_secs, defaults.idle_timeout),
        }
    }

    pub fn cleanup_interval(&self) -> std::time::Duration {
        secs_or(self.cleanup_interval_secs, std::time::Duration::from_secs(60))
    }

    pub(super) fn validate(&self, issues: &mut Vec<ConfigIssue>) {
        if self.max_connections == 0 {
            issues.push(ConfigIssue::warning(
                "pool.max_connections",
                "0 disables pooling; every call opens a temporary connection",
            ));
        }
        check_positive_secs("pool.idle_timeout_secs", self.idle_timeout_secs, issues);
        check_positive_secs("pool.cleanup_interval_secs", self.cleanup_interval_secs, issues);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    pub max_attempts: u32,
    pub base_delay_secs: f64,
    pub max_delay_secs: f64,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_secs: policy.base_delay.as_secs_f64(),
            max_delay_secs: policy.max_delay.as_secs_f64(),
        }
    }
}

impl FileRetryConfig {
    pub fn to_retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy::new(
            self.max_attempts.max(1),
            secs_or(self.base_delay_secs, defaults.base_delay),
            secs_or(self.max_delay_secs, defaults.max_delay),
        )
    }

    pub(super) fn validate(&self, issues: &mut Vec<ConfigIssue>) {
        if self.max_attempts == 0 {
            issues.push(ConfigIssue::error("retry.max_attempts", "must be at least 1"));
        }
        check_positive_secs("retry.base_delay_secs", self.base_delay_secs, issues);
        check_positive_secs("retry.max_delay_secs", self.max_delay_secs, issues);
        if self.base_delay_secs > self.max_delay_secs {
            issues.push(ConfigIssue::warning(
                "retry.base_delay_secs",
                "base delay exceeds max delay; every retry waits max_delay_secs",
            ));
        }
    }
}
