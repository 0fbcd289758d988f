//! Server configuration from TOML (`[server]` and `[executor]` sections)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use strix_application::{ExecutorParams, Protocol, ServerParams};
use strix_domain::ConfigIssue;

use super::{check_positive_secs, secs_or};

/// Raw server configuration from TOML.
///
/// ```toml
/// [server]
/// host = "0.0.0.0"
/// port = 50051
/// transport = "http"
/// auth_token = "..."
/// require_auth = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    pub host: String,
    pub port: u16,
    pub transport: Protocol,
    /// Bearer token callers must present (`STRIX_SERVER_TOKEN`)
    pub auth_token: Option<String>,
    /// Refuse to start when no token is configured
    pub require_auth: bool,
    /// Host resolved by the health check's reachability probe
    pub probe_host: String,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 50051,
            transport: Protocol::Grpc,
            auth_token: None,
            require_auth: false,
            probe_host: "google.com".to_string(),
        }
    }
}

impl FileServerConfig {
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn to_server_params(&self) -> ServerParams {
        let params = ServerParams::default().with_require_auth(self.require_auth);
        match &self.auth_token {
            Some(token) => params.with_auth_token(token.clone()),
            None => params,
        }
    }

    pub(super) fn validate(&self, issues: &mut Vec<ConfigIssue>) {
        if self.port == 0 {
            issues.push(ConfigIssue::error("server.port", "port must be between 1 and 65535"));
        }
        if self.host.trim().is_empty() {
            issues.push(ConfigIssue::error("server.host", "host must not be empty"));
        }
        let has_token = self.auth_token.as_deref().is_some_and(|t| !t.is_empty());
        if self.require_auth && !has_token {
            issues.push(ConfigIssue::error(
                "server.auth_token",
                "require_auth is set but no token is configured (set STRIX_SERVER_TOKEN)",
            ));
        }
    }
}

/// Raw executor configuration from TOML (`[executor]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutorConfig {
    /// Worker pool size (`STRIX_TOOL_POOL_SIZE`)
    pub pool_size: usize,
    /// Default per-tool timeout in seconds
    pub timeout_secs: f64,
    pub batch_cap: usize,
}

impl Default for FileExecutorConfig {
    fn default() -> Self {
        let params = ExecutorParams::default();
        Self {
            pool_size: params.pool_size,
            timeout_secs: params.default_timeout.as_secs_f64(),
            batch_cap: params.batch_cap,
        }
    }
}

impl FileExecutorConfig {
    pub fn to_executor_params(&self) -> ExecutorParams {
        ExecutorParams::default()
            .with_pool_size(self.pool_size)
            .with_default_timeout(secs_or(self.timeout_secs, Duration::from_secs(60)))
            .with_batch_cap(self.batch_cap)
    }

    pub(super) fn validate(&self, issues: &mut Vec<ConfigIssue>) {
        if self.pool_size == 0 {
            issues.push(ConfigIssue::error("executor.pool_size", "must be at least 1"));
        }
        if self.batch_cap == 0 {
            issues.push(ConfigIssue::error("executor.batch_cap", "must be at least 1"));
        }
        check_positive_secs("executor.timeout_secs", self.timeout_secs, issues);
    }
}
