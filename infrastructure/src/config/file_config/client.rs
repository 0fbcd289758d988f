//! Client configuration from TOML (`[client]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use strix_application::{ClientParams, Protocol};
use strix_domain::ConfigIssue;

use super::{check_positive_secs, secs_or};

/// Raw client configuration from TOML.
///
/// ```toml
/// [client]
/// server_url = "my-tunnel.trycloudflare.com"
/// transport = "http"
/// timeout_secs = 300
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileClientConfig {
    /// Remote server (`STRIX_SERVER_URL`, or `CRED_TUNNEL` which wins)
    pub server_url: Option<String>,
    pub transport: Protocol,
    /// Token sent as a bearer credential (`STRIX_SERVER_TOKEN`)
    pub auth_token: Option<String>,
    /// Default per-call timeout (`STRIX_TOOL_TIMEOUT`); 60 s when unset
    pub timeout_secs: Option<f64>,
    pub health_timeout_secs: f64,
    /// Agent id used by CLI calls
    pub agent_id: String,
}

impl Default for FileClientConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            transport: Protocol::Grpc,
            auth_token: None,
            timeout_secs: None,
            health_timeout_secs: ClientParams::default().health_timeout.as_secs_f64(),
            agent_id: "strix-cli".to_string(),
        }
    }
}

impl FileClientConfig {
    pub fn to_client_params(&self) -> ClientParams {
        let defaults = ClientParams::default();
        let params = ClientParams {
            health_timeout: secs_or(self.health_timeout_secs, defaults.health_timeout),
            ..defaults
        };
        match self.timeout_secs {
            Some(secs) => params.with_default_timeout(secs_or(secs, Duration::from_secs(60))),
            None => params,
        }
    }

    pub(super) fn validate(&self, issues: &mut Vec<ConfigIssue>) {
        if let Some(secs) = self.timeout_secs {
            check_positive_secs("client.timeout_secs", secs, issues);
        }
        check_positive_secs("client.health_timeout_secs", self.health_timeout_secs, issues);
        if self.server_url.as_deref().is_some_and(|u| u.trim().is_empty()) {
            issues.push(ConfigIssue::warning("client.server_url", "empty server URL is ignored"));
        }
    }
}
