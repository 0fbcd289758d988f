//! DNS-based reachability probe for health reports.

use async_trait::async_trait;
use std::time::Duration;
use strix_application::NetworkProbe;
use strix_domain::NetworkStatus;
use tokio::net::lookup_host;
use tracing::debug;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Resolves a well-known host; success means outbound DNS works.
pub struct DnsProbe {
    target: String,
    timeout: Duration,
}

impl DnsProbe {
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        let target = if host.contains(':') {
            host
        } else {
            format!("{}:443", host)
        };
        Self {
            target,
            timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl NetworkProbe for DnsProbe {
    async fn check(&self) -> NetworkStatus {
        match tokio::time::timeout(self.timeout, lookup_host(self.target.as_str())).await {
            Ok(Ok(mut addrs)) => {
                if addrs.next().is_some() {
                    NetworkStatus::Connected
                } else {
                    NetworkStatus::Disconnected
                }
            }
            Ok(Err(e)) => {
                debug!(target = %self.target, error = %e, "Network probe failed");
                NetworkStatus::Disconnected
            }
            Err(_) => {
                debug!(target = %self.target, "Network probe timed out");
                NetworkStatus::Unknown
            }
        }
    }
}
