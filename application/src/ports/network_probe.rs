//! Network reachability port used by health reporting.

use async_trait::async_trait;
use strix_domain::NetworkStatus;

/// Best-effort outbound connectivity check.
///
/// Implementations swallow their own errors and report
/// [`NetworkStatus::Disconnected`] or [`NetworkStatus::Unknown`] instead.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn check(&self) -> NetworkStatus;
}

/// Probe that always reports a fixed status.
pub struct StaticProbe(pub NetworkStatus);

#[async_trait]
impl NetworkProbe for StaticProbe {
    async fn check(&self) -> NetworkStatus {
        self.0
    }
}
