//! Health and registration responses
//!
//! Both wire bindings render these same structures, so a caller sees the
//! same health fields whether it talks gRPC or HTTP.

use serde::{Deserialize, Serialize};

/// Result of the best-effort outbound reachability probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStatus {
    Connected,
    Disconnected,
    #[default]
    Unknown,
}

impl NetworkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkStatus::Connected => "connected",
            NetworkStatus::Disconnected => "disconnected",
            NetworkStatus::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "connected" => NetworkStatus::Connected,
            "disconnected" => NetworkStatus::Disconnected,
            _ => NetworkStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub uptime_seconds: f64,
    pub total_requests: u64,
    pub error_rate: f64,
    pub request_rate_per_minute: f64,
}

/// Occupancy of the server's bounded worker pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPoolStats {
    pub pool_size: usize,
    pub busy: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub version: String,
    pub registered_agents: usize,
    pub tool_count: usize,
    pub network_status: NetworkStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub metrics: MetricsSummary,
    #[serde(default)]
    pub workers: WorkerPoolStats,
}

impl HealthReport {
    /// Report for a server that could not be reached or failed to answer.
    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self {
            healthy: false,
            reason: Some(reason.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationAck {
    pub success: bool,
    pub agent_id: String,
    pub message: String,
}

impl RegistrationAck {
    pub fn accepted(agent_id: impl Into<String>) -> Self {
        let agent_id = agent_id.into();
        Self {
            success: true,
            message: format!("Agent {} registered successfully", agent_id),
            agent_id,
        }
    }
}
