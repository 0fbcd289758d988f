//! Transport binding port
//!
//! One abstract capability, two wire protocols. The client-side resilience
//! pipeline (cache, breaker, retry, metrics) lives in
//! [`RemoteToolClient`](crate::use_cases::remote_client::RemoteToolClient)
//! and talks to whichever binding was configured:
//!
//! ```text
//!                      ┌────────────────────┐
//!                      │  RemoteToolClient  │
//!                      └─────────┬──────────┘
//!                                │ dyn TransportBinding
//!                 ┌──────────────┴──────────────┐
//!                 ▼                             ▼
//!        ┌─────────────────┐           ┌─────────────────┐
//!        │ GrpcBinding     │           │ HttpBinding     │
//!        │ (tonic)         │           │ (reqwest)       │
//!        └─────────────────┘           └─────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strix_domain::{ErrorKind, HealthReport, RegistrationAck, ToolInvocation, ToolResult};
use thiserror::Error;

/// Wire protocol of a binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Grpc,
    #[serde(alias = "rest")]
    Http,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Grpc => "grpc",
            Protocol::Http => "http",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grpc" => Ok(Protocol::Grpc),
            "http" | "rest" => Ok(Protocol::Http),
            other => Err(format!("unknown transport '{}' (expected grpc or http)", other)),
        }
    }
}

/// RPC status codes, mirroring the canonical gRPC set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcCode {
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

/// Status attached to a transport failure by the wire layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireStatus {
    Http(u16),
    Rpc(RpcCode),
}

impl WireStatus {
    /// Statuses worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            WireStatus::Http(code) => matches!(code, 408 | 429 | 500 | 502 | 503 | 504),
            WireStatus::Rpc(code) => matches!(
                code,
                RpcCode::Unavailable
                    | RpcCode::DeadlineExceeded
                    | RpcCode::ResourceExhausted
                    | RpcCode::Aborted
                    | RpcCode::Internal
            ),
        }
    }

    /// Whether the remote end is asking callers to slow down.
    pub fn is_throttled(&self) -> bool {
        matches!(
            self,
            WireStatus::Http(429) | WireStatus::Rpc(RpcCode::ResourceExhausted)
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WireStatus::Http(code) => match code {
                400 | 422 => ErrorKind::InvalidArguments,
                401 | 403 => ErrorKind::Unauthorized,
                404 => ErrorKind::NotFound,
                408 | 504 => ErrorKind::Timeout,
                429 | 502 | 503 => ErrorKind::Unavailable,
                _ => ErrorKind::ServerError,
            },
            WireStatus::Rpc(code) => match code {
                RpcCode::InvalidArgument | RpcCode::OutOfRange | RpcCode::FailedPrecondition => {
                    ErrorKind::InvalidArguments
                }
                RpcCode::Unauthenticated | RpcCode::PermissionDenied => ErrorKind::Unauthorized,
                RpcCode::NotFound | RpcCode::Unimplemented => ErrorKind::NotFound,
                RpcCode::DeadlineExceeded => ErrorKind::Timeout,
                RpcCode::Unavailable | RpcCode::ResourceExhausted | RpcCode::Cancelled => {
                    ErrorKind::Unavailable
                }
                _ => ErrorKind::ServerError,
            },
        }
    }
}

impl std::fmt::Display for WireStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireStatus::Http(code) => write!(f, "HTTP {}", code),
            WireStatus::Rpc(code) => write!(f, "RPC {:?}", code),
        }
    }
}

/// Failure of a wire call (as opposed to a tool that ran and failed).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: ErrorKind,
    pub message: String,
    pub status: Option<WireStatus>,
}

impl TransportError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Error carrying a wire status; the kind is derived from it.
    pub fn with_status(status: WireStatus, message: impl Into<String>) -> Self {
        Self {
            kind: status.kind(),
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("Request timed out after {:.1}s", after.as_secs_f64()),
        )
    }

    pub fn invalid_endpoint(endpoint: &str, reason: &str) -> Self {
        Self::new(
            ErrorKind::InvalidArguments,
            format!("Invalid endpoint '{}': {}", endpoint, reason),
        )
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerError, message)
    }
}

/// Client side of a wire protocol.
#[async_trait]
pub trait TransportBinding: Send + Sync {
    fn protocol(&self) -> Protocol;

    /// Normalized remote endpoint; keys the circuit breaker.
    fn endpoint(&self) -> &str;

    async fn execute_tool(
        &self,
        invocation: &ToolInvocation,
        timeout: Duration,
    ) -> Result<ToolResult, TransportError>;

    async fn execute_batch(
        &self,
        agent_id: &str,
        invocations: &[ToolInvocation],
        timeout: Duration,
    ) -> Result<Vec<ToolResult>, TransportError>;

    async fn health_check(&self) -> Result<HealthReport, TransportError>;

    async fn register_agent(&self, agent_id: &str) -> Result<RegistrationAck, TransportError>;

    /// Close pooled connections.
    fn shutdown(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        for code in [408, 429, 500, 502, 503, 504] {
            assert!(WireStatus::Http(code).is_retryable(), "{}", code);
        }
        for code in [400, 401, 403, 404, 422] {
            assert!(!WireStatus::Http(code).is_retryable(), "{}", code);
        }
        assert!(WireStatus::Rpc(RpcCode::Unavailable).is_retryable());
        assert!(WireStatus::Rpc(RpcCode::Internal).is_retryable());
        assert!(!WireStatus::Rpc(RpcCode::Unauthenticated).is_retryable());
    }

    #[test]
    fn test_status_kind_mapping() {
        assert_eq!(WireStatus::Http(401).kind(), ErrorKind::Unauthorized);
        assert_eq!(WireStatus::Http(404).kind(), ErrorKind::NotFound);
        assert_eq!(WireStatus::Http(503).kind(), ErrorKind::Unavailable);
        assert_eq!(WireStatus::Http(500).kind(), ErrorKind::ServerError);
        assert_eq!(
            WireStatus::Rpc(RpcCode::DeadlineExceeded).kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            WireStatus::Rpc(RpcCode::InvalidArgument).kind(),
            ErrorKind::InvalidArguments
        );
    }

    #[test]
    fn test_protocol_parse() {
        assert_eq!("gRPC".parse::<Protocol>().unwrap(), Protocol::Grpc);
        assert_eq!("rest".parse::<Protocol>().unwrap(), Protocol::Http);
        assert!("smtp".parse::<Protocol>().is_err());
    }
}
