//! gRPC binding (tonic client and server)
//!
//! Arguments travel as a `map<string, string>` of JSON-encoded values and
//! results as a JSON string, so any JSON value survives the trip.

pub mod client;
pub mod server;

pub use client::{GrpcBinding, GrpcChannelFactory, GrpcPool};
pub use server::{GrpcToolService, serve};

pub mod proto {
    tonic::include_proto!("strix.toolservice");
}

use proto::{HealthResponse, RegisterAgentResponse, ToolRequest, ToolResponse};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use strix_application::{RpcCode, TransportError, WireStatus};
use strix_domain::tool::invocation::UNKNOWN_AGENT;
use strix_domain::{
    ErrorKind, HealthReport, MetricsSummary, NetworkStatus, RegistrationAck, ToolInvocation,
    ToolResult, WorkerPoolStats,
};

pub(crate) fn encode_kwargs(arguments: &BTreeMap<String, Value>) -> HashMap<String, String> {
    arguments
        .iter()
        .map(|(k, v)| (k.clone(), v.to_string()))
        .collect()
}

/// Values that are not valid JSON pass through as raw strings.
pub(crate) fn decode_kwargs(kwargs: HashMap<String, String>) -> BTreeMap<String, Value> {
    kwargs
        .into_iter()
        .map(|(k, raw)| {
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            (k, value)
        })
        .collect()
}

pub(crate) fn tool_request(invocation: &ToolInvocation, auth_token: Option<&str>) -> ToolRequest {
    ToolRequest {
        agent_id: invocation.agent_id.clone(),
        tool_name: invocation.tool_name.clone(),
        kwargs: encode_kwargs(&invocation.arguments),
        auth_token: auth_token.unwrap_or_default().to_string(),
        timeout_secs: invocation.timeout.map(|t| t.as_secs_f64()),
    }
}

pub(crate) fn invocation_from(request: ToolRequest) -> ToolInvocation {
    let agent_id = if request.agent_id.is_empty() {
        UNKNOWN_AGENT.to_string()
    } else {
        request.agent_id
    };
    let mut invocation = ToolInvocation::new(request.tool_name)
        .with_agent_id(agent_id)
        .with_arguments(decode_kwargs(request.kwargs));
    if let Some(timeout) = request
        .timeout_secs
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .filter(|d| !d.is_zero())
    {
        invocation = invocation.with_timeout(timeout);
    }
    invocation
}

impl From<ToolResult> for ToolResponse {
    fn from(result: ToolResult) -> Self {
        let exit_code = result.exit_code();
        match result {
            ToolResult::Success { value } => ToolResponse {
                success: true,
                result: value.to_string(),
                error: String::new(),
                exit_code,
                error_kind: String::new(),
            },
            ToolResult::Failure { message, kind } => ToolResponse {
                success: false,
                result: String::new(),
                error: message,
                exit_code,
                error_kind: kind.as_str().to_string(),
            },
        }
    }
}

impl From<ToolResponse> for ToolResult {
    fn from(response: ToolResponse) -> Self {
        if response.success {
            let value = if response.result.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&response.result).unwrap_or(Value::String(response.result))
            };
            ToolResult::success(value)
        } else {
            ToolResult::Failure {
                message: response.error,
                kind: ErrorKind::parse(&response.error_kind).unwrap_or(ErrorKind::ExecutionError),
            }
        }
    }
}

impl From<HealthReport> for HealthResponse {
    fn from(report: HealthReport) -> Self {
        HealthResponse {
            healthy: report.healthy,
            version: report.version,
            registered_agents: report.registered_agents as u32,
            tool_count: report.tool_count as u32,
            network_status: report.network_status.as_str().to_string(),
            reason: report.reason.unwrap_or_default(),
            uptime_seconds: report.metrics.uptime_seconds,
            total_requests: report.metrics.total_requests,
            error_rate: report.metrics.error_rate,
            request_rate_per_minute: report.metrics.request_rate_per_minute,
            worker_pool_size: report.workers.pool_size as u32,
            workers_busy: report.workers.busy as u32,
        }
    }
}

impl From<HealthResponse> for HealthReport {
    fn from(response: HealthResponse) -> Self {
        HealthReport {
            healthy: response.healthy,
            version: response.version,
            registered_agents: response.registered_agents as usize,
            tool_count: response.tool_count as usize,
            network_status: NetworkStatus::parse(&response.network_status),
            reason: (!response.reason.is_empty()).then_some(response.reason),
            metrics: MetricsSummary {
                uptime_seconds: response.uptime_seconds,
                total_requests: response.total_requests,
                error_rate: response.error_rate,
                request_rate_per_minute: response.request_rate_per_minute,
            },
            workers: WorkerPoolStats {
                pool_size: response.worker_pool_size as usize,
                busy: response.workers_busy as usize,
            },
        }
    }
}

impl From<RegistrationAck> for RegisterAgentResponse {
    fn from(ack: RegistrationAck) -> Self {
        RegisterAgentResponse {
            success: ack.success,
            agent_id: ack.agent_id,
            message: ack.message,
        }
    }
}

impl From<RegisterAgentResponse> for RegistrationAck {
    fn from(response: RegisterAgentResponse) -> Self {
        RegistrationAck {
            success: response.success,
            agent_id: response.agent_id,
            message: response.message,
        }
    }
}

pub(crate) fn rpc_code(code: tonic::Code) -> RpcCode {
    use tonic::Code;
    match code {
        Code::Ok => RpcCode::Ok,
        Code::Cancelled => RpcCode::Cancelled,
        Code::Unknown => RpcCode::Unknown,
        Code::InvalidArgument => RpcCode::InvalidArgument,
        Code::DeadlineExceeded => RpcCode::DeadlineExceeded,
        Code::NotFound => RpcCode::NotFound,
        Code::AlreadyExists => RpcCode::AlreadyExists,
        Code::PermissionDenied => RpcCode::PermissionDenied,
        Code::ResourceExhausted => RpcCode::ResourceExhausted,
        Code::FailedPrecondition => RpcCode::FailedPrecondition,
        Code::Aborted => RpcCode::Aborted,
        Code::OutOfRange => RpcCode::OutOfRange,
        Code::Unimplemented => RpcCode::Unimplemented,
        Code::Internal => RpcCode::Internal,
        Code::Unavailable => RpcCode::Unavailable,
        Code::DataLoss => RpcCode::DataLoss,
        Code::Unauthenticated => RpcCode::Unauthenticated,
    }
}

pub(crate) fn status_error(status: tonic::Status) -> TransportError {
    let code = rpc_code(status.code());
    let message = if status.message().is_empty() {
        format!("{:?}", status.code())
    } else {
        status.message().to_string()
    };
    TransportError::with_status(WireStatus::Rpc(code), message)
}
