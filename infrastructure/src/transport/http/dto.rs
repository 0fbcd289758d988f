//! JSON bodies of the HTTP binding

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use strix_domain::tool::invocation::UNKNOWN_AGENT;
use strix_domain::{ErrorKind, ToolInvocation, ToolResult};

fn unknown_agent() -> String {
    UNKNOWN_AGENT.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default = "unknown_agent")]
    pub agent_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl ExecuteRequest {
    pub fn from_invocation(invocation: &ToolInvocation, auth_token: Option<&str>) -> Self {
        Self {
            agent_id: invocation.agent_id.clone(),
            tool_name: invocation.tool_name.clone(),
            kwargs: object(invocation),
            timeout: invocation.timeout.map(|t| t.as_secs_f64()),
            auth_token: auth_token.map(str::to_string),
        }
    }

    pub fn into_invocation(self) -> ToolInvocation {
        let mut invocation = ToolInvocation::new(self.tool_name)
            .with_agent_id(self.agent_id)
            .with_arguments(self.kwargs.into_iter().collect());
        if let Some(timeout) = self
            .timeout
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .filter(|d| !d.is_zero())
        {
            invocation = invocation.with_timeout(timeout);
        }
        invocation
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub success: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_error_kind"
    )]
    pub error_kind: Option<ErrorKind>,
    pub exit_code: i32,
}

/// Kinds this build does not know read as `ExecutionError`.
fn lenient_error_kind<'de, D>(deserializer: D) -> Result<Option<ErrorKind>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|kind| ErrorKind::parse(&kind).unwrap_or(ErrorKind::ExecutionError)))
}

impl From<ToolResult> for ExecuteResponse {
    fn from(result: ToolResult) -> Self {
        let exit_code = result.exit_code();
        match result {
            ToolResult::Success { value } => Self {
                success: true,
                result: value,
                error: String::new(),
                error_kind: None,
                exit_code,
            },
            ToolResult::Failure { message, kind } => Self {
                success: false,
                result: Value::Null,
                error: message,
                error_kind: Some(kind),
                exit_code,
            },
        }
    }
}

impl From<ExecuteResponse> for ToolResult {
    fn from(response: ExecuteResponse) -> Self {
        if response.success {
            ToolResult::success(response.result)
        } else {
            ToolResult::Failure {
                message: response.error,
                kind: response.error_kind.unwrap_or(ErrorKind::ExecutionError),
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub tool_name: String,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchExecuteRequest {
    #[serde(default = "unknown_agent")]
    pub agent_id: String,
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl BatchExecuteRequest {
    pub fn from_invocations(
        agent_id: &str,
        invocations: &[ToolInvocation],
        auth_token: Option<&str>,
    ) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            tools: invocations
                .iter()
                .map(|inv| ToolSpec {
                    tool_name: inv.tool_name.clone(),
                    kwargs: object(inv),
                })
                .collect(),
            auth_token: auth_token.map(str::to_string),
        }
    }

    pub fn into_invocations(self) -> (String, Vec<ToolInvocation>) {
        let agent_id = self.agent_id;
        let invocations = self
            .tools
            .into_iter()
            .map(|spec| {
                ToolInvocation::new(spec.tool_name)
                    .with_agent_id(agent_id.clone())
                    .with_arguments(spec.kwargs.into_iter().collect())
            })
            .collect();
        (agent_id, invocations)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchExecuteResponse {
    pub results: Vec<ExecuteResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAgentRequest {
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

fn object(invocation: &ToolInvocation) -> Map<String, Value> {
    invocation
        .arguments
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_execute_request_defaults() {
        let req: ExecuteRequest = serde_json::from_value(json!({"tool_name": "ping"})).unwrap();
        let inv = req.into_invocation();
        assert_eq!(inv.agent_id, "unknown");
        assert!(inv.arguments.is_empty());
        assert!(inv.timeout.is_none());
    }

    #[test]
    fn test_execute_request_timeout() {
        let req: ExecuteRequest = serde_json::from_value(
            json!({"tool_name": "ping", "timeout": 2.5, "kwargs": {"a": 1}}),
        )
        .unwrap();
        let inv = req.into_invocation();
        assert_eq!(inv.timeout, Some(Duration::from_millis(2500)));
        assert_eq!(inv.arguments["a"], json!(1));
    }

    #[test]
    fn test_failure_response_shape() {
        let response = ExecuteResponse::from(ToolResult::Failure {
            message: "Tool 'x' not found".into(),
            kind: ErrorKind::NotFound,
        });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "success": false,
                "result": null,
                "error": "Tool 'x' not found",
                "error_kind": "not_found",
                "exit_code": 1,
            })
        );
    }

    #[test]
    fn test_unrecognised_error_kind_falls_back() {
        let response: ExecuteResponse = serde_json::from_value(json!({
            "success": false,
            "error": "quota",
            "error_kind": "quota_exceeded",
            "exit_code": 1,
        }))
        .unwrap();
        assert_eq!(
            ToolResult::from(response).kind(),
            Some(ErrorKind::ExecutionError)
        );

        let known: ExecuteResponse = serde_json::from_value(json!({
            "success": false,
            "error": "Tool 'x' not found",
            "error_kind": "not_found",
            "exit_code": 1,
        }))
        .unwrap();
        assert_eq!(known.error_kind, Some(ErrorKind::NotFound));
    }

    #[test]
    fn test_legacy_failure_without_kind() {
        let response: ExecuteResponse =
            serde_json::from_value(json!({"success": false, "error": "boom", "exit_code": 1}))
                .unwrap();
        assert_eq!(
            ToolResult::from(response).kind(),
            Some(ErrorKind::ExecutionError)
        );
    }
}
