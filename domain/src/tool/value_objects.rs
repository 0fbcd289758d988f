//! Tool domain value objects: result and error types
//!
//! These types form the **output side** of a tool invocation. Every
//! execution, local or remote, ends in exactly one [`ToolResult`]: either a
//! JSON value or a failure message with an [`ErrorKind`].
//!
//! The error kind drives the **retry strategy** of remote callers:
//!
//! | Kind | Retried? | Typical cause |
//! |------|----------|---------------|
//! | `not_found` | No | Unknown tool name |
//! | `invalid_arguments` | No | Conversion or validation failure |
//! | `unauthorized` | No | Bad or missing bearer token |
//! | `execution_error` | No | The tool itself failed |
//! | `unavailable` | Yes | Circuit open, connection refused |
//! | `timeout` | Yes | Deadline exceeded |
//! | `server_error` | Yes | Unexpected 5xx / internal status |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Classification of a failed tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown tool
    NotFound,
    /// Argument conversion or validation failure
    InvalidArguments,
    /// The tool raised during its run
    ExecutionError,
    /// Bad or missing token
    Unauthorized,
    /// Circuit open or connection failure
    Unavailable,
    /// Deadline exceeded
    Timeout,
    /// Unexpected 5xx or internal failure
    ServerError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::NotFound,
        ErrorKind::InvalidArguments,
        ErrorKind::ExecutionError,
        ErrorKind::Unauthorized,
        ErrorKind::Unavailable,
        ErrorKind::Timeout,
        ErrorKind::ServerError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidArguments => "invalid_arguments",
            ErrorKind::ExecutionError => "execution_error",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ServerError => "server_error",
        }
    }

    /// Parse the wire representation. Unknown strings map to `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// Whether a transport failure of this kind may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::Unavailable | ErrorKind::Timeout | ErrorKind::ServerError
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error produced while resolving, validating or running a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(tool_name: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("Tool '{}' not found", tool_name))
    }

    pub fn invalid_arguments(message: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::InvalidArguments,
            format!("Argument conversion error: {}", message),
        )
    }

    pub fn execution(message: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::ExecutionError,
            format!("Tool execution error: {}", message),
        )
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized, "Unauthorized")
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    pub fn timeout(tool_name: &str, after: std::time::Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!(
                "Tool '{}' timed out after {:.1}s",
                tool_name,
                after.as_secs_f64()
            ),
        )
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerError, message)
    }
}

/// Outcome of one tool invocation.
///
/// Always exactly one of a value or a failure; the exit code follows the
/// process convention (`0` on success, `1` otherwise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResult {
    Success { value: Value },
    Failure { message: String, kind: ErrorKind },
}

impl ToolResult {
    pub fn success(value: impl Into<Value>) -> Self {
        ToolResult::Success {
            value: value.into(),
        }
    }

    pub fn failure(error: ToolError) -> Self {
        ToolResult::Failure {
            message: error.message,
            kind: error.kind,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success { .. })
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            ToolResult::Success { value } => Some(value),
            ToolResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<ToolError> {
        match self {
            ToolResult::Success { .. } => None,
            ToolResult::Failure { message, kind } => Some(ToolError::new(*kind, message.clone())),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ToolResult::Success { .. } => None,
            ToolResult::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn into_result(self) -> Result<Value, ToolError> {
        match self {
            ToolResult::Success { value } => Ok(value),
            ToolResult::Failure { message, kind } => Err(ToolError { kind, message }),
        }
    }
}

impl From<Result<Value, ToolError>> for ToolResult {
    fn from(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(value) => ToolResult::success(value),
            Err(error) => ToolResult::failure(error),
        }
    }
}
