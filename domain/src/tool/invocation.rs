//! Tool invocation requests

use crate::util::truncate_chars;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Agent id used when a caller does not identify itself.
pub const UNKNOWN_AGENT: &str = "unknown";

/// Maximum characters of a single argument value shown in error summaries.
pub const ARGUMENT_PREVIEW_CHARS: usize = 100;

const SECRET_KEY_MARKERS: &[&str] = &[
    "token",
    "password",
    "passwd",
    "secret",
    "api_key",
    "apikey",
    "authorization",
    "credential",
    "cookie",
];

/// A single request to run a named tool.
///
/// Built once by the caller with the `with_*` methods and consumed by the
/// executor. Arguments are kept in an ordered map so serialized forms are
/// stable.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub arguments: BTreeMap<String, Value>,
    pub agent_id: String,
    pub timeout: Option<Duration>,
}

/// Ordered group of invocations executed together.
pub type BatchSpec = Vec<ToolInvocation>;

impl ToolInvocation {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: BTreeMap::new(),
            agent_id: UNKNOWN_AGENT.to_string(),
            timeout: None,
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_arguments(mut self, arguments: BTreeMap<String, Value>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Arguments as a JSON object.
    pub fn arguments_value(&self) -> Value {
        Value::Object(
            self.arguments
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Human-readable argument preview for error messages.
    pub fn argument_summary(&self) -> String {
        summarize_arguments(&self.arguments)
    }
}

/// Render arguments as compact JSON with long values truncated and
/// secret-shaped keys redacted.
pub fn summarize_arguments(arguments: &BTreeMap<String, Value>) -> String {
    let summary: serde_json::Map<String, Value> = arguments
        .iter()
        .map(|(key, value)| {
            let shown = if is_secret_key(key) {
                Value::String("[REDACTED]".to_string())
            } else {
                match value {
                    Value::String(s) => Value::String(truncate_chars(s, ARGUMENT_PREVIEW_CHARS)),
                    other => {
                        let rendered = other.to_string();
                        if rendered.chars().count() > ARGUMENT_PREVIEW_CHARS {
                            Value::String(truncate_chars(&rendered, ARGUMENT_PREVIEW_CHARS))
                        } else {
                            other.clone()
                        }
                    }
                }
            };
            (key.clone(), shown)
        })
        .collect();
    Value::Object(summary).to_string()
}

fn is_secret_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SECRET_KEY_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_defaults() {
        let inv = ToolInvocation::new("read_file").with_arg("path", "/etc/hostname");
        assert_eq!(inv.agent_id, UNKNOWN_AGENT);
        assert!(inv.timeout.is_none());
        assert_eq!(inv.arguments_value(), json!({"path": "/etc/hostname"}));
    }

    #[test]
    fn test_summary_truncates_long_values() {
        let long = "x".repeat(250);
        let inv = ToolInvocation::new("write_file").with_arg("content", long);
        let summary = inv.argument_summary();
        assert!(summary.contains(&format!("{}...", "x".repeat(100))));
        assert!(!summary.contains(&"x".repeat(101)));
    }

    #[test]
    fn test_summary_redacts_secrets() {
        let inv = ToolInvocation::new("login")
            .with_arg("username", "admin")
            .with_arg("Password", "hunter2")
            .with_arg("api_key", "abc");
        let summary = inv.argument_summary();
        assert!(summary.contains("admin"));
        assert!(!summary.contains("hunter2"));
        assert!(!summary.contains("abc"));
        assert!(summary.contains("[REDACTED]"));
    }
}
