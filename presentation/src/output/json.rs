//! JSON output formatter

use crate::config::ConfigSourceView;
use crate::output::formatter::OutputFormatter;
use serde_json::{Value, json};
use strix_application::ToolCallError;
use strix_domain::{ConfigIssue, HealthReport, RegistrationAck, ToolInvocation, ToolResult};

/// Machine-readable output, one pretty-printed JSON document per command
pub struct JsonFormatter;

fn pretty(value: Value) -> String {
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
}

impl OutputFormatter for JsonFormatter {
    fn tool_value(&self, tool_name: &str, value: &Value) -> String {
        pretty(json!({"success": true, "tool_name": tool_name, "result": value}))
    }

    fn tool_error(&self, error: &ToolCallError) -> String {
        pretty(json!({
            "success": false,
            "tool_name": error.tool_name,
            "endpoint": error.endpoint,
            "error": error.message,
            "error_kind": error.kind,
            "arguments": error.arguments,
            "hint": error.hint,
        }))
    }

    fn batch(&self, invocations: &[ToolInvocation], results: &[ToolResult]) -> String {
        let results: Vec<Value> = invocations
            .iter()
            .zip(results)
            .map(|(inv, result)| match result {
                ToolResult::Success { value } => {
                    json!({"tool_name": inv.tool_name, "success": true, "result": value})
                }
                ToolResult::Failure { message, kind } => json!({
                    "tool_name": inv.tool_name,
                    "success": false,
                    "error": message,
                    "error_kind": kind,
                }),
            })
            .collect();
        pretty(json!({"results": results}))
    }

    fn health(&self, endpoint: &str, report: &HealthReport) -> String {
        let mut value = serde_json::to_value(report).unwrap_or_default();
        if let Value::Object(map) = &mut value {
            map.insert("endpoint".to_string(), json!(endpoint));
        }
        pretty(value)
    }

    fn registration(&self, ack: &RegistrationAck) -> String {
        pretty(serde_json::to_value(ack).unwrap_or_default())
    }

    fn config(
        &self,
        sources: &[ConfigSourceView],
        effective: &Value,
        issues: &[ConfigIssue],
    ) -> String {
        let issues: Vec<Value> = issues
            .iter()
            .map(|issue| {
                json!({
                    "severity": if issue.is_error() { "error" } else { "warning" },
                    "field": issue.field,
                    "message": issue.message,
                })
            })
            .collect();
        pretty(json!({
            "sources": sources,
            "issues": issues,
            "effective": effective,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strix_domain::ErrorKind;

    #[test]
    fn test_error_document() {
        let error = ToolCallError {
            tool_name: "read_file".into(),
            endpoint: "worker:50051".into(),
            kind: ErrorKind::Unavailable,
            message: "connection refused".into(),
            arguments: "{}".into(),
            hint: "check".into(),
        };
        let value: Value = serde_json::from_str(&JsonFormatter.tool_error(&error)).unwrap();
        assert_eq!(value["error_kind"], json!("unavailable"));
        assert_eq!(value["success"], json!(false));
    }

    #[test]
    fn test_health_includes_endpoint() {
        let text = JsonFormatter.health("w:1", &HealthReport::unhealthy("down"));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["endpoint"], json!("w:1"));
        assert_eq!(value["healthy"], json!(false));
        assert_eq!(value["reason"], json!("down"));
    }
}
