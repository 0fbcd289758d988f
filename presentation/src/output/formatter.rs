//! Output formatter trait

use crate::config::ConfigSourceView;
use serde_json::Value;
use strix_application::ToolCallError;
use strix_domain::{ConfigIssue, HealthReport, RegistrationAck, ToolInvocation, ToolResult};

/// Renders command results for the terminal
pub trait OutputFormatter {
    /// Successful single tool call
    fn tool_value(&self, tool_name: &str, value: &Value) -> String;

    fn tool_error(&self, error: &ToolCallError) -> String;

    /// Batch results, paired with their invocations by position
    fn batch(&self, invocations: &[ToolInvocation], results: &[ToolResult]) -> String;

    fn health(&self, endpoint: &str, report: &HealthReport) -> String;

    fn registration(&self, ack: &RegistrationAck) -> String;

    fn config(&self, sources: &[ConfigSourceView], effective: &Value, issues: &[ConfigIssue])
    -> String;
}
