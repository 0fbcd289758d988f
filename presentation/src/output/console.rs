//! Console output formatter

use crate::config::ConfigSourceView;
use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use serde_json::Value;
use strix_application::ToolCallError;
use strix_domain::{ConfigIssue, HealthReport, RegistrationAck, ToolInvocation, ToolResult};

/// Human-readable, colored output
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn field(name: &str, value: impl std::fmt::Display) -> String {
        format!("  {:<20} {}\n", format!("{}:", name).dimmed(), value)
    }

    /// Strings print raw; everything else as pretty JSON.
    pub fn render_value(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn tool_value(&self, _tool_name: &str, value: &Value) -> String {
        Self::render_value(value)
    }

    fn tool_error(&self, error: &ToolCallError) -> String {
        format!("{} {}", "Error:".red().bold(), error)
    }

    fn batch(&self, invocations: &[ToolInvocation], results: &[ToolResult]) -> String {
        let mut output = String::new();
        let failed = results.iter().filter(|r| !r.is_success()).count();

        for (i, (invocation, result)) in invocations.iter().zip(results).enumerate() {
            let label = format!("[{}] {}", i + 1, invocation.tool_name);
            match result {
                ToolResult::Success { value } => {
                    output.push_str(&format!("{} {}\n", "✓".green().bold(), label.bold()));
                    output.push_str(&Self::indent(&Self::render_value(value), "    "));
                }
                ToolResult::Failure { message, kind } => {
                    output.push_str(&format!(
                        "{} {} {}\n",
                        "✗".red().bold(),
                        label.bold(),
                        format!("({})", kind).dimmed()
                    ));
                    output.push_str(&Self::indent(message, "    "));
                }
            }
            output.push('\n');
        }

        let summary = format!("{} succeeded, {} failed", results.len() - failed, failed);
        if failed == 0 {
            output.push_str(&summary.green().to_string());
        } else {
            output.push_str(&summary.yellow().to_string());
        }
        output
    }

    fn health(&self, endpoint: &str, report: &HealthReport) -> String {
        let mut output = Self::header("Tool Server Health");
        output.push('\n');
        output.push_str(&Self::field("Endpoint", endpoint));

        let status = if report.healthy {
            "healthy".green().bold()
        } else {
            "unhealthy".red().bold()
        };
        output.push_str(&Self::field("Status", status));
        if let Some(reason) = &report.reason {
            output.push_str(&Self::field("Reason", reason));
        }
        if !report.healthy {
            return output;
        }

        output.push_str(&Self::field("Version", &report.version));
        output.push_str(&Self::field("Tools", report.tool_count));
        output.push_str(&Self::field("Registered agents", report.registered_agents));
        output.push_str(&Self::field("Network", report.network_status.as_str()));
        output.push_str(&Self::field(
            "Workers",
            format!("{}/{} busy", report.workers.busy, report.workers.pool_size),
        ));

        output.push_str(&Self::section_header("Metrics"));
        let metrics = &report.metrics;
        output.push_str(&Self::field(
            "Uptime",
            format!("{:.0}s", metrics.uptime_seconds),
        ));
        output.push_str(&Self::field("Requests", metrics.total_requests));
        output.push_str(&Self::field(
            "Error rate",
            format!("{:.1}%", metrics.error_rate * 100.0),
        ));
        output.push_str(&Self::field(
            "Requests/min",
            format!("{:.1}", metrics.request_rate_per_minute),
        ));
        output
    }

    fn registration(&self, ack: &RegistrationAck) -> String {
        if ack.success {
            format!("{} {}", "✓".green().bold(), ack.message)
        } else {
            format!("{} {}", "✗".red().bold(), ack.message)
        }
    }

    fn config(
        &self,
        sources: &[ConfigSourceView],
        effective: &Value,
        issues: &[ConfigIssue],
    ) -> String {
        let mut output = Self::section_header("Configuration sources (highest priority first)");
        for source in sources {
            let marker = if source.found {
                "✓".green().bold()
            } else {
                "-".dimmed()
            };
            output.push_str(&format!(
                "  {} {:<10} {}\n",
                marker,
                source.label,
                source.location
            ));
        }

        if !issues.is_empty() {
            output.push_str(&Self::section_header("Issues"));
            for issue in issues {
                let tag = if issue.is_error() {
                    "error".red().bold()
                } else {
                    "warning".yellow().bold()
                };
                output.push_str(&format!("  {} {}: {}\n", tag, issue.field, issue.message));
            }
        }

        output.push_str(&Self::section_header("Effective configuration"));
        output.push_str(&Self::render_value(effective));
        output.push('\n');
        output
    }
}
