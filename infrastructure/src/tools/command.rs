//! Command execution tool: run_command

use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use strix_application::ports::tool::{Tool, ToolTask};
use strix_domain::{
    Arguments, ExecutionContext, ParamType, ToolDefinition, ToolError, ToolParameter,
};
use tokio::process::Command;
use tracing::debug;

/// Tool name constant
pub const RUN_COMMAND: &str = "run_command";

/// Default timeout for command execution (60 seconds)
const DEFAULT_TIMEOUT_SECS: f64 = 60.0;

/// Maximum bytes kept per output stream (1 MB)
const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

#[derive(Debug, Deserialize)]
struct RunCommandParams {
    command: String,
    #[serde(default)]
    working_dir: Option<PathBuf>,
    #[serde(default)]
    timeout_secs: Option<f64>,
}

pub struct RunCommandTool {
    definition: ToolDefinition,
}

impl Default for RunCommandTool {
    fn default() -> Self {
        Self {
            definition: ToolDefinition::new(
                RUN_COMMAND,
                "Execute a shell command and return its exit code and output",
            )
            .with_parameter(
                ToolParameter::new("command", "The command to execute", true)
                    .with_type(ParamType::String),
            )
            .with_parameter(
                ToolParameter::new("working_dir", "Working directory for the command", false)
                    .with_type(ParamType::Path),
            )
            .with_parameter(
                ToolParameter::new("timeout_secs", "Timeout in seconds (default: 60)", false)
                    .with_type(ParamType::Number),
            ),
        }
    }
}

impl Tool for RunCommandTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    fn call(&self, args: Arguments, _context: ExecutionContext) -> ToolTask {
        Box::pin(async move {
            let params: RunCommandParams = args.parse()?;
            run_command(params).await
        })
    }
}

async fn run_command(params: RunCommandParams) -> Result<Value, ToolError> {
    if params.command.trim().is_empty() {
        return Err(ToolError::invalid_arguments("command must not be empty"));
    }
    let timeout_secs = params.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    let limit = Duration::try_from_secs_f64(timeout_secs)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| ToolError::invalid_arguments(format!("invalid timeout_secs: {}", timeout_secs)))?;

    let mut cmd = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", params.command.as_str()]);
        c
    } else {
        let mut c = Command::new("sh");
        c.args(["-c", params.command.as_str()]);
        c
    };

    if let Some(dir) = &params.working_dir {
        if !dir.is_dir() {
            return Err(ToolError::execution(format!(
                "Working directory does not exist: {}",
                dir.display()
            )));
        }
        cmd.current_dir(dir);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd
        .spawn()
        .map_err(|e| ToolError::execution(format!("Failed to spawn command: {}", e)))?;

    debug!(command = %params.command, timeout_secs, "Running command");
    let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(result) => result
            .map_err(|e| ToolError::execution(format!("Failed to wait for command: {}", e)))?,
        Err(_) => {
            return Err(ToolError::execution(format!(
                "Command timed out after {} seconds",
                timeout_secs
            )));
        }
    };

    // A non-zero exit is still a result; the caller decides what it means.
    Ok(json!({
        "exit_code": output.status.code().unwrap_or(-1),
        "stdout": clip(&output.stdout),
        "stderr": clip(&output.stderr),
    }))
}

fn clip(bytes: &[u8]) -> String {
    if bytes.len() <= MAX_OUTPUT_SIZE {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    let mut text = String::from_utf8_lossy(&bytes[..MAX_OUTPUT_SIZE]).into_owned();
    text.push_str("\n... (output truncated)");
    text
}
