//! CLI command definitions

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use strix_application::Protocol;
use strix_domain::ToolInvocation;

/// CLI arguments for strix-tool-server
#[derive(Parser, Debug)]
#[command(name = "strix-tool-server")]
#[command(author, version, about = "Remote tool execution for strix agents")]
#[command(long_about = r#"
Runs security tools on behalf of remote agents, or calls such a server.

`serve` starts a worker that exposes the local tools over gRPC or HTTP.
The other commands are a client for a running worker: they go through the
same cache, circuit breaker and retry pipeline agents use.

Configuration files are loaded from (in priority order):
1. Environment           STRIX__SECTION__KEY, STRIX_SERVER_TOKEN, CRED_TUNNEL, ...
2. --config <path>       Explicit config file
3. ./strix-tools.toml    Project-level config
4. ~/.config/strix/tool-server.toml   Global config

Example:
  strix-tool-server serve --transport http --port 8000
  STRIX_SERVER_URL=worker:50051 strix-tool-server exec read_file --arg path=/etc/hostname
  strix-tool-server batch tools.json
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files (environment still applies)
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the tool server
    Serve(ServeArgs),
    /// Execute one tool on the configured server
    Exec(ExecArgs),
    /// Execute a batch of tools described in a JSON file (`-` for stdin)
    Batch(BatchArgs),
    /// Check the configured server's health
    Health,
    /// Register an agent id with the configured server
    Register(RegisterArgs),
    /// Show configuration sources and the effective configuration
    Config,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Wire protocol to serve
    #[arg(long, value_name = "grpc|http")]
    pub transport: Option<Protocol>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Bearer token callers must present (prefer STRIX_SERVER_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Refuse to start without a token
    #[arg(long)]
    pub require_auth: bool,
}

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Tool name
    pub tool: String,

    /// Tool argument as key=value; values are parsed as JSON when possible
    #[arg(short, long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub args: Vec<(String, Value)>,

    /// All arguments as one JSON object (merged under --arg)
    #[arg(long, value_name = "JSON")]
    pub args_json: Option<String>,

    /// Agent id to call as
    #[arg(long)]
    pub agent_id: Option<String>,

    /// Timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<f64>,
}

impl ExecArgs {
    /// Merge `--args-json` and `--arg` pairs; pairs win on conflict.
    pub fn arguments(&self) -> Result<BTreeMap<String, Value>, String> {
        let mut merged = BTreeMap::new();
        if let Some(raw) = &self.args_json {
            let object: Map<String, Value> = serde_json::from_str(raw)
                .map_err(|e| format!("--args-json must be a JSON object: {}", e))?;
            merged.extend(object);
        }
        merged.extend(self.args.iter().cloned());
        Ok(merged)
    }
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON file (`-` for stdin): a list of `{tool_name, kwargs}` or `{agent_id, tools: [...]}`
    pub file: PathBuf,

    /// Agent id to call as (overrides the file)
    #[arg(long)]
    pub agent_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Agent id to register
    pub agent_id: String,
}

/// Parse `key=value`; the value is JSON when it parses, a string otherwise.
pub fn parse_key_value(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[derive(Deserialize)]
struct BatchEntry {
    tool_name: String,
    #[serde(default)]
    kwargs: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BatchFile {
    List(Vec<BatchEntry>),
    Object {
        #[serde(default)]
        agent_id: Option<String>,
        tools: Vec<BatchEntry>,
    },
}

/// Parse a batch description into `(agent_id, invocations)`.
pub fn parse_batch(text: &str, default_agent: &str) -> Result<(String, Vec<ToolInvocation>), String> {
    let file: BatchFile =
        serde_json::from_str(text).map_err(|e| format!("Invalid batch file: {}", e))?;
    let (agent_id, entries) = match file {
        BatchFile::List(entries) => (None, entries),
        BatchFile::Object { agent_id, tools } => (agent_id, tools),
    };
    let agent_id = agent_id.unwrap_or_else(|| default_agent.to_string());
    let invocations = entries
        .into_iter()
        .map(|entry| {
            ToolInvocation::new(entry.tool_name)
                .with_agent_id(agent_id.clone())
                .with_arguments(entry.kwargs.into_iter().collect())
        })
        .collect();
    Ok((agent_id, invocations))
}
