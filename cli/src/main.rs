//! CLI entrypoint for the Strix tool server
//!
//! This is the main binary that wires together all layers using
//! dependency injection: `serve` builds the local executor behind a gRPC or
//! HTTP listener, every other command talks to a remote server through the
//! resilient client.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use strix_application::{
    CircuitBreakerRegistry, MetricsCollector, Protocol, RemoteToolClient, ResultCache, ToolExecutor,
    ToolService,
};
use strix_infrastructure::config::FileLoggingConfig;
use strix_infrastructure::transport::{grpc, http};
use strix_infrastructure::{
    ConfigLoader, ConnectedBinding, DnsProbe, FileConfig, ServerError, builtin_registry, connect,
    shutdown_signal,
};
use strix_presentation::cli::commands::{BatchArgs, ExecArgs, ServeArgs};
use strix_presentation::{
    Cli, Command, ConfigSourceView, OutputConfig, OutputFormatter, parse_batch, redact_tokens,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Command::Serve(args) = &cli.command {
        apply_serve_overrides(&mut config, args);
    }

    // Serving logs its lifecycle at info without any -v.
    let serving = matches!(cli.command, Command::Serve(_));
    let _guard = init_logging(cli.verbose, serving, &config.logging);

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Console logging from `-v` (or `RUST_LOG`), plus an optional daily file.
fn init_logging(verbose: u8, serving: bool, logging: &FileLoggingConfig) -> Option<WorkerGuard> {
    let level = match verbose.saturating_add(u8::from(serving)) {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level)
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file, guard) = match &logging.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
    guard
}

fn apply_serve_overrides(config: &mut FileConfig, args: &ServeArgs) {
    if let Some(transport) = args.transport {
        config.server.transport = transport;
    }
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(token) = &args.token {
        config.server.auth_token = Some(token.clone());
    }
    if args.require_auth {
        config.server.require_auth = true;
    }
}

async fn run(cli: Cli, config: FileConfig) -> Result<ExitCode> {
    let output = OutputConfig { json: cli.json };
    let formatter = output.formatter();

    if let Command::Config = cli.command {
        return Ok(show_config(&cli, &config, formatter.as_ref()));
    }

    let issues = config.validate();
    for issue in &issues {
        if issue.is_error() {
            eprintln!("Config error: {}: {}", issue.field, issue.message);
        } else {
            warn!(field = %issue.field, "{}", issue.message);
        }
    }
    if FileConfig::has_errors(&issues) {
        return Ok(ExitCode::FAILURE);
    }

    match cli.command {
        Command::Serve(_) => serve(&config).await.map(|_| ExitCode::SUCCESS),
        Command::Exec(args) => exec(&config, args, formatter.as_ref()).await,
        Command::Batch(args) => batch(&config, args, formatter.as_ref()).await,
        Command::Health => health(&config, formatter.as_ref()).await,
        Command::Register(args) => {
            let (client, reaper) = build_client(&config)?;
            let outcome = client.register_agent(&args.agent_id).await;
            client.shutdown();
            reaper.abort();
            Ok(match outcome {
                Ok(ack) => {
                    println!("{}", formatter.registration(&ack));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    println!("{}", formatter.tool_error(&e));
                    ExitCode::FAILURE
                }
            })
        }
        Command::Config => Ok(ExitCode::SUCCESS),
    }
}

async fn serve(config: &FileConfig) -> Result<()> {
    let server = &config.server;

    // === Dependency Injection ===
    let registry = Arc::new(builtin_registry());
    let executor = Arc::new(ToolExecutor::new(registry, config.executor.to_executor_params()));
    let metrics = Arc::new(MetricsCollector::new());
    let probe = Arc::new(DnsProbe::new(server.probe_host.clone()));
    let service = Arc::new(
        ToolService::new(executor, metrics, probe, server.to_server_params())
            .context("Refusing to start")?,
    );

    let addr = server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!(
        transport = ?server.transport,
        tools = service.tool_names().len(),
        auth = server.auth_token.is_some(),
        "Starting Strix tool server"
    );

    match server.transport {
        Protocol::Grpc => grpc::serve(service, listener, shutdown_signal()).await?,
        Protocol::Http => http::serve(service, listener, shutdown_signal()).await?,
    }
    info!("Server stopped");
    Ok(())
}

fn build_client(config: &FileConfig) -> Result<(RemoteToolClient, tokio::task::JoinHandle<()>)> {
    let ConnectedBinding { binding, reaper } = connect(&config.client, &config.pool)?;
    let client = RemoteToolClient::new(binding)
        .with_cache(Arc::new(ResultCache::new(config.cache.to_cache_config())))
        .with_breakers(Arc::new(CircuitBreakerRegistry::new(
            config.circuit_breaker.to_breaker_config(),
        )))
        .with_metrics(Arc::new(MetricsCollector::new()))
        .with_retry_policy(config.retry.to_retry_policy())
        .with_params(config.client.to_client_params());
    Ok((client, reaper))
}

async fn exec(config: &FileConfig, args: ExecArgs, formatter: &dyn OutputFormatter) -> Result<ExitCode> {
    let arguments = args.arguments().map_err(anyhow::Error::msg)?;
    let timeout = args
        .timeout
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("Invalid --timeout")?;
    let agent_id = args.agent_id.as_deref().unwrap_or(&config.client.agent_id);

    let (client, reaper) = build_client(config)?;
    let outcome = client
        .execute_tool(agent_id, &args.tool, arguments, timeout)
        .await;
    client.shutdown();
    reaper.abort();

    Ok(match outcome {
        Ok(value) => {
            println!("{}", formatter.tool_value(&args.tool, &value));
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", formatter.tool_error(&e));
            ExitCode::FAILURE
        }
    })
}

async fn batch(config: &FileConfig, args: BatchArgs, formatter: &dyn OutputFormatter) -> Result<ExitCode> {
    let text = if args.file.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("Failed to read batch from stdin")?
    } else {
        std::fs::read_to_string(&args.file)
            .with_context(|| format!("Failed to read {}", args.file.display()))?
    };
    let (file_agent, invocations) =
        parse_batch(&text, &config.client.agent_id).map_err(anyhow::Error::msg)?;
    let agent_id = args.agent_id.unwrap_or(file_agent);

    let (client, reaper) = build_client(config)?;
    let outcome = client.execute_batch(&agent_id, invocations.clone()).await;
    client.shutdown();
    reaper.abort();

    Ok(match outcome {
        Ok(results) => {
            println!("{}", formatter.batch(&invocations, &results));
            if results.iter().all(|r| r.is_success()) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            println!("{}", formatter.tool_error(&e));
            ExitCode::FAILURE
        }
    })
}

async fn health(config: &FileConfig, formatter: &dyn OutputFormatter) -> Result<ExitCode> {
    let (client, reaper) = build_client(config)?;
    let report = client.health_check().await;
    println!("{}", formatter.health(client.endpoint(), &report));
    client.shutdown();
    reaper.abort();
    Ok(if report.healthy {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn show_config(cli: &Cli, config: &FileConfig, formatter: &dyn OutputFormatter) -> ExitCode {
    let sources: Vec<ConfigSourceView> = if cli.no_config {
        Vec::new()
    } else {
        ConfigLoader::sources(cli.config.as_ref())
            .into_iter()
            .map(|s| ConfigSourceView {
                label: s.label.to_string(),
                location: s.location,
                found: s.found,
            })
            .collect()
    };
    let mut effective = match serde_json::to_value(config) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error: failed to render configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    redact_tokens(&mut effective);
    let issues = config.validate();
    println!("{}", formatter.config(&sources, &effective, &issues));
    if FileConfig::has_errors(&issues) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
