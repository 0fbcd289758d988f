//! Remote tool client
//!
//! Caller-side pipeline in front of a [`TransportBinding`]:
//!
//! ```text
//! execute_tool ─▶ cache ─hit─▶ value
//!                   │ miss
//!                   ▼
//!             circuit breaker ─open─▶ Unavailable
//!                   │
//!                   ▼
//!          retry ( timeout ( binding call ) )
//!                   │
//!                   ▼
//!         metrics + cache fill ─▶ value | ToolCallError
//! ```
//!
//! A tool that ran remotely and failed is a successful wire call: it is not
//! retried and does not count against the breaker.

use crate::cache::ResultCache;
use crate::config::ClientParams;
use crate::metrics::MetricsCollector;
use crate::ports::transport::{TransportBinding, TransportError};
use crate::resilience::{CircuitBreakerRegistry, RetryPolicy, retry};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use strix_domain::{ErrorKind, HealthReport, RegistrationAck, ToolInvocation, ToolResult};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Name reported for errors that concern a whole batch.
pub const BATCH_TOOL_NAME: &str = "batch";

/// Caller-visible failure of a remote tool call.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Tool '{tool_name}' failed on {endpoint}: {message}\n  Arguments: {arguments}\n  Hint: {hint}")]
pub struct ToolCallError {
    pub tool_name: String,
    pub endpoint: String,
    pub kind: ErrorKind,
    pub message: String,
    /// Truncated, redacted argument summary
    pub arguments: String,
    pub hint: String,
}

/// One-line remediation for a failure category.
pub fn remediation_hint(kind: ErrorKind, throttled: bool) -> &'static str {
    if throttled {
        return "The server is rate limiting requests; back off and retry later.";
    }
    match kind {
        ErrorKind::Unavailable => {
            "Check that the tool server is running and the tunnel/network path is reachable."
        }
        ErrorKind::Timeout => {
            "The call exceeded its deadline; raise the timeout or check server load."
        }
        ErrorKind::Unauthorized => {
            "Check that STRIX_SERVER_TOKEN matches the token the server was started with."
        }
        ErrorKind::NotFound => "Check the tool name; it is not registered on the server.",
        ErrorKind::InvalidArguments => "Check the argument names and types against the tool definition.",
        ErrorKind::ServerError => "The server failed unexpectedly; check the server logs.",
        ErrorKind::ExecutionError => "The tool itself failed; inspect its output and arguments.",
    }
}

fn mentions_throttling(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("resource exhausted") || lower.contains("rate limit")
}

fn is_throttled(error: &TransportError) -> bool {
    error.status.is_some_and(|s| s.is_throttled()) || mentions_throttling(&error.message)
}

pub struct RemoteToolClient {
    binding: Arc<dyn TransportBinding>,
    cache: Arc<ResultCache>,
    breakers: Arc<CircuitBreakerRegistry>,
    metrics: Arc<MetricsCollector>,
    retry_policy: RetryPolicy,
    params: ClientParams,
}

impl RemoteToolClient {
    pub fn new(binding: Arc<dyn TransportBinding>) -> Self {
        Self {
            binding,
            cache: Arc::new(ResultCache::default()),
            breakers: Arc::new(CircuitBreakerRegistry::default()),
            metrics: Arc::new(MetricsCollector::new()),
            retry_policy: RetryPolicy::default(),
            params: ClientParams::default(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_breakers(mut self, breakers: Arc<CircuitBreakerRegistry>) -> Self {
        self.breakers = breakers;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_params(mut self, params: ClientParams) -> Self {
        self.params = params;
        self
    }

    pub fn endpoint(&self) -> &str {
        self.binding.endpoint()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn breakers(&self) -> &CircuitBreakerRegistry {
        &self.breakers
    }

    /// Breaker gate, then retries of `operation` each bounded by `limit`.
    async fn guarded<T, F, Fut>(&self, limit: Duration, mut operation: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let policy = &self.retry_policy;
        let attempt = move || {
            let call = operation();
            async move {
                tokio::time::timeout(limit, call)
                    .await
                    .map_err(|_| TransportError::timeout(limit))?
            }
        };
        let breaker = self.breakers.get(self.binding.endpoint());
        breaker.call(move || retry(policy, attempt)).await
    }

    fn call_error(
        &self,
        tool_name: &str,
        kind: ErrorKind,
        message: String,
        arguments: String,
        throttled: bool,
    ) -> ToolCallError {
        ToolCallError {
            tool_name: tool_name.to_string(),
            endpoint: self.binding.endpoint().to_string(),
            kind,
            message,
            arguments,
            hint: remediation_hint(kind, throttled).to_string(),
        }
    }

    pub async fn execute_tool(
        &self,
        agent_id: &str,
        tool_name: &str,
        args: BTreeMap<String, Value>,
        timeout: Option<Duration>,
    ) -> Result<Value, ToolCallError> {
        if let Some(value) = self.cache.get(tool_name, &args) {
            debug!(tool = tool_name, "Served from cache");
            return Ok(value);
        }

        let limit = self.params.effective_timeout(timeout);
        let invocation = ToolInvocation::new(tool_name)
            .with_arguments(args)
            .with_agent_id(agent_id)
            .with_timeout(limit);

        let binding = &self.binding;
        let request = &invocation;
        let started = Instant::now();
        let outcome = self
            .guarded(limit, move || binding.execute_tool(request, limit))
            .await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(ToolResult::Success { value }) => {
                self.metrics.record(tool_name, elapsed, true, None);
                self.cache
                    .set(tool_name, &invocation.arguments, value.clone(), None);
                Ok(value)
            }
            Ok(ToolResult::Failure { message, kind }) => {
                self.metrics.record(tool_name, elapsed, false, Some(kind));
                let throttled = mentions_throttling(&message);
                Err(self.call_error(
                    tool_name,
                    kind,
                    message,
                    invocation.argument_summary(),
                    throttled,
                ))
            }
            Err(e) => {
                self.metrics.record(tool_name, elapsed, false, Some(e.kind));
                warn!(
                    tool = tool_name,
                    endpoint = self.binding.endpoint(),
                    kind = %e.kind,
                    error = %e,
                    "Remote tool call failed"
                );
                let throttled = is_throttled(&e);
                Err(self.call_error(
                    tool_name,
                    e.kind,
                    e.message,
                    invocation.argument_summary(),
                    throttled,
                ))
            }
        }
    }

    /// Execute several invocations in one wire call; results follow input
    /// order and element failures are returned as they came back.
    pub async fn execute_batch(
        &self,
        agent_id: &str,
        invocations: Vec<ToolInvocation>,
    ) -> Result<Vec<ToolResult>, ToolCallError> {
        if invocations.is_empty() {
            return Err(self.call_error(
                BATCH_TOOL_NAME,
                ErrorKind::InvalidArguments,
                "tools list is required".to_string(),
                "0 tools".to_string(),
                false,
            ));
        }

        let limit = self.params.batch_timeout();
        let expected = invocations.len();
        let binding = &self.binding;
        let batch = invocations.as_slice();
        let started = Instant::now();
        let outcome = self
            .guarded(limit, move || async move {
                let results = binding.execute_batch(agent_id, batch, limit).await?;
                if results.len() != expected {
                    return Err(TransportError::protocol(format!(
                        "Batch returned {} results for {} tools",
                        results.len(),
                        expected
                    )));
                }
                Ok(results)
            })
            .await;
        let share = started.elapsed() / expected as u32;

        match outcome {
            Ok(results) => {
                for (invocation, result) in invocations.iter().zip(&results) {
                    self.metrics.record(
                        &invocation.tool_name,
                        share,
                        result.is_success(),
                        result.kind(),
                    );
                }
                Ok(results)
            }
            Err(e) => {
                for invocation in &invocations {
                    self.metrics
                        .record(&invocation.tool_name, share, false, Some(e.kind));
                }
                warn!(size = expected, error = %e, "Remote batch failed");
                let names: Vec<&str> = invocations.iter().map(|i| i.tool_name.as_str()).collect();
                let throttled = is_throttled(&e);
                Err(self.call_error(
                    BATCH_TOOL_NAME,
                    e.kind,
                    e.message,
                    format!("{} tools: {}", expected, summarize_names(&names)),
                    throttled,
                ))
            }
        }
    }

    /// Ask the server for its health. Never fails: transport errors come
    /// back as an unhealthy report.
    pub async fn health_check(&self) -> HealthReport {
        let limit = self.params.health_timeout;
        match tokio::time::timeout(limit, self.binding.health_check()).await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                warn!(endpoint = self.binding.endpoint(), error = %e, "Health check failed");
                HealthReport::unhealthy(e.message)
            }
            Err(_) => HealthReport::unhealthy(TransportError::timeout(limit).message),
        }
    }

    pub async fn register_agent(&self, agent_id: &str) -> Result<RegistrationAck, ToolCallError> {
        let limit = self.params.effective_timeout(None);
        let binding = &self.binding;
        match self
            .guarded(limit, move || binding.register_agent(agent_id))
            .await
        {
            Ok(ack) => {
                info!(agent_id, endpoint = self.binding.endpoint(), "Agent registered");
                Ok(ack)
            }
            Err(e) => {
                let throttled = is_throttled(&e);
                Err(self.call_error(
                    "register_agent",
                    e.kind,
                    e.message,
                    format!("agent_id={}", agent_id),
                    throttled,
                ))
            }
        }
    }

    /// Close pooled connections held by the binding.
    pub fn shutdown(&self) {
        self.binding.shutdown();
    }
}

fn summarize_names(names: &[&str]) -> String {
    const SHOWN: usize = 5;
    if names.len() <= SHOWN {
        names.join(", ")
    } else {
        format!("{}, ... (+{})", names[..SHOWN].join(", "), names.len() - SHOWN)
    }
}
