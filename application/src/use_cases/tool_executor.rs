//! Local tool executor
//!
//! Resolves a tool by name, coerces arguments against its definition and
//! runs it on a spawned task that holds one permit of the shared worker
//! pool. Every problem ends up inside the returned [`ToolResult`]:
//!
//! | Situation | Result kind |
//! |-----------|-------------|
//! | Unknown tool | `not_found` |
//! | Argument coercion / typed parse fails | `invalid_arguments` |
//! | Tool returns an error or panics | `execution_error` |
//! | Deadline passes (queueing included) | `timeout` |
//!
//! A panic or timeout in one invocation never affects others running
//! concurrently, including siblings in the same batch.

use crate::config::ExecutorParams;
use crate::ports::tool_executor::ToolExecutorPort;
use crate::registry::ToolRegistry;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use strix_domain::{
    ExecutionContext, ToolError, ToolInvocation, ToolResult, WorkerPoolStats, coerce_arguments,
};
use tokio::sync::Semaphore;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    workers: Arc<Semaphore>,
    params: ExecutorParams,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, params: ExecutorParams) -> Self {
        let pool_size = params.pool_size.max(1);
        Self {
            registry,
            workers: Arc::new(Semaphore::new(pool_size)),
            params: ExecutorParams {
                pool_size,
                ..params
            },
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn run(
        &self,
        invocation: ToolInvocation,
        context: Option<ExecutionContext>,
    ) -> Result<serde_json::Value, ToolError> {
        let name = invocation.tool_name.as_str();
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| ToolError::not_found(name))?;
        let args = coerce_arguments(tool.definition(), &invocation.arguments)?;

        let context = match context {
            Some(ctx) => ctx,
            None => {
                if tool.definition().needs_context {
                    debug!(tool = name, "No agent context supplied, using minimal context");
                }
                ExecutionContext::default()
            }
        };

        let limit = invocation.timeout.unwrap_or(self.params.default_timeout);
        let deadline = Instant::now() + limit;

        let permit = timeout_at(deadline, Arc::clone(&self.workers).acquire_owned())
            .await
            .map_err(|_| ToolError::timeout(name, limit))?
            .map_err(|_| ToolError::server("worker pool is shut down"))?;

        let mut handle = tokio::spawn(async move {
            let _permit = permit;
            tool.call(args, context).await
        });

        match timeout_at(deadline, &mut handle).await {
            Err(_) => {
                handle.abort();
                warn!(tool = name, timeout_secs = limit.as_secs_f64(), "Tool execution timed out");
                Err(ToolError::timeout(name, limit))
            }
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                let reason = if join_error.is_panic() {
                    panic_message(join_error.into_panic())
                } else {
                    "task cancelled".to_string()
                };
                warn!(tool = name, reason = %reason, "Tool task failed");
                Err(ToolError::execution(format!("{}: {}", name, reason)))
            }
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[async_trait]
impl ToolExecutorPort for ToolExecutor {
    fn tool_names(&self) -> Vec<String> {
        self.registry.names()
    }

    fn tool_count(&self) -> usize {
        self.registry.len()
    }

    fn has_tool(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    async fn execute_with_context(
        &self,
        invocation: ToolInvocation,
        context: Option<ExecutionContext>,
    ) -> ToolResult {
        let name = invocation.tool_name.clone();
        let result = self.run(invocation, context).await;
        if let Err(e) = &result {
            debug!(tool = %name, kind = %e.kind, error = %e, "Tool invocation failed");
        }
        result.into()
    }

    async fn execute_batch(&self, invocations: Vec<ToolInvocation>) -> Vec<ToolResult> {
        if invocations.is_empty() {
            return Vec::new();
        }
        let width = invocations.len().min(self.params.batch_cap).max(1);
        let gate = Semaphore::new(width);
        debug!(size = invocations.len(), width, "Executing batch");

        join_all(invocations.into_iter().map(|invocation| {
            let gate = &gate;
            async move {
                let _slot = gate.acquire().await.ok();
                self.execute(invocation).await
            }
        }))
        .await
    }

    fn worker_stats(&self) -> WorkerPoolStats {
        let pool_size = self.params.pool_size;
        WorkerPoolStats {
            pool_size,
            busy: pool_size.saturating_sub(self.workers.available_permits()),
        }
    }
}
