//! Tool Executor port
//!
//! Defines the interface the server bindings use to run tools locally.

use async_trait::async_trait;
use strix_domain::{ExecutionContext, ToolInvocation, ToolResult, WorkerPoolStats};

/// Port for local tool execution
///
/// Implementations never fail as a whole: every problem (unknown tool, bad
/// arguments, panic, timeout) is reported inside the returned [`ToolResult`].
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Names of all available tools, sorted
    fn tool_names(&self) -> Vec<String>;

    fn tool_count(&self) -> usize {
        self.tool_names().len()
    }

    fn has_tool(&self, name: &str) -> bool {
        self.tool_names().iter().any(|n| n == name)
    }

    /// Execute with an explicit context; `None` runs with the minimal context.
    async fn execute_with_context(
        &self,
        invocation: ToolInvocation,
        context: Option<ExecutionContext>,
    ) -> ToolResult;

    async fn execute(&self, invocation: ToolInvocation) -> ToolResult {
        self.execute_with_context(invocation, None).await
    }

    /// Execute all invocations concurrently; results follow input order.
    async fn execute_batch(&self, invocations: Vec<ToolInvocation>) -> Vec<ToolResult>;

    fn worker_stats(&self) -> WorkerPoolStats;
}
