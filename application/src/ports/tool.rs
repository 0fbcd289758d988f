//! Tool port
//!
//! A [`Tool`] is one named capability the worker can run. Implementations
//! may finish immediately or suspend on I/O; both hand back a [`ToolTask`]
//! so the executor can await every tool the same way.

use futures::future::BoxFuture;
use serde_json::Value;
use strix_domain::{Arguments, ExecutionContext, ToolDefinition, ToolError};

/// Pending result of one tool run.
pub type ToolTask = BoxFuture<'static, Result<Value, ToolError>>;

pub trait Tool: Send + Sync {
    fn definition(&self) -> &ToolDefinition;

    /// Start the tool with validated arguments.
    fn call(&self, args: Arguments, context: ExecutionContext) -> ToolTask;
}

/// Wrap an already-computed result as a task.
pub fn ready(result: Result<Value, ToolError>) -> ToolTask {
    Box::pin(futures::future::ready(result))
}

/// Adapter turning a closure into a [`Tool`].
pub struct FnTool<F> {
    definition: ToolDefinition,
    func: F,
}

impl<F> FnTool<F>
where
    F: Fn(Arguments, ExecutionContext) -> ToolTask + Send + Sync,
{
    pub fn new(definition: ToolDefinition, func: F) -> Self {
        Self { definition, func }
    }
}

impl<F> Tool for FnTool<F>
where
    F: Fn(Arguments, ExecutionContext) -> ToolTask + Send + Sync,
{
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    fn call(&self, args: Arguments, context: ExecutionContext) -> ToolTask {
        (self.func)(args, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fn_tool_sync_and_async_paths() {
        let sync_tool = FnTool::new(ToolDefinition::new("echo", "Echo"), |args, _| {
            ready(Ok(args.into_value()))
        });
        let async_tool = FnTool::new(ToolDefinition::new("later", "Later"), |_, ctx| {
            let agent = ctx.agent_id().to_string();
            Box::pin(async move {
                tokio::task::yield_now().await;
                Ok(json!(agent))
            })
        });

        let out = sync_tool
            .call(Arguments::default(), ExecutionContext::default())
            .await
            .unwrap();
        assert_eq!(out, json!({}));

        let out = async_tool
            .call(Arguments::default(), ExecutionContext::default())
            .await
            .unwrap();
        assert_eq!(out, json!("remote-server-agent"));
        assert_eq!(async_tool.definition().name, "later");
    }
}
