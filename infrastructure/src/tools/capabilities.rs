//! Agent capability listing: get_agent_capabilities

use serde_json::json;
use strix_application::ports::tool::{Tool, ToolTask, ready};
use strix_domain::{Arguments, ExecutionContext, ToolDefinition};

pub const GET_AGENT_CAPABILITIES: &str = "get_agent_capabilities";

/// Reports the calling agent's identity and the tools this worker offers.
pub struct AgentCapabilitiesTool {
    definition: ToolDefinition,
    tools: Vec<String>,
}

impl AgentCapabilitiesTool {
    pub fn new(mut tools: Vec<String>) -> Self {
        tools.push(GET_AGENT_CAPABILITIES.to_string());
        tools.sort();
        tools.dedup();
        Self {
            definition: ToolDefinition::new(
                GET_AGENT_CAPABILITIES,
                "Describe the calling agent and the tools available on this worker",
            )
            .with_context(),
            tools,
        }
    }
}

impl Tool for AgentCapabilitiesTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    fn call(&self, _args: Arguments, context: ExecutionContext) -> ToolTask {
        ready(Ok(json!({
            "agent_id": context.agent_id(),
            "sandbox_id": context.sandbox_id(),
            "session": if context.is_minimal() { "minimal" } else { "full" },
            "tools": self.tools,
        })))
    }
}
