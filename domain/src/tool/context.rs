//! Execution context handed to context-aware tools
//!
//! Some tools expect to know which agent and sandbox they run for. A bare
//! worker process has no agent session, so the executor falls back to
//! [`ExecutionContext::Minimal`] with fixed placeholder identities.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const MINIMAL_AGENT_ID: &str = "remote-server-agent";
pub const MINIMAL_SANDBOX_ID: &str = "remote-server";

/// Full session state supplied by an orchestrating agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub agent_id: String,
    pub sandbox_id: String,
    pub sandbox_token: String,
    #[serde(default)]
    pub sandbox_info: Map<String, Value>,
}

/// Placeholder identity for tools running without a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimalContext {
    pub agent_id: String,
    pub sandbox_id: String,
}

impl Default for MinimalContext {
    fn default() -> Self {
        Self {
            agent_id: MINIMAL_AGENT_ID.to_string(),
            sandbox_id: MINIMAL_SANDBOX_ID.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExecutionContext {
    Full(SessionContext),
    Minimal(MinimalContext),
}

impl Default for ExecutionContext {
    fn default() -> Self {
        ExecutionContext::Minimal(MinimalContext::default())
    }
}

impl ExecutionContext {
    pub fn agent_id(&self) -> &str {
        match self {
            ExecutionContext::Full(s) => &s.agent_id,
            ExecutionContext::Minimal(m) => &m.agent_id,
        }
    }

    pub fn sandbox_id(&self) -> &str {
        match self {
            ExecutionContext::Full(s) => &s.sandbox_id,
            ExecutionContext::Minimal(m) => &m.sandbox_id,
        }
    }

    /// Sandbox token; empty for the minimal context.
    pub fn sandbox_token(&self) -> &str {
        match self {
            ExecutionContext::Full(s) => &s.sandbox_token,
            ExecutionContext::Minimal(_) => "",
        }
    }

    pub fn is_minimal(&self) -> bool {
        matches!(self, ExecutionContext::Minimal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_defaults() {
        let ctx = ExecutionContext::default();
        assert!(ctx.is_minimal());
        assert_eq!(ctx.agent_id(), "remote-server-agent");
        assert_eq!(ctx.sandbox_id(), "remote-server");
        assert_eq!(ctx.sandbox_token(), "");
    }

    #[test]
    fn test_full_context_accessors() {
        let ctx = ExecutionContext::Full(SessionContext {
            agent_id: "agent-7".into(),
            sandbox_id: "sbx".into(),
            sandbox_token: "tok".into(),
            sandbox_info: Map::new(),
        });
        assert!(!ctx.is_minimal());
        assert_eq!(ctx.agent_id(), "agent-7");
        assert_eq!(ctx.sandbox_token(), "tok");
    }
}
