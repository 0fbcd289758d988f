//! Tool registry: name → tool implementation

use crate::ports::tool::Tool;
use std::collections::HashMap;
use std::sync::Arc;
use strix_domain::ToolDefinition;

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its definition name, replacing any previous one.
    pub fn register(mut self, tool: impl Tool + 'static) -> Self {
        self.insert(Arc::new(tool));
        self
    }

    pub fn insert(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.definition().name.clone(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Sorted tool names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.definition().clone()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::tool::{ToolTask, ready};
    use serde_json::json;
    use strix_domain::{Arguments, ExecutionContext};

    struct Named(ToolDefinition);

    impl Tool for Named {
        fn definition(&self) -> &ToolDefinition {
            &self.0
        }

        fn call(&self, _args: Arguments, _context: ExecutionContext) -> ToolTask {
            ready(Ok(json!(null)))
        }
    }

    fn tool(name: &str) -> Named {
        Named(ToolDefinition::new(name, "test"))
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ToolRegistry::new().register(tool("b")).register(tool("a"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert!(registry.contains("a"));
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.definitions()[0].name, "a");
    }

    #[test]
    fn test_register_replaces_same_name() {
        let registry = ToolRegistry::new().register(tool("a")).register(tool("a"));
        assert_eq!(registry.len(), 1);
    }
}
