//! Built-in worker tools
//!
//! These are the tools a bare `strix-tool-server` offers out of the box.
//! Scanners and browser automation plug in through the same
//! [`Tool`](strix_application::ports::tool::Tool) port.

pub mod capabilities;
pub mod command;
pub mod file;

pub use capabilities::AgentCapabilitiesTool;
pub use command::RunCommandTool;
pub use file::{ListDirectoryTool, ReadFileTool, WriteFileTool};

use strix_application::ToolRegistry;

/// Registry with every built-in tool.
pub fn builtin_registry() -> ToolRegistry {
    let registry = ToolRegistry::new()
        .register(ReadFileTool::default())
        .register(WriteFileTool::default())
        .register(ListDirectoryTool::default())
        .register(RunCommandTool::default());
    let names = registry.names();
    registry.register(AgentCapabilitiesTool::new(names))
}
