//! Domain layer for the strix tool server
//!
//! This crate contains the core types of remote tool execution: what a tool
//! accepts, how it is invoked, and what comes back. It has no dependencies
//! on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! - **Tool**: a named capability with typed parameters and a JSON result
//! - **Agent**: the logical caller identity issuing invocations
//! - **Batch**: an ordered group of invocations executed concurrently, with
//!   results correlated by position

pub mod config;
pub mod service;
pub mod tool;
pub mod util;

// Re-export commonly used types
pub use config::{ConfigIssue, Severity};
pub use service::{HealthReport, MetricsSummary, NetworkStatus, RegistrationAck, WorkerPoolStats};
pub use tool::{
    Arguments, BatchSpec, ErrorKind, ExecutionContext, MinimalContext, ParamType, SessionContext,
    ToolDefinition, ToolError, ToolInvocation, ToolParameter, ToolResult, coerce_arguments,
    summarize_arguments,
};
