//! Tool domain module
//!
//! Pure definitions for remote tool execution. Nothing in here performs I/O.
//!
//! ```text
//! ┌────────────────┐   coerce_arguments   ┌──────────────┐
//! │ ToolInvocation │─────────────────────▶│  Arguments   │
//! │ (raw JSON-ish) │   (ToolDefinition)   │  (validated) │
//! └────────────────┘                      └──────┬───────┘
//!                                                │ tool runs
//!                                                ▼
//!                                         ┌──────────────┐
//!                                         │  ToolResult  │
//!                                         │ Success|Fail │
//!                                         └──────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ToolDefinition`] / [`ToolParameter`]: what a tool accepts
//! - [`ToolInvocation`]: a request to run a tool, with agent id and timeout
//! - [`Arguments`]: coerced, validated arguments ready for typed parsing
//! - [`ExecutionContext`]: full session or minimal placeholder identity
//! - [`ToolResult`] / [`ToolError`] / [`ErrorKind`]: the outcome

pub mod arguments;
pub mod context;
pub mod entities;
pub mod invocation;
pub mod value_objects;

pub use arguments::{Arguments, coerce_arguments};
pub use context::{ExecutionContext, MinimalContext, SessionContext};
pub use entities::{ParamType, ToolDefinition, ToolParameter};
pub use invocation::{BatchSpec, ToolInvocation, summarize_arguments};
pub use value_objects::{ErrorKind, ToolError, ToolResult};
