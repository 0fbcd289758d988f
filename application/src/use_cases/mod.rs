//! Use cases
//!
//! Application-level operations built on the ports and resilience
//! components.
//!
//! - [`tool_executor`]: run registered tools locally inside a bounded worker pool
//! - [`remote_client`]: call a remote tool server through cache, breaker and retry
//! - [`tool_service`]: server-side request handling shared by both wire bindings

pub mod remote_client;
pub mod tool_executor;
pub mod tool_service;
