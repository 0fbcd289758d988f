//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod channel;
pub mod network_probe;
pub mod tool;
pub mod tool_executor;
pub mod transport;
