//! Infrastructure layer for the strix tool server
//!
//! Adapters for the ports defined in the application layer: layered
//! configuration loading, the built-in tools, the DNS network probe and the
//! HTTP and gRPC wire bindings.

pub mod config;
pub mod network;
pub mod tools;
pub mod transport;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigSource, FileConfig};
pub use network::DnsProbe;
pub use tools::builtin_registry;
pub use transport::{ConnectedBinding, ServerError, connect, shutdown_signal};
