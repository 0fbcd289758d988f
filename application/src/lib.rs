//! Application layer for the Strix tool server
//!
//! This crate contains use cases, port definitions, the resilience
//! components and application configuration. It depends only on the
//! domain layer.

pub mod cache;
pub mod config;
pub mod metrics;
pub mod pool;
pub mod ports;
pub mod registry;
pub mod resilience;
pub mod use_cases;

// Re-export commonly used types
pub use cache::{CacheConfig, CacheStats, ResultCache};
pub use config::{ClientParams, ExecutorParams, ServerParams};
pub use metrics::{MetricsCollector, ServerStats, ToolStats};
pub use pool::{ConnectionPool, PoolConfig, PoolStats, PooledChannel};
pub use ports::{
    channel::{ChannelFactory, ChannelTarget},
    network_probe::{NetworkProbe, StaticProbe},
    tool::{FnTool, Tool, ToolTask},
    tool_executor::ToolExecutorPort,
    transport::{Protocol, RpcCode, TransportBinding, TransportError, WireStatus},
};
pub use registry::ToolRegistry;
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState, RetryPolicy,
};
pub use use_cases::remote_client::{RemoteToolClient, ToolCallError};
pub use use_cases::tool_executor::ToolExecutor;
pub use use_cases::tool_service::{ServiceError, ToolService};
