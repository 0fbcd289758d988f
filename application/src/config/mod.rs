//! Application-level configuration.
//!
//! Runtime parameters that control how use cases behave. The
//! infrastructure config loader builds these from the TOML/env sources.
//!
//! - [`ExecutorParams`]: worker pool size and default tool timeout
//! - [`ClientParams`]: remote call timeouts
//! - [`ServerParams`]: auth token policy and reported version
//!
//! Component-specific settings live next to their component:
//! [`RetryPolicy`](crate::resilience::RetryPolicy),
//! [`CircuitBreakerConfig`](crate::resilience::CircuitBreakerConfig),
//! [`PoolConfig`](crate::pool::PoolConfig) and
//! [`CacheConfig`](crate::cache::CacheConfig).

pub mod client_params;
pub mod execution_params;
pub mod server_params;

pub use client_params::{ClientParams, FALLBACK_TIMEOUT};
pub use execution_params::ExecutorParams;
pub use server_params::ServerParams;
