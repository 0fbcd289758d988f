//! Configuration file loading for the Strix tool server
//!
//! This module handles file I/O and merging of configuration from multiple
//! sources. The priority order (highest to lowest):
//!
//! 1. Environment (`STRIX__SECTION__KEY`, then legacy `STRIX_*` / `CRED_TUNNEL`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./strix-tools.toml` or `./.strix-tools.toml`
//! 4. Global: `$XDG_CONFIG_HOME/strix/tool-server.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileCacheConfig, FileCircuitBreakerConfig, FileClientConfig, FileConfig, FileExecutorConfig,
    FileLoggingConfig, FilePoolConfig, FileRetryConfig, FileServerConfig,
};
pub use loader::{ConfigLoader, ConfigSource};
