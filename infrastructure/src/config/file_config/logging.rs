//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};

/// Raw logging configuration from TOML.
///
/// Console verbosity comes from `-v` flags or `RUST_LOG`; this section only
/// controls the optional rotating log file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for daily-rotated log files; no file logging when unset
    pub dir: Option<String>,
    pub file_prefix: String,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            file_prefix: "strix-tool-server".to_string(),
        }
    }
}
