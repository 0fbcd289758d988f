//! Presentation layer for the strix tool server
//!
//! This crate contains the CLI definitions and the text/JSON output
//! formatters.

pub mod cli;
pub mod config;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, parse_batch};
pub use config::{ConfigSourceView, OutputConfig, redact_tokens};
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
pub use output::json::JsonFormatter;
