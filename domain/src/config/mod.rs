//! Configuration validation types shared by every layer.

pub mod validation;

pub use validation::{ConfigIssue, Severity};
