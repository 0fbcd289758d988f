//! Presentation-level configuration

use crate::output::console::ConsoleFormatter;
use crate::output::formatter::OutputFormatter;
use crate::output::json::JsonFormatter;
use serde::Serialize;
use serde_json::Value;

/// How command results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    pub json: bool,
}

impl OutputConfig {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        if self.json {
            Box::new(JsonFormatter)
        } else {
            Box::new(ConsoleFormatter)
        }
    }
}

/// One configuration source as shown by the `config` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSourceView {
    pub label: String,
    pub location: String,
    pub found: bool,
}

/// Replace every non-null `*token*` value with `[REDACTED]`.
pub fn redact_tokens(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if key.contains("token") && !field.is_null() {
                    *field = Value::String("[REDACTED]".to_string());
                } else {
                    redact_tokens(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_tokens),
        _ => {}
    }
}
