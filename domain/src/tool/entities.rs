//! Tool definitions: name, parameters and execution traits

use serde::{Deserialize, Serialize};

/// Declared type of a tool parameter.
///
/// Drives the loose coercion in [`crate::tool::arguments`]: callers send
/// JSON-ish values (often strings) and the declared type decides how they
/// are converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Path,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    /// Any JSON value, passed through untouched
    Any,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Path => "path",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
            ParamType::Any => "any",
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter specification for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub param_type: ParamType,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            param_type: ParamType::String,
        }
    }

    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }
}

/// Definition of a tool that can be invoked remotely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "read_file")
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
    /// Tool expects an agent/sandbox execution context
    #[serde(default)]
    pub needs_context: bool,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            needs_context: false,
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_context(mut self) -> Self {
        self.needs_context = true;
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ToolParameter> {
        self.parameters.iter().filter(|p| p.required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_builder() {
        let def = ToolDefinition::new("read_file", "Read a file")
            .with_parameter(ToolParameter::new("path", "File path", true).with_type(ParamType::Path))
            .with_parameter(
                ToolParameter::new("limit", "Max lines", false).with_type(ParamType::Integer),
            );

        assert_eq!(def.parameters.len(), 2);
        assert!(!def.needs_context);
        assert_eq!(def.parameter("limit").unwrap().param_type, ParamType::Integer);
        assert_eq!(
            def.required_parameters().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            vec!["path"]
        );
    }

    #[test]
    fn test_param_type_defaults_to_string() {
        let param = ToolParameter::new("q", "query", true);
        assert_eq!(param.param_type, ParamType::String);
        assert_eq!(param.param_type.to_string(), "string");
    }
}
