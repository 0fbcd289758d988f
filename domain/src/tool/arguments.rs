//! Argument conversion for loosely-typed tool input
//!
//! Remote callers send arguments as JSON-ish values. Over the gRPC binding
//! every value arrives as a string, and agents routinely send `"42"` where a
//! number is expected. [`coerce_arguments`] converts that input against the
//! tool's declared [`ToolParameter`]s:
//!
//! | Declared | Accepted input |
//! |----------|----------------|
//! | `string` / `path` | string, number, boolean |
//! | `integer` | integral number, numeric string |
//! | `number` | number, numeric string |
//! | `boolean` | boolean, `"true"`/`"false"`/`"1"`/`"0"` |
//! | `array` / `object` | native JSON, or a JSON-encoded string |
//! | `any` | anything |
//!
//! The validated [`Arguments`] are then deserialized into each tool's own
//! parameter struct via [`Arguments::parse`]. Every failure along the way is
//! an `invalid_arguments` [`ToolError`].

use super::entities::{ParamType, ToolDefinition, ToolParameter};
use super::value_objects::ToolError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Validated, type-coerced arguments for one tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deserialize into a strongly-typed parameter struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(ToolError::invalid_arguments)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Validate and coerce raw arguments against a tool definition.
pub fn coerce_arguments(
    definition: &ToolDefinition,
    raw: &BTreeMap<String, Value>,
) -> Result<Arguments, ToolError> {
    if let Some(unknown) = raw.keys().find(|k| definition.parameter(k).is_none()) {
        return Err(ToolError::invalid_arguments(format!(
            "unexpected argument '{}' for tool '{}'",
            unknown, definition.name
        )));
    }

    let mut out = Map::new();
    for param in &definition.parameters {
        match raw.get(&param.name) {
            None | Some(Value::Null) => {
                if param.required {
                    return Err(ToolError::invalid_arguments(format!(
                        "missing required argument '{}'",
                        param.name
                    )));
                }
            }
            Some(value) => {
                out.insert(param.name.clone(), coerce_value(param, value)?);
            }
        }
    }
    Ok(Arguments(out))
}

fn coerce_value(param: &ToolParameter, value: &Value) -> Result<Value, ToolError> {
    let mismatch = || {
        ToolError::invalid_arguments(format!(
            "argument '{}' expects {}, got {}",
            param.name,
            param.param_type,
            describe(value)
        ))
    };

    match param.param_type {
        ParamType::Any => Ok(value.clone()),
        ParamType::String | ParamType::Path => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(mismatch()),
        },
        ParamType::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            Value::Number(n) => n
                .as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| Value::Number(Number::from(f as i64)))
                .ok_or_else(mismatch),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(|i| Value::Number(Number::from(i)))
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        ParamType::Number => match value {
            Value::Number(_) => Ok(value.clone()),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
        ParamType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(mismatch()),
            },
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },
        ParamType::Array => match value {
            Value::Array(_) => Ok(value.clone()),
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(parsed @ Value::Array(_)) => Ok(parsed),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },
        ParamType::Object => match value {
            Value::Object(_) => Ok(value.clone()),
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(parsed @ Value::Object(_)) => Ok(parsed),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::value_objects::ErrorKind;
    use serde::Deserialize;
    use serde_json::json;

    fn definition() -> ToolDefinition {
        ToolDefinition::new("scan", "Scan a target")
            .with_parameter(ToolParameter::new("target", "Host", true))
            .with_parameter(
                ToolParameter::new("port", "Port", false).with_type(ParamType::Integer),
            )
            .with_parameter(
                ToolParameter::new("verbose", "Verbose", false).with_type(ParamType::Boolean),
            )
            .with_parameter(
                ToolParameter::new("flags", "Extra flags", false).with_type(ParamType::Array),
            )
    }

    fn raw(value: Value) -> BTreeMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_numeric_string_accepted_for_integer() {
        let args = coerce_arguments(&definition(), &raw(json!({"target": "h", "port": "42"})))
            .unwrap();
        assert_eq!(args.get("port"), Some(&json!(42)));
    }

    #[test]
    fn test_non_numeric_string_rejected_for_integer() {
        let err = coerce_arguments(&definition(), &raw(json!({"target": "h", "port": "abc"})))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArguments);
        assert!(err.message.contains("port"));
    }

    #[test]
    fn test_integral_float_accepted_for_integer() {
        let args = coerce_arguments(&definition(), &raw(json!({"target": "h", "port": 8080.0})))
            .unwrap();
        assert_eq!(args.get("port"), Some(&json!(8080)));
    }

    #[test]
    fn test_out_of_range_float_rejected_for_integer() {
        for big in [1e20, -1e20] {
            let err = coerce_arguments(&definition(), &raw(json!({"target": "h", "port": big})))
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidArguments);
        }
    }

    #[test]
    fn test_unknown_argument_rejected() {
        let err = coerce_arguments(&definition(), &raw(json!({"target": "h", "bogus": 1})))
            .unwrap_err();
        assert!(err.message.contains("bogus"));
    }

    #[test]
    fn test_missing_required_rejected() {
        let err = coerce_arguments(&definition(), &raw(json!({"port": 1}))).unwrap_err();
        assert!(err.message.contains("missing required argument 'target'"));
    }

    #[test]
    fn test_null_optional_is_dropped() {
        let args = coerce_arguments(&definition(), &raw(json!({"target": "h", "port": null})))
            .unwrap();
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_string_encoded_array_and_bool() {
        let args = coerce_arguments(
            &definition(),
            &raw(json!({"target": 10, "flags": "[\"-sV\"]", "verbose": "TRUE"})),
        )
        .unwrap();
        assert_eq!(args.get("target"), Some(&json!("10")));
        assert_eq!(args.get("flags"), Some(&json!(["-sV"])));
        assert_eq!(args.get("verbose"), Some(&json!(true)));
    }

    #[test]
    fn test_parse_into_typed_struct() {
        #[derive(Deserialize)]
        struct Params {
            target: String,
            #[serde(default)]
            port: Option<u16>,
        }

        let args = coerce_arguments(&definition(), &raw(json!({"target": "h", "port": 8080})))
            .unwrap();
        let params: Params = args.parse().unwrap();
        assert_eq!(params.target, "h");
        assert_eq!(params.port, Some(8080));

        let too_big = coerce_arguments(&definition(), &raw(json!({"target": "h", "port": 70000})))
            .unwrap();
        let err = too_big.parse::<Params>().err().unwrap();
        assert_eq!(err.kind, ErrorKind::InvalidArguments);
    }
}
