//! Parameter extraction for tool invocations.
//!
//! Invocation parameters arrive as an untyped JSON object. Adapters pull the
//! keys they understand out through [`ParamExt`]; unknown keys are ignored,
//! while a known key holding the wrong kind of value is an error.

use docent_types::Parameters;
use serde_json::Value;

/// A tool parameter failed validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterValidationError {
    /// A parameter has an invalid type.
    #[error("invalid type for '{name}': expected {expected}, got {actual}")]
    InvalidType {
        name: &'static str,
        expected: &'static str,
        actual: String,
    },

    /// A parameter value is not acceptable.
    #[error("'{name}' has invalid value '{value}': {message}")]
    InvalidValue {
        name: &'static str,
        value: String,
        message: String,
    },
}

impl ParameterValidationError {
    /// Create an invalid type error, describing the value that was found.
    pub fn invalid_type(name: &'static str, expected: &'static str, actual: &Value) -> Self {
        Self::InvalidType {
            name,
            expected,
            actual: json_kind(actual).to_string(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(
        name: &'static str,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            name,
            value: value.into(),
            message: message.into(),
        }
    }

    /// The parameter this error refers to.
    pub fn parameter_name(&self) -> &str {
        match self {
            Self::InvalidType { name, .. } | Self::InvalidValue { name, .. } => name,
        }
    }
}

/// Result type for parameter extraction.
pub type ParamResult<T> = std::result::Result<T, ParameterValidationError>;

/// Typed access to invocation parameters.
///
/// Absent keys and explicit `null` both read as `None`.
pub trait ParamExt {
    /// Get an optional string parameter.
    fn optional_str(&self, name: &'static str) -> ParamResult<Option<&str>>;

    /// Get an optional integer parameter. Integers beyond `i64` saturate.
    fn optional_i64(&self, name: &'static str) -> ParamResult<Option<i64>>;

    /// Get an optional JSON object parameter.
    fn optional_object(&self, name: &'static str) -> ParamResult<Option<&Value>>;
}

impl ParamExt for Parameters {
    fn optional_str(&self, name: &'static str) -> ParamResult<Option<&str>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(ParameterValidationError::invalid_type(name, "string", other)),
        }
    }

    fn optional_i64(&self, name: &'static str) -> ParamResult<Option<i64>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Ok(Some(i))
                } else if n.as_u64().is_some() {
                    Ok(Some(i64::MAX))
                } else {
                    Err(ParameterValidationError::invalid_value(
                        name,
                        n.to_string(),
                        "must be an integer",
                    ))
                }
            }
            Some(other) => Err(ParameterValidationError::invalid_type(name, "integer", other)),
        }
    }

    fn optional_object(&self, name: &'static str) -> ParamResult<Option<&Value>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(v @ Value::Object(_)) => Ok(Some(v)),
            Some(other) => Err(ParameterValidationError::invalid_type(name, "object", other)),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
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
    use serde_json::json;

    fn params(value: Value) -> Parameters {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_optional_str() {
        let p = params(json!({"question": "hi", "n": 3, "empty": null}));
        assert_eq!(p.optional_str("question").unwrap(), Some("hi"));
        assert_eq!(p.optional_str("missing").unwrap(), None);
        assert_eq!(p.optional_str("empty").unwrap(), None);

        let err = p.optional_str("n").unwrap_err();
        assert_eq!(
            err,
            ParameterValidationError::InvalidType {
                name: "n",
                expected: "string",
                actual: "number".to_string(),
            }
        );
    }

    #[test]
    fn test_optional_i64() {
        let p = params(json!({
            "small": -3,
            "huge": u64::MAX,
            "fraction": 2.5,
            "text": "five"
        }));
        assert_eq!(p.optional_i64("small").unwrap(), Some(-3));
        assert_eq!(p.optional_i64("huge").unwrap(), Some(i64::MAX));
        assert_eq!(p.optional_i64("missing").unwrap(), None);

        let fraction = p.optional_i64("fraction").unwrap_err();
        assert!(matches!(fraction, ParameterValidationError::InvalidValue { .. }));
        assert_eq!(fraction.parameter_name(), "fraction");

        let text = p.optional_i64("text").unwrap_err();
        assert!(text.to_string().contains("expected integer, got string"));
    }

    #[test]
    fn test_optional_object() {
        let p = params(json!({"filter": {"doc_type": "Travel"}, "bad": [1]}));
        assert_eq!(
            p.optional_object("filter").unwrap(),
            Some(&json!({"doc_type": "Travel"}))
        );
        assert!(p.optional_object("bad").is_err());
    }
}
