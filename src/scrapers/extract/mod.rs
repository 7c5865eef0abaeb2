//! Project the Apollo cache into flat overview and review records.

mod overview;
mod reviews;

pub use overview::{extract_overview, try_extract_overview};
pub use reviews::extract_reviews;

use serde_json::{Map, Value};
use thiserror::Error;

use super::apollo::value_as_i64;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("missing key {0}")]
    MissingField(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

impl ExtractError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ExtractError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// A key that must be present; its value may still be `null`.
fn required<'a>(node: &'a Map<String, Value>, key: &str) -> Result<&'a Value, ExtractError> {
    node.get(key)
        .ok_or_else(|| ExtractError::MissingField(key.to_string()))
}

fn object<'a>(
    node: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a Map<String, Value>, ExtractError> {
    required(node, key)?
        .as_object()
        .ok_or_else(|| ExtractError::invalid(key, "expected an object"))
}

fn opt_f64(value: &Value, key: &str) -> Result<Option<f64>, ExtractError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ExtractError::invalid(key, format!("{:?} is not a number", s))),
        other => Err(ExtractError::invalid(
            key,
            format!("expected a number, got {}", other),
        )),
    }
}

fn opt_i64(value: &Value, key: &str) -> Result<Option<i64>, ExtractError> {
    match value {
        Value::Null => Ok(None),
        other => value_as_i64(other)
            .map(Some)
            .ok_or_else(|| ExtractError::invalid(key, format!("expected an integer, got {}", other))),
    }
}

/// Categorical values are kept as strings; numbers are rendered.
fn opt_string(value: &Value, key: &str) -> Result<Option<String>, ExtractError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(ExtractError::invalid(
            key,
            format!("expected a string, got {}", other),
        )),
    }
}

/// Truthiness of a boolean-ish field. `null` is false.
fn coerce_bool(value: &Value, key: &str) -> Result<bool, ExtractError> {
    match value {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "false" | "no" | "0" => Ok(false),
            "true" | "yes" | "1" => Ok(true),
            _ => Err(ExtractError::invalid(
                key,
                format!("{:?} is not a boolean", s),
            )),
        },
        other => Err(ExtractError::invalid(
            key,
            format!("expected a boolean, got {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bool_coercion() {
        assert!(!coerce_bool(&Value::Null, "k").unwrap());
        assert!(coerce_bool(&json!(1), "k").unwrap());
        assert!(!coerce_bool(&json!(0), "k").unwrap());
        assert!(coerce_bool(&json!("TRUE"), "k").unwrap());
        assert!(!coerce_bool(&json!("false"), "k").unwrap());
        assert!(coerce_bool(&json!("maybe"), "k").is_err());
        assert!(coerce_bool(&json!([]), "k").is_err());
    }

    #[test]
    fn numeric_fields_accept_strings() {
        assert_eq!(opt_f64(&json!("4.5"), "k").unwrap(), Some(4.5));
        assert_eq!(opt_f64(&json!(null), "k").unwrap(), None);
        assert_eq!(opt_i64(&json!("12"), "k").unwrap(), Some(12));
        assert!(opt_i64(&json!("twelve"), "k").is_err());
    }

    #[test]
    fn required_distinguishes_null_from_absent() {
        let node = json!({"present": null});
        let node = node.as_object().unwrap();
        assert_eq!(required(node, "present").unwrap(), &Value::Null);
        assert_eq!(
            required(node, "absent"),
            Err(ExtractError::MissingField("absent".to_string()))
        );
    }
}
