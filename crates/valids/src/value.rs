//! Helpers for interpreting loosely-typed JSON values.

use serde_json::Value;
use std::borrow::Cow;

/// Whether a rule parameter switches its rule on.
///
/// `false`, `null`, `0` and `""` are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Whether a field value counts as missing: `null` or the empty string.
pub fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Length of a value for the `min`/`max` rules.
///
/// Strings are measured in chars, arrays in elements, and `null` has
/// length zero. Other values have no length.
pub fn measure(value: &Value) -> Option<usize> {
    match value {
        Value::Null => Some(0),
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Text form of a value as matched by the pattern rules and shown in
/// choice lists. Strings are used as-is, `null` is the empty string.
pub fn display_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}
