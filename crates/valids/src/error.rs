//! Error types for the validation engine.
//!
//! Two very different things can go wrong while validating a record:
//!
//! - a field fails one of its rules, which is recorded in [`ValidationErrors`]
//!   and is an ordinary outcome, and
//! - the schema itself cannot be interpreted, which surfaces as a
//!   [`ValidateError`] and aborts the whole call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Configuration faults raised while interpreting a schema or record.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// A rule group names a rule that is neither registered nor custom.
    #[error("unknown rule \"{rule}\" on field \"{field}\"")]
    UnknownRule { field: String, rule: String },

    /// A built-in rule received a parameter it cannot interpret.
    #[error("invalid parameter for rule \"{rule}\": {reason}")]
    InvalidParameter { rule: String, reason: String },

    /// The value handed to `validate_value` is not an object.
    #[error("record must be an object, got {0}")]
    InvalidRecord(String),

    /// A declarative schema or options document is malformed.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ValidateError {
    pub(crate) fn invalid_parameter(rule: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            rule: rule.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidateError>;

/// Failure messages for a validated record, keyed by field name.
///
/// Each failing field carries exactly one message: the first failure
/// encountered for it. A field absent from the map is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the failure message for a field, replacing any previous one.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.insert(field.into(), message.into());
    }

    /// True when no field failed, i.e. the record is valid.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Alias for [`is_empty`](Self::is_empty) that reads better at call sites.
    pub fn is_valid(&self) -> bool {
        self.is_empty()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Message for a specific field, if it failed.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Names of all failing fields, sorted.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Convert to `Result` - `Ok` if valid, `Err(self)` otherwise.
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed for {} field(s)", self.len())
    }
}

impl std::error::Error for ValidationErrors {}

impl FromIterator<(String, String)> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
