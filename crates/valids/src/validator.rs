//! Record validation: every field concurrently, each field in order.

use crate::error::{Result, ValidateError, ValidationErrors};
use crate::field::{validate_field, FieldContext};
use crate::message::Message;
use crate::rules::RuleRegistry;
use crate::schema::{FieldSchema, RuleSpec, Schema, SchemaDocument};
use futures_util::future::join_all;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::Instrument;

/// A record to validate: field name to value.
pub type Record = serde_json::Map<String, Value>;

/// Options for one validation call.
#[derive(Debug, Clone)]
pub struct Options {
    schema: Schema,
    validate_all: bool,
    messages: HashMap<String, Message>,
}

impl Options {
    /// Options for `schema` with every other setting at its default.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            validate_all: true,
            messages: HashMap::new(),
        }
    }

    /// Start building options.
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    /// The schema fields are validated against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Whether fields declared in the schema but missing from the record
    /// are validated as `null`. Defaults to `true`.
    pub fn validate_all(&self) -> bool {
        self.validate_all
    }

    /// Message overrides applied to every field, keyed by rule name.
    pub fn messages(&self) -> &HashMap<String, Message> {
        &self.messages
    }

    /// Load options from a JSON document:
    ///
    /// ```json
    /// {
    ///   "schema": { "name": { "rules": { "required": true } } },
    ///   "validateAll": false,
    ///   "messages": { "required": "{name} please" }
    /// }
    /// ```
    pub fn from_json(value: &Value) -> Result<Self> {
        let document = OptionsDocument::deserialize(value)
            .map_err(|e| ValidateError::InvalidSchema(e.to_string()))?;
        let messages = document
            .messages
            .into_iter()
            .map(|(rule, template)| (rule, Message::template(template)))
            .collect();
        Ok(Self {
            schema: document.schema.into(),
            validate_all: document.validate_all,
            messages,
        })
    }

    /// Same as [`from_json`](Self::from_json) for JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }
}

impl From<Schema> for Options {
    fn from(schema: Schema) -> Self {
        Self::new(schema)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct OptionsDocument {
    schema: SchemaDocument,
    #[serde(default = "default_validate_all")]
    validate_all: bool,
    #[serde(default)]
    messages: HashMap<String, String>,
}

fn default_validate_all() -> bool {
    true
}

/// Builder for [`Options`].
#[derive(Debug, Default)]
pub struct OptionsBuilder {
    schema: Schema,
    validate_all: Option<bool>,
    messages: HashMap<String, Message>,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole schema.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Add one field to the schema.
    pub fn field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.schema = self.schema.field(name, field);
        self
    }

    /// See [`Options::validate_all`].
    pub fn validate_all(mut self, validate_all: bool) -> Self {
        self.validate_all = Some(validate_all);
        self
    }

    /// Override the message of `rule` for every field.
    pub fn message(mut self, rule: impl Into<String>, message: impl Into<Message>) -> Self {
        self.messages.insert(rule.into(), message.into());
        self
    }

    pub fn build(self) -> Options {
        Options {
            schema: self.schema,
            validate_all: self.validate_all.unwrap_or(true),
            messages: self.messages,
        }
    }
}

/// Validates records against schemas using a fixed [`RuleRegistry`].
///
/// ## Example
///
/// ```rust
/// use serde_json::json;
/// use valids::{FieldSchema, Options, RuleGroup, Schema, Validator};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let schema = Schema::new()
///     .field("name", FieldSchema::with_rules(RuleGroup::new().rule("required", true)))
///     .field(
///         "email",
///         FieldSchema::new()
///             .group(RuleGroup::new().rule("required", true))
///             .group(RuleGroup::new().rule("email", true)),
///     );
/// let options = Options::new(schema);
///
/// let record = json!({"name": "me", "email": "a@b.c"});
/// let errors = Validator::default()
///     .validate(record.as_object().unwrap(), &options)
///     .await
///     .unwrap();
/// assert!(errors.is_valid());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Validator {
    registry: RuleRegistry,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(RuleRegistry::builtin())
    }
}

impl Validator {
    /// A validator resolving rule names through `registry`.
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    /// The rules this validator knows by name.
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Check that every registry rule named in `schema` exists.
    pub fn check_schema(&self, schema: &Schema) -> Result<()> {
        for (field, field_schema) in schema.iter() {
            for group in field_schema.groups() {
                for (rule, spec) in group.iter() {
                    if matches!(spec, RuleSpec::Param(_)) && !self.registry.contains(rule) {
                        return Err(ValidateError::UnknownRule {
                            field: field.to_string(),
                            rule: rule.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Validate `record` against `options`.
    ///
    /// Fields are validated concurrently and independently; the result
    /// holds one message per failing field and is empty when the record is
    /// valid. Record fields the schema does not declare are ignored. An `Err` means
    /// the schema could not be interpreted.
    ///
    /// Completes only once every field has completed, so every custom rule
    /// involved must eventually resolve.
    pub async fn validate(&self, record: &Record, options: &Options) -> Result<ValidationErrors> {
        if let Err(err) = self.check_schema(options.schema()) {
            tracing::warn!(error = %err, "schema rejected");
            return Err(err);
        }

        let absent = Value::Null;
        let fields = options.schema().iter().filter_map(|(field, schema)| {
            let value = match record.get(field) {
                Some(value) => value,
                None if options.validate_all() => &absent,
                None => return None,
            };
            let ctx = FieldContext::new(field, schema, &self.registry, options.messages());
            Some(
                async move { (field, validate_field(schema, value, &ctx).await) }
                    .instrument(tracing::debug_span!("validate_field", field)),
            )
        });

        let outcomes = join_all(fields).await;
        let checked = outcomes.len();

        let mut errors = ValidationErrors::new();
        for (field, outcome) in outcomes {
            match outcome {
                Ok(Some(message)) => errors.insert(field, message),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(field, error = %err, "field could not be validated");
                    return Err(err);
                }
            }
        }

        tracing::debug!(fields = checked, failed = errors.len(), "record validated");
        Ok(errors)
    }

    /// Validate any JSON value; anything but an object is rejected.
    pub async fn validate_value(&self, value: &Value, options: &Options) -> Result<ValidationErrors> {
        match value {
            Value::Object(record) => self.validate(record, options).await,
            other => Err(ValidateError::InvalidRecord(kind_of(other).to_string())),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate `record` with the built-in rules.
pub async fn validate(record: &Record, options: &Options) -> Result<ValidationErrors> {
    static BUILTIN: OnceLock<Validator> = OnceLock::new();
    BUILTIN
        .get_or_init(Validator::default)
        .validate(record, options)
        .await
}
