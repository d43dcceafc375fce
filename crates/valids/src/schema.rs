//! Schema types: which rules apply to which fields, and in what order.
//!
//! A [`Schema`] maps field names to [`FieldSchema`]s. Each field holds an
//! ordered list of [`RuleGroup`]s; groups run strictly in that order. Inside
//! a group, rules run in insertion order and the first failure wins.

use crate::error::{Result, ValidateError};
use crate::message::Message;
use crate::rules::CustomRule;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Configuration of one rule inside a group.
#[derive(Clone)]
pub enum RuleSpec {
    /// Parameter for a rule looked up by name in the registry.
    Param(Value),
    /// Caller-supplied asynchronous check.
    Custom(Arc<dyn CustomRule>),
}

impl RuleSpec {
    pub fn is_custom(&self) -> bool {
        matches!(self, RuleSpec::Custom(_))
    }
}

impl fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSpec::Param(param) => f.debug_tuple("Param").field(param).finish(),
            RuleSpec::Custom(_) => f.write_str("Custom(<rule>)"),
        }
    }
}

/// Rules evaluated together against one value; the first failure wins.
///
/// Rule names are unique. Re-adding a name replaces its spec but keeps
/// the original position.
#[derive(Debug, Clone, Default)]
pub struct RuleGroup {
    rules: IndexMap<String, RuleSpec>,
}

impl RuleGroup {
    /// An empty group; it always passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registry rule with its parameter.
    pub fn rule(mut self, name: impl Into<String>, param: impl Into<Value>) -> Self {
        self.rules.insert(name.into(), RuleSpec::Param(param.into()));
        self
    }

    /// Add a custom asynchronous rule.
    pub fn custom(self, name: impl Into<String>, rule: impl CustomRule + 'static) -> Self {
        self.custom_arc(name, Arc::new(rule))
    }

    /// Add a shared custom asynchronous rule.
    pub fn custom_arc(mut self, name: impl Into<String>, rule: Arc<dyn CustomRule>) -> Self {
        self.rules.insert(name.into(), RuleSpec::Custom(rule));
        self
    }

    /// The rule configured under `name`.
    pub fn get(&self, name: &str) -> Option<&RuleSpec> {
        self.rules.get(name)
    }

    /// Rules in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleSpec)> {
        self.rules.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Number of rules in the group.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when the group has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Validation configuration for a single field.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    groups: Vec<RuleGroup>,
    display_name: Option<String>,
    messages: HashMap<String, Message>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// A field with a single rule group.
    pub fn with_rules(group: RuleGroup) -> Self {
        Self::new().group(group)
    }

    /// Append a rule group. Groups run in the order they are added.
    pub fn group(mut self, group: RuleGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Name used in messages instead of the field's key.
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Override the message of one rule for this field only.
    pub fn message(mut self, rule: impl Into<String>, message: impl Into<Message>) -> Self {
        self.messages.insert(rule.into(), message.into());
        self
    }

    pub fn groups(&self) -> &[RuleGroup] {
        &self.groups
    }

    pub fn messages(&self) -> &HashMap<String, Message> {
        &self.messages
    }

    /// Display name if set, otherwise the field's key.
    pub fn name_for<'a>(&'a self, field: &'a str) -> &'a str {
        self.display_name.as_deref().unwrap_or(field)
    }
}

/// Field name to [`FieldSchema`].
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: IndexMap<String, FieldSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a field.
    pub fn field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Load a schema from a JSON document.
    ///
    /// ```json
    /// {
    ///   "name":  { "rules": { "required": true } },
    ///   "email": { "displayName": "E-mail",
    ///              "rules": [ { "required": true }, { "email": true } ],
    ///              "messages": { "email": "{name} looks wrong" } }
    /// }
    /// ```
    ///
    /// `rules` is either one group or an array of groups. Custom rules
    /// cannot be expressed here; attach them programmatically.
    pub fn from_json(value: &Value) -> Result<Self> {
        let document = SchemaDocument::deserialize(value)
            .map_err(|e| ValidateError::InvalidSchema(e.to_string()))?;
        Ok(document.into())
    }

    /// Same as [`from_json`](Self::from_json) for JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub(crate) struct SchemaDocument {
    fields: IndexMap<String, FieldDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FieldDocument {
    #[serde(default)]
    rules: RulesDocument,
    display_name: Option<String>,
    #[serde(default)]
    messages: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RulesDocument {
    Single(IndexMap<String, Value>),
    Ordered(Vec<IndexMap<String, Value>>),
}

impl Default for RulesDocument {
    fn default() -> Self {
        RulesDocument::Ordered(Vec::new())
    }
}

fn group_from_document(rules: IndexMap<String, Value>) -> RuleGroup {
    rules
        .into_iter()
        .fold(RuleGroup::new(), |group, (name, param)| group.rule(name, param))
}

impl From<SchemaDocument> for Schema {
    fn from(document: SchemaDocument) -> Self {
        document
            .fields
            .into_iter()
            .fold(Schema::new(), |schema, (name, doc)| {
                let groups = match doc.rules {
                    RulesDocument::Single(group) => vec![group],
                    RulesDocument::Ordered(groups) => groups,
                };
                let mut field = groups
                    .into_iter()
                    .map(group_from_document)
                    .fold(FieldSchema::new(), FieldSchema::group);
                if let Some(display_name) = doc.display_name {
                    field = field.display_name(display_name);
                }
                for (rule, template) in doc.messages {
                    field = field.message(rule, template);
                }
                schema.field(name, field)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{custom_fn, CustomRuleError};
    use serde_json::json;

    #[test]
    fn group_keeps_insertion_order_and_unique_names() {
        let group = RuleGroup::new()
            .rule("required", true)
            .rule("min", 5)
            .rule("required", false);

        let names: Vec<&str> = group.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["required", "min"]);
        assert!(matches!(group.get("required"), Some(RuleSpec::Param(Value::Bool(false)))));
    }

    #[test]
    fn custom_rules_are_tagged() {
        let group = RuleGroup::new()
            .rule("required", true)
            .custom("unique", custom_fn(|_| async { Ok::<(), CustomRuleError>(()) }));

        assert!(!group.get("required").unwrap().is_custom());
        assert!(group.get("unique").unwrap().is_custom());
    }

    #[test]
    fn field_display_name_falls_back_to_key() {
        let plain = FieldSchema::with_rules(RuleGroup::new().rule("required", true));
        let named = plain.clone().display_name("E-mail");

        assert_eq!(plain.name_for("email"), "email");
        assert_eq!(named.name_for("email"), "E-mail");
        assert_eq!(named.groups().len(), 1);
    }

    #[test]
    fn from_json_single_and_ordered_groups() {
        let schema = Schema::from_json(&json!({
            "name": { "rules": { "required": true, "min": 2 } },
            "email": {
                "displayName": "E-mail",
                "rules": [ { "required": true }, { "email": true, "max": 64 } ],
                "messages": { "email": "{name} looks wrong" }
            }
        }))
        .unwrap();

        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["name", "email"]);

        let name = schema.get("name").unwrap();
        assert_eq!(name.groups().len(), 1);
        let rules: Vec<&str> = name.groups()[0].iter().map(|(n, _)| n).collect();
        assert_eq!(rules, vec!["required", "min"]);

        let email = schema.get("email").unwrap();
        assert_eq!(email.groups().len(), 2);
        assert_eq!(email.name_for("email"), "E-mail");
        let rules: Vec<&str> = email.groups()[1].iter().map(|(n, _)| n).collect();
        assert_eq!(rules, vec!["email", "max"]);
        assert_eq!(
            email.messages().get("email").and_then(Message::source),
            Some("{name} looks wrong")
        );
    }

    #[test]
    fn from_json_without_rules_has_no_groups() {
        let schema = Schema::from_json(&json!({ "note": {} })).unwrap();
        assert!(schema.get("note").unwrap().groups().is_empty());
    }

    #[test]
    fn from_json_rejects_malformed_documents() {
        let err = Schema::from_json(&json!({ "name": { "rules": 5 } })).unwrap_err();
        assert!(matches!(err, ValidateError::InvalidSchema(_)));

        let err = Schema::from_json(&json!({ "name": { "rule": {} } })).unwrap_err();
        assert!(matches!(err, ValidateError::InvalidSchema(_)));

        let err = Schema::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ValidateError::Json(_)));
    }
}
