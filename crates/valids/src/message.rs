//! Failure message rendering and override resolution.
//!
//! Every rule failure is rendered through a [`Message`]. Which message is
//! used for a rule on a given field is decided by [`MessageResolver`]:
//!
//! 1. an override attached to the field itself,
//! 2. an override in the options-level `messages` table,
//! 3. the rule's built-in default.

use crate::rules::Rule;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

type RenderFn = dyn Fn(&MessageParams) -> String + Send + Sync;

/// Named parameters available to a message while it renders.
///
/// Always carries `name` (the field's display name); rules add their own
/// values such as `min` or `choices`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageParams {
    params: BTreeMap<String, String>,
}

impl MessageParams {
    /// Parameters for a field with the given display name.
    pub fn new(name: impl Into<String>) -> Self {
        let mut params = BTreeMap::new();
        params.insert("name".to_string(), name.into());
        Self { params }
    }

    /// Add a parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Look up a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The field's display name.
    pub fn name(&self) -> &str {
        self.get("name").unwrap_or_default()
    }

    /// Replace `{key}` placeholders in `template` with parameter values.
    ///
    /// The template is scanned once; substituted values are copied as-is
    /// and never interpolated again. Placeholders without a matching
    /// parameter are left untouched.
    pub fn interpolate(&self, template: &str) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            result.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                rest = &rest[open..];
                break;
            };
            let key = &after[..close];
            if key.contains('{') {
                result.push('{');
                rest = after;
                continue;
            }
            match self.params.get(key) {
                Some(value) => result.push_str(value),
                None => {
                    result.push('{');
                    result.push_str(key);
                    result.push('}');
                }
            }
            rest = &after[close + 1..];
        }
        result.push_str(rest);
        result
    }
}

/// A message renderer: turns [`MessageParams`] into the text reported for a
/// failing field.
#[derive(Clone)]
pub struct Message {
    render: Arc<RenderFn>,
    source: Option<Arc<str>>,
}

impl Message {
    /// A message from a template string with `{param}` placeholders.
    ///
    /// ```rust
    /// use valids::{Message, MessageParams};
    ///
    /// let message = Message::template("field \"{name}\" failed");
    /// assert_eq!(message.render(&MessageParams::new("email")), "field \"email\" failed");
    /// ```
    pub fn template(template: impl Into<String>) -> Self {
        let source: Arc<str> = Arc::from(template.into());
        let template = Arc::clone(&source);
        Self {
            render: Arc::new(move |params: &MessageParams| params.interpolate(&template)),
            source: Some(source),
        }
    }

    /// A message computed by a closure.
    pub fn from_fn<F>(render: F) -> Self
    where
        F: Fn(&MessageParams) -> String + Send + Sync + 'static,
    {
        Self {
            render: Arc::new(render),
            source: None,
        }
    }

    /// Render the message against the given parameters.
    pub fn render(&self, params: &MessageParams) -> String {
        (self.render)(params)
    }

    /// The template text, when the message was built from one.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => f.debug_tuple("Message").field(source).finish(),
            None => f.write_str("Message(<fn>)"),
        }
    }
}

impl From<&str> for Message {
    fn from(template: &str) -> Self {
        Self::template(template)
    }
}

impl From<String> for Message {
    fn from(template: String) -> Self {
        Self::template(template)
    }
}

/// Picks the message for a rule on one field.
#[derive(Debug, Clone, Copy)]
pub struct MessageResolver<'a> {
    field: &'a HashMap<String, Message>,
    global: &'a HashMap<String, Message>,
}

impl<'a> MessageResolver<'a> {
    pub fn new(field: &'a HashMap<String, Message>, global: &'a HashMap<String, Message>) -> Self {
        Self { field, global }
    }

    /// Field override, then options override, then the rule's default.
    pub fn resolve(&self, rule_name: &str, rule: &dyn Rule) -> Message {
        self.field
            .get(rule_name)
            .or_else(|| self.global.get(rule_name))
            .cloned()
            .unwrap_or_else(|| rule.default_message())
    }
}

/// `"1 character"`, `"2 characters"`, `"0 characters"`.
pub fn pluralize(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("{} {}", count, unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

/// Join items into a sentence with a serial comma.
///
/// With `separator = ", "` and `last_separator = " or "`:
/// `a` → `a`, `a, b` → `a or b`, `a, b, c` → `a, b, or c`.
pub fn to_sentence_serial<S: AsRef<str>>(
    items: &[S],
    separator: &str,
    last_separator: &str,
) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [init @ .., last] => {
            let head = init
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(separator);
            let joiner = if items.len() > 2 {
                format!("{}{}", separator.trim_end(), last_separator)
            } else {
                last_separator.to_string()
            };
            format!("{}{}{}", head, joiner, last.as_ref())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn template_interpolates_known_params() {
        let message = Message::template("{name} needs {min}, not {other}");
        let params = MessageParams::new("title").with("min", "3 characters");
        assert_eq!(message.render(&params), "title needs 3 characters, not {other}");
        assert_eq!(message.source(), Some("{name} needs {min}, not {other}"));
    }

    #[test]
    fn substituted_values_are_not_reinterpolated() {
        let params = MessageParams::new("tag").with("choices", "\"{name}\" or \"b\"");
        assert_eq!(
            params.interpolate("{name} must be {choices}"),
            "tag must be \"{name}\" or \"b\""
        );

        let params = MessageParams::new("{min}").with("min", "3 characters");
        assert_eq!(params.interpolate("{name}: {min}"), "{min}: 3 characters");
    }

    #[test]
    fn unbalanced_braces_are_kept() {
        let params = MessageParams::new("zip");
        assert_eq!(params.interpolate("{name"), "{name");
        assert_eq!(params.interpolate("{{name}"), "{zip");
        assert_eq!(params.interpolate("} {name} {"), "} zip {");
        assert_eq!(params.interpolate("{}"), "{}");
    }

    #[test]
    fn closure_message() {
        let message = Message::from_fn(|p| p.name().to_uppercase());
        assert_eq!(message.render(&MessageParams::new("zip")), "ZIP");
        assert!(message.source().is_none());
    }

    #[test]
    fn pluralize_units() {
        assert_eq!(pluralize(1, "character"), "1 character");
        assert_eq!(pluralize(2, "character"), "2 characters");
        assert_eq!(pluralize(0, "character"), "0 characters");
    }

    #[test]
    fn sentence_serial() {
        let none: [&str; 0] = [];
        assert_eq!(to_sentence_serial(&none, ", ", " or "), "");
        assert_eq!(to_sentence_serial(&["a"], ", ", " or "), "a");
        assert_eq!(to_sentence_serial(&["a", "b"], ", ", " or "), "a or b");
        assert_eq!(
            to_sentence_serial(&["a", "b", "c"], ", ", " or "),
            "a, b, or c"
        );
        assert_eq!(
            to_sentence_serial(&["a", "b", "c", "d"], ", ", " and "),
            "a, b, c, and d"
        );
    }

    proptest! {
        #[test]
        fn pluralize_adds_suffix_unless_one(n in 0u64..100_000) {
            let rendered = pluralize(n, "character");
            if n == 1 {
                prop_assert_eq!(rendered, "1 character");
            } else {
                prop_assert_eq!(rendered, format!("{} characters", n));
            }
        }

        #[test]
        fn serial_list_keeps_every_item_in_order(items in prop::collection::vec("[a-z]{1,8}", 3..8)) {
            let sentence = to_sentence_serial(&items, ", ", " or ");
            let expected_tail = format!(", or {}", items[items.len() - 1]);
            prop_assert!(sentence.ends_with(&expected_tail));
            let mut cursor = 0;
            for item in &items {
                let found = sentence[cursor..].find(item.as_str());
                prop_assert!(found.is_some());
                cursor += found.unwrap() + item.len();
            }
        }
    }
}
