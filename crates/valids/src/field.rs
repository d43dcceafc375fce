//! Field validation: run a field's rule groups in order, stopping at the
//! first group that fails.

use crate::error::Result;
use crate::group::evaluate_group;
use crate::message::{Message, MessageResolver};
use crate::rules::RuleRegistry;
use crate::schema::FieldSchema;
use serde_json::Value;
use std::collections::HashMap;

/// Everything a rule needs to know about the field it is checking.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    /// Key of the field in the record.
    pub field: &'a str,
    /// Name shown in messages.
    pub display_name: &'a str,
    pub registry: &'a RuleRegistry,
    pub messages: MessageResolver<'a>,
}

impl<'a> FieldContext<'a> {
    pub fn new(
        field: &'a str,
        schema: &'a FieldSchema,
        registry: &'a RuleRegistry,
        global_messages: &'a HashMap<String, Message>,
    ) -> Self {
        Self {
            field,
            display_name: schema.name_for(field),
            registry,
            messages: MessageResolver::new(schema.messages(), global_messages),
        }
    }
}

/// Validate one field's value against its schema.
///
/// Groups run strictly in order; the first group reporting a failure ends
/// the field and its message is returned. A field with no groups passes.
pub async fn validate_field(
    schema: &FieldSchema,
    value: &Value,
    ctx: &FieldContext<'_>,
) -> Result<Option<String>> {
    for (index, group) in schema.groups().iter().enumerate() {
        if let Some(message) = evaluate_group(group, value, ctx).await? {
            tracing::debug!(field = ctx.field, group = index, %message, "field failed");
            return Ok(Some(message));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{custom_fn, CustomRuleError};
    use crate::schema::RuleGroup;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn run(schema: &FieldSchema, value: Value) -> Option<String> {
        let registry = RuleRegistry::builtin();
        let globals = HashMap::new();
        let ctx = FieldContext::new("email", schema, &registry, &globals);
        validate_field(schema, &value, &ctx).await.unwrap()
    }

    #[tokio::test]
    async fn no_groups_always_pass() {
        assert_eq!(run(&FieldSchema::new(), Value::Null).await, None);
    }

    #[tokio::test]
    async fn first_failing_group_wins() {
        let schema = FieldSchema::new()
            .group(RuleGroup::new().rule("required", true))
            .group(RuleGroup::new().rule("email", true));

        assert_eq!(
            run(&schema, Value::Null).await,
            Some("attribute \"email\" is required".to_string())
        );
        assert_eq!(
            run(&schema, json!("nope")).await,
            Some("attribute \"email\" must be a valid email address".to_string())
        );
        assert_eq!(run(&schema, json!("a@b.c")).await, None);
    }

    #[tokio::test]
    async fn later_groups_do_not_run_after_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let schema = FieldSchema::new()
            .group(RuleGroup::new().rule("required", true))
            .group(RuleGroup::new().custom(
                "counted",
                custom_fn(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<(), CustomRuleError>(()) }
                }),
            ));

        assert!(run(&schema, json!("")).await.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(run(&schema, json!("present")).await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn display_name_is_used_in_messages() {
        let schema = FieldSchema::with_rules(RuleGroup::new().rule("required", true))
            .display_name("E-mail address");

        assert_eq!(
            run(&schema, Value::Null).await,
            Some("attribute \"E-mail address\" is required".to_string())
        );
    }
}
