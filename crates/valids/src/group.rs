//! Rule group evaluation.

use crate::error::{Result, ValidateError};
use crate::field::FieldContext;
use crate::rules::{CustomRule, CustomRuleError, Rule};
use crate::schema::{RuleGroup, RuleSpec};
use serde_json::Value;

/// Evaluate every rule of `group` against `value`, in insertion order.
///
/// Returns the message of the first rule that fails, or `None` when all
/// pass. Custom rules are awaited one at a time; an error from a custom
/// rule counts as a failure like any other. A registry rule name that
/// cannot be resolved is a configuration error.
pub async fn evaluate_group(
    group: &RuleGroup,
    value: &Value,
    ctx: &FieldContext<'_>,
) -> Result<Option<String>> {
    for (rule_name, spec) in group.iter() {
        tracing::trace!(field = ctx.field, rule = rule_name, "evaluating rule");

        let failure = match spec {
            RuleSpec::Custom(rule) => custom_failure(rule_name, rule.check(value).await),
            RuleSpec::Param(param) => {
                let rule = ctx
                    .registry
                    .get(rule_name)
                    .ok_or_else(|| ValidateError::UnknownRule {
                        field: ctx.field.to_string(),
                        rule: rule_name.to_string(),
                    })?;
                let message = ctx.messages.resolve(rule_name, rule.as_ref());
                rule.check(ctx.display_name, value, param, &message)?
            }
        };

        if let Some(message) = failure {
            tracing::debug!(field = ctx.field, rule = rule_name, "rule failed");
            return Ok(Some(message));
        }
    }
    Ok(None)
}

fn custom_failure(
    rule_name: &str,
    outcome: std::result::Result<(), CustomRuleError>,
) -> Option<String> {
    match outcome {
        Ok(()) => None,
        // An empty message is not a failure.
        Err(CustomRuleError::Message(message)) if message.is_empty() => None,
        Err(CustomRuleError::Abandoned) => Some(format!(
            "custom rule \"{}\" dropped its completion handle",
            rule_name
        )),
        Err(err) => Some(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::rules::{callback, custom_fn, RuleRegistry};
    use crate::schema::FieldSchema;
    use serde_json::json;
    use std::collections::HashMap;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn run(group: RuleGroup, value: Value) -> Result<Option<String>> {
        run_with(group, value, RuleRegistry::builtin(), HashMap::new()).await
    }

    async fn run_with(
        group: RuleGroup,
        value: Value,
        registry: RuleRegistry,
        globals: HashMap<String, Message>,
    ) -> Result<Option<String>> {
        let schema = FieldSchema::with_rules(group.clone());
        let ctx = FieldContext::new("name", &schema, &registry, &globals);
        evaluate_group(&group, &value, &ctx).await
    }

    #[tokio::test]
    async fn empty_group_passes() {
        assert_eq!(run(RuleGroup::new(), Value::Null).await.unwrap(), None);
    }

    #[tokio::test]
    async fn required_short_circuits_min() {
        let group = RuleGroup::new().rule("required", true).rule("min", 5);
        assert_eq!(
            run(group, json!("")).await.unwrap(),
            Some("attribute \"name\" is required".to_string())
        );
    }

    #[tokio::test]
    async fn rules_after_first_failure_are_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let group = RuleGroup::new().rule("max", 2).custom(
            "counted",
            custom_fn(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok::<(), CustomRuleError>(()) }
            }),
        );

        assert!(run(group.clone(), json!("too long")).await.unwrap().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(run(group, json!("ok")).await.unwrap().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn custom_message_and_fault_both_fail() {
        let group = RuleGroup::new().custom(
            "lookup",
            callback(|value, done| match value.as_str() {
                Some("fault") => done.fault(io::Error::new(io::ErrorKind::Other, "backend down")),
                Some("bad") => done.fail("customValidator message"),
                Some("empty") => done.fail(""),
                _ => done.ok(),
            }),
        );

        assert_eq!(
            run(group.clone(), json!("bad")).await.unwrap(),
            Some("customValidator message".to_string())
        );
        assert_eq!(
            run(group.clone(), json!("fault")).await.unwrap(),
            Some("backend down".to_string())
        );
        assert_eq!(run(group.clone(), json!("empty")).await.unwrap(), None);
        assert_eq!(run(group, json!("good")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn abandoned_handle_names_the_rule() {
        let group = RuleGroup::new().custom("lookup", callback(|_, done| drop(done)));
        assert_eq!(
            run(group, json!("x")).await.unwrap(),
            Some("custom rule \"lookup\" dropped its completion handle".to_string())
        );
    }

    #[tokio::test]
    async fn unknown_rule_is_a_configuration_error() {
        let group = RuleGroup::new().rule("emial", true);
        let err = run(group, json!("x")).await.unwrap_err();
        assert!(matches!(
            err,
            ValidateError::UnknownRule { ref field, ref rule } if field == "name" && rule == "emial"
        ));
    }

    #[tokio::test]
    async fn bad_parameter_is_a_configuration_error() {
        let group = RuleGroup::new().rule("in", "abc");
        let err = run(group, json!("x")).await.unwrap_err();
        assert!(matches!(err, ValidateError::InvalidParameter { .. }));
    }

    #[tokio::test]
    async fn global_message_override_applies() {
        let mut globals = HashMap::new();
        globals.insert("required".to_string(), Message::template("{name} missing"));
        let group = RuleGroup::new().rule("required", true);

        assert_eq!(
            run_with(group, Value::Null, RuleRegistry::builtin(), globals)
                .await
                .unwrap(),
            Some("name missing".to_string())
        );
    }

    #[tokio::test]
    async fn registered_rule_is_used() {
        let registry = RuleRegistry::builtin().with_fn(
            "even",
            "attribute \"{name}\" must be even",
            |name, value, _param, message| {
                if value.as_i64().is_some_and(|n| n % 2 == 0) {
                    Ok(None)
                } else {
                    Ok(Some(message.render(&crate::message::MessageParams::new(name))))
                }
            },
        );
        let group = RuleGroup::new().rule("even", true);

        assert_eq!(
            run_with(group.clone(), json!(4), registry.clone(), HashMap::new())
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            run_with(group, json!(3), registry, HashMap::new()).await.unwrap(),
            Some("attribute \"name\" must be even".to_string())
        );
    }
}
