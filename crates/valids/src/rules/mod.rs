//! Validation rules and the registry that names them.
//!
//! A [`Rule`] is a synchronous check of one value against one parameter.
//! Rules are looked up by name in a [`RuleRegistry`]; custom asynchronous
//! checks live in [`custom`] and are attached to a schema directly.

mod builtin;
pub mod custom;

pub use builtin::{
    ChoiceRule, EmailRule, MaxRule, MinRule, PostalCodeRule, RequiredRule, UsernameRule,
};
pub use custom::{callback, custom_fn, CustomRule, CustomRuleError, Done};

use crate::error::Result;
use crate::message::Message;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A synchronous validation rule.
///
/// `check` receives the field's display name, its value, the parameter
/// configured in the schema, and the message already resolved for this
/// rule on this field. It returns `Ok(None)` when the value passes and
/// `Ok(Some(message))` when it fails. `Err` is reserved for parameters
/// the rule cannot interpret.
///
/// ## Example
///
/// ```rust
/// use serde_json::Value;
/// use valids::{Message, MessageParams, Rule};
///
/// struct Even;
///
/// impl Rule for Even {
///     fn check(
///         &self,
///         name: &str,
///         value: &Value,
///         _param: &Value,
///         message: &Message,
///     ) -> valids::Result<Option<String>> {
///         match value.as_i64() {
///             Some(n) if n % 2 == 0 => Ok(None),
///             _ => Ok(Some(message.render(&MessageParams::new(name)))),
///         }
///     }
///
///     fn default_message(&self) -> Message {
///         Message::template("attribute \"{name}\" must be even")
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    fn check(
        &self,
        name: &str,
        value: &Value,
        param: &Value,
        message: &Message,
    ) -> Result<Option<String>>;

    /// Message used when neither the field nor the options override it.
    fn default_message(&self) -> Message;
}

type CheckFn = dyn Fn(&str, &Value, &Value, &Message) -> Result<Option<String>> + Send + Sync;

/// A rule backed by a closure, registered through [`RuleRegistry::with_fn`].
pub struct FnRule {
    check: Arc<CheckFn>,
    default_message: Message,
}

impl FnRule {
    pub fn new<F>(default_message: impl Into<Message>, check: F) -> Self
    where
        F: Fn(&str, &Value, &Value, &Message) -> Result<Option<String>> + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(check),
            default_message: default_message.into(),
        }
    }
}

impl Rule for FnRule {
    fn check(
        &self,
        name: &str,
        value: &Value,
        param: &Value,
        message: &Message,
    ) -> Result<Option<String>> {
        (self.check)(name, value, param, message)
    }

    fn default_message(&self) -> Message {
        self.default_message.clone()
    }
}

/// Immutable table of named rules.
///
/// Registering a rule returns a new registry and leaves the receiver as it
/// was, so a registry can be shared freely between concurrent validations.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<String, Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// A registry with no rules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding the built-in rules:
    /// `required`, `min`, `max`, `in`, `choice`, `email`, `postal_code`
    /// and `username`.
    pub fn builtin() -> Self {
        let choice: Arc<dyn Rule> = Arc::new(ChoiceRule);
        let mut rules: HashMap<String, Arc<dyn Rule>> = HashMap::new();
        rules.insert("required".to_string(), Arc::new(RequiredRule));
        rules.insert("min".to_string(), Arc::new(MinRule));
        rules.insert("max".to_string(), Arc::new(MaxRule));
        rules.insert("in".to_string(), Arc::clone(&choice));
        rules.insert("choice".to_string(), choice);
        rules.insert("email".to_string(), Arc::new(EmailRule));
        rules.insert("postal_code".to_string(), Arc::new(PostalCodeRule));
        rules.insert("username".to_string(), Arc::new(UsernameRule));
        Self { rules }
    }

    /// A copy of this registry with `rule` registered under `name`,
    /// replacing any rule already using that name.
    pub fn with_rule(&self, name: impl Into<String>, rule: impl Rule + 'static) -> Self {
        self.with_rule_arc(name, Arc::new(rule))
    }

    /// Same as [`with_rule`](Self::with_rule) for a shared rule.
    pub fn with_rule_arc(&self, name: impl Into<String>, rule: Arc<dyn Rule>) -> Self {
        let mut rules = self.rules.clone();
        rules.insert(name.into(), rule);
        Self { rules }
    }

    /// A copy of this registry with a closure registered as a rule.
    pub fn with_fn<F>(&self, name: impl Into<String>, default_message: impl Into<Message>, check: F) -> Self
    where
        F: Fn(&str, &Value, &Value, &Message) -> Result<Option<String>> + Send + Sync + 'static,
    {
        self.with_rule(name, FnRule::new(default_message, check))
    }

    /// A copy of this registry without the named rule.
    pub fn without(&self, name: &str) -> Self {
        let mut rules = self.rules.clone();
        rules.remove(name);
        Self { rules }
    }

    /// Look up a rule by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.get(name)
    }

    /// Whether a rule is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Registered rule names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.names())
            .finish()
    }
}
