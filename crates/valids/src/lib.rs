//! # valids
//!
//! Schema-driven validation of records of named values.
//!
//! A [`Schema`] gives each field an ordered list of [`RuleGroup`]s. Validating
//! a record:
//!
//! - runs every field concurrently; a failing field never stops another,
//! - runs a field's groups strictly in order and stops at the first group
//!   that fails,
//! - runs the rules of a group in insertion order and stops at the first
//!   rule that fails,
//! - reports at most one message per field.
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use valids::{custom_fn, CustomRuleError, FieldSchema, Options, RuleGroup, Schema};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> valids::Result<()> {
//! let schema = Schema::new()
//!     .field("name", FieldSchema::with_rules(RuleGroup::new().rule("required", true)))
//!     .field(
//!         "email",
//!         FieldSchema::new()
//!             .group(RuleGroup::new().rule("required", true))
//!             .group(RuleGroup::new().rule("email", true).rule("max", 64)),
//!     )
//!     .field(
//!         "plan",
//!         FieldSchema::with_rules(RuleGroup::new().custom(
//!             "available",
//!             custom_fn(|value| async move {
//!                 if value == "free" || value == "pro" {
//!                     Ok(())
//!                 } else {
//!                     Err(CustomRuleError::message("plan is not available"))
//!                 }
//!             }),
//!         )),
//!     );
//!
//! let options = Options::builder()
//!     .schema(schema)
//!     .message("required", "{name} cannot be blank")
//!     .build();
//!
//! let record = json!({"email": "not-an-email", "plan": "gold"});
//! let errors = valids::validate(record.as_object().unwrap(), &options).await?;
//!
//! assert_eq!(errors.get("name"), Some("name cannot be blank"));
//! assert_eq!(
//!     errors.get("email"),
//!     Some("attribute \"email\" must be a valid email address")
//! );
//! assert_eq!(errors.get("plan"), Some("plan is not available"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Messages
//!
//! Message templates use `{param}` placeholders. Every rule provides
//! `{name}`; `min`/`max` add `{min}`/`{max}` (e.g. `5 characters`) and
//! `{count}`; `in`/`choice` add `{choices}`. A field-level override beats an
//! options-level override, which beats the rule's default.

mod error;
mod field;
mod group;
mod message;
mod rules;
mod schema;
mod validator;
pub mod value;

pub use error::{Result, ValidateError, ValidationErrors};
pub use field::{validate_field, FieldContext};
pub use group::evaluate_group;
pub use message::{pluralize, to_sentence_serial, Message, MessageParams, MessageResolver};
pub use rules::custom::{CallbackRule, FnCustomRule};
pub use rules::{
    callback, custom_fn, ChoiceRule, CustomRule, CustomRuleError, Done, EmailRule, FnRule,
    MaxRule, MinRule, PostalCodeRule, RequiredRule, Rule, RuleRegistry, UsernameRule,
};
pub use schema::{FieldSchema, RuleGroup, RuleSpec, Schema};
pub use validator::{validate, Options, OptionsBuilder, Record, Validator};

// Re-exported for implementors of `CustomRule`.
pub use async_trait::async_trait;

/// Prelude module for validation
pub mod prelude {
    pub use crate::error::{ValidateError, ValidationErrors};
    pub use crate::message::Message;
    pub use crate::rules::{callback, custom_fn, CustomRule, CustomRuleError, Done, Rule, RuleRegistry};
    pub use crate::schema::{FieldSchema, RuleGroup, Schema};
    pub use crate::validator::{validate, Options, Record, Validator};
}
