//! Built-in synchronous rules.

use crate::error::{Result, ValidateError};
use crate::message::{pluralize, to_sentence_serial, Message, MessageParams};
use crate::rules::Rule;
use crate::value::{display_text, is_absent, is_truthy, measure};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static POSTAL_CODE_REGEX: OnceLock<Regex> = OnceLock::new();
static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern compiles"))
}

fn postal_code_regex() -> &'static Regex {
    POSTAL_CODE_REGEX
        .get_or_init(|| Regex::new(r"^[0-9]{5}(-[0-9]{4})?$").expect("postal code pattern compiles"))
}

fn username_regex() -> &'static Regex {
    USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._-]+$").expect("username pattern compiles"))
}

fn length_bound(rule: &str, param: &Value) -> Result<u64> {
    if let Some(n) = param.as_u64() {
        return Ok(n);
    }
    match param.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
        _ => Err(ValidateError::invalid_parameter(
            rule,
            format!("expected a non-negative integer, got {}", param),
        )),
    }
}

fn fail(message: &Message, params: MessageParams) -> Result<Option<String>> {
    Ok(Some(message.render(&params)))
}

/// Fails when active and the value is `null` or the empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredRule;

impl Rule for RequiredRule {
    fn check(
        &self,
        name: &str,
        value: &Value,
        param: &Value,
        message: &Message,
    ) -> Result<Option<String>> {
        if is_truthy(param) && is_absent(value) {
            return fail(message, MessageParams::new(name));
        }
        Ok(None)
    }

    fn default_message(&self) -> Message {
        Message::template("attribute \"{name}\" is required")
    }
}

/// Fails when the value is shorter than the bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinRule;

impl Rule for MinRule {
    fn check(
        &self,
        name: &str,
        value: &Value,
        param: &Value,
        message: &Message,
    ) -> Result<Option<String>> {
        let min = length_bound("min", param)?;
        match measure(value) {
            Some(len) if (len as u64) < min => fail(
                message,
                MessageParams::new(name)
                    .with("min", pluralize(min, "character"))
                    .with("count", min),
            ),
            _ => Ok(None),
        }
    }

    fn default_message(&self) -> Message {
        Message::template("attribute \"{name}\" must have a minimum of {min}")
    }
}

/// Fails when the value is longer than the bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxRule;

impl Rule for MaxRule {
    fn check(
        &self,
        name: &str,
        value: &Value,
        param: &Value,
        message: &Message,
    ) -> Result<Option<String>> {
        let max = length_bound("max", param)?;
        match measure(value) {
            Some(len) if (len as u64) > max => fail(
                message,
                MessageParams::new(name)
                    .with("max", pluralize(max, "character"))
                    .with("count", max),
            ),
            _ => Ok(None),
        }
    }

    fn default_message(&self) -> Message {
        Message::template("attribute \"{name}\" must have a maximum of {max}")
    }
}

/// Fails when the value is not one of the allowed values.
///
/// Registered as both `in` and `choice`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChoiceRule;

impl Rule for ChoiceRule {
    fn check(
        &self,
        name: &str,
        value: &Value,
        param: &Value,
        message: &Message,
    ) -> Result<Option<String>> {
        let allowed = param.as_array().ok_or_else(|| {
            ValidateError::invalid_parameter(
                "choice",
                format!("expected an array of allowed values, got {}", param),
            )
        })?;

        if allowed.contains(value) {
            return Ok(None);
        }

        let quoted: Vec<String> = allowed
            .iter()
            .map(|choice| format!("\"{}\"", display_text(choice)))
            .collect();
        let choices = if quoted.is_empty() {
            "nothing".to_string()
        } else {
            to_sentence_serial(&quoted, ", ", " or ")
        };
        fail(message, MessageParams::new(name).with("choices", choices))
    }

    fn default_message(&self) -> Message {
        Message::template("attribute \"{name}\" must be {choices}")
    }
}

/// Fails when active and the value does not look like `local@domain.tld`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailRule;

impl Rule for EmailRule {
    fn check(
        &self,
        name: &str,
        value: &Value,
        param: &Value,
        message: &Message,
    ) -> Result<Option<String>> {
        if is_truthy(param) && !email_regex().is_match(&display_text(value)) {
            return fail(message, MessageParams::new(name));
        }
        Ok(None)
    }

    fn default_message(&self) -> Message {
        Message::template("attribute \"{name}\" must be a valid email address")
    }
}

/// Fails when active and the value is not `12345` or `12345-6789`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostalCodeRule;

impl Rule for PostalCodeRule {
    fn check(
        &self,
        name: &str,
        value: &Value,
        param: &Value,
        message: &Message,
    ) -> Result<Option<String>> {
        if is_truthy(param) && !postal_code_regex().is_match(&display_text(value)) {
            return fail(message, MessageParams::new(name));
        }
        Ok(None)
    }

    fn default_message(&self) -> Message {
        Message::template("attribute \"{name}\" must be a valid postal code")
    }
}

/// Fails when active and the value has characters other than letters,
/// digits, `.`, `-` and `_`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsernameRule;

impl Rule for UsernameRule {
    fn check(
        &self,
        name: &str,
        value: &Value,
        param: &Value,
        message: &Message,
    ) -> Result<Option<String>> {
        if is_truthy(param) && !username_regex().is_match(&display_text(value)) {
            return fail(message, MessageParams::new(name));
        }
        Ok(None)
    }

    fn default_message(&self) -> Message {
        Message::template(
            "attribute \"{name}\" must only contain letters, numbers, periods, dashes, and underscores",
        )
    }
}
