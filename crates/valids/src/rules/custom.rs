//! Caller-supplied asynchronous rules.
//!
//! A custom rule is attached to a rule group directly instead of being
//! looked up by name. It either passes or fails with a
//! [`CustomRuleError`]; a plain message and a fault are both reported as
//! the field's failure message.
//!
//! Custom rules must eventually complete. Validation of a record waits for
//! every field, so a rule that never resolves stalls the whole call. There
//! is no built-in timeout; wrap the call in `tokio::time::timeout` when one
//! is needed.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use thiserror::Error;
use tokio::sync::oneshot;

/// Why a custom rule rejected a value.
#[derive(Debug, Error)]
pub enum CustomRuleError {
    /// The value is invalid; the text is reported verbatim.
    #[error("{0}")]
    Message(String),

    /// The rule itself failed, e.g. a lookup it depends on errored.
    #[error("{0}")]
    Fault(Box<dyn std::error::Error + Send + Sync>),

    /// A [`Done`] handle was dropped without being resolved.
    #[error("custom rule dropped its completion handle")]
    Abandoned,
}

impl CustomRuleError {
    /// The value is invalid; `message` becomes the field's failure.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// The rule could not run; the error's text becomes the field's failure.
    pub fn fault(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Fault(error.into())
    }
}

/// An asynchronous rule supplied by the caller.
///
/// ## Example
///
/// ```rust,ignore
/// use valids::{CustomRule, CustomRuleError};
///
/// struct UniqueEmail { db: Db }
///
/// #[async_trait]
/// impl CustomRule for UniqueEmail {
///     async fn check(&self, value: &Value) -> Result<(), CustomRuleError> {
///         let taken = self.db.email_exists(value.as_str().unwrap_or_default()).await
///             .map_err(CustomRuleError::fault)?;
///         if taken {
///             Err(CustomRuleError::message("email is already registered"))
///         } else {
///             Ok(())
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait CustomRule: Send + Sync {
    async fn check(&self, value: &Value) -> Result<(), CustomRuleError>;
}

/// Custom rule built from an async closure. See [`custom_fn`].
pub struct FnCustomRule<F> {
    check: F,
}

#[async_trait]
impl<F, Fut> CustomRule for FnCustomRule<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CustomRuleError>> + Send + 'static,
{
    async fn check(&self, value: &Value) -> Result<(), CustomRuleError> {
        (self.check)(value.clone()).await
    }
}

/// Wrap an async closure as a custom rule.
///
/// ```rust
/// use valids::{custom_fn, CustomRuleError};
///
/// let rule = custom_fn(|value| async move {
///     if value == "correct" {
///         Ok(())
///     } else {
///         Err(CustomRuleError::message("customValidator message"))
///     }
/// });
/// # let _ = rule;
/// ```
pub fn custom_fn<F, Fut>(check: F) -> FnCustomRule<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CustomRuleError>> + Send + 'static,
{
    FnCustomRule { check }
}

/// Completion handle passed to a [`callback`] rule.
///
/// Resolving consumes the handle, so a rule completes at most once.
/// Dropping it unresolved fails the rule with
/// [`CustomRuleError::Abandoned`].
pub struct Done {
    tx: oneshot::Sender<Result<(), CustomRuleError>>,
}

impl Done {
    /// The value passed.
    pub fn ok(self) {
        self.complete(Ok(()));
    }

    /// The value failed with a message.
    pub fn fail(self, message: impl Into<String>) {
        self.complete(Err(CustomRuleError::Message(message.into())));
    }

    /// The rule hit an error of its own.
    pub fn fault(self, error: impl Into<Box<dyn std::error::Error + Send + Sync>>) {
        self.complete(Err(CustomRuleError::Fault(error.into())));
    }

    /// Resolve with an outcome built elsewhere.
    pub fn complete(self, outcome: Result<(), CustomRuleError>) {
        // The receiver is gone only if the validation was dropped.
        let _ = self.tx.send(outcome);
    }
}

impl fmt::Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Custom rule driven by a completion handle. See [`callback`].
pub struct CallbackRule<F> {
    invoke: F,
}

#[async_trait]
impl<F> CustomRule for CallbackRule<F>
where
    F: Fn(Value, Done) + Send + Sync + 'static,
{
    async fn check(&self, value: &Value) -> Result<(), CustomRuleError> {
        let (tx, rx) = oneshot::channel();
        (self.invoke)(value.clone(), Done { tx });
        rx.await.unwrap_or_else(|_| Err(CustomRuleError::Abandoned))
    }
}

/// Wrap a function that reports its outcome through a [`Done`] handle,
/// possibly from another task.
///
/// ```rust
/// use valids::callback;
///
/// let rule = callback(|value, done| {
///     tokio::spawn(async move {
///         if value.is_string() {
///             done.ok();
///         } else {
///             done.fail("must be text");
///         }
///     });
/// });
/// # let _ = rule;
/// ```
pub fn callback<F>(invoke: F) -> CallbackRule<F>
where
    F: Fn(Value, Done) + Send + Sync + 'static,
{
    CallbackRule { invoke }
}
