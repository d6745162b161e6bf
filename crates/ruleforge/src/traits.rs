//! Core validation traits

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::EvaluationResult;
use crate::message::{self, MessageArgs, MessageFormatter};
use crate::outcome::{Severity, ValidationFailure, ValidationOutcome};

/// Everything a rule may look at besides the value itself
pub struct RuleContext<'a, P: ?Sized> {
    /// The instance that owns the property being validated
    pub instance: &'a P,
    /// Display name used in messages, e.g. `FirstName` or `Tags[2]`
    pub property_name: &'a str,
    /// Formatter inherited from the validator or the current call
    pub formatter: Option<&'a dyn MessageFormatter>,
}

impl<'a, P: ?Sized> RuleContext<'a, P> {
    pub fn new(instance: &'a P, property_name: &'a str) -> Self {
        Self {
            instance,
            property_name,
            formatter: None,
        }
    }

    pub fn with_formatter<'b>(self, formatter: Option<&'b dyn MessageFormatter>) -> RuleContext<'b, P>
    where
        'a: 'b,
    {
        RuleContext {
            instance: self.instance,
            property_name: self.property_name,
            formatter,
        }
    }

    /// Same context under another display name
    pub fn renamed<'b>(&self, property_name: &'b str) -> RuleContext<'b, P>
    where
        'a: 'b,
    {
        RuleContext {
            instance: self.instance,
            property_name,
            formatter: self.formatter,
        }
    }
}

impl RuleContext<'static, ()> {
    /// Context for a rule evaluated outside any validator
    pub fn detached(property_name: &'static str) -> Self {
        RuleContext::new(&(), property_name)
    }
}

impl<P: ?Sized> Clone for RuleContext<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: ?Sized> Copy for RuleContext<'_, P> {}

impl<P: ?Sized> fmt::Debug for RuleContext<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleContext")
            .field("property_name", &self.property_name)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

/// Message and severity settings shared by every concrete rule
#[derive(Clone, Default)]
pub struct RuleOptions {
    /// Literal message template, wins over everything else
    pub message: Option<String>,
    /// Overrides the rule's built-in message key
    pub message_key: Option<String>,
    /// Formatter used instead of the one in the context
    pub formatter: Option<Arc<dyn MessageFormatter>>,
    pub severity: Severity,
}

impl RuleOptions {
    /// Resolve the failure message
    ///
    /// An explicit message is used as a template. Otherwise the key goes to
    /// the rule's formatter, then the context's formatter, and finally to the
    /// built-in English catalog.
    pub fn render<P: ?Sized>(&self, ctx: &RuleContext<'_, P>, default_key: &str, mut args: MessageArgs) -> String {
        args.entry("PropertyName".to_string())
            .or_insert_with(|| Value::String(ctx.property_name.to_string()));

        if let Some(template) = &self.message {
            return message::substitute(template, &args);
        }

        let key = self.message_key.as_deref().unwrap_or(default_key);
        let formatter: Option<&dyn MessageFormatter> = match &self.formatter {
            Some(own) => Some(own.as_ref()),
            None => ctx.formatter,
        };
        if let Some(formatter) = formatter {
            return formatter.format_message(key, &args);
        }

        let template = message::default_template(key)
            .or_else(|| message::default_template(default_key))
            .unwrap_or("{PropertyName} is invalid");
        message::substitute(template, &args)
    }

    /// Single failure at the property itself
    pub fn fail<P: ?Sized>(&self, ctx: &RuleContext<'_, P>, default_key: &str, args: MessageArgs) -> ValidationOutcome {
        let message = self.render(ctx, default_key, args);
        let code = self.message_key.as_deref().unwrap_or(default_key);
        ValidationFailure::new("", message)
            .severity(self.severity)
            .code(code)
            .into()
    }
}

impl fmt::Debug for RuleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleOptions")
            .field("message", &self.message)
            .field("message_key", &self.message_key)
            .field("formatter", &self.formatter.is_some())
            .field("severity", &self.severity)
            .finish()
    }
}

/// Build [`MessageArgs`] from `name => value` pairs
#[macro_export]
macro_rules! message_args {
    () => { $crate::message::MessageArgs::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut args = $crate::message::MessageArgs::new();
        $(args.insert($name.to_string(), ::serde_json::json!($value));)+
        args
    }};
}

/// One testable condition over a value of type `T` owned by a `P`
///
/// `evaluate` and `evaluate_async` must agree for every rule whose logic is
/// synchronous. Failures are reported relative to the property: a plain rule
/// uses the empty path and the owning chain adds the property name.
#[async_trait]
pub trait Rule<P, T>: Send + Sync
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult;

    async fn evaluate_async(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        self.evaluate(value, ctx)
    }

    /// Rule name for logging and errors
    fn rule_name(&self) -> &'static str;

    /// Message settings, when the rule has any
    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        None
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for Box<dyn Rule<P, T>>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        (**self).evaluate(value, ctx)
    }

    async fn evaluate_async(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        (**self).evaluate_async(value, ctx).await
    }

    fn rule_name(&self) -> &'static str {
        (**self).rule_name()
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        (**self).options_mut()
    }
}

/// Builder-style message settings for concrete rules
pub trait Configurable: Sized {
    fn options(&mut self) -> &mut RuleOptions;

    fn message(mut self, message: impl Into<String>) -> Self {
        self.options().message = Some(message.into());
        self
    }

    fn message_key(mut self, key: impl Into<String>) -> Self {
        self.options().message_key = Some(key.into());
        self
    }

    fn formatter(mut self, formatter: Arc<dyn MessageFormatter>) -> Self {
        self.options().formatter = Some(formatter);
        self
    }

    fn severity(mut self, severity: Severity) -> Self {
        self.options().severity = severity;
        self
    }
}

/// Evaluate a rule on a bare value, outside any validator
#[async_trait]
pub trait RuleExt<T: ?Sized + Sync + 'static>: Rule<(), T> {
    fn check(&self, value: &T) -> EvaluationResult {
        self.evaluate(value, &RuleContext::detached("Value"))
    }

    async fn check_async(&self, value: &T) -> EvaluationResult {
        self.evaluate_async(value, &RuleContext::detached("Value")).await
    }
}

impl<T, R> RuleExt<T> for R
where
    T: ?Sized + Sync + 'static,
    R: Rule<(), T> + ?Sized,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::CatalogFormatter;

    #[test]
    fn test_render_order() {
        let ctx = RuleContext::detached("Name");
        let mut options = RuleOptions::default();
        assert_eq!(options.render(&ctx, "NotEmpty", MessageArgs::new()), "Name must not be empty");

        let turkish = CatalogFormatter::turkish();
        let with_formatter = ctx.with_formatter(Some(&turkish));
        assert_eq!(options.render(&with_formatter, "NotEmpty", MessageArgs::new()), "Name boş olamaz");

        options.message = Some("{PropertyName} is required".to_string());
        assert_eq!(options.render(&with_formatter, "NotEmpty", MessageArgs::new()), "Name is required");
    }

    #[test]
    fn test_fail_carries_code_and_severity() {
        let options = RuleOptions {
            severity: Severity::Warning,
            ..RuleOptions::default()
        };
        let outcome = options.fail(&RuleContext::detached("Age"), "GreaterThan", message_args!("ComparisonValue" => 17));

        let failure = &outcome.failures()[0];
        assert_eq!(failure.property_path, "");
        assert_eq!(failure.message, "Age must be greater than 17");
        assert_eq!(failure.severity, Severity::Warning);
        assert_eq!(failure.error_code.as_deref(), Some("GreaterThan"));
    }

    #[test]
    fn test_unknown_key_without_formatter_uses_default() {
        let options = RuleOptions {
            message_key: Some("Custom.Key".to_string()),
            ..RuleOptions::default()
        };
        let message = options.render(&RuleContext::detached("Email"), "Email", MessageArgs::new());
        assert_eq!(message, "Email must be a valid email address");
    }
}
