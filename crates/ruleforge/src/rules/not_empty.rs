//! Presence validators

use async_trait::async_trait;

use crate::error::EvaluationResult;
use crate::message::MessageArgs;
use crate::outcome::ValidationOutcome;
use crate::traits::{Configurable, Rule, RuleContext, RuleOptions};
use crate::value::Emptiable;

/// Fails when the value is empty
///
/// `None`, whitespace-only text and empty collections are empty. This is the
/// only built-in rule that rejects absent values.
#[derive(Debug, Clone, Default)]
pub struct NotEmptyRule {
    options: RuleOptions,
}

impl NotEmptyRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Configurable for NotEmptyRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for NotEmptyRule
where
    P: ?Sized + Sync + 'static,
    T: Emptiable + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        if value.is_empty_value() {
            Ok(self.options.fail(ctx, "NotEmpty", MessageArgs::new()))
        } else {
            Ok(ValidationOutcome::success())
        }
    }

    fn rule_name(&self) -> &'static str {
        "not_empty"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

/// Fails when an optional value is `None`
///
/// Unlike [`NotEmptyRule`] the inner value is not inspected, so `Some("")`
/// passes.
#[derive(Debug, Clone, Default)]
pub struct NotNullRule {
    options: RuleOptions,
}

impl NotNullRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Configurable for NotNullRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, V> Rule<P, Option<V>> for NotNullRule
where
    P: ?Sized + Sync + 'static,
    V: Sync + 'static,
{
    fn evaluate(&self, value: &Option<V>, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        match value {
            Some(_) => Ok(ValidationOutcome::success()),
            None => Ok(self.options.fail(ctx, "NotNull", MessageArgs::new())),
        }
    }

    fn rule_name(&self) -> &'static str {
        "not_null"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}
