//! Length validators for text

use async_trait::async_trait;

use crate::error::EvaluationResult;
use crate::message_args;
use crate::outcome::ValidationOutcome;
use crate::traits::{Configurable, Rule, RuleContext, RuleOptions};
use crate::value::TextValue;

/// Character-count constraint on text
///
/// Counts Unicode scalar values, not bytes. Absent and empty text pass;
/// pair with `NotEmptyRule` to require a value.
#[derive(Debug, Clone, Default)]
pub struct LengthRule {
    /// Minimum length (inclusive)
    pub min: Option<usize>,
    /// Maximum length (inclusive)
    pub max: Option<usize>,
    options: RuleOptions,
}

impl LengthRule {
    /// Create a length rule with no constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive range
    pub fn between(min: usize, max: usize) -> Self {
        Self::new().min(min).max(max)
    }

    pub fn exact(length: usize) -> Self {
        Self::between(length, length)
    }

    /// Set minimum length constraint
    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    /// Set maximum length constraint
    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    fn accepts(&self, length: usize) -> bool {
        self.min.map_or(true, |min| length >= min) && self.max.map_or(true, |max| length <= max)
    }

    fn default_key(&self) -> &'static str {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => "ExactLength",
            (Some(_), Some(_)) => "Length",
            (Some(_), None) => "MinimumLength",
            (None, _) => "MaximumLength",
        }
    }
}

impl Configurable for LengthRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for LengthRule
where
    P: ?Sized + Sync + 'static,
    T: TextValue + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let Some(text) = value.non_empty_text() else {
            return Ok(ValidationOutcome::success());
        };

        let length = text.chars().count();
        if self.accepts(length) {
            return Ok(ValidationOutcome::success());
        }

        let args = message_args!(
            "MinLength" => self.min,
            "MaxLength" => self.max,
            "TotalLength" => length,
        );
        Ok(self.options.fail(ctx, self.default_key(), args))
    }

    fn rule_name(&self) -> &'static str {
        "length"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}
