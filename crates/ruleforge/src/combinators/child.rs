//! Delegate a property to a nested validator

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EvaluationResult;
use crate::outcome::ValidationOutcome;
use crate::traits::{Rule, RuleContext};
use crate::validator::Validator;

/// Runs a shared nested validator on the property value
///
/// Failures keep the nested validator's own paths (`Street`); the owning
/// chain adds the property name once. `None` is valid.
pub struct ChildValidatorRule<C: Sync + 'static> {
    validator: Arc<Validator<C>>,
}

impl<C: Sync + 'static> ChildValidatorRule<C> {
    pub fn new(validator: Arc<Validator<C>>) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &Arc<Validator<C>> {
        &self.validator
    }
}

impl<C: Sync + 'static> Clone for ChildValidatorRule<C> {
    fn clone(&self) -> Self {
        Self {
            validator: Arc::clone(&self.validator),
        }
    }
}

#[async_trait]
impl<P, C> Rule<P, C> for ChildValidatorRule<C>
where
    P: ?Sized + Sync + 'static,
    C: Sync + 'static,
{
    fn evaluate(&self, value: &C, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        self.validator.run_nested(value, ctx.formatter)
    }

    async fn evaluate_async(&self, value: &C, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        self.validator.run_nested_async(value, ctx.formatter).await
    }

    fn rule_name(&self) -> &'static str {
        "child_validator"
    }
}

#[async_trait]
impl<P, C> Rule<P, Option<C>> for ChildValidatorRule<C>
where
    P: ?Sized + Sync + 'static,
    C: Sync + 'static,
{
    fn evaluate(&self, value: &Option<C>, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        match value {
            Some(child) => self.validator.run_nested(child, ctx.formatter),
            None => Ok(ValidationOutcome::success()),
        }
    }

    async fn evaluate_async(&self, value: &Option<C>, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        match value {
            Some(child) => self.validator.run_nested_async(child, ctx.formatter).await,
            None => Ok(ValidationOutcome::success()),
        }
    }

    fn rule_name(&self) -> &'static str {
        "child_validator"
    }
}
