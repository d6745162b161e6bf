//! AND/OR composition of rules over the same value

use async_trait::async_trait;

use crate::error::EvaluationResult;
use crate::outcome::ValidationOutcome;
use crate::traits::{Rule, RuleContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    /// Every rule must pass; the first failure is reported
    All,
    /// One passing rule is enough; otherwise the first failure is reported
    Any,
}

/// Several rules treated as one
pub struct Composite<P, T>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    rules: Vec<Box<dyn Rule<P, T>>>,
    mode: CompositeMode,
}

impl<P, T> Composite<P, T>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    pub fn new(mode: CompositeMode, rules: Vec<Box<dyn Rule<P, T>>>) -> Self {
        Self { rules, mode }
    }

    pub fn all(rules: Vec<Box<dyn Rule<P, T>>>) -> Self {
        Self::new(CompositeMode::All, rules)
    }

    pub fn any(rules: Vec<Box<dyn Rule<P, T>>>) -> Self {
        Self::new(CompositeMode::Any, rules)
    }

    pub fn push(mut self, rule: impl Rule<P, T> + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn mode(&self) -> CompositeMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn settle(&self, first_failure: &mut Option<ValidationOutcome>, outcome: ValidationOutcome) -> Option<ValidationOutcome> {
        match self.mode {
            CompositeMode::All if !outcome.is_valid() => Some(outcome),
            CompositeMode::Any if outcome.is_valid() => Some(outcome),
            CompositeMode::Any => {
                first_failure.get_or_insert(outcome);
                None
            }
            CompositeMode::All => None,
        }
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for Composite<P, T>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let mut first_failure = None;
        for rule in &self.rules {
            let outcome = rule.evaluate(value, ctx)?;
            if let Some(done) = self.settle(&mut first_failure, outcome) {
                return Ok(done);
            }
        }
        Ok(first_failure.unwrap_or_default())
    }

    async fn evaluate_async(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let mut first_failure = None;
        for rule in &self.rules {
            let outcome = rule.evaluate_async(value, ctx).await?;
            if let Some(done) = self.settle(&mut first_failure, outcome) {
                return Ok(done);
            }
        }
        Ok(first_failure.unwrap_or_default())
    }

    fn rule_name(&self) -> &'static str {
        match self.mode {
            CompositeMode::All => "all_of",
            CompositeMode::Any => "any_of",
        }
    }
}
