//! When/unless gating over the parent instance

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EvaluationResult;
use crate::outcome::ValidationOutcome;
use crate::traits::{Rule, RuleContext, RuleOptions};

/// Predicate over the parent instance, optionally inverted
///
/// `unless(f)` is `when(f)` with `invert` set.
pub struct Condition<P: ?Sized> {
    predicate: Arc<dyn Fn(&P) -> bool + Send + Sync>,
    invert: bool,
}

impl<P: ?Sized> Condition<P> {
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            invert: false,
        }
    }

    pub fn unless<F>(predicate: F) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        Self {
            invert: true,
            ..Self::when(predicate)
        }
    }

    pub fn holds(&self, instance: &P) -> bool {
        (self.predicate)(instance) != self.invert
    }

    pub fn is_inverted(&self) -> bool {
        self.invert
    }
}

impl<P: ?Sized> Clone for Condition<P> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
            invert: self.invert,
        }
    }
}

impl<P: ?Sized> fmt::Debug for Condition<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("invert", &self.invert)
            .finish()
    }
}

/// Runs the inner rule only while the condition holds
pub struct Conditional<P: ?Sized, R> {
    condition: Condition<P>,
    inner: R,
}

impl<P: ?Sized, R> Conditional<P, R> {
    pub fn new(condition: Condition<P>, inner: R) -> Self {
        Self { condition, inner }
    }

    pub fn when<F>(inner: R, predicate: F) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        Self::new(Condition::when(predicate), inner)
    }

    pub fn unless<F>(inner: R, predicate: F) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        Self::new(Condition::unless(predicate), inner)
    }
}

#[async_trait]
impl<P, T, R> Rule<P, T> for Conditional<P, R>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
    R: Rule<P, T>,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        if !self.condition.holds(ctx.instance) {
            return Ok(ValidationOutcome::success());
        }
        self.inner.evaluate(value, ctx)
    }

    async fn evaluate_async(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        if !self.condition.holds(ctx.instance) {
            return Ok(ValidationOutcome::success());
        }
        self.inner.evaluate_async(value, ctx).await
    }

    fn rule_name(&self) -> &'static str {
        if self.condition.is_inverted() {
            "unless"
        } else {
            "when"
        }
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        self.inner.options_mut()
    }
}
