//! Map the value before validating it

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::EvaluationResult;
use crate::traits::{Rule, RuleContext, RuleOptions};
use crate::value::TextValue;

/// Applies `map` and validates the result with `inner`
///
/// Failures come back unchanged; they already refer to the outer property.
pub struct Transform<T: ?Sized, U, F, R> {
    map: F,
    inner: R,
    _types: PhantomData<fn(&T) -> U>,
}

impl<T: ?Sized, U, F, R> Transform<T, U, F, R>
where
    F: Fn(&T) -> U,
{
    pub fn new(map: F, inner: R) -> Self {
        Self {
            map,
            inner,
            _types: PhantomData,
        }
    }
}

#[async_trait]
impl<P, T, U, F, R> Rule<P, T> for Transform<T, U, F, R>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
    U: Send + Sync + 'static,
    F: Fn(&T) -> U + Send + Sync,
    R: Rule<P, U>,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let mapped = (self.map)(value);
        self.inner.evaluate(&mapped, ctx)
    }

    async fn evaluate_async(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let mapped = (self.map)(value);
        self.inner.evaluate_async(&mapped, ctx).await
    }

    fn rule_name(&self) -> &'static str {
        "transform"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        self.inner.options_mut()
    }
}

/// Text with surrounding whitespace removed; absent text stays absent
pub fn trimmed<T: TextValue + ?Sized>(value: &T) -> Option<String> {
    value.text().map(|text| text.trim().to_string())
}

/// Lowercased text; absent text stays absent
pub fn lowercased<T: TextValue + ?Sized>(value: &T) -> Option<String> {
    value.text().map(str::to_lowercase)
}
