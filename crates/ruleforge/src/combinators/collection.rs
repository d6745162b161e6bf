//! Apply a rule to every item of a sequence

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::error::EvaluationResult;
use crate::outcome::ValidationOutcome;
use crate::path;
use crate::traits::{Rule, RuleContext, RuleOptions};
use crate::value::Sequence;

/// Validates each item with `item_rule`
///
/// Item failures are reported as `[index]` or `[index].Nested` relative to
/// the collection property, and item messages name the item as `Tags[index]`.
/// An absent or empty sequence is valid.
pub struct ForEach<R> {
    item_rule: R,
}

impl<R> ForEach<R> {
    pub fn new(item_rule: R) -> Self {
        Self { item_rule }
    }
}

#[async_trait]
impl<P, C, R> Rule<P, C> for ForEach<R>
where
    P: ?Sized + Sync + 'static,
    C: Sequence + ?Sized + Sync + 'static,
    C::Item: Sync + 'static,
    R: Rule<P, C::Item>,
{
    fn evaluate(&self, value: &C, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let Some(items) = value.items() else {
            return Ok(ValidationOutcome::success());
        };

        let mut outcome = ValidationOutcome::success();
        for (position, item) in items.iter().enumerate() {
            let name = path::item_name(ctx.property_name, position);
            let item_outcome = self.item_rule.evaluate(item, &ctx.renamed(&name))?;
            outcome.merge(item_outcome.prefixed(&path::index(position)));
        }
        Ok(outcome)
    }

    async fn evaluate_async(&self, value: &C, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let Some(items) = value.items() else {
            return Ok(ValidationOutcome::success());
        };

        let names: Vec<String> = (0..items.len())
            .map(|position| path::item_name(ctx.property_name, position))
            .collect();
        let evaluations = items.iter().zip(&names).map(|(item, name)| {
            let item_ctx = ctx.renamed(name);
            async move { self.item_rule.evaluate_async(item, &item_ctx).await }
        });

        // try_join_all yields results in input order
        let outcomes = try_join_all(evaluations).await?;
        Ok(ValidationOutcome::combine(
            outcomes
                .into_iter()
                .enumerate()
                .map(|(position, outcome)| outcome.prefixed(&path::index(position))),
        ))
    }

    fn rule_name(&self) -> &'static str {
        "for_each"
    }

    /// Message settings of the item rule, so item failures can be reworded
    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        self.item_rule.options_mut()
    }
}
