//! Collection size and uniqueness validators

use std::collections::HashSet;
use std::hash::Hash;

use async_trait::async_trait;

use crate::error::EvaluationResult;
use crate::message_args;
use crate::outcome::ValidationOutcome;
use crate::traits::{Configurable, Rule, RuleContext, RuleOptions};
use crate::value::Sequence;

/// Number of items in a sequence; an absent sequence is valid
#[derive(Debug, Clone)]
pub struct CountRule {
    min: Option<usize>,
    max: Option<usize>,
    options: RuleOptions,
}

impl CountRule {
    pub fn min(min: usize) -> Self {
        Self::bounded(Some(min), None)
    }

    pub fn max(max: usize) -> Self {
        Self::bounded(None, Some(max))
    }

    pub fn exact(count: usize) -> Self {
        Self::bounded(Some(count), Some(count))
    }

    pub fn between(min: usize, max: usize) -> Self {
        Self::bounded(Some(min), Some(max))
    }

    fn bounded(min: Option<usize>, max: Option<usize>) -> Self {
        Self {
            min,
            max,
            options: RuleOptions::default(),
        }
    }

    fn key(&self) -> &'static str {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => "ExactCount",
            (Some(_), Some(_)) => "CountBetween",
            (Some(_), None) => "MinimumCount",
            _ => "MaximumCount",
        }
    }

    fn accepts(&self, count: usize) -> bool {
        self.min.map_or(true, |min| count >= min) && self.max.map_or(true, |max| count <= max)
    }
}

impl Configurable for CountRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for CountRule
where
    P: ?Sized + Sync + 'static,
    T: Sequence + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let Some(items) = value.items() else {
            return Ok(ValidationOutcome::success());
        };
        if self.accepts(items.len()) {
            return Ok(ValidationOutcome::success());
        }

        let args = message_args!(
            "MinCount" => self.min,
            "MaxCount" => self.max,
            "TotalCount" => items.len(),
        );
        Ok(self.options.fail(ctx, self.key(), args))
    }

    fn rule_name(&self) -> &'static str {
        "count"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

/// Sequence without repeated items
#[derive(Debug, Clone, Default)]
pub struct UniqueRule {
    options: RuleOptions,
}

impl UniqueRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Configurable for UniqueRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for UniqueRule
where
    P: ?Sized + Sync + 'static,
    T: Sequence + ?Sized + Sync + 'static,
    T::Item: Eq + Hash,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let Some(items) = value.items() else {
            return Ok(ValidationOutcome::success());
        };

        let mut seen = HashSet::with_capacity(items.len());
        if items.iter().all(|item| seen.insert(item)) {
            Ok(ValidationOutcome::success())
        } else {
            Ok(self.options.fail(ctx, "Unique", message_args!()))
        }
    }

    fn rule_name(&self) -> &'static str {
        "unique"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}
