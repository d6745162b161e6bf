//! Range and equality validators

use std::fmt::{self, Display};
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EvaluationResult;
use crate::message_args;
use crate::outcome::ValidationOutcome;
use crate::traits::{Configurable, Rule, RuleContext, RuleOptions};
use crate::value::Present;

/// Range check with independently inclusive or exclusive bounds
///
/// An `Unbounded` side places no limit. Absent values pass.
#[derive(Debug, Clone)]
pub struct BetweenRule<V> {
    lower: Bound<V>,
    upper: Bound<V>,
    options: RuleOptions,
}

impl<V> BetweenRule<V> {
    pub fn new(lower: Bound<V>, upper: Bound<V>) -> Self {
        Self {
            lower,
            upper,
            options: RuleOptions::default(),
        }
    }

    /// `from <= value <= to`
    pub fn inclusive(from: V, to: V) -> Self {
        Self::new(Bound::Included(from), Bound::Included(to))
    }

    /// `from < value < to`
    pub fn exclusive(from: V, to: V) -> Self {
        Self::new(Bound::Excluded(from), Bound::Excluded(to))
    }

    pub fn greater_than(limit: V) -> Self {
        Self::new(Bound::Excluded(limit), Bound::Unbounded)
    }

    pub fn greater_than_or_equal(limit: V) -> Self {
        Self::new(Bound::Included(limit), Bound::Unbounded)
    }

    pub fn less_than(limit: V) -> Self {
        Self::new(Bound::Unbounded, Bound::Excluded(limit))
    }

    pub fn less_than_or_equal(limit: V) -> Self {
        Self::new(Bound::Unbounded, Bound::Included(limit))
    }
}

impl<V: PartialOrd + Display> BetweenRule<V> {
    fn accepts(&self, value: &V) -> bool {
        let above = match &self.lower {
            Bound::Included(from) => value >= from,
            Bound::Excluded(from) => value > from,
            Bound::Unbounded => true,
        };
        let below = match &self.upper {
            Bound::Included(to) => value <= to,
            Bound::Excluded(to) => value < to,
            Bound::Unbounded => true,
        };
        above && below
    }

    fn describe(&self) -> (&'static str, crate::message::MessageArgs) {
        match (&self.lower, &self.upper) {
            (Bound::Excluded(from), Bound::Excluded(to)) => (
                "ExclusiveBetween",
                message_args!("From" => from.to_string(), "To" => to.to_string()),
            ),
            (Bound::Included(from) | Bound::Excluded(from), Bound::Included(to) | Bound::Excluded(to)) => (
                "Between",
                message_args!("From" => from.to_string(), "To" => to.to_string()),
            ),
            (Bound::Included(limit), Bound::Unbounded) => {
                ("GreaterThanOrEqual", message_args!("ComparisonValue" => limit.to_string()))
            }
            (Bound::Excluded(limit), Bound::Unbounded) => {
                ("GreaterThan", message_args!("ComparisonValue" => limit.to_string()))
            }
            (Bound::Unbounded, Bound::Included(limit)) => {
                ("LessThanOrEqual", message_args!("ComparisonValue" => limit.to_string()))
            }
            (Bound::Unbounded, Bound::Excluded(limit)) => {
                ("LessThan", message_args!("ComparisonValue" => limit.to_string()))
            }
            (Bound::Unbounded, Bound::Unbounded) => ("Between", message_args!()),
        }
    }
}

impl<V> Configurable for BetweenRule<V> {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T, V> Rule<P, T> for BetweenRule<V>
where
    P: ?Sized + Sync + 'static,
    T: Present<V> + Sync + 'static,
    V: PartialOrd + Display + Send + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        match value.present() {
            Some(current) if !self.accepts(current) => {
                let (key, mut args) = self.describe();
                args.insert("PropertyValue".to_string(), current.to_string().into());
                Ok(self.options.fail(ctx, key, args))
            }
            _ => Ok(ValidationOutcome::success()),
        }
    }

    fn rule_name(&self) -> &'static str {
        "between"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

type Comparer<V> = Arc<dyn Fn(&V, &V) -> bool + Send + Sync>;

/// Equality or inequality against a fixed value
///
/// A custom comparer replaces `PartialEq`, e.g. for case-insensitive text.
pub struct EqualRule<V> {
    expected: V,
    negate: bool,
    comparer: Option<Comparer<V>>,
    options: RuleOptions,
}

impl<V> EqualRule<V> {
    pub fn equal(expected: V) -> Self {
        Self {
            expected,
            negate: false,
            comparer: None,
            options: RuleOptions::default(),
        }
    }

    pub fn not_equal(expected: V) -> Self {
        Self {
            negate: true,
            ..Self::equal(expected)
        }
    }

    pub fn with_comparer<F>(mut self, comparer: F) -> Self
    where
        F: Fn(&V, &V) -> bool + Send + Sync + 'static,
    {
        self.comparer = Some(Arc::new(comparer));
        self
    }
}

impl<V: PartialEq> EqualRule<V> {
    fn equals(&self, value: &V) -> bool {
        match &self.comparer {
            Some(comparer) => comparer(value, &self.expected),
            None => *value == self.expected,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for EqualRule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EqualRule")
            .field("expected", &self.expected)
            .field("negate", &self.negate)
            .field("comparer", &self.comparer.is_some())
            .finish()
    }
}

impl<V> Configurable for EqualRule<V> {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T, V> Rule<P, T> for EqualRule<V>
where
    P: ?Sized + Sync + 'static,
    T: Present<V> + Sync + 'static,
    V: PartialEq + Display + Send + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let Some(current) = value.present() else {
            return Ok(ValidationOutcome::success());
        };
        if self.equals(current) != self.negate {
            return Ok(ValidationOutcome::success());
        }

        let key = if self.negate { "NotEqual" } else { "Equal" };
        let args = message_args!(
            "ComparisonValue" => self.expected.to_string(),
            "PropertyValue" => current.to_string(),
        );
        Ok(self.options.fail(ctx, key, args))
    }

    fn rule_name(&self) -> &'static str {
        if self.negate {
            "not_equal"
        } else {
            "equal"
        }
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}
