//! Per-property rule chains
//!
//! A [`RuleChain`] is the fluent builder handed to `rule_for` closures. Once
//! bound to a name and an accessor it becomes a [`PropertyRuleChain`], which
//! the validator stores behind the type-erased [`PropertyRules`] handle.
//!
//! Evaluation of one chain: gate on the conditions, extract the value, run
//! the rules in order, then root every failure under the property name.

use std::fmt;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::combinators::{
    lowercased, trimmed, ChildValidatorRule, Composite, CompositeMode, Condition, Conditional, ForEach, Transform,
};
use crate::error::{BoxError, EvaluationResult, ValidatorError};
use crate::message::MessageFormatter;
use crate::outcome::{Severity, ValidationOutcome};
use crate::rules::{
    BetweenRule, ColorFormat, ColorRule, CountRule, CreditCardRule, CustomContext, CustomRule, DateTimeRule,
    DependentRule, DurationRule, EmailRule, EnumRule, EqualRule, FileExtensionRule, IpAddressRule, JsonRule,
    LengthRule, Moment, MustRule, NotEmptyRule, NotNullRule, OneOfRule, PasswordRule, PhoneNumberRule, RegexRule,
    ScalePrecisionRule, UniqueRule, UrlRule, UuidRule,
};
use crate::traits::{Rule, RuleContext, RuleOptions};
use crate::validator::Validator;
use crate::value::{Emptiable, Sequence, TextValue};

/// Whether evaluation continues after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CascadeMode {
    /// Run every rule
    #[default]
    Continue,
    /// Stop at the first failing rule (chain) or chain (validator)
    StopOnFirstFailure,
}

/// Ordered rules for one value, with optional chain-wide conditions
pub struct RuleChain<P, T>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    conditions: Vec<Condition<P>>,
    rules: Vec<Box<dyn Rule<P, T>>>,
    cascade: Option<CascadeMode>,
    errors: Vec<ValidatorError>,
}

impl<P, T> Default for RuleChain<P, T>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            rules: Vec::new(),
            cascade: None,
            errors: Vec::new(),
        }
    }
}

impl<P, T> fmt::Debug for RuleChain<P, T>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules: Vec<&'static str> = self.rules.iter().map(|rule| rule.rule_name()).collect();
        f.debug_struct("RuleChain")
            .field("conditions", &self.conditions.len())
            .field("rules", &rules)
            .field("cascade", &self.cascade)
            .finish()
    }
}

impl<P, T> RuleChain<P, T>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn cascade_mode(&self) -> Option<CascadeMode> {
        self.cascade
    }

    /// Configuration errors collected while building, e.g. bad patterns
    pub(crate) fn take_errors(&mut self) -> Vec<ValidatorError> {
        std::mem::take(&mut self.errors)
    }

    /// Whether every chain condition holds for `instance`
    pub fn is_active(&self, instance: &P) -> bool {
        self.conditions.iter().all(|condition| condition.holds(instance))
    }

    pub(crate) fn run(&self, value: &T, ctx: &RuleContext<'_, P>, cascade: CascadeMode) -> EvaluationResult {
        let mut outcome = ValidationOutcome::success();
        for rule in &self.rules {
            let result = rule.evaluate(value, ctx)?;
            let failed = !result.is_valid();
            outcome.merge(result);
            if failed && cascade == CascadeMode::StopOnFirstFailure {
                trace!(rule = rule.rule_name(), "chain stopped at first failure");
                break;
            }
        }
        Ok(outcome)
    }

    pub(crate) async fn run_async(
        &self,
        value: &T,
        ctx: &RuleContext<'_, P>,
        cascade: CascadeMode,
    ) -> EvaluationResult {
        let mut outcome = ValidationOutcome::success();
        for rule in &self.rules {
            let result = rule.evaluate_async(value, ctx).await?;
            let failed = !result.is_valid();
            outcome.merge(result);
            if failed && cascade == CascadeMode::StopOnFirstFailure {
                trace!(rule = rule.rule_name(), "chain stopped at first failure");
                break;
            }
        }
        Ok(outcome)
    }

    // Chain settings

    /// Gate the whole chain on a predicate over the parent instance
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        self.conditions.push(Condition::when(predicate));
        self
    }

    pub fn unless<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        self.conditions.push(Condition::unless(predicate));
        self
    }

    pub fn cascade(mut self, mode: CascadeMode) -> Self {
        self.cascade = Some(mode);
        self
    }

    pub fn stop_on_first_failure(self) -> Self {
        self.cascade(CascadeMode::StopOnFirstFailure)
    }

    // Modifiers for the most recently added rule

    fn last_options(&mut self) -> Option<&mut RuleOptions> {
        self.rules.last_mut().and_then(|rule| rule.options_mut())
    }

    /// Apply `configure` to the last rule's options
    ///
    /// Rules without message settings, such as nested validators, cannot be
    /// configured; the attempt is reported by `ValidatorBuilder::build`.
    fn configure_last(mut self, modifier: &'static str, configure: impl FnOnce(&mut RuleOptions)) -> Self {
        let Some(rule) = self.rules.last_mut() else {
            self.errors.push(ValidatorError::InvalidRuleConfiguration(format!(
                "{} needs a preceding rule",
                modifier
            )));
            return self;
        };
        let name = rule.rule_name();
        match rule.options_mut() {
            Some(options) => configure(options),
            None => self.errors.push(ValidatorError::InvalidRuleConfiguration(format!(
                "{} has no effect on rule '{}'",
                modifier, name
            ))),
        }
        self
    }

    /// Message template for the last rule; `{PropertyName}` and rule arguments are substituted
    pub fn with_message(self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.configure_last("with_message", |options| options.message = Some(message))
    }

    pub fn with_message_key(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.configure_last("with_message_key", |options| options.message_key = Some(key))
    }

    pub fn with_formatter(self, formatter: Arc<dyn MessageFormatter>) -> Self {
        self.configure_last("with_formatter", |options| options.formatter = Some(formatter))
    }

    pub fn with_severity(self, severity: Severity) -> Self {
        self.configure_last("with_severity", |options| options.severity = severity)
    }

    /// Only run the last rule when `predicate` holds
    pub fn rule_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        if let Some(last) = self.rules.pop() {
            self.rules.push(Box::new(Conditional::when(last, predicate)));
        }
        self
    }

    pub fn rule_unless<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        if let Some(last) = self.rules.pop() {
            self.rules.push(Box::new(Conditional::unless(last, predicate)));
        }
        self
    }

    // Rules

    pub fn add_rule(mut self, rule: impl Rule<P, T> + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn not_empty(self) -> Self
    where
        T: Emptiable,
    {
        self.add_rule(NotEmptyRule::new())
    }

    pub fn not_null(self) -> Self
    where
        NotNullRule: Rule<P, T>,
    {
        self.add_rule(NotNullRule::new())
    }

    /// Inclusive character-count range
    pub fn length(self, min: usize, max: usize) -> Self
    where
        LengthRule: Rule<P, T>,
    {
        self.add_rule(LengthRule::between(min, max))
    }

    pub fn min_length(self, min: usize) -> Self
    where
        LengthRule: Rule<P, T>,
    {
        self.add_rule(LengthRule::new().min(min))
    }

    pub fn max_length(self, max: usize) -> Self
    where
        LengthRule: Rule<P, T>,
    {
        self.add_rule(LengthRule::new().max(max))
    }

    pub fn exact_length(self, length: usize) -> Self
    where
        LengthRule: Rule<P, T>,
    {
        self.add_rule(LengthRule::exact(length))
    }

    /// An invalid pattern is reported by `ValidatorBuilder::build`
    pub fn matches(mut self, pattern: &str) -> Self
    where
        RegexRule: Rule<P, T>,
    {
        match RegexRule::new(pattern) {
            Ok(rule) => self.add_rule(rule),
            Err(err) => {
                self.errors.push(err);
                self
            }
        }
    }

    pub fn email(self) -> Self
    where
        EmailRule: Rule<P, T>,
    {
        self.add_rule(EmailRule::new())
    }

    pub fn credit_card(self) -> Self
    where
        CreditCardRule: Rule<P, T>,
    {
        self.add_rule(CreditCardRule::new())
    }

    pub fn url(self) -> Self
    where
        UrlRule: Rule<P, T>,
    {
        self.add_rule(UrlRule::new())
    }

    pub fn ip_address(self) -> Self
    where
        IpAddressRule: Rule<P, T>,
    {
        self.add_rule(IpAddressRule::any())
    }

    pub fn json(self) -> Self
    where
        JsonRule: Rule<P, T>,
    {
        self.add_rule(JsonRule::new())
    }

    pub fn password(self) -> Self
    where
        PasswordRule: Rule<P, T>,
    {
        self.add_rule(PasswordRule::new())
    }

    pub fn uuid(self) -> Self
    where
        UuidRule: Rule<P, T>,
    {
        self.add_rule(UuidRule::new())
    }

    pub fn one_of<I, S>(self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        OneOfRule: Rule<P, T>,
    {
        self.add_rule(OneOfRule::new(allowed))
    }

    pub fn date_time(self, moment: Moment) -> Self
    where
        DateTimeRule: Rule<P, T>,
    {
        self.add_rule(DateTimeRule::new(moment))
    }

    pub fn duration(self, rule: DurationRule) -> Self
    where
        DurationRule: Rule<P, T>,
    {
        self.add_rule(rule)
    }

    pub fn phone_number(self) -> Self
    where
        PhoneNumberRule: Rule<P, T>,
    {
        self.add_rule(PhoneNumberRule::new())
    }

    pub fn color(self, formats: ColorFormat) -> Self
    where
        ColorRule: Rule<P, T>,
    {
        self.add_rule(ColorRule::formats(formats))
    }

    /// File name ending in one of `extensions`, compared case-insensitively
    pub fn allowed_extensions<I, S>(self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        FileExtensionRule: Rule<P, T>,
    {
        self.add_rule(FileExtensionRule::new(extensions))
    }

    /// Text that `E::from_str` accepts
    pub fn is_in_enum<E>(self) -> Self
    where
        E: std::str::FromStr + 'static,
        EnumRule<E>: Rule<P, T>,
    {
        self.add_rule(EnumRule::<E>::new())
    }

    /// At most `precision` digits, `scale` of them after the decimal point
    ///
    /// `scale > precision` is reported by `ValidatorBuilder::build`.
    pub fn scale_precision(mut self, precision: u32, scale: u32) -> Self
    where
        ScalePrecisionRule: Rule<P, T>,
    {
        match ScalePrecisionRule::new(precision, scale) {
            Ok(rule) => self.add_rule(rule),
            Err(err) => {
                self.errors.push(err);
                self
            }
        }
    }

    pub fn min_count(self, min: usize) -> Self
    where
        CountRule: Rule<P, T>,
    {
        self.add_rule(CountRule::min(min))
    }

    pub fn max_count(self, max: usize) -> Self
    where
        CountRule: Rule<P, T>,
    {
        self.add_rule(CountRule::max(max))
    }

    pub fn exact_count(self, count: usize) -> Self
    where
        CountRule: Rule<P, T>,
    {
        self.add_rule(CountRule::exact(count))
    }

    pub fn count_between(self, min: usize, max: usize) -> Self
    where
        CountRule: Rule<P, T>,
    {
        self.add_rule(CountRule::between(min, max))
    }

    pub fn unique(self) -> Self
    where
        UniqueRule: Rule<P, T>,
    {
        self.add_rule(UniqueRule::new())
    }

    /// `from <= value <= to`
    pub fn between<V: 'static>(self, from: V, to: V) -> Self
    where
        BetweenRule<V>: Rule<P, T>,
    {
        self.add_rule(BetweenRule::inclusive(from, to))
    }

    /// `from < value < to`
    pub fn exclusive_between<V: 'static>(self, from: V, to: V) -> Self
    where
        BetweenRule<V>: Rule<P, T>,
    {
        self.add_rule(BetweenRule::exclusive(from, to))
    }

    pub fn in_range<V: 'static>(self, lower: Bound<V>, upper: Bound<V>) -> Self
    where
        BetweenRule<V>: Rule<P, T>,
    {
        self.add_rule(BetweenRule::new(lower, upper))
    }

    pub fn greater_than<V: 'static>(self, limit: V) -> Self
    where
        BetweenRule<V>: Rule<P, T>,
    {
        self.add_rule(BetweenRule::greater_than(limit))
    }

    pub fn greater_than_or_equal<V: 'static>(self, limit: V) -> Self
    where
        BetweenRule<V>: Rule<P, T>,
    {
        self.add_rule(BetweenRule::greater_than_or_equal(limit))
    }

    pub fn less_than<V: 'static>(self, limit: V) -> Self
    where
        BetweenRule<V>: Rule<P, T>,
    {
        self.add_rule(BetweenRule::less_than(limit))
    }

    pub fn less_than_or_equal<V: 'static>(self, limit: V) -> Self
    where
        BetweenRule<V>: Rule<P, T>,
    {
        self.add_rule(BetweenRule::less_than_or_equal(limit))
    }

    pub fn equal<V: 'static>(self, expected: V) -> Self
    where
        EqualRule<V>: Rule<P, T>,
    {
        self.add_rule(EqualRule::equal(expected))
    }

    pub fn not_equal<V: 'static>(self, expected: V) -> Self
    where
        EqualRule<V>: Rule<P, T>,
    {
        self.add_rule(EqualRule::not_equal(expected))
    }

    pub fn must<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.add_rule(MustRule::new(predicate))
    }

    /// Predicate over the parent instance and the value
    pub fn must_with<F>(self, predicate: F) -> Self
    where
        F: Fn(&P, &T) -> bool + Send + Sync + 'static,
    {
        self.add_rule(MustRule::with_instance(predicate))
    }

    pub fn try_must<F, E>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.add_rule(MustRule::try_new(predicate))
    }

    /// Async-only predicate; synchronous validation of this chain fails with `SyncUnsupported`
    pub fn must_async<F, Fut>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = bool> + Send + 'static,
    {
        self.add_rule(MustRule::new_async(predicate))
    }

    pub fn try_must_async<F, Fut, E>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<bool, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        self.add_rule(MustRule::try_new_async(predicate))
    }

    pub fn custom<F>(self, check: F) -> Self
    where
        F: Fn(&T, &mut CustomContext<'_, P>) + Send + Sync + 'static,
    {
        self.add_rule(CustomRule::new(check))
    }

    /// Check the value against another value selected from the instance
    ///
    /// `dependency` names that value in the failure message.
    pub fn dependent_on<D, S, C>(self, dependency: impl Into<String>, select: S, check: C) -> Self
    where
        D: 'static,
        S: Fn(&P) -> D + Send + Sync + 'static,
        C: Fn(&T, &D) -> bool + Send + Sync + 'static,
    {
        self.add_rule(DependentRule::new(dependency, select, check))
    }

    /// Validate the value with a nested validator
    pub fn set_validator<C>(self, validator: Arc<Validator<C>>) -> Self
    where
        C: Sync + 'static,
        ChildValidatorRule<C>: Rule<P, T>,
    {
        self.add_rule(ChildValidatorRule::new(validator))
    }

    /// Rules applied to every item of a sequence
    pub fn for_each<I, B>(mut self, build: B) -> Self
    where
        T: Sequence<Item = I>,
        I: Sync + 'static,
        B: FnOnce(RuleChain<P, I>) -> RuleChain<P, I>,
    {
        let mut items = build(RuleChain::new());
        self.errors.extend(items.take_errors());
        self.add_rule(ForEach::new(items))
    }

    /// Nested validator applied to every item of a sequence
    pub fn for_each_validator<C>(self, validator: Arc<Validator<C>>) -> Self
    where
        T: Sequence<Item = C>,
        C: Sync + 'static,
    {
        self.add_rule(ForEach::new(ChildValidatorRule::new(validator)))
    }

    /// Validate `map(value)` with the rules built by `build`
    pub fn transform<U, F, B>(mut self, map: F, build: B) -> Self
    where
        U: Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
        B: FnOnce(RuleChain<P, U>) -> RuleChain<P, U>,
    {
        let mut mapped = build(RuleChain::new());
        self.errors.extend(mapped.take_errors());
        self.add_rule(Transform::new(map, mapped))
    }

    /// Validate the trimmed text; absent text stays `None`
    pub fn trim<B>(self, build: B) -> Self
    where
        T: TextValue,
        B: FnOnce(RuleChain<P, Option<String>>) -> RuleChain<P, Option<String>>,
    {
        self.transform(trimmed::<T>, build)
    }

    /// Validate the lowercased text; absent text stays `None`
    pub fn to_lower<B>(self, build: B) -> Self
    where
        T: TextValue,
        B: FnOnce(RuleChain<P, Option<String>>) -> RuleChain<P, Option<String>>,
    {
        self.transform(lowercased::<T>, build)
    }

    fn add_group(mut self, mode: CompositeMode, mut group: RuleChain<P, T>) -> Self {
        self.errors.extend(group.take_errors());
        if group.cascade.is_some() {
            self.errors.push(ValidatorError::InvalidRuleConfiguration(
                "all_of and any_of groups do not take a cascade mode".to_string(),
            ));
        }

        let mut rule: Box<dyn Rule<P, T>> = Box::new(Composite::new(mode, group.rules));
        for condition in group.conditions {
            rule = Box::new(Conditional::new(condition, rule));
        }
        self.add_rule(rule)
    }

    /// All rules must pass; reports the first failure only
    ///
    /// `when`/`unless` inside the group gate the whole group.
    pub fn all_of<B>(self, build: B) -> Self
    where
        B: FnOnce(RuleChain<P, T>) -> RuleChain<P, T>,
    {
        let group = build(RuleChain::new());
        self.add_group(CompositeMode::All, group)
    }

    /// At least one rule must pass
    pub fn any_of<B>(self, build: B) -> Self
    where
        B: FnOnce(RuleChain<P, T>) -> RuleChain<P, T>,
    {
        let group = build(RuleChain::new());
        self.add_group(CompositeMode::Any, group)
    }
}

/// Nested chains run with their own cascade, `Continue` unless set
#[async_trait]
impl<P, T> Rule<P, T> for RuleChain<P, T>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        if !self.is_active(ctx.instance) {
            return Ok(ValidationOutcome::success());
        }
        self.run(value, ctx, self.cascade.unwrap_or_default())
    }

    async fn evaluate_async(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        if !self.is_active(ctx.instance) {
            return Ok(ValidationOutcome::success());
        }
        self.run_async(value, ctx, self.cascade.unwrap_or_default()).await
    }

    fn rule_name(&self) -> &'static str {
        "rule_chain"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        self.last_options()
    }
}

/// Validator-wide settings in effect while a chain runs
#[derive(Clone, Copy)]
pub struct EvaluationScope<'a> {
    pub formatter: Option<&'a dyn MessageFormatter>,
    /// Used by chains without their own cascade
    pub default_cascade: CascadeMode,
}

impl EvaluationScope<'_> {
    fn cascade_for(&self, own: Option<CascadeMode>) -> CascadeMode {
        own.unwrap_or(self.default_cascade)
    }
}

impl Default for EvaluationScope<'_> {
    fn default() -> Self {
        Self {
            formatter: None,
            default_cascade: CascadeMode::Continue,
        }
    }
}

impl fmt::Debug for EvaluationScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationScope")
            .field("formatter", &self.formatter.is_some())
            .field("default_cascade", &self.default_cascade)
            .finish()
    }
}

/// Type-erased chain bound to one property of `P`
#[async_trait]
pub trait PropertyRules<P>: Send + Sync
where
    P: ?Sized + Sync + 'static,
{
    fn property_name(&self) -> &str;

    fn validate(&self, instance: &P, scope: &EvaluationScope<'_>) -> EvaluationResult;

    async fn validate_async(&self, instance: &P, scope: &EvaluationScope<'_>) -> EvaluationResult;
}

type Accessor<P, T> = Box<dyn Fn(&P) -> &T + Send + Sync>;

/// A [`RuleChain`] bound to a property name and accessor
pub struct PropertyRuleChain<P, T>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    name: String,
    accessor: Accessor<P, T>,
    chain: RuleChain<P, T>,
}

impl<P, T> PropertyRuleChain<P, T>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    pub fn new<A>(name: impl Into<String>, accessor: A, chain: RuleChain<P, T>) -> Self
    where
        A: Fn(&P) -> &T + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            accessor: Box::new(accessor),
            chain,
        }
    }

    pub fn chain(&self) -> &RuleChain<P, T> {
        &self.chain
    }
}

impl<P, T> fmt::Debug for PropertyRuleChain<P, T>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyRuleChain")
            .field("name", &self.name)
            .field("chain", &self.chain)
            .finish()
    }
}

#[async_trait]
impl<P, T> PropertyRules<P> for PropertyRuleChain<P, T>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    fn property_name(&self) -> &str {
        &self.name
    }

    fn validate(&self, instance: &P, scope: &EvaluationScope<'_>) -> EvaluationResult {
        if !self.chain.is_active(instance) {
            trace!(property = %self.name, "chain skipped by condition");
            return Ok(ValidationOutcome::success());
        }

        let value = (self.accessor)(instance);
        let ctx = RuleContext::new(instance, &self.name).with_formatter(scope.formatter);
        let outcome = self
            .chain
            .run(value, &ctx, scope.cascade_for(self.chain.cascade))?;

        trace!(property = %self.name, failures = outcome.len(), "chain evaluated");
        Ok(outcome.prefixed(&self.name))
    }

    async fn validate_async(&self, instance: &P, scope: &EvaluationScope<'_>) -> EvaluationResult {
        if !self.chain.is_active(instance) {
            trace!(property = %self.name, "chain skipped by condition");
            return Ok(ValidationOutcome::success());
        }

        let value = (self.accessor)(instance);
        let ctx = RuleContext::new(instance, &self.name).with_formatter(scope.formatter);
        let outcome = self
            .chain
            .run_async(value, &ctx, scope.cascade_for(self.chain.cascade))
            .await?;

        trace!(property = %self.name, failures = outcome.len(), "chain evaluated");
        Ok(outcome.prefixed(&self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Signup {
        username: String,
        referral: Option<String>,
        tags: Vec<String>,
        beta: bool,
    }

    fn signup() -> Signup {
        Signup {
            username: String::new(),
            referral: None,
            tags: vec!["ok".to_string(), "".to_string()],
            beta: false,
        }
    }

    fn bind<T: ?Sized + Sync + 'static>(
        name: &str,
        accessor: impl Fn(&Signup) -> &T + Send + Sync + 'static,
        chain: RuleChain<Signup, T>,
    ) -> PropertyRuleChain<Signup, T> {
        PropertyRuleChain::new(name, accessor, chain)
    }

    #[tokio::test]
    async fn test_chain_cascade() {
        let rules = || {
            RuleChain::<Signup, String>::new()
                .not_empty()
                .must(|name| name.starts_with('@'))
                .must(|name| name.len() > 3)
        };
        let scope = EvaluationScope::default();

        let continuing = bind("Username", |s| &s.username, rules());
        assert_eq!(continuing.validate(&signup(), &scope).unwrap().len(), 3);

        let stopping = bind("Username", |s| &s.username, rules().stop_on_first_failure());
        let outcome = stopping.validate_async(&signup(), &scope).await.unwrap();
        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.failures()[0].message, "Username must not be empty");
    }

    #[test]
    fn test_own_cascade_wins_over_default() {
        let rules = || {
            RuleChain::<Signup, String>::new()
                .not_empty()
                .must(|name| name.len() > 3)
                .must(|_| false)
        };
        let scope = EvaluationScope {
            default_cascade: CascadeMode::StopOnFirstFailure,
            ..EvaluationScope::default()
        };

        let defaulted = bind("Username", |s| &s.username, rules());
        assert_eq!(defaulted.validate(&signup(), &scope).unwrap().len(), 1);

        let own = bind("Username", |s| &s.username, rules().cascade(CascadeMode::Continue));
        assert_eq!(own.validate(&signup(), &scope).unwrap().len(), 3);
    }

    #[test]
    fn test_conditions_gate_whole_chain() {
        let chain = bind(
            "Username",
            |s| &s.username,
            RuleChain::new().when(|s: &Signup| s.beta).not_empty(),
        );
        assert!(chain.validate(&signup(), &EvaluationScope::default()).unwrap().is_valid());

        let beta = Signup { beta: true, ..signup() };
        assert!(!chain.validate(&beta, &EvaluationScope::default()).unwrap().is_valid());
    }

    #[test]
    fn test_rule_level_condition_and_message() {
        let chain = bind(
            "Referral",
            |s| &s.referral,
            RuleChain::new()
                .not_empty()
                .rule_when(|s: &Signup| s.beta)
                .with_message("beta users need a referral")
                .max_length(8),
        );

        assert!(chain.validate(&signup(), &EvaluationScope::default()).unwrap().is_valid());

        let beta = Signup { beta: true, ..signup() };
        let outcome = chain.validate(&beta, &EvaluationScope::default()).unwrap();
        assert_eq!(outcome.failures()[0].message, "beta users need a referral");
        assert_eq!(outcome.failures()[0].property_path, "Referral");
    }

    #[test]
    fn test_for_each_paths() {
        let chain = bind("Tags", |s| &s.tags, RuleChain::new().for_each(|item| item.not_empty()));
        let outcome = chain.validate(&signup(), &EvaluationScope::default()).unwrap();

        assert_eq!(outcome.property_paths(), vec!["Tags[1]"]);
        assert_eq!(outcome.failures()[0].message, "Tags[1] must not be empty");
    }

    #[test]
    fn test_transform_and_severity() {
        let chain = bind(
            "Username",
            |s| &s.username,
            RuleChain::new()
                .transform(|name: &String| name.chars().count(), |len| len.greater_than(0_usize))
                .with_severity(Severity::Warning),
        );
        let outcome = chain.validate(&signup(), &EvaluationScope::default()).unwrap();

        assert_eq!(outcome.failures()[0].severity, Severity::Warning);
        assert_eq!(outcome.failures()[0].message, "Username must be greater than 0");
    }

    #[test]
    fn test_invalid_pattern_is_collected() {
        let mut chain = RuleChain::<Signup, String>::new().matches("(unclosed");
        assert!(chain.is_empty());
        assert!(matches!(chain.take_errors()[..], [ValidatorError::InvalidPattern { .. }]));
    }

    #[test]
    fn test_any_of_group() {
        let chain = bind(
            "Username",
            |s| &s.username,
            RuleChain::new().any_of(|group| group.email().matches("^@[a-z]+$")),
        );
        let named = Signup {
            username: "@alice".to_string(),
            ..signup()
        };
        assert!(chain.validate(&named, &EvaluationScope::default()).unwrap().is_valid());

        let bad = Signup {
            username: "alice".to_string(),
            ..signup()
        };
        assert_eq!(chain.validate(&bad, &EvaluationScope::default()).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_group_conditions_gate_the_group() {
        let chain = bind(
            "Username",
            |s| &s.username,
            RuleChain::new().all_of(|group| group.when(|s: &Signup| s.beta).not_empty().min_length(3)),
        );
        assert!(chain.validate(&signup(), &EvaluationScope::default()).unwrap().is_valid());

        let beta = Signup { beta: true, ..signup() };
        let outcome = chain.validate_async(&beta, &EvaluationScope::default()).await.unwrap();
        assert_eq!(outcome.property_paths(), vec!["Username"]);
    }

    #[test]
    fn test_group_cascade_is_rejected() {
        let mut chain = RuleChain::<Signup, String>::new().any_of(|group| group.stop_on_first_failure().email());
        assert!(matches!(chain.take_errors()[..], [ValidatorError::InvalidRuleConfiguration(_)]));
    }

    #[test]
    fn test_item_messages_can_be_reworded() {
        let chain = bind(
            "Tags",
            |s| &s.tags,
            RuleChain::new()
                .for_each(|item| item.not_empty())
                .with_message("blank tag at {PropertyName}"),
        );
        let outcome = chain.validate(&signup(), &EvaluationScope::default()).unwrap();
        assert_eq!(outcome.failures()[0].message, "blank tag at Tags[1]");
    }

    #[test]
    fn test_unsupported_modifiers_are_reported() {
        let mut dangling = RuleChain::<Signup, String>::new().with_severity(Severity::Warning);
        let errors = dangling.take_errors();
        assert!(matches!(&errors[..], [ValidatorError::InvalidRuleConfiguration(reason)] if reason.contains("preceding rule")));

        let mut grouped = RuleChain::<Signup, String>::new()
            .all_of(|group| group.not_empty())
            .with_message("ignored");
        let errors = grouped.take_errors();
        assert!(matches!(&errors[..], [ValidatorError::InvalidRuleConfiguration(reason)] if reason.contains("all_of")));
    }
}
