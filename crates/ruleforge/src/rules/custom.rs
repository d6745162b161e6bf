//! Predicate and closure based validators

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};

use crate::error::{BoxError, EvaluationResult, ValidatorError};
use crate::message::MessageArgs;
use crate::message_args;
use crate::outcome::{Severity, ValidationFailure, ValidationOutcome};
use crate::traits::{Configurable, Rule, RuleContext, RuleOptions};

/// Synchronous predicate with access to the parent instance
pub type SyncPredicate<P, T> = Arc<dyn Fn(&P, &T) -> Result<bool, BoxError> + Send + Sync>;

/// Asynchronous predicate; the returned future must not borrow its inputs
pub type AsyncPredicate<P, T> =
    Arc<dyn Fn(&P, &T) -> BoxFuture<'static, Result<bool, BoxError>> + Send + Sync>;

enum Predicate<P: ?Sized, T: ?Sized> {
    Sync(SyncPredicate<P, T>),
    Async(AsyncPredicate<P, T>),
}

/// Passes when a predicate returns `true`
///
/// Predicate errors are not failures. They abort validation and surface as
/// [`ValidatorError::Predicate`]. A rule built from an async predicate refuses
/// synchronous evaluation with [`ValidatorError::SyncUnsupported`].
pub struct MustRule<P: ?Sized, T: ?Sized> {
    predicate: Predicate<P, T>,
    options: RuleOptions,
}

impl<P: ?Sized + 'static, T: ?Sized + 'static> MustRule<P, T> {
    fn from_predicate(predicate: Predicate<P, T>) -> Self {
        Self {
            predicate,
            options: RuleOptions::default(),
        }
    }

    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::from_predicate(Predicate::Sync(Arc::new(move |_: &P, value: &T| -> Result<bool, BoxError> {
            Ok(predicate(value))
        })))
    }

    /// Predicate that also sees the parent instance
    pub fn with_instance<F>(predicate: F) -> Self
    where
        F: Fn(&P, &T) -> bool + Send + Sync + 'static,
    {
        Self::from_predicate(Predicate::Sync(Arc::new(move |instance: &P, value: &T| -> Result<bool, BoxError> {
            Ok(predicate(instance, value))
        })))
    }

    /// Fallible predicate; an `Err` aborts validation
    pub fn try_new<F, E>(predicate: F) -> Self
    where
        F: Fn(&T) -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::from_predicate(Predicate::Sync(Arc::new(move |_: &P, value: &T| -> Result<bool, BoxError> {
            predicate(value).map_err(Into::into)
        })))
    }

    pub fn new_async<F, Fut>(predicate: F) -> Self
    where
        F: Fn(&T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self::from_predicate(Predicate::Async(Arc::new(move |_: &P, value: &T| {
            predicate(value).map(Ok::<bool, BoxError>).boxed()
        })))
    }

    pub fn try_new_async<F, Fut, E>(predicate: F) -> Self
    where
        F: Fn(&T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self::from_predicate(Predicate::Async(Arc::new(move |_: &P, value: &T| {
            predicate(value)
                .map(|result| result.map_err(Into::<BoxError>::into))
                .boxed()
        })))
    }

    /// Async predicate that also sees the parent instance
    pub fn with_instance_async<F, Fut>(predicate: F) -> Self
    where
        F: Fn(&P, &T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self::from_predicate(Predicate::Async(Arc::new(move |instance: &P, value: &T| {
            predicate(instance, value).map(Ok::<bool, BoxError>).boxed()
        })))
    }

    pub fn is_async(&self) -> bool {
        matches!(self.predicate, Predicate::Async(_))
    }

    fn verdict(&self, passed: bool, ctx: &RuleContext<'_, P>) -> ValidationOutcome {
        if passed {
            ValidationOutcome::success()
        } else {
            self.options.fail(ctx, "Must", MessageArgs::new())
        }
    }
}

impl<P: ?Sized, T: ?Sized> fmt::Debug for MustRule<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MustRule")
            .field("is_async", &matches!(self.predicate, Predicate::Async(_)))
            .field("options", &self.options)
            .finish()
    }
}

impl<P: ?Sized, T: ?Sized> Configurable for MustRule<P, T> {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for MustRule<P, T>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        match &self.predicate {
            Predicate::Sync(predicate) => {
                let passed = predicate(ctx.instance, value)
                    .map_err(|source| ValidatorError::predicate("must", source))?;
                Ok(self.verdict(passed, ctx))
            }
            Predicate::Async(_) => Err(ValidatorError::SyncUnsupported { rule: "must_async" }),
        }
    }

    async fn evaluate_async(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        match &self.predicate {
            Predicate::Sync(_) => self.evaluate(value, ctx),
            Predicate::Async(predicate) => {
                let passed = predicate(ctx.instance, value)
                    .await
                    .map_err(|source| ValidatorError::predicate("must_async", source))?;
                Ok(self.verdict(passed, ctx))
            }
        }
    }

    fn rule_name(&self) -> &'static str {
        match self.predicate {
            Predicate::Sync(_) => "must",
            Predicate::Async(_) => "must_async",
        }
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

/// Handle passed to [`CustomRule`] closures for reporting failures
pub struct CustomContext<'a, P: ?Sized> {
    rule: RuleContext<'a, P>,
    severity: Severity,
    outcome: ValidationOutcome,
}

impl<'a, P: ?Sized> CustomContext<'a, P> {
    pub fn instance(&self) -> &'a P {
        self.rule.instance
    }

    pub fn property_name(&self) -> &'a str {
        self.rule.property_name
    }

    /// Report a failure on the property itself
    pub fn add_failure(&mut self, message: impl Into<String>) {
        self.add_failure_at("", message);
    }

    /// Report a failure on a path relative to the property, e.g. `Street`
    pub fn add_failure_at(&mut self, relative_path: &str, message: impl Into<String>) {
        let severity = self.severity;
        self.push(ValidationFailure::new(relative_path, message).severity(severity));
    }

    pub fn push(&mut self, failure: ValidationFailure) {
        self.outcome.push(failure);
    }
}

type CustomFn<P, T> = Arc<dyn Fn(&T, &mut CustomContext<'_, P>) -> Result<(), BoxError> + Send + Sync>;

/// Closure that reports any number of failures itself
pub struct CustomRule<P: ?Sized, T: ?Sized> {
    check: CustomFn<P, T>,
    options: RuleOptions,
}

impl<P: ?Sized + 'static, T: ?Sized + 'static> CustomRule<P, T> {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&T, &mut CustomContext<'_, P>) + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(move |value: &T, ctx: &mut CustomContext<'_, P>| -> Result<(), BoxError> {
                check(value, ctx);
                Ok(())
            }),
            options: RuleOptions::default(),
        }
    }

    pub fn try_new<F, E>(check: F) -> Self
    where
        F: Fn(&T, &mut CustomContext<'_, P>) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            check: Arc::new(move |value: &T, ctx: &mut CustomContext<'_, P>| -> Result<(), BoxError> {
                check(value, ctx).map_err(Into::into)
            }),
            options: RuleOptions::default(),
        }
    }
}

impl<P: ?Sized, T: ?Sized> CustomRule<P, T> {
    /// Apply a configured message or key to every reported failure
    fn reword(&self, outcome: ValidationOutcome, ctx: &RuleContext<'_, P>) -> ValidationOutcome {
        if self.options.message.is_none() && self.options.message_key.is_none() {
            return outcome;
        }

        let message = self.options.render(ctx, "Must", MessageArgs::new());
        let mut reworded = ValidationOutcome::success();
        for mut failure in outcome.into_failures() {
            failure.message = message.clone();
            if let Some(key) = &self.options.message_key {
                failure.error_code = Some(key.clone());
            }
            reworded.push(failure);
        }
        reworded
    }
}

impl<P: ?Sized, T: ?Sized> fmt::Debug for CustomRule<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRule")
            .field("options", &self.options)
            .finish()
    }
}

impl<P: ?Sized, T: ?Sized> Configurable for CustomRule<P, T> {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for CustomRule<P, T>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let mut custom = CustomContext {
            rule: *ctx,
            severity: self.options.severity,
            outcome: ValidationOutcome::success(),
        };
        (self.check)(value, &mut custom).map_err(|source| ValidatorError::predicate("custom", source))?;
        Ok(self.reword(custom.outcome, ctx))
    }

    fn rule_name(&self) -> &'static str {
        "custom"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

type Selector<P, D> = Arc<dyn Fn(&P) -> D + Send + Sync>;
type DependentCheck<T, D> = Arc<dyn Fn(&T, &D) -> bool + Send + Sync>;

/// Checks a property against another value taken from the same instance
///
/// `dependency` names the other value in the failure message, e.g. a
/// postcode that is not valid for the selected `Country`.
pub struct DependentRule<P: ?Sized, T: ?Sized, D> {
    dependency: String,
    select: Selector<P, D>,
    check: DependentCheck<T, D>,
    options: RuleOptions,
}

impl<P: ?Sized, T: ?Sized, D> DependentRule<P, T, D> {
    pub fn new<S, C>(dependency: impl Into<String>, select: S, check: C) -> Self
    where
        S: Fn(&P) -> D + Send + Sync + 'static,
        C: Fn(&T, &D) -> bool + Send + Sync + 'static,
    {
        Self {
            dependency: dependency.into(),
            select: Arc::new(select),
            check: Arc::new(check),
            options: RuleOptions::default(),
        }
    }
}

impl<P: ?Sized, T: ?Sized, D> fmt::Debug for DependentRule<P, T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependentRule")
            .field("dependency", &self.dependency)
            .field("options", &self.options)
            .finish()
    }
}

impl<P: ?Sized, T: ?Sized, D> Configurable for DependentRule<P, T, D> {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T, D> Rule<P, T> for DependentRule<P, T, D>
where
    P: ?Sized + Sync + 'static,
    T: ?Sized + Sync + 'static,
    D: 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let dependency = (self.select)(ctx.instance);
        if (self.check)(value, &dependency) {
            return Ok(ValidationOutcome::success());
        }
        Ok(self.options.fail(ctx, "DependentOn", message_args!("Dependency" => self.dependency)))
    }

    fn rule_name(&self) -> &'static str {
        "dependent_on"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}
