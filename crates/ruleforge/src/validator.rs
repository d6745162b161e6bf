//! Validators: ordered property chains, rule sets and inclusion

use std::any::type_name;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, trace, warn};

use crate::chain::{CascadeMode, EvaluationScope, PropertyRuleChain, PropertyRules, RuleChain};
use crate::combinators::Condition;
use crate::config::ValidatorSettings;
use crate::error::{EvaluationResult, ValidatorError, ValidatorResult};
use crate::message::MessageFormatter;
use crate::outcome::ValidationOutcome;
use crate::path;

/// Name that selects the chains declared outside any rule set
pub const DEFAULT_RULE_SET: &str = "default";

type SharedChain<P> = Arc<dyn PropertyRules<P>>;

/// Per-call options for [`Validator::validate_with`]
#[derive(Clone, Default)]
pub struct ValidationOptions {
    /// Rule set name, or a comma-separated list of names
    pub rule_set: Option<String>,
    /// Formatter for this call only; wins over the validator's own
    pub formatter: Option<Arc<dyn MessageFormatter>>,
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule_set(mut self, name: impl Into<String>) -> Self {
        self.rule_set = Some(name.into());
        self
    }

    pub fn formatter(mut self, formatter: Arc<dyn MessageFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }
}

impl fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("rule_set", &self.rule_set)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

/// Validates instances of `P`
///
/// Built once with [`Validator::builder`] and shared freely afterwards; a
/// validator holds no per-call state, so concurrent calls are independent.
///
/// ```
/// use ruleforge::prelude::*;
///
/// struct Signup {
///     email: String,
/// }
///
/// let validator = Validator::<Signup>::builder()
///     .rule_for("Email", |s| &s.email, |rule| rule.not_empty().email())
///     .build()
///     .unwrap();
///
/// let outcome = validator.validate(&Signup { email: "nope".into() }).unwrap();
/// assert_eq!(outcome.failures()[0].message, "Email must be a valid email address");
/// ```
pub struct Validator<P: Sync + 'static> {
    chains: Vec<SharedChain<P>>,
    rule_sets: HashMap<String, Vec<SharedChain<P>>>,
    pre_conditions: Vec<Condition<P>>,
    formatter: Option<Arc<dyn MessageFormatter>>,
    settings: ValidatorSettings,
}

impl<P: Sync + 'static> Clone for Validator<P> {
    fn clone(&self) -> Self {
        Self {
            chains: self.chains.clone(),
            rule_sets: self.rule_sets.clone(),
            pre_conditions: self.pre_conditions.clone(),
            formatter: self.formatter.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<P: Sync + 'static> fmt::Debug for Validator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("type", &type_name::<P>())
            .field("properties", &self.property_names())
            .field("rule_sets", &self.rule_set_names())
            .field("pre_conditions", &self.pre_conditions.len())
            .field("formatter", &self.formatter.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

impl<P: Sync + 'static> Validator<P> {
    pub fn builder() -> ValidatorBuilder<P> {
        ValidatorBuilder::new()
    }

    /// Run the default chains
    pub fn validate(&self, instance: &P) -> EvaluationResult {
        self.run(instance, None, self.own_formatter())
    }

    pub async fn validate_async(&self, instance: &P) -> EvaluationResult {
        self.run_async(instance, None, self.own_formatter()).await
    }

    /// Run the named rule set(s)
    ///
    /// A single unknown name is an error. In a comma-separated list unknown
    /// names are skipped and duplicates run once. An empty name runs the
    /// default chains.
    pub fn validate_rule_set(&self, instance: &P, rule_set: &str) -> EvaluationResult {
        self.run(instance, Some(rule_set), self.own_formatter())
    }

    pub async fn validate_rule_set_async(&self, instance: &P, rule_set: &str) -> EvaluationResult {
        self.run_async(instance, Some(rule_set), self.own_formatter()).await
    }

    pub fn validate_with(&self, instance: &P, options: &ValidationOptions) -> EvaluationResult {
        let formatter = first_of(options.formatter.as_deref(), self.own_formatter());
        self.run(instance, options.rule_set.as_deref(), formatter)
    }

    pub async fn validate_with_async(&self, instance: &P, options: &ValidationOptions) -> EvaluationResult {
        let formatter = first_of(options.formatter.as_deref(), self.own_formatter());
        self.run_async(instance, options.rule_set.as_deref(), formatter)
            .await
    }

    /// Default chain names in evaluation order
    pub fn property_names(&self) -> Vec<&str> {
        self.chains.iter().map(|chain| chain.property_name()).collect()
    }

    pub fn rule_set_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rule_sets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    fn own_formatter(&self) -> Option<&dyn MessageFormatter> {
        self.formatter.as_deref()
    }

    /// Entry point for a validator nested under a parent chain
    ///
    /// The nested validator's own formatter wins over the inherited one.
    pub(crate) fn run_nested(&self, instance: &P, inherited: Option<&dyn MessageFormatter>) -> EvaluationResult {
        self.run(instance, None, first_of(self.own_formatter(), inherited))
    }

    pub(crate) async fn run_nested_async(
        &self,
        instance: &P,
        inherited: Option<&dyn MessageFormatter>,
    ) -> EvaluationResult {
        self.run_async(instance, None, first_of(self.own_formatter(), inherited))
            .await
    }

    fn run(&self, instance: &P, rule_set: Option<&str>, formatter: Option<&dyn MessageFormatter>) -> EvaluationResult {
        let chains = self.select(rule_set)?;
        if !self.should_validate(instance) {
            return Ok(ValidationOutcome::success());
        }

        let scope = self.scope(formatter);
        let mut outcome = ValidationOutcome::success();
        for chain in chains {
            let result = chain.validate(instance, &scope)?;
            let failed = !result.is_valid();
            outcome.merge(result);
            if failed && self.settings.stops_on_first_failure() {
                trace!(property = chain.property_name(), "validator stopped at first failing chain");
                break;
            }
        }

        self.finish(outcome)
    }

    async fn run_async(
        &self,
        instance: &P,
        rule_set: Option<&str>,
        formatter: Option<&dyn MessageFormatter>,
    ) -> EvaluationResult {
        let chains = self.select(rule_set)?;
        if !self.should_validate(instance) {
            return Ok(ValidationOutcome::success());
        }

        let scope = self.scope(formatter);
        let stop = self.settings.async_stops_on_first_failure();
        if *self.settings.get_concurrent_chains() && !stop {
            // try_join_all keeps declaration order in its output
            let outcomes = try_join_all(chains.iter().map(|chain| chain.validate_async(instance, &scope))).await?;
            return self.finish(ValidationOutcome::combine(outcomes));
        }

        let mut outcome = ValidationOutcome::success();
        for chain in chains {
            let result = chain.validate_async(instance, &scope).await?;
            let failed = !result.is_valid();
            outcome.merge(result);
            if failed && stop {
                trace!(property = chain.property_name(), "validator stopped at first failing chain");
                break;
            }
        }

        self.finish(outcome)
    }

    fn should_validate(&self, instance: &P) -> bool {
        let proceed = self.pre_conditions.iter().all(|condition| condition.holds(instance));
        if !proceed {
            debug!(validator = type_name::<P>(), "pre-validation declined, skipping rules");
        }
        proceed
    }

    fn scope<'a>(&self, formatter: Option<&'a dyn MessageFormatter>) -> EvaluationScope<'a> {
        EvaluationScope {
            formatter,
            default_cascade: *self.settings.get_default_chain_cascade(),
        }
    }

    fn finish(&self, outcome: ValidationOutcome) -> EvaluationResult {
        debug!(
            validator = type_name::<P>(),
            valid = outcome.is_valid(),
            failures = outcome.len(),
            "validation finished"
        );
        Ok(outcome)
    }

    fn lookup(&self, name: &str) -> Option<&[SharedChain<P>]> {
        match self.rule_sets.get(name) {
            Some(chains) => Some(chains),
            None if name == DEFAULT_RULE_SET => Some(&self.chains),
            None => None,
        }
    }

    fn select(&self, rule_set: Option<&str>) -> ValidatorResult<Vec<&SharedChain<P>>> {
        let requested = match rule_set.map(str::trim) {
            None | Some("") => return Ok(self.chains.iter().collect()),
            Some(requested) => requested,
        };

        if !requested.contains(',') {
            return self
                .lookup(requested)
                .map(|chains| chains.iter().collect())
                .ok_or_else(|| ValidatorError::UnknownRuleSet(requested.to_string()));
        }

        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        for name in requested.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            if !seen.insert(name) {
                continue;
            }
            match self.lookup(name) {
                Some(chains) => selected.extend(chains.iter()),
                None => warn!(rule_set = name, "skipping unknown rule set"),
            }
        }
        Ok(selected)
    }
}

fn first_of<'a>(
    preferred: Option<&'a dyn MessageFormatter>,
    fallback: Option<&'a dyn MessageFormatter>,
) -> Option<&'a dyn MessageFormatter> {
    preferred.or(fallback)
}

/// Bind a chain to a property, recording configuration errors
fn bind<P, T, A, B>(
    name: &str,
    accessor: A,
    build: B,
    errors: &mut Vec<ValidatorError>,
) -> Option<SharedChain<P>>
where
    P: Sync + 'static,
    T: ?Sized + Sync + 'static,
    A: Fn(&P) -> &T + Send + Sync + 'static,
    B: FnOnce(RuleChain<P, T>) -> RuleChain<P, T>,
{
    let mut chain = build(RuleChain::new());
    errors.extend(chain.take_errors());

    if !path::is_member_path(name) {
        errors.push(ValidatorError::InvalidPropertyPath(name.to_string()));
        return None;
    }
    Some(Arc::new(PropertyRuleChain::new(name, accessor, chain)))
}

/// Collects the chains of one named rule set
pub struct RuleSetBuilder<P: Sync + 'static> {
    chains: Vec<SharedChain<P>>,
    errors: Vec<ValidatorError>,
}

impl<P: Sync + 'static> RuleSetBuilder<P> {
    fn new() -> Self {
        Self {
            chains: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn rule_for<T, A, B>(mut self, name: &str, accessor: A, build: B) -> Self
    where
        T: ?Sized + Sync + 'static,
        A: Fn(&P) -> &T + Send + Sync + 'static,
        B: FnOnce(RuleChain<P, T>) -> RuleChain<P, T>,
    {
        if let Some(chain) = bind(name, accessor, build, &mut self.errors) {
            self.chains.push(chain);
        }
        self
    }
}

/// Builder for [`Validator`]
///
/// Configuration problems such as an invalid pattern are collected while
/// building and the first one is returned from [`ValidatorBuilder::build`].
pub struct ValidatorBuilder<P: Sync + 'static> {
    chains: Vec<SharedChain<P>>,
    rule_sets: HashMap<String, Vec<SharedChain<P>>>,
    pre_conditions: Vec<Condition<P>>,
    formatter: Option<Arc<dyn MessageFormatter>>,
    settings: ValidatorSettings,
    errors: Vec<ValidatorError>,
}

impl<P: Sync + 'static> Default for ValidatorBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Sync + 'static> ValidatorBuilder<P> {
    pub fn new() -> Self {
        Self {
            chains: Vec::new(),
            rule_sets: HashMap::new(),
            pre_conditions: Vec::new(),
            formatter: None,
            settings: ValidatorSettings::default(),
            errors: Vec::new(),
        }
    }

    /// Declare rules for the property `name`, read through `accessor`
    pub fn rule_for<T, A, B>(mut self, name: &str, accessor: A, build: B) -> Self
    where
        T: ?Sized + Sync + 'static,
        A: Fn(&P) -> &T + Send + Sync + 'static,
        B: FnOnce(RuleChain<P, T>) -> RuleChain<P, T>,
    {
        if let Some(chain) = bind(name, accessor, build, &mut self.errors) {
            self.chains.push(chain);
        }
        self
    }

    /// Chains that run only when the rule set is requested by name
    ///
    /// Declaring the same name twice appends to the set.
    pub fn rule_set<B>(mut self, name: &str, build: B) -> Self
    where
        B: FnOnce(RuleSetBuilder<P>) -> RuleSetBuilder<P>,
    {
        let set = build(RuleSetBuilder::new());
        self.errors.extend(set.errors);
        self.rule_sets
            .entry(name.trim().to_string())
            .or_default()
            .extend(set.chains);
        self
    }

    /// Append another validator's chains, rule sets and pre-validation
    /// gates at this point
    ///
    /// Chains are shared, not copied. The formatter and settings of `other`
    /// are not inherited.
    pub fn include(mut self, other: &Validator<P>) -> Self {
        self.chains.extend(other.chains.iter().cloned());
        self.pre_conditions.extend(other.pre_conditions.iter().cloned());
        for (name, chains) in &other.rule_sets {
            self.rule_sets
                .entry(name.clone())
                .or_default()
                .extend(chains.iter().cloned());
        }
        self
    }

    /// Skip all rules (and report success) unless `predicate` holds
    pub fn pre_validate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        self.pre_conditions.push(Condition::when(predicate));
        self
    }

    pub fn formatter(mut self, formatter: Arc<dyn MessageFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn settings(mut self, settings: ValidatorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn cascade(mut self, mode: CascadeMode) -> Self {
        self.settings.set_cascade(mode);
        self
    }

    /// Validator cascade for `validate_async`, overriding [`cascade`](Self::cascade)
    pub fn async_cascade(mut self, mode: CascadeMode) -> Self {
        self.settings.set_async_cascade(Some(mode));
        self
    }

    pub fn default_chain_cascade(mut self, mode: CascadeMode) -> Self {
        self.settings.set_default_chain_cascade(mode);
        self
    }

    pub fn concurrent_chains(mut self, enabled: bool) -> Self {
        self.settings.set_concurrent_chains(enabled);
        self
    }

    pub fn build(self) -> ValidatorResult<Validator<P>> {
        if let Some(error) = self.errors.into_iter().next() {
            warn!(validator = type_name::<P>(), error = %error, "validator configuration rejected");
            return Err(error);
        }

        debug!(
            validator = type_name::<P>(),
            chains = self.chains.len(),
            rule_sets = self.rule_sets.len(),
            "validator built"
        );
        Ok(Validator {
            chains: self.chains,
            rule_sets: self.rule_sets,
            pre_conditions: self.pre_conditions,
            formatter: self.formatter,
            settings: self.settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::CatalogFormatter;
    use std::time::Duration;

    #[derive(Debug, Clone)]
    struct Account {
        username: String,
        email: String,
        age: u32,
        active: bool,
    }

    fn blank() -> Account {
        Account {
            username: String::new(),
            email: "not-an-email".to_string(),
            age: 12,
            active: true,
        }
    }

    fn account_validator() -> ValidatorBuilder<Account> {
        Validator::<Account>::builder()
            .rule_for("Username", |a| &a.username, |rule| rule.not_empty())
            .rule_for("Email", |a| &a.email, |rule| rule.email())
            .rule_for("Age", |a| &a.age, |rule| rule.greater_than_or_equal(18))
    }

    #[test]
    fn test_failures_follow_declaration_order() {
        let validator = account_validator().build().unwrap();
        let outcome = validator.validate(&blank()).unwrap();

        assert_eq!(outcome.property_paths(), vec!["Username", "Email", "Age"]);
        assert_eq!(validator.property_names(), vec!["Username", "Email", "Age"]);
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let validator = account_validator().build().unwrap();
        let sync = validator.validate(&blank()).unwrap();
        let concurrent = validator.validate_async(&blank()).await.unwrap();

        let sequential = account_validator().concurrent_chains(false).build().unwrap();
        let ordered = sequential.validate_async(&blank()).await.unwrap();

        assert_eq!(sync, concurrent);
        assert_eq!(sync, ordered);
    }

    #[tokio::test]
    async fn test_concurrent_chains_keep_order() {
        let validator = Validator::<Account>::builder()
            .rule_for("Username", |a| &a.username, |rule| {
                rule.must_async(|_| async {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    false
                })
            })
            .rule_for("Email", |a| &a.email, |rule| rule.email())
            .build()
            .unwrap();

        let outcome = validator.validate_async(&blank()).await.unwrap();
        assert_eq!(outcome.property_paths(), vec!["Username", "Email"]);
    }

    #[test]
    fn test_validator_stop_on_first_failure() {
        let validator = account_validator()
            .cascade(CascadeMode::StopOnFirstFailure)
            .build()
            .unwrap();
        let outcome = validator.validate(&blank()).unwrap();

        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.failures()[0].property_path, "Username");
    }

    #[tokio::test]
    async fn test_validator_stop_keeps_whole_failing_chain() {
        let validator = Validator::<Account>::builder()
            .cascade(CascadeMode::StopOnFirstFailure)
            .rule_for("Username", |a| &a.username, |rule| {
                rule.cascade(CascadeMode::Continue)
                    .not_empty()
                    .must(|name| name.contains('@'))
            })
            .rule_for("Email", |a| &a.email, |rule| rule.email())
            .build()
            .unwrap();

        let outcome = validator.validate(&blank()).unwrap();
        assert_eq!(outcome.property_paths(), vec!["Username", "Username"]);

        let concurrent = validator.validate_async(&blank()).await.unwrap();
        assert_eq!(outcome, concurrent);
    }

    #[tokio::test]
    async fn test_async_cascade_applies_to_async_path_only() {
        let validator = account_validator()
            .async_cascade(CascadeMode::StopOnFirstFailure)
            .build()
            .unwrap();

        assert_eq!(validator.validate(&blank()).unwrap().len(), 3);

        let outcome = validator.validate_async(&blank()).await.unwrap();
        assert_eq!(outcome.property_paths(), vec!["Username"]);
    }

    #[test]
    fn test_pre_validation_short_circuits() {
        let validator = account_validator()
            .pre_validate(|a: &Account| a.active)
            .build()
            .unwrap();

        let inactive = Account { active: false, ..blank() };
        assert!(validator.validate(&inactive).unwrap().is_valid());
        assert!(!validator.validate(&blank()).unwrap().is_valid());
    }

    #[test]
    fn test_rule_set_selection() {
        let validator = Validator::<Account>::builder()
            .rule_for("Username", |a| &a.username, |rule| rule.not_empty())
            .rule_set("Contact", |set| set.rule_for("Email", |a| &a.email, |rule| rule.email()))
            .rule_set("Adult", |set| {
                set.rule_for("Age", |a| &a.age, |rule| rule.greater_than_or_equal(18))
            })
            .build()
            .unwrap();

        assert_eq!(validator.rule_set_names(), vec!["Adult", "Contact"]);

        let contact = validator.validate_rule_set(&blank(), "Contact").unwrap();
        assert_eq!(contact.property_paths(), vec!["Email"]);

        let both = validator
            .validate_rule_set(&blank(), "Adult, Missing, default, Adult")
            .unwrap();
        assert_eq!(both.property_paths(), vec!["Age", "Username"]);

        let unknown = validator.validate_rule_set(&blank(), "Missing");
        assert!(matches!(unknown, Err(ValidatorError::UnknownRuleSet(name)) if name == "Missing"));

        let default = validator.validate_rule_set(&blank(), "").unwrap();
        assert_eq!(default.property_paths(), vec!["Username"]);
    }

    #[test]
    fn test_include_appends_in_place() {
        let base = Validator::<Account>::builder()
            .rule_for("Email", |a| &a.email, |rule| rule.email())
            .build()
            .unwrap();
        let validator = Validator::<Account>::builder()
            .rule_for("Username", |a| &a.username, |rule| rule.not_empty())
            .include(&base)
            .rule_for("Age", |a| &a.age, |rule| rule.greater_than_or_equal(18))
            .build()
            .unwrap();

        let outcome = validator.validate(&blank()).unwrap();
        assert_eq!(outcome.property_paths(), vec!["Username", "Email", "Age"]);
    }

    #[test]
    fn test_formatter_precedence() {
        let validator = Validator::<Account>::builder()
            .rule_for("Username", |a| &a.username, |rule| rule.not_empty())
            .formatter(Arc::new(CatalogFormatter::turkish()))
            .build()
            .unwrap();

        let own = validator.validate(&blank()).unwrap();
        assert_eq!(own.failures()[0].message, "Username boş olamaz");

        let options = ValidationOptions::new().formatter(Arc::new(CatalogFormatter::english()));
        let per_call = validator.validate_with(&blank(), &options).unwrap();
        assert_eq!(per_call.failures()[0].message, "Username must not be empty");
    }

    #[test]
    fn test_build_rejects_bad_configuration() {
        let bad_pattern = Validator::<Account>::builder()
            .rule_for("Username", |a| &a.username, |rule| rule.matches("[a-"))
            .build();
        assert!(matches!(bad_pattern, Err(ValidatorError::InvalidPattern { .. })));

        let bad_name = Validator::<Account>::builder()
            .rule_for("User name", |a| &a.username, |rule| rule.not_empty())
            .build();
        assert!(matches!(bad_name, Err(ValidatorError::InvalidPropertyPath(name)) if name == "User name"));
    }

    #[test]
    fn test_async_only_rule_fails_sync_path() {
        let validator = Validator::<Account>::builder()
            .rule_for("Username", |a| &a.username, |rule| rule.must_async(|_| async { true }))
            .build()
            .unwrap();

        let result = validator.validate(&blank());
        assert!(matches!(result, Err(ValidatorError::SyncUnsupported { .. })));
        assert!(tokio_test::block_on(validator.validate_async(&blank()))
            .unwrap()
            .is_valid());
    }
}
