//! Format validators for URLs, IP addresses, JSON, passwords and enumerations

use std::net::IpAddr;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::{EvaluationResult, ValidatorError, ValidatorResult};
use crate::message_args;
use crate::outcome::ValidationOutcome;
use crate::traits::{Configurable, Rule, RuleContext, RuleOptions};
use crate::value::TextValue;

/// Absolute `http` or `https` URL with a host
#[derive(Debug, Clone, Default)]
pub struct UrlRule {
    require_https: bool,
    options: RuleOptions,
}

impl UrlRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept only `https` URLs
    pub fn https_only() -> Self {
        Self {
            require_https: true,
            ..Self::default()
        }
    }
}

impl Configurable for UrlRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for UrlRule
where
    P: ?Sized + Sync + 'static,
    T: TextValue + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let Some(text) = value.non_empty_text() else {
            return Ok(ValidationOutcome::success());
        };

        let parsed = Url::parse(text).ok().filter(|url| url.has_host());
        let key = match parsed.as_ref().map(Url::scheme) {
            Some("https") => return Ok(ValidationOutcome::success()),
            Some("http") if !self.require_https => return Ok(ValidationOutcome::success()),
            Some("http") => "SecureUrl",
            _ if self.require_https => "SecureUrl",
            _ => "Url",
        };
        Ok(self.options.fail(ctx, key, message_args!()))
    }

    fn rule_name(&self) -> &'static str {
        "url"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

/// IPv4 and/or IPv6 address literal
#[derive(Debug, Clone)]
pub struct IpAddressRule {
    allow_v4: bool,
    allow_v6: bool,
    options: RuleOptions,
}

impl IpAddressRule {
    /// At least one family must be allowed
    pub fn new(allow_v4: bool, allow_v6: bool) -> ValidatorResult<Self> {
        if !allow_v4 && !allow_v6 {
            return Err(ValidatorError::InvalidRuleConfiguration(
                "at least one IP version must be allowed".to_string(),
            ));
        }
        Ok(Self {
            allow_v4,
            allow_v6,
            options: RuleOptions::default(),
        })
    }

    pub fn any() -> Self {
        Self {
            allow_v4: true,
            allow_v6: true,
            options: RuleOptions::default(),
        }
    }

    pub fn v4_only() -> Self {
        Self {
            allow_v6: false,
            ..Self::any()
        }
    }

    pub fn v6_only() -> Self {
        Self {
            allow_v4: false,
            ..Self::any()
        }
    }

    fn accepts(&self, text: &str) -> bool {
        match text.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => self.allow_v4,
            Ok(IpAddr::V6(_)) => self.allow_v6,
            Err(_) => false,
        }
    }
}

impl Configurable for IpAddressRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for IpAddressRule
where
    P: ?Sized + Sync + 'static,
    T: TextValue + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        match value.non_empty_text() {
            Some(text) if !self.accepts(text) => Ok(self.options.fail(ctx, "IpAddress", message_args!())),
            _ => Ok(ValidationOutcome::success()),
        }
    }

    fn rule_name(&self) -> &'static str {
        "ip_address"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

/// Shape constraints for [`JsonRule`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonShape {
    #[default]
    Any,
    Object,
    Array,
}

/// Text that parses as JSON, optionally with a required root shape and depth limit
#[derive(Debug, Clone, Default)]
pub struct JsonRule {
    shape: JsonShape,
    max_depth: Option<usize>,
    options: RuleOptions,
}

impl JsonRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shape(mut self, shape: JsonShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    fn violation(&self, text: &str) -> Option<&'static str> {
        let Ok(document) = serde_json::from_str::<Value>(text) else {
            return Some("Json");
        };
        match (self.shape, &document) {
            (JsonShape::Object, value) if !value.is_object() => return Some("JsonObject"),
            (JsonShape::Array, value) if !value.is_array() => return Some("JsonArray"),
            _ => {}
        }
        match self.max_depth {
            Some(limit) if depth(&document) > limit => Some("JsonDepth"),
            _ => None,
        }
    }
}

/// Nesting depth; scalars are 0, `{}` and `[]` are 1
fn depth(value: &Value) -> usize {
    match value {
        Value::Object(map) => 1 + map.values().map(depth).max().unwrap_or(0),
        Value::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
        _ => 0,
    }
}

impl Configurable for JsonRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for JsonRule
where
    P: ?Sized + Sync + 'static,
    T: TextValue + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let violation = value.non_empty_text().and_then(|text| self.violation(text));
        match violation {
            Some(key) => Ok(self.options.fail(ctx, key, message_args!("MaxDepth" => self.max_depth))),
            None => Ok(ValidationOutcome::success()),
        }
    }

    fn rule_name(&self) -> &'static str {
        "json"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

/// Password strength requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

impl PasswordPolicy {
    /// Unmet requirements, in a fixed order
    pub fn unmet(&self, password: &str) -> Vec<String> {
        let mut unmet = Vec::new();
        if password.chars().count() < self.min_length {
            unmet.push(format!("at least {} characters", self.min_length));
        }
        if self.require_uppercase && !password.chars().any(char::is_uppercase) {
            unmet.push("an uppercase letter".to_string());
        }
        if self.require_lowercase && !password.chars().any(char::is_lowercase) {
            unmet.push("a lowercase letter".to_string());
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            unmet.push("a digit".to_string());
        }
        if self.require_special && password.chars().all(char::is_alphanumeric) {
            unmet.push("a special character".to_string());
        }
        unmet
    }
}

#[derive(Debug, Clone, Default)]
pub struct PasswordRule {
    policy: PasswordPolicy,
    options: RuleOptions,
}

impl PasswordRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: PasswordPolicy) -> Self {
        Self {
            policy,
            options: RuleOptions::default(),
        }
    }
}

impl Configurable for PasswordRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for PasswordRule
where
    P: ?Sized + Sync + 'static,
    T: TextValue + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let Some(password) = value.non_empty_text() else {
            return Ok(ValidationOutcome::success());
        };
        let unmet = self.policy.unmet(password);
        if unmet.is_empty() {
            return Ok(ValidationOutcome::success());
        }
        let args = message_args!(
            "Requirements" => unmet.join(", "),
            "MinLength" => self.policy.min_length,
        );
        Ok(self.options.fail(ctx, "Password", args))
    }

    fn rule_name(&self) -> &'static str {
        "password"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

/// Text restricted to a fixed set of values
#[derive(Debug, Clone)]
pub struct OneOfRule {
    allowed: Vec<String>,
    ignore_case: bool,
    options: RuleOptions,
}

impl OneOfRule {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            ignore_case: false,
            options: RuleOptions::default(),
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    fn accepts(&self, text: &str) -> bool {
        self.allowed.iter().any(|candidate| {
            if self.ignore_case {
                candidate.to_lowercase() == text.to_lowercase()
            } else {
                candidate == text
            }
        })
    }
}

impl Configurable for OneOfRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for OneOfRule
where
    P: ?Sized + Sync + 'static,
    T: TextValue + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        match value.non_empty_text() {
            Some(text) if !self.accepts(text) => Ok(self.options.fail(
                ctx,
                "OneOf",
                message_args!("AllowedValues" => self.allowed.join(", ")),
            )),
            _ => Ok(ValidationOutcome::success()),
        }
    }

    fn rule_name(&self) -> &'static str {
        "one_of"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}
