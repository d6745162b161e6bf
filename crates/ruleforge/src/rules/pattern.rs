//! Pattern-based validators using regular expressions

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

use crate::error::{EvaluationResult, ValidatorError, ValidatorResult};
use crate::message_args;
use crate::outcome::ValidationOutcome;
use crate::traits::{Configurable, Rule, RuleContext, RuleOptions};
use crate::value::TextValue;

/// Validator for custom regular expression patterns
///
/// Uses `is_match`, so anchor the pattern when the whole text must match, or
/// switch on [`full_match`](Self::full_match).
#[derive(Debug, Clone)]
pub struct RegexRule {
    pattern: Regex,
    /// `^(?:pattern)$`, compiled when full matching is on
    anchored: Option<Regex>,
    case_insensitive: bool,
    options: RuleOptions,
}

impl RegexRule {
    pub fn new(pattern: &str) -> ValidatorResult<Self> {
        let regex = Regex::new(pattern).map_err(|source| ValidatorError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::from_regex(regex))
    }

    pub fn new_case_insensitive(pattern: &str) -> ValidatorResult<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| ValidatorError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            case_insensitive: true,
            ..Self::from_regex(regex)
        })
    }

    /// Create a validator from an existing Regex
    ///
    /// Builder flags of `pattern` are not carried into the anchored form used
    /// by [`full_match`](Self::full_match); use inline flags such as `(?i)`.
    pub fn from_regex(pattern: Regex) -> Self {
        Self {
            pattern,
            anchored: None,
            case_insensitive: false,
            options: RuleOptions::default(),
        }
    }

    /// Require the match to cover the entire text
    pub fn full_match(mut self, full_match: bool) -> Self {
        self.anchored = if full_match {
            RegexBuilder::new(&format!("^(?:{})$", self.pattern.as_str()))
                .case_insensitive(self.case_insensitive)
                .build()
                .ok()
        } else {
            None
        };
        self
    }

    pub fn is_full_match(&self) -> bool {
        self.anchored.is_some()
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn matches(&self, text: &str) -> bool {
        match &self.anchored {
            Some(anchored) => anchored.is_match(text),
            None => self.pattern.is_match(text),
        }
    }
}

impl Configurable for RegexRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for RegexRule
where
    P: ?Sized + Sync + 'static,
    T: TextValue + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        match value.non_empty_text() {
            Some(text) if !self.matches(text) => Ok(self.options.fail(
                ctx,
                "Regex",
                message_args!("RegularExpression" => self.pattern.as_str()),
            )),
            _ => Ok(ValidationOutcome::success()),
        }
    }

    fn rule_name(&self) -> &'static str {
        "regex"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            RegexBuilder::new(EMAIL_PATTERN)
                .case_insensitive(true)
                .build()
                .ok()
        })
        .as_ref()
}

/// Check an address against the permissive email pattern
pub fn is_valid_email(text: &str) -> bool {
    email_pattern().map_or(false, |pattern| pattern.is_match(text))
}

/// Email address format
///
/// Intentionally permissive: one `@`, no whitespace, and a dot somewhere in
/// the domain. It is not an RFC 5322 parser.
#[derive(Debug, Clone, Default)]
pub struct EmailRule {
    options: RuleOptions,
}

impl EmailRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Configurable for EmailRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for EmailRule
where
    P: ?Sized + Sync + 'static,
    T: TextValue + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        match value.non_empty_text() {
            Some(text) if !is_valid_email(text) => Ok(self.options.fail(ctx, "Email", message_args!())),
            _ => Ok(ValidationOutcome::success()),
        }
    }

    fn rule_name(&self) -> &'static str {
        "email"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}
