//! Usage errors raised by a misconfigured validator
//!
//! Invalid input is never reported through these types. A failed rule is
//! data and lives in [`ValidationOutcome`]; a `ValidatorError` means the
//! validator itself (or a predicate it runs) is broken.

use thiserror::Error;

use crate::outcome::ValidationOutcome;

/// Boxed error produced by fallible predicates
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type ValidatorResult<T> = Result<T, ValidatorError>;

/// Result of evaluating a rule, chain or validator
pub type EvaluationResult = ValidatorResult<ValidationOutcome>;

#[derive(Error, Debug)]
pub enum ValidatorError {
    /// The rule was built with an asynchronous predicate only
    #[error("rule '{rule}' only supports asynchronous evaluation, use validate_async")]
    SyncUnsupported { rule: &'static str },

    #[error("rule set '{0}' is not registered on this validator")]
    UnknownRuleSet(String),

    /// Property names must be plain member paths such as `Address.City`
    #[error("'{0}' is not a simple property path")]
    InvalidPropertyPath(String),

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid rule configuration: {0}")]
    InvalidRuleConfiguration(String),

    /// A user supplied predicate returned an error
    #[error("predicate of rule '{rule}' failed: {source}")]
    Predicate {
        rule: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("no validator registered for type {0}")]
    NotRegistered(&'static str),
}

impl ValidatorError {
    pub fn predicate(rule: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Predicate {
            rule,
            source: source.into(),
        }
    }

    /// Whether the error comes from a user predicate rather than validator setup
    pub fn is_predicate_error(&self) -> bool {
        matches!(self, Self::Predicate { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidatorError::UnknownRuleSet("Create".to_string());
        assert_eq!(err.to_string(), "rule set 'Create' is not registered on this validator");

        let err = ValidatorError::SyncUnsupported { rule: "must" };
        assert!(err.to_string().contains("validate_async"));
    }

    #[test]
    fn test_predicate_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "lookup failed");
        let err = ValidatorError::predicate("must", io);

        assert!(err.is_predicate_error());
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "predicate of rule 'must' failed: lookup failed");
    }
}
