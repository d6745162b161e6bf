//! Validation outcome types
//!
//! A [`ValidationOutcome`] is an ordered list of failures. It is valid exactly
//! when that list is empty. Outcomes only grow by appending, so the order in
//! which failures were discovered is always preserved.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path;

/// How serious a failure is
///
/// Severity is informational. Any failure, even `Info`, makes an outcome
/// invalid; callers that want to ignore warnings filter explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    #[default]
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single failed rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Path of the failing property, e.g. `Address.Street` or `Tags[2]`
    pub property_path: String,
    /// Human-readable message
    pub message: String,
    pub severity: Severity,
    /// Message key of the rule that failed, for programmatic handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl ValidationFailure {
    pub fn new(property_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property_path: property_path.into(),
            message: message.into(),
            severity: Severity::Error,
            error_code: None,
        }
    }

    /// Set the severity
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the error code
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.property_path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.property_path, self.message)
        }
    }
}

/// Accumulated result of one or more evaluations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    failures: Vec<ValidationFailure>,
}

impl ValidationOutcome {
    /// Outcome with no failures
    pub fn success() -> Self {
        Self::default()
    }

    /// Outcome with a single `Error` failure
    pub fn failure(property_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::from_failure(ValidationFailure::new(property_path, message))
    }

    pub fn failure_with_severity(
        property_path: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self::from_failure(ValidationFailure::new(property_path, message).severity(severity))
    }

    pub fn from_failure(failure: ValidationFailure) -> Self {
        Self {
            failures: vec![failure],
        }
    }

    /// Concatenate outcomes in argument order
    pub fn combine(outcomes: impl IntoIterator<Item = ValidationOutcome>) -> Self {
        let mut combined = Self::success();
        for outcome in outcomes {
            combined.merge(outcome);
        }
        combined
    }

    pub fn add_failure(
        &mut self,
        property_path: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) {
        self.push(ValidationFailure::new(property_path, message).severity(severity));
    }

    pub fn push(&mut self, failure: ValidationFailure) {
        self.failures.push(failure);
    }

    /// Append all failures of `other` after the current ones
    pub fn merge(&mut self, other: ValidationOutcome) {
        self.failures.extend(other.failures);
    }

    /// Rebase every failure path under `parent`
    pub fn prefixed(mut self, parent: &str) -> Self {
        for failure in &mut self.failures {
            failure.property_path = path::join(parent, &failure.property_path);
        }
        self
    }

    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<ValidationFailure> {
        self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failures reported for exactly `property_path`
    pub fn failures_for<'a>(&'a self, property_path: &'a str) -> impl Iterator<Item = &'a ValidationFailure> + 'a {
        self.failures
            .iter()
            .filter(move |failure| failure.property_path == property_path)
    }

    pub fn failures_with_severity(&self, severity: Severity) -> impl Iterator<Item = &ValidationFailure> + '_ {
        self.failures
            .iter()
            .filter(move |failure| failure.severity == severity)
    }

    /// Whether any failure has `Error` severity
    pub fn has_errors(&self) -> bool {
        self.failures
            .iter()
            .any(|failure| failure.severity == Severity::Error)
    }

    /// Paths of all failures, in discovery order
    pub fn property_paths(&self) -> Vec<&str> {
        self.failures
            .iter()
            .map(|failure| failure.property_path.as_str())
            .collect()
    }

    /// Messages grouped by property path
    pub fn errors_by_property(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for failure in &self.failures {
            grouped
                .entry(failure.property_path.clone())
                .or_default()
                .push(failure.message.clone());
        }
        grouped
    }

    /// Convert to a JSON body suitable for API responses
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": "validation_failed",
                "message": "Validation failed",
                "fields": self.failures
            }
        })
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "Validation succeeded");
        }
        write!(f, "Validation failed with {} failure(s):", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n  [{}] {}", failure.severity, failure)?;
        }
        Ok(())
    }
}

impl From<ValidationFailure> for ValidationOutcome {
    fn from(failure: ValidationFailure) -> Self {
        Self::from_failure(failure)
    }
}

impl FromIterator<ValidationFailure> for ValidationOutcome {
    fn from_iter<I: IntoIterator<Item = ValidationFailure>>(iter: I) -> Self {
        Self {
            failures: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ValidationOutcome {
    type Item = ValidationFailure;
    type IntoIter = std::vec::IntoIter<ValidationFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}
