//! # ruleforge
//!
//! Declarative object validation. Rules are attached to properties through a
//! fluent builder, grouped into named rule sets, composed with conditions,
//! transforms, collections and nested validators, and evaluated either
//! synchronously or asynchronously with identical results.
//!
//! ```
//! use ruleforge::prelude::*;
//!
//! struct Customer {
//!     name: String,
//!     age: u32,
//! }
//!
//! let validator = Validator::<Customer>::builder()
//!     .rule_for("Name", |c| &c.name, |rule| rule.not_empty().length(2, 50))
//!     .rule_for("Age", |c| &c.age, |rule| rule.between(18, 120))
//!     .build()
//!     .unwrap();
//!
//! let outcome = validator.validate(&Customer { name: String::new(), age: 7 }).unwrap();
//! assert_eq!(outcome.property_paths(), vec!["Name", "Age"]);
//! ```

pub mod chain;
pub mod combinators;
pub mod config;
pub mod error;
pub mod message;
pub mod outcome;
pub mod path;
pub mod registry;
pub mod rules;
pub mod traits;
pub mod validator;
pub mod value;

// Re-exports for easy access
pub use chain::{CascadeMode, EvaluationScope, PropertyRuleChain, PropertyRules, RuleChain};
pub use config::{ValidatorSettings, ValidatorSettingsBuilder};
pub use error::{BoxError, EvaluationResult, ValidatorError, ValidatorResult};
pub use message::{CatalogFormatter, MessageArgs, MessageFormatter};
pub use outcome::{Severity, ValidationFailure, ValidationOutcome};
pub use registry::ValidatorRegistry;
pub use traits::{Configurable, Rule, RuleContext, RuleExt, RuleOptions};
pub use validator::{RuleSetBuilder, ValidationOptions, Validator, ValidatorBuilder, DEFAULT_RULE_SET};
pub use value::{DecimalValue, Emptiable, Present, Sequence, TextValue};

// Combinators and built-in rules
pub use combinators::{ChildValidatorRule, Composite, CompositeMode, Condition, Conditional, ForEach, Transform};
pub use rules::{
    BetweenRule, ColorFormat, ColorRule, CountRule, CreditCardRule, CustomContext, CustomRule, DateTimeRule,
    DependentRule, DurationRule, EmailRule, EnumRule, EqualRule, FileExtensionRule, IpAddressRule, JsonRule,
    JsonShape, LengthRule, Moment, MustRule, NotEmptyRule, NotNullRule, OneOfRule, PasswordPolicy, PasswordRule,
    PhoneNumberRule, RegexRule, ScalePrecisionRule, UniqueRule, UrlRule, UuidRule,
};

/// Everything needed to declare and run validators
pub mod prelude {
    pub use crate::chain::{CascadeMode, RuleChain};
    pub use crate::config::ValidatorSettings;
    pub use crate::error::{ValidatorError, ValidatorResult};
    pub use crate::message::{CatalogFormatter, MessageFormatter};
    pub use crate::outcome::{Severity, ValidationFailure, ValidationOutcome};
    pub use crate::registry::ValidatorRegistry;
    pub use crate::rules::{ColorFormat, Moment};
    pub use crate::traits::{Configurable, Rule, RuleExt};
    pub use crate::validator::{ValidationOptions, Validator};
    pub use crate::value::Emptiable;
}
