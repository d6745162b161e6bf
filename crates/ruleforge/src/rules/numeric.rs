//! Digit-count validators for decimal numbers

use async_trait::async_trait;

use crate::error::{EvaluationResult, ValidatorError, ValidatorResult};
use crate::message_args;
use crate::outcome::ValidationOutcome;
use crate::traits::{Configurable, Rule, RuleContext, RuleOptions};
use crate::value::DecimalValue;

/// Limits the total number of digits and the number of decimal places
///
/// Trailing fractional zeros do not count, so `1.50` has one decimal place.
/// Values that are not plain decimals (`NaN`, `inf`) fail the precision check.
#[derive(Debug, Clone)]
pub struct ScalePrecisionRule {
    precision: u32,
    scale: u32,
    options: RuleOptions,
}

/// Digits before and after the decimal point
fn digit_counts(text: &str) -> Option<(u32, u32)> {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let fraction = fraction.trim_end_matches('0');

    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if integer.is_empty() || !all_digits(integer) || !all_digits(fraction) {
        return None;
    }
    Some((integer.len() as u32, fraction.len() as u32))
}

impl ScalePrecisionRule {
    /// `scale` may not exceed `precision`
    pub fn new(precision: u32, scale: u32) -> ValidatorResult<Self> {
        if scale > precision {
            return Err(ValidatorError::InvalidRuleConfiguration(format!(
                "scale {} cannot be greater than precision {}",
                scale, precision
            )));
        }
        Ok(Self {
            precision,
            scale,
            options: RuleOptions::default(),
        })
    }

    fn violation(&self, text: &str) -> Option<&'static str> {
        let Some((integer, fraction)) = digit_counts(text) else {
            return Some("Precision");
        };
        if fraction > self.scale {
            Some("Scale")
        } else if integer + fraction > self.precision {
            Some("Precision")
        } else {
            None
        }
    }
}

impl Configurable for ScalePrecisionRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for ScalePrecisionRule
where
    P: ?Sized + Sync + 'static,
    T: DecimalValue + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let Some(text) = value.decimal_text() else {
            return Ok(ValidationOutcome::success());
        };
        match self.violation(&text) {
            Some(key) => {
                let args = message_args!(
                    "Precision" => self.precision,
                    "Scale" => self.scale,
                    "PropertyValue" => text,
                );
                Ok(self.options.fail(ctx, key, args))
            }
            None => Ok(ValidationOutcome::success()),
        }
    }

    fn rule_name(&self) -> &'static str {
        "scale_precision"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}
