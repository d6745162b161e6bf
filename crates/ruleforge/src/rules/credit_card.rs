//! Credit card number validator

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::error::EvaluationResult;
use crate::message_args;
use crate::outcome::ValidationOutcome;
use crate::traits::{Configurable, Rule, RuleContext, RuleOptions};
use crate::value::TextValue;

const BRAND_PATTERN: &str = r"^(?:4[0-9]{12}(?:[0-9]{3})?|5[1-5][0-9]{14}|3[47][0-9]{13}|3(?:0[0-5]|[68][0-9])[0-9]{11}|6(?:011|5[0-9]{2})[0-9]{12}|(?:2131|1800|35\d{3})\d{11})$";

fn brand_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(BRAND_PATTERN).ok()).as_ref()
}

/// Luhn checksum over a string of ASCII digits
pub fn luhn_checksum_valid(digits: &str) -> bool {
    let mut sum = 0;
    for (position, c) in digits.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if position % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}

/// Full card number check
///
/// Separators are stripped first. The remaining 13 to 19 digits must match a
/// known brand layout and pass the Luhn checksum.
pub fn is_valid_card_number(input: &str) -> bool {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    if !brand_pattern().map_or(false, |pattern| pattern.is_match(&digits)) {
        return false;
    }
    luhn_checksum_valid(&digits)
}

#[derive(Debug, Clone, Default)]
pub struct CreditCardRule {
    options: RuleOptions,
}

impl CreditCardRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Configurable for CreditCardRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for CreditCardRule
where
    P: ?Sized + Sync + 'static,
    T: TextValue + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        match value.non_empty_text() {
            Some(number) if !is_valid_card_number(number) => {
                Ok(self.options.fail(ctx, "CreditCard", message_args!()))
            }
            _ => Ok(ValidationOutcome::success()),
        }
    }

    fn rule_name(&self) -> &'static str {
        "credit_card"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::RuleExt;

    #[test]
    fn test_luhn() {
        assert!(luhn_checksum_valid("4532015112830366"));
        assert!(!luhn_checksum_valid("4532015112830367"));
        assert!(luhn_checksum_valid("79927398713"));
    }

    #[test]
    fn test_card_numbers() {
        assert!(is_valid_card_number("4532015112830366"));
        assert!(is_valid_card_number("4532 0151 1283 0366"));
        assert!(is_valid_card_number("5555-5555-5555-4444"));
        assert!(is_valid_card_number("378282246310005"));

        assert!(!is_valid_card_number("4532015112830367"));
        assert!(!is_valid_card_number("123"));
        // passes Luhn but matches no brand
        assert!(!is_valid_card_number("9999999999999995"));
    }

    #[tokio::test]
    async fn test_credit_card_rule() {
        let rule = CreditCardRule::new();

        assert!(rule.check("4532015112830366").unwrap().is_valid());
        assert!(rule.check_async("4532015112830366").await.unwrap().is_valid());

        let outcome = rule.check("123").unwrap();
        assert_eq!(outcome.failures()[0].message, "Value must be a valid credit card number");
        assert!(rule.check(&None::<String>).unwrap().is_valid());
    }
}
