//! Phone number, color, file extension and enumeration validators

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::ops::BitOr;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::error::EvaluationResult;
use crate::message_args;
use crate::outcome::ValidationOutcome;
use crate::traits::{Configurable, Rule, RuleContext, RuleOptions};
use crate::value::TextValue;

const HEX_PATTERN: &str = r"^#(?:(?:[0-9a-fA-F]{3}){1,2}|(?:[0-9a-fA-F]{4}){1,2})$";
const CHANNEL: &str = r"(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)";

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: impl FnOnce() -> String) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(&pattern()).ok()).as_ref()
}

fn phone_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&PATTERN, || r"^\+?[0-9\s\-()]{10,}$".to_string())
}

/// Check a phone number: optional leading `+`, digits with spaces, dashes
/// or parentheses, and 10 to 15 digits in total
pub fn is_valid_phone_number(text: &str) -> bool {
    let digits = text.chars().filter(char::is_ascii_digit).count();
    (10..=15).contains(&digits) && phone_pattern().map_or(false, |pattern| pattern.is_match(text))
}

/// Loose international phone number format
#[derive(Debug, Clone, Default)]
pub struct PhoneNumberRule {
    options: RuleOptions,
}

impl PhoneNumberRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Configurable for PhoneNumberRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for PhoneNumberRule
where
    P: ?Sized + Sync + 'static,
    T: TextValue + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        match value.non_empty_text() {
            Some(text) if !is_valid_phone_number(text) => {
                Ok(self.options.fail(ctx, "PhoneNumber", message_args!()))
            }
            _ => Ok(ValidationOutcome::success()),
        }
    }

    fn rule_name(&self) -> &'static str {
        "phone_number"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

/// Color notations accepted by [`ColorRule`]; combine with `|`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorFormat {
    hex: bool,
    rgb: bool,
    rgba: bool,
}

impl ColorFormat {
    /// `#rgb`, `#rrggbb` and their alpha forms
    pub const HEX: Self = Self { hex: true, rgb: false, rgba: false };
    /// `rgb(255, 0, 0)`
    pub const RGB: Self = Self { hex: false, rgb: true, rgba: false };
    /// `rgba(255, 0, 0, 0.5)`
    pub const RGBA: Self = Self { hex: false, rgb: false, rgba: true };
    pub const ALL: Self = Self { hex: true, rgb: true, rgba: true };

    fn accepts(&self, text: &str) -> bool {
        static HEX_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
        static RGB_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
        static RGBA_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

        let is_match = |regex: Option<&Regex>| regex.map_or(false, |regex| regex.is_match(text));
        (self.hex && is_match(cached(&HEX_REGEX, || HEX_PATTERN.to_string())))
            || (self.rgb && is_match(cached(&RGB_REGEX, || format!(r"^rgb\(\s*(?:{CHANNEL}\s*,\s*){{2}}{CHANNEL}\s*\)$"))))
            || (self.rgba
                && is_match(cached(&RGBA_REGEX, || {
                    format!(r"^rgba\(\s*(?:{CHANNEL}\s*,\s*){{3}}(?:0|1|0?\.[0-9]+)\s*\)$")
                })))
    }
}

impl Default for ColorFormat {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for ColorFormat {
    type Output = Self;

    fn bitor(self, other: Self) -> Self {
        Self {
            hex: self.hex || other.hex,
            rgb: self.rgb || other.rgb,
            rgba: self.rgba || other.rgba,
        }
    }
}

/// CSS-style color literal
#[derive(Debug, Clone, Default)]
pub struct ColorRule {
    formats: ColorFormat,
    options: RuleOptions,
}

impl ColorRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn formats(formats: ColorFormat) -> Self {
        Self {
            formats,
            options: RuleOptions::default(),
        }
    }
}

impl Configurable for ColorRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for ColorRule
where
    P: ?Sized + Sync + 'static,
    T: TextValue + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        match value.non_empty_text() {
            Some(text) if !self.formats.accepts(text) => Ok(self.options.fail(ctx, "Color", message_args!())),
            _ => Ok(ValidationOutcome::success()),
        }
    }

    fn rule_name(&self) -> &'static str {
        "color"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

/// File name whose extension is in an allow-list
///
/// Extensions are given with or without the leading dot and compared
/// case-insensitively unless [`case_sensitive`](Self::case_sensitive) is set.
#[derive(Debug, Clone)]
pub struct FileExtensionRule {
    allowed: Vec<String>,
    case_sensitive: bool,
    options: RuleOptions,
}

impl FileExtensionRule {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: allowed
                .into_iter()
                .map(|extension| extension.as_ref().trim_start_matches('.').to_string())
                .collect(),
            case_sensitive: false,
            options: RuleOptions::default(),
        }
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    fn violation(&self, text: &str) -> Option<&'static str> {
        let extension = Path::new(text)
            .extension()
            .and_then(|extension| extension.to_str())
            .filter(|extension| !extension.is_empty());
        let Some(extension) = extension else {
            return Some("FileExtensionMissing");
        };

        let allowed = self.allowed.iter().any(|candidate| {
            if self.case_sensitive {
                candidate == extension
            } else {
                candidate.eq_ignore_ascii_case(extension)
            }
        });
        (!allowed).then_some("FileExtension")
    }

    fn listed(&self) -> String {
        self.allowed
            .iter()
            .map(|extension| format!(".{}", extension))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Configurable for FileExtensionRule {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T> Rule<P, T> for FileExtensionRule
where
    P: ?Sized + Sync + 'static,
    T: TextValue + ?Sized + Sync + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        let violation = value.non_empty_text().and_then(|text| self.violation(text));
        match violation {
            Some(key) => Ok(self.options.fail(ctx, key, message_args!("AllowedExtensions" => self.listed()))),
            None => Ok(ValidationOutcome::success()),
        }
    }

    fn rule_name(&self) -> &'static str {
        "file_extension"
    }

    fn options_mut(&mut self) -> Option<&mut RuleOptions> {
        Some(&mut self.options)
    }
}

/// Text that names a variant of `E`, as decided by `E::from_str`
pub struct EnumRule<E> {
    options: RuleOptions,
    _enum: PhantomData<fn() -> E>,
}

impl<E: FromStr> EnumRule<E> {
    pub fn new() -> Self {
        Self {
            options: RuleOptions::default(),
            _enum: PhantomData,
        }
    }

    fn enum_name() -> &'static str {
        let full = type_name::<E>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

impl<E: FromStr> Default for EnumRule<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for EnumRule<E> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            _enum: PhantomData,
        }
    }
}

impl<E> fmt::Debug for EnumRule<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumRule")
            .field("enum", &type_name::<E>())
            .field("options", &self.options)
            .finish()
    }
}

impl<E> Configurable for EnumRule<E> {
    fn options(&mut self) -> &mut RuleOptions {
        &mut self.options
    }
}

#[async_trait]
impl<P, T, E> Rule<P, T> for EnumRule<E>
where
    P: ?Sized + Sync + 'static,
    T: TextValue + ?Sized + Sync + 'static,
    E: FromStr + 'static,
{
    fn evaluate(&self, value: &T, ctx: &RuleContext<'_, P>) -> EvaluationResult {
        match value.non_empty_text() {
            Some(text) if text.parse::<E>().is_err() => {
                let args = message_args!("EnumName" => Self::enum_name(), "PropertyValue" => text);
                Ok(self.options.fail(ctx, "Enum", args))
            }
            _ => Ok(ValidationOutcome::success()),
        }
    }

    fn rule_name(&self) -> &'static str {
        "enum"
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
    fn test_phone_numbers() {
        let rule = PhoneNumberRule::new();
        assert!(rule.check("+90 (555) 111-2233").unwrap().is_valid());
        assert!(rule.check("5551112233").unwrap().is_valid());
        assert!(!rule.check("555-1234").unwrap().is_valid());
        assert!(!rule.check("+1 555 CALL NOW").unwrap().is_valid());
        assert!(!rule.check("1234567890123456").unwrap().is_valid());
        assert!(rule.check(&None::<String>).unwrap().is_valid());
    }

    #[test]
    fn test_colors() {
        let any = ColorRule::new();
        for color in ["#fff", "#A0B1C2", "#ffff", "rgb(255, 0, 10)", "rgba(0,0,0,0.5)"] {
            assert!(any.check(color).unwrap().is_valid(), "{}", color);
        }
        assert!(!any.check("#ggg").unwrap().is_valid());
        assert!(!any.check("rgb(256, 0, 0)").unwrap().is_valid());

        let hex_only = ColorRule::formats(ColorFormat::HEX);
        let outcome = hex_only.check("rgb(1, 2, 3)").unwrap();
        assert_eq!(outcome.failures()[0].message, "Value must be a valid color");

        let no_alpha = ColorRule::formats(ColorFormat::HEX | ColorFormat::RGB);
        assert!(no_alpha.check("rgb(1, 2, 3)").unwrap().is_valid());
        assert!(!no_alpha.check("rgba(1, 2, 3, 1)").unwrap().is_valid());
    }

    #[test]
    fn test_file_extensions() {
        let rule = FileExtensionRule::new([".png", "jpg"]);
        assert!(rule.check("avatar.PNG").unwrap().is_valid());
        assert!(rule.check("photos/cat.jpg").unwrap().is_valid());

        let outcome = rule.check("notes.txt").unwrap();
        assert_eq!(outcome.failures()[0].message, "Value must have one of the extensions: .png, .jpg");

        let outcome = rule.check("README").unwrap();
        assert_eq!(outcome.failures()[0].error_code.as_deref(), Some("FileExtensionMissing"));

        assert!(!FileExtensionRule::new(["png"]).case_sensitive().check("a.PNG").unwrap().is_valid());
    }

    #[derive(Debug)]
    enum Plan {
        Free,
        Pro,
    }

    impl FromStr for Plan {
        type Err = ();

        fn from_str(text: &str) -> Result<Self, ()> {
            match text {
                "free" => Ok(Plan::Free),
                "pro" => Ok(Plan::Pro),
                _ => Err(()),
            }
        }
    }

    #[test]
    fn test_enum_membership() {
        let rule = EnumRule::<Plan>::new();
        assert!(rule.check("pro").unwrap().is_valid());
        assert!(matches!("free".parse::<Plan>(), Ok(Plan::Free)));

        let outcome = rule.check("gold").unwrap();
        assert_eq!(outcome.failures()[0].message, "Value must be one of the defined Plan values");
    }
}
