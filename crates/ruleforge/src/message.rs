//! Message formatting
//!
//! Rules never localize anything themselves. They carry a message key and a
//! set of named arguments, and hand both to a [`MessageFormatter`] when one is
//! attached. Without a formatter the built-in English template for the key is
//! used.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

/// Named placeholder values, e.g. `PropertyName` or `MinLength`
pub type MessageArgs = BTreeMap<String, Value>;

/// Turns a message key plus arguments into user-facing text
pub trait MessageFormatter: Send + Sync {
    fn format_message(&self, key: &str, args: &MessageArgs) -> String;
}

impl<F> MessageFormatter for F
where
    F: Fn(&str, &MessageArgs) -> String + Send + Sync,
{
    fn format_message(&self, key: &str, args: &MessageArgs) -> String {
        self(key, args)
    }
}

/// Built-in English templates
pub(crate) const ENGLISH: &[(&str, &str)] = &[
    ("NotEmpty", "{PropertyName} must not be empty"),
    ("NotNull", "{PropertyName} must not be null"),
    ("Length", "{PropertyName} must be between {MinLength} and {MaxLength} characters"),
    ("MinimumLength", "{PropertyName} must be at least {MinLength} characters"),
    ("MaximumLength", "{PropertyName} must not exceed {MaxLength} characters"),
    ("ExactLength", "{PropertyName} must be exactly {MaxLength} characters"),
    ("Regex", "{PropertyName} is not in the correct format"),
    ("Email", "{PropertyName} must be a valid email address"),
    ("CreditCard", "{PropertyName} must be a valid credit card number"),
    ("Equal", "{PropertyName} must be equal to {ComparisonValue}"),
    ("NotEqual", "{PropertyName} must not be equal to {ComparisonValue}"),
    ("GreaterThan", "{PropertyName} must be greater than {ComparisonValue}"),
    ("GreaterThanOrEqual", "{PropertyName} must be greater than or equal to {ComparisonValue}"),
    ("LessThan", "{PropertyName} must be less than {ComparisonValue}"),
    ("LessThanOrEqual", "{PropertyName} must be less than or equal to {ComparisonValue}"),
    ("Between", "{PropertyName} must be between {From} and {To}"),
    ("ExclusiveBetween", "{PropertyName} must be between {From} and {To} (exclusive)"),
    ("Must", "{PropertyName} is invalid"),
    ("Url", "{PropertyName} must be a valid URL"),
    ("SecureUrl", "{PropertyName} must be a valid HTTPS URL"),
    ("IpAddress", "{PropertyName} must be a valid IP address"),
    ("Json", "{PropertyName} must be valid JSON"),
    ("JsonObject", "{PropertyName} must be a JSON object"),
    ("JsonArray", "{PropertyName} must be a JSON array"),
    ("JsonDepth", "{PropertyName} must not be nested deeper than {MaxDepth} levels"),
    ("Password", "{PropertyName} does not meet the password requirements: {Requirements}"),
    ("OneOf", "{PropertyName} must be one of: {AllowedValues}"),
    ("Uuid", "{PropertyName} must be a valid UUID"),
    ("Future", "{PropertyName} must be in the future"),
    ("FutureOrPresent", "{PropertyName} must not be in the past"),
    ("Past", "{PropertyName} must be in the past"),
    ("PastOrPresent", "{PropertyName} must not be in the future"),
    ("Before", "{PropertyName} must be before {ComparisonValue}"),
    ("BeforeOrEqual", "{PropertyName} must be on or before {ComparisonValue}"),
    ("After", "{PropertyName} must be after {ComparisonValue}"),
    ("AfterOrEqual", "{PropertyName} must be on or after {ComparisonValue}"),
    ("Scale", "{PropertyName} must not have more than {Scale} decimal places"),
    ("Precision", "{PropertyName} must not exceed {Precision} digits in total"),
    ("PhoneNumber", "{PropertyName} must be a valid phone number"),
    ("Color", "{PropertyName} must be a valid color"),
    ("FileExtension", "{PropertyName} must have one of the extensions: {AllowedExtensions}"),
    ("FileExtensionMissing", "{PropertyName} must have a file extension"),
    ("Enum", "{PropertyName} must be one of the defined {EnumName} values"),
    ("DurationZero", "{PropertyName} must not be zero"),
    ("DurationNegative", "{PropertyName} must not be negative"),
    ("DurationMinimum", "{PropertyName} must be at least {MinDuration}"),
    ("DurationMaximum", "{PropertyName} must not exceed {MaxDuration}"),
    ("MinimumCount", "{PropertyName} must contain at least {MinCount} items"),
    ("MaximumCount", "{PropertyName} must not contain more than {MaxCount} items"),
    ("ExactCount", "{PropertyName} must contain exactly {MaxCount} items"),
    ("CountBetween", "{PropertyName} must contain between {MinCount} and {MaxCount} items"),
    ("Unique", "{PropertyName} must not contain duplicate items"),
    ("DependentOn", "{PropertyName} is not valid for the given {Dependency}"),
];

const TURKISH: &[(&str, &str)] = &[
    ("NotEmpty", "{PropertyName} boş olamaz"),
    ("NotNull", "{PropertyName} null olamaz"),
    ("Length", "{PropertyName} {MinLength} ile {MaxLength} karakter arasında olmalıdır"),
    ("MinimumLength", "{PropertyName} en az {MinLength} karakter olmalıdır"),
    ("MaximumLength", "{PropertyName} en fazla {MaxLength} karakter olmalıdır"),
    ("ExactLength", "{PropertyName} tam olarak {MaxLength} karakter olmalıdır"),
    ("Regex", "{PropertyName} doğru formatta değil"),
    ("Email", "{PropertyName} geçerli bir e-posta adresi olmalıdır"),
    ("CreditCard", "{PropertyName} geçerli bir kredi kartı numarası olmalıdır"),
    ("Equal", "{PropertyName} {ComparisonValue} değerine eşit olmalıdır"),
    ("NotEqual", "{PropertyName} {ComparisonValue} değerine eşit olmamalıdır"),
    ("GreaterThan", "{PropertyName} {ComparisonValue} değerinden büyük olmalıdır"),
    ("GreaterThanOrEqual", "{PropertyName} {ComparisonValue} değerinden büyük veya eşit olmalıdır"),
    ("LessThan", "{PropertyName} {ComparisonValue} değerinden küçük olmalıdır"),
    ("LessThanOrEqual", "{PropertyName} {ComparisonValue} değerinden küçük veya eşit olmalıdır"),
    ("Between", "{PropertyName} {From} ile {To} arasında olmalıdır"),
    ("ExclusiveBetween", "{PropertyName} {From} ile {To} arasında olmalıdır (sınırlar hariç)"),
    ("Must", "{PropertyName} geçersiz"),
    ("Url", "{PropertyName} geçerli bir URL olmalıdır"),
    ("SecureUrl", "{PropertyName} geçerli bir HTTPS URL olmalıdır"),
    ("IpAddress", "{PropertyName} geçerli bir IP adresi olmalıdır"),
    ("Json", "{PropertyName} geçerli bir JSON olmalıdır"),
    ("JsonObject", "{PropertyName} bir JSON nesnesi olmalıdır"),
    ("JsonArray", "{PropertyName} bir JSON dizisi olmalıdır"),
    ("JsonDepth", "{PropertyName} en fazla {MaxDepth} seviye iç içe olabilir"),
    ("Password", "{PropertyName} parola gereksinimlerini karşılamıyor: {Requirements}"),
    ("OneOf", "{PropertyName} şunlardan biri olmalıdır: {AllowedValues}"),
    ("Uuid", "{PropertyName} geçerli bir UUID olmalıdır"),
    ("Future", "{PropertyName} gelecekte bir tarih olmalıdır"),
    ("FutureOrPresent", "{PropertyName} geçmişte bir tarih olamaz"),
    ("Past", "{PropertyName} geçmişte bir tarih olmalıdır"),
    ("PastOrPresent", "{PropertyName} gelecekte bir tarih olamaz"),
    ("Before", "{PropertyName} {ComparisonValue} tarihinden önce olmalıdır"),
    ("BeforeOrEqual", "{PropertyName} en geç {ComparisonValue} olmalıdır"),
    ("After", "{PropertyName} {ComparisonValue} tarihinden sonra olmalıdır"),
    ("AfterOrEqual", "{PropertyName} en erken {ComparisonValue} olmalıdır"),
    ("Scale", "{PropertyName} en fazla {Scale} ondalık basamak içerebilir"),
    ("Precision", "{PropertyName} toplamda en fazla {Precision} basamak içerebilir"),
    ("PhoneNumber", "{PropertyName} geçerli bir telefon numarası olmalıdır"),
    ("Color", "{PropertyName} geçerli bir renk olmalıdır"),
    ("FileExtension", "{PropertyName} şu uzantılardan birine sahip olmalıdır: {AllowedExtensions}"),
    ("FileExtensionMissing", "{PropertyName} bir dosya uzantısına sahip olmalıdır"),
    ("Enum", "{PropertyName} tanımlı {EnumName} değerlerinden biri olmalıdır"),
    ("DurationZero", "{PropertyName} sıfır olamaz"),
    ("DurationNegative", "{PropertyName} negatif olamaz"),
    ("DurationMinimum", "{PropertyName} en az {MinDuration} olmalıdır"),
    ("DurationMaximum", "{PropertyName} en fazla {MaxDuration} olabilir"),
    ("MinimumCount", "{PropertyName} en az {MinCount} öğe içermelidir"),
    ("MaximumCount", "{PropertyName} en fazla {MaxCount} öğe içerebilir"),
    ("ExactCount", "{PropertyName} tam olarak {MaxCount} öğe içermelidir"),
    ("CountBetween", "{PropertyName} {MinCount} ile {MaxCount} arasında öğe içermelidir"),
    ("Unique", "{PropertyName} tekrarlanan öğeler içeremez"),
    ("DependentOn", "{PropertyName} verilen {Dependency} için geçerli değil"),
];

/// English template for a built-in message key
pub fn default_template(key: &str) -> Option<&'static str> {
    ENGLISH
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, template)| *template)
}

fn placeholder_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{([^{}]+)\}").ok())
        .as_ref()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Replace `{Name}` placeholders with values from `args`
///
/// Placeholders without a matching argument are left untouched.
pub fn substitute(template: &str, args: &MessageArgs) -> String {
    let Some(pattern) = placeholder_pattern() else {
        return template.to_string();
    };
    pattern
        .replace_all(template, |caps: &Captures<'_>| match args.get(&caps[1]) {
            Some(value) => render_value(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Catalog-backed formatter with an explicit locale
///
/// Lookup order is the exact locale, then its parent (`tr-TR` falls back to
/// `tr`). When neither has a template the key itself is returned.
#[derive(Clone)]
pub struct CatalogFormatter {
    locale: String,
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl CatalogFormatter {
    /// Formatter with the built-in `en` and `tr` catalogs
    pub fn new(locale: impl Into<String>) -> Self {
        let mut formatter = Self::empty(locale);
        formatter.add_messages("en", ENGLISH.iter().copied());
        formatter.add_messages("tr", TURKISH.iter().copied());
        formatter
    }

    /// Formatter without any catalog
    pub fn empty(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            catalogs: HashMap::new(),
        }
    }

    pub fn english() -> Self {
        Self::new("en")
    }

    pub fn turkish() -> Self {
        Self::new("tr-TR")
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Add or replace templates for a locale
    pub fn add_messages<K, V>(&mut self, locale: &str, messages: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let catalog = self.catalogs.entry(locale.to_string()).or_default();
        for (key, template) in messages {
            catalog.insert(key.into(), template.into());
        }
    }

    /// Builder-style variant of [`add_messages`](Self::add_messages) for one entry
    pub fn with_message(mut self, locale: &str, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.add_messages(locale, [(key.into(), template.into())]);
        self
    }

    fn parent_locale(&self) -> Option<&str> {
        self.locale
            .split_once(&['-', '_'][..])
            .map(|(parent, _)| parent)
    }

    fn template(&self, key: &str) -> Option<&str> {
        let lookup = |locale: &str| {
            self.catalogs
                .get(locale)
                .and_then(|catalog| catalog.get(key))
                .map(String::as_str)
        };
        lookup(&self.locale).or_else(|| self.parent_locale().and_then(lookup))
    }
}

impl Default for CatalogFormatter {
    fn default() -> Self {
        Self::english()
    }
}

impl fmt::Debug for CatalogFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut locales: Vec<&String> = self.catalogs.keys().collect();
        locales.sort();
        f.debug_struct("CatalogFormatter")
            .field("locale", &self.locale)
            .field("catalogs", &locales)
            .finish()
    }
}

impl MessageFormatter for CatalogFormatter {
    fn format_message(&self, key: &str, args: &MessageArgs) -> String {
        match self.template(key) {
            Some(template) => substitute(template, args),
            None => key.to_string(),
        }
    }
}
