//! Built-in validation rules

pub mod comparison;
pub mod count;
pub mod credit_card;
pub mod custom;
pub mod format;
pub mod length;
pub mod not_empty;
pub mod numeric;
pub mod pattern;
pub mod temporal;
pub mod text;

pub use comparison::{BetweenRule, EqualRule};
pub use count::{CountRule, UniqueRule};
pub use credit_card::{is_valid_card_number, luhn_checksum_valid, CreditCardRule};
pub use custom::{CustomContext, CustomRule, DependentRule, MustRule};
pub use format::{is_valid_phone_number, ColorFormat, ColorRule, EnumRule, FileExtensionRule, PhoneNumberRule};
pub use length::LengthRule;
pub use not_empty::{NotEmptyRule, NotNullRule};
pub use numeric::ScalePrecisionRule;
pub use pattern::{is_valid_email, EmailRule, RegexRule};
pub use temporal::{DateTimeRule, DurationRule, Moment, UuidRule};
pub use text::{IpAddressRule, JsonRule, JsonShape, OneOfRule, PasswordPolicy, PasswordRule, UrlRule};
