//! Value shape traits
//!
//! These traits let one rule type work over owned, borrowed and optional
//! property types alike. `None` is how absence is spelled; shape rules treat
//! it as valid and leave presence checks to [`NotEmptyRule`](crate::rules::NotEmptyRule).

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use serde_json::Value;

/// Values that may carry text
pub trait TextValue {
    /// The text, or `None` when the value is absent
    fn text(&self) -> Option<&str>;

    /// The text when present and non-empty
    fn non_empty_text(&self) -> Option<&str> {
        self.text().filter(|text| !text.is_empty())
    }
}

impl TextValue for str {
    fn text(&self) -> Option<&str> {
        Some(self)
    }
}

impl TextValue for String {
    fn text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl TextValue for Cow<'_, str> {
    fn text(&self) -> Option<&str> {
        Some(self.as_ref())
    }
}

impl<T: TextValue + ?Sized> TextValue for &T {
    fn text(&self) -> Option<&str> {
        (**self).text()
    }
}

impl<T: TextValue + ?Sized> TextValue for Box<T> {
    fn text(&self) -> Option<&str> {
        (**self).text()
    }
}

impl<T: TextValue> TextValue for Option<T> {
    fn text(&self) -> Option<&str> {
        self.as_ref().and_then(TextValue::text)
    }
}

/// Values that may carry a `V`, used by comparison and temporal rules
///
/// Implemented for `V` itself and for `Option<V>`.
pub trait Present<V> {
    fn present(&self) -> Option<&V>;
}

impl<V> Present<V> for V {
    fn present(&self) -> Option<&V> {
        Some(self)
    }
}

impl<V> Present<V> for Option<V> {
    fn present(&self) -> Option<&V> {
        self.as_ref()
    }
}

/// Emptiness as seen by `NotEmpty`
///
/// Whitespace-only strings and empty collections are empty, `None` is empty,
/// numbers and booleans never are. Domain types can opt in with an empty impl
/// block, which treats every value as present.
pub trait Emptiable {
    fn is_empty_value(&self) -> bool {
        false
    }
}

impl Emptiable for str {
    fn is_empty_value(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Emptiable for String {
    fn is_empty_value(&self) -> bool {
        self.as_str().is_empty_value()
    }
}

impl Emptiable for Cow<'_, str> {
    fn is_empty_value(&self) -> bool {
        self.as_ref().is_empty_value()
    }
}

impl<T: Emptiable + ?Sized> Emptiable for &T {
    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

impl<T: Emptiable + ?Sized> Emptiable for Box<T> {
    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

impl<T: Emptiable> Emptiable for Option<T> {
    fn is_empty_value(&self) -> bool {
        match self {
            Some(value) => value.is_empty_value(),
            None => true,
        }
    }
}

impl<T> Emptiable for [T] {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Emptiable for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Emptiable for VecDeque<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> Emptiable for HashMap<K, V, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Emptiable for BTreeMap<K, V> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T, S> Emptiable for HashSet<T, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Emptiable for BTreeSet<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl Emptiable for Value {
    fn is_empty_value(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(text) => text.is_empty_value(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Number(_) | Value::Bool(_) => false,
        }
    }
}

macro_rules! never_empty {
    ($($ty:ty),* $(,)?) => {
        $(impl Emptiable for $ty {})*
    };
}

never_empty!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
never_empty!(uuid::Uuid, chrono::NaiveDate, chrono::NaiveDateTime);

impl<Tz: chrono::TimeZone> Emptiable for chrono::DateTime<Tz> {}

/// Ordered sequences that collection rules iterate over
///
/// An absent sequence yields `None` and is valid.
pub trait Sequence {
    type Item;

    fn items(&self) -> Option<&[Self::Item]>;
}

impl<I> Sequence for [I] {
    type Item = I;

    fn items(&self) -> Option<&[I]> {
        Some(self)
    }
}

impl<I> Sequence for Vec<I> {
    type Item = I;

    fn items(&self) -> Option<&[I]> {
        Some(self.as_slice())
    }
}

impl<I> Sequence for Box<[I]> {
    type Item = I;

    fn items(&self) -> Option<&[I]> {
        Some(self)
    }
}

impl<S: Sequence> Sequence for Option<S> {
    type Item = S::Item;

    fn items(&self) -> Option<&[S::Item]> {
        self.as_ref().and_then(Sequence::items)
    }
}

/// Numbers whose decimal digits can be counted
///
/// The text is the plain positional form produced by `Display`, e.g.
/// `-12.5`; integers have no fractional part.
pub trait DecimalValue {
    fn decimal_text(&self) -> Option<String>;
}

macro_rules! decimal_value {
    ($($ty:ty),* $(,)?) => {
        $(impl DecimalValue for $ty {
            fn decimal_text(&self) -> Option<String> {
                Some(self.to_string())
            }
        })*
    };
}

decimal_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl<T: DecimalValue + ?Sized> DecimalValue for &T {
    fn decimal_text(&self) -> Option<String> {
        (**self).decimal_text()
    }
}

impl<T: DecimalValue> DecimalValue for Option<T> {
    fn decimal_text(&self) -> Option<String> {
        self.as_ref().and_then(DecimalValue::decimal_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_values() {
        assert_eq!("abc".text(), Some("abc"));
        assert_eq!(Some("x".to_string()).text(), Some("x"));
        assert_eq!(None::<String>.text(), None);
        assert_eq!(String::new().non_empty_text(), None);
    }

    #[test]
    fn test_emptiness() {
        assert!("   ".is_empty_value());
        assert!(None::<String>.is_empty_value());
        assert!(Vec::<u8>::new().is_empty_value());
        assert!(json!({}).is_empty_value());
        assert!(json!(null).is_empty_value());

        assert!(!0_i32.is_empty_value());
        assert!(!false.is_empty_value());
        assert!(!json!(0).is_empty_value());
        assert!(!Some(vec![1]).is_empty_value());
    }

    #[test]
    fn test_sequences() {
        let tags = vec!["a", "b"];
        assert_eq!(tags.items().map(<[_]>::len), Some(2));
        assert!(None::<Vec<u8>>.items().is_none());
    }

    #[test]
    fn test_decimal_text() {
        assert_eq!(12.5_f64.decimal_text().as_deref(), Some("12.5"));
        assert_eq!((-7_i32).decimal_text().as_deref(), Some("-7"));
        assert_eq!(f64::NAN.decimal_text().as_deref(), Some("NaN"));
        assert_eq!(None::<f32>.decimal_text(), None);
    }

    #[test]
    fn test_present() {
        assert_eq!(Present::<i32>::present(&5), Some(&5));
        assert_eq!(Present::<i32>::present(&None::<i32>), None);
    }
}
