//! The attribute value model shared by every layer of the crate.
//!
//! `AttributeValue` mirrors the closed set of shapes the store accepts. Numbers
//! are always carried as canonical decimal strings, and set variants compare
//! equal regardless of element order.

use std::collections::HashMap;
use std::fmt;

use super::AttributeError;

/// An item or key as exchanged with the store: attribute name to value.
pub type AttributeMap = HashMap<String, AttributeValue>;

/// A single typed attribute value.
#[derive(Debug, Clone)]
pub enum AttributeValue {
    /// String.
    S(String),
    /// Number, kept in its decimal text form.
    N(String),
    /// Binary.
    B(Vec<u8>),
    /// String set.
    Ss(Vec<String>),
    /// Number set.
    Ns(Vec<String>),
    /// Binary set.
    Bs(Vec<Vec<u8>>),
    /// Nested map.
    M(AttributeMap),
    /// Ordered list.
    L(Vec<AttributeValue>),
    /// Explicit null, distinct from an absent attribute.
    Null,
    /// Boolean.
    Bool(bool),
}

mod sealed {
    pub trait Sealed {}
}

/// Integer types that can be encoded losslessly as a number attribute.
pub trait Number: sealed::Sealed + fmt::Display + Copy {}

macro_rules! impl_number {
    ($($t:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}
            impl Number for $t {}

            impl From<$t> for AttributeValue {
                fn from(n: $t) -> Self {
                    AttributeValue::number(n)
                }
            }
        )*
    };
}

impl_number!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl AttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        AttributeValue::S(value.into())
    }

    /// Encodes an integer as its decimal representation.
    pub fn number<N: Number>(n: N) -> Self {
        AttributeValue::N(n.to_string())
    }

    /// Encodes a float, rejecting NaN and infinities. Integral values are
    /// stored as integer text (`1700000000.0` becomes `1700000000`).
    pub fn float(n: f64) -> Result<Self, AttributeError> {
        if !n.is_finite() {
            return Err(AttributeError::InvalidNumber(n.to_string()));
        }
        canonical_number(&n.to_string()).map(AttributeValue::N)
    }

    /// Parses decimal text, rewriting it in canonical form: no exponent, no
    /// leading `+`, no redundant zeros, and `0` for negative zero.
    ///
    /// ```
    /// use dynatable_core::AttributeValue;
    ///
    /// let n = AttributeValue::number_from_str("1.7e9").unwrap();
    /// assert_eq!(n, AttributeValue::number(1_700_000_000_i64));
    /// ```
    pub fn number_from_str(text: &str) -> Result<Self, AttributeError> {
        canonical_number(text).map(AttributeValue::N)
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        AttributeValue::B(bytes.into())
    }

    /// Builds a string set. Duplicates are dropped keeping first occurrence;
    /// an empty input is rejected because the store refuses empty sets.
    pub fn string_set<I, T>(values: I) -> Result<Self, AttributeError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let values = dedup(values.into_iter().map(Into::into));
        if values.is_empty() {
            return Err(AttributeError::EmptySet("SS"));
        }
        Ok(AttributeValue::Ss(values))
    }

    pub fn number_set<I, N>(values: I) -> Result<Self, AttributeError>
    where
        I: IntoIterator<Item = N>,
        N: Number,
    {
        let values = dedup(values.into_iter().map(|n| n.to_string()));
        if values.is_empty() {
            return Err(AttributeError::EmptySet("NS"));
        }
        Ok(AttributeValue::Ns(values))
    }

    /// Builds a number set from decimal text, validating every element.
    pub fn number_set_from_strs<I, T>(values: I) -> Result<Self, AttributeError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|value| canonical_number(&value.into()))
            .collect::<Result<Vec<_>, _>>()?;
        let values = dedup(values.into_iter());
        if values.is_empty() {
            return Err(AttributeError::EmptySet("NS"));
        }
        Ok(AttributeValue::Ns(values))
    }

    pub fn binary_set<I, T>(values: I) -> Result<Self, AttributeError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Vec<u8>>,
    {
        let values = dedup(values.into_iter().map(Into::into));
        if values.is_empty() {
            return Err(AttributeError::EmptySet("BS"));
        }
        Ok(AttributeValue::Bs(values))
    }

    pub fn list(values: impl IntoIterator<Item = AttributeValue>) -> Self {
        AttributeValue::L(values.into_iter().collect())
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, AttributeValue)>) -> Self {
        AttributeValue::M(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn null() -> Self {
        AttributeValue::Null
    }

    pub fn bool(value: bool) -> Self {
        AttributeValue::Bool(value)
    }

    /// The store's type descriptor for this value (`S`, `N`, `SS`, ...).
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::B(_) => "B",
            AttributeValue::Ss(_) => "SS",
            AttributeValue::Ns(_) => "NS",
            AttributeValue::Bs(_) => "BS",
            AttributeValue::M(_) => "M",
            AttributeValue::L(_) => "L",
            AttributeValue::Null => "NULL",
            AttributeValue::Bool(_) => "BOOL",
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            AttributeValue::N(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_b(&self) -> Option<&[u8]> {
        match self {
            AttributeValue::B(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_ss(&self) -> Option<&[String]> {
        match self {
            AttributeValue::Ss(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_ns(&self) -> Option<&[String]> {
        match self {
            AttributeValue::Ns(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_bs(&self) -> Option<&[Vec<u8>]> {
        match self {
            AttributeValue::Bs(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_m(&self) -> Option<&AttributeMap> {
        match self {
            AttributeValue::M(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_l(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::L(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Parses a number attribute as `i64`, if it is one and fits.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_n().and_then(|n| n.parse().ok())
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        use AttributeValue::*;

        match (self, other) {
            (S(a), S(b)) | (N(a), N(b)) => a == b,
            (B(a), B(b)) => a == b,
            (Ss(a), Ss(b)) | (Ns(a), Ns(b)) => same_elements(a, b),
            (Bs(a), Bs(b)) => same_elements(a, b),
            (M(a), M(b)) => a == b,
            (L(a), L(b)) => a == b,
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AttributeValue {}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::S(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::S(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

/// Exponents past this are refused before any digits are expanded.
const MAX_EXPONENT: i64 = 1024;

/// Checks that `text` is a finite decimal number.
pub(crate) fn validate_number(text: &str) -> Result<(), AttributeError> {
    canonical_number(text).map(drop)
}

/// Rewrites finite decimal text as plain digits with an optional sign and
/// fraction. The rewrite is lexical, so no precision is lost to `f64`.
pub(crate) fn canonical_number(text: &str) -> Result<String, AttributeError> {
    let invalid = || AttributeError::InvalidNumber(text.to_string());

    if !text.parse::<f64>().is_ok_and(f64::is_finite) {
        return Err(invalid());
    }

    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => {
            let exponent = exponent.parse::<i64>().map_err(|_| invalid())?;
            (mantissa, exponent)
        }
        None => (unsigned, 0),
    };
    if exponent.abs() > MAX_EXPONENT {
        return Err(invalid());
    }
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if (whole.is_empty() && fraction.is_empty())
        || !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    // Significant digits, with the decimal point `point` places from their start.
    let digits = format!("{whole}{fraction}");
    let significant = digits.trim_start_matches('0');
    let point = whole.len() as i64 + exponent - (digits.len() - significant.len()) as i64;
    let significant = significant.trim_end_matches('0');
    if significant.is_empty() {
        return Ok("0".to_string());
    }

    let len = significant.len() as i64;
    let mut canonical = String::new();
    if negative {
        canonical.push('-');
    }
    if point <= 0 {
        canonical.push_str("0.");
        canonical.extend(std::iter::repeat('0').take(point.unsigned_abs() as usize));
        canonical.push_str(significant);
    } else if point >= len {
        canonical.push_str(significant);
        canonical.extend(std::iter::repeat('0').take((point - len) as usize));
    } else {
        let (whole, fraction) = significant.split_at(point as usize);
        canonical.push_str(whole);
        canonical.push('.');
        canonical.push_str(fraction);
    }
    Ok(canonical)
}

fn dedup<T: PartialEq>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut unique: Vec<T> = Vec::new();
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}

fn same_elements<T: Ord + Clone>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_is_decimal_text() {
        assert_eq!(AttributeValue::number(42_i64), AttributeValue::N("42".to_string()));
        assert_eq!(AttributeValue::from(-7_i32).as_n(), Some("-7"));
        assert_eq!(
            AttributeValue::number(u128::MAX).as_n(),
            Some("340282366920938463463374607431768211455")
        );
    }

    #[test]
    fn test_float_rejects_non_finite() {
        assert_eq!(AttributeValue::float(0.1).unwrap().as_n(), Some("0.1"));
        assert!(AttributeValue::float(f64::NAN).is_err());
        assert!(AttributeValue::float(f64::INFINITY).is_err());
    }

    #[test]
    fn test_number_text_is_canonical() {
        let canonical = |text: &str| AttributeValue::number_from_str(text).unwrap();

        assert_eq!(canonical("1700000000.0"), AttributeValue::number(1_700_000_000_i64));
        assert_eq!(canonical("1e+21").as_n(), Some("1000000000000000000000"));
        assert_eq!(canonical("1e21"), AttributeValue::float(1e21).unwrap());
        assert_eq!(canonical("1e5").as_n(), Some("100000"));
        assert_eq!(canonical("01").as_n(), Some("1"));
        assert_eq!(canonical("+7").as_n(), Some("7"));
        assert_eq!(canonical("12.50").as_n(), Some("12.5"));
        assert_eq!(canonical("-3E-3").as_n(), Some("-0.003"));
        assert_eq!(canonical(".5").as_n(), Some("0.5"));
        assert_eq!(canonical("-0.0").as_n(), Some("0"));
        assert_eq!(canonical("000").as_n(), Some("0"));
        assert_eq!(canonical("1.25e1").as_n(), Some("12.5"));
        assert_eq!(
            canonical("123456789012345678901234567890.5").as_n(),
            Some("123456789012345678901234567890.5")
        );
    }

    #[test]
    fn test_float_matches_integer_text() {
        assert_eq!(
            AttributeValue::float(1_700_000_000.0).unwrap(),
            AttributeValue::number(1_700_000_000_i64)
        );
        assert_eq!(AttributeValue::float(-0.0).unwrap().as_n(), Some("0"));
        assert_eq!(AttributeValue::float(1e-7).unwrap().as_n(), Some("0.0000001"));
    }

    #[test]
    fn test_number_set_from_strs_dedups_canonical_text() {
        let set = AttributeValue::number_set_from_strs(["1", "1.0", "1e0", "2"]).unwrap();
        assert_eq!(set, AttributeValue::number_set([1, 2]).unwrap());
    }

    #[test]
    fn test_number_from_str_validation() {
        assert!(AttributeValue::number_from_str("12.50").is_ok());
        assert!(AttributeValue::number_from_str("-3e5").is_ok());
        assert!(AttributeValue::number_from_str("").is_err());
        assert!(AttributeValue::number_from_str(" 1").is_err());
        assert!(AttributeValue::number_from_str("inf").is_err());
        assert!(AttributeValue::number_from_str("NaN").is_err());
        assert!(AttributeValue::number_from_str("twelve").is_err());
        assert!(AttributeValue::number_from_str("1e").is_err());
        assert!(AttributeValue::number_from_str("1e99999").is_err());
        assert!(AttributeValue::number_from_str("0x10").is_err());
        assert!(AttributeValue::number_from_str(".").is_err());
    }

    #[test]
    fn test_empty_sets_are_rejected() {
        assert_eq!(
            AttributeValue::string_set(Vec::<String>::new()),
            Err(AttributeError::EmptySet("SS"))
        );
        assert_eq!(
            AttributeValue::number_set(Vec::<i64>::new()),
            Err(AttributeError::EmptySet("NS"))
        );
        assert_eq!(
            AttributeValue::binary_set(Vec::<Vec<u8>>::new()),
            Err(AttributeError::EmptySet("BS"))
        );
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let a = AttributeValue::string_set(["user", "manager"]).unwrap();
        let b = AttributeValue::string_set(["manager", "user"]).unwrap();
        assert_eq!(a, b);

        let c = AttributeValue::number_set([3, 1, 2]).unwrap();
        let d = AttributeValue::number_set([1, 2, 3]).unwrap();
        assert_eq!(c, d);
    }

    #[test]
    fn test_list_equality_respects_order() {
        let a = AttributeValue::list(["a".into(), "b".into()]);
        let b = AttributeValue::list(["b".into(), "a".into()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_set_construction_drops_duplicates() {
        let set = AttributeValue::string_set(["a", "b", "a"]).unwrap();
        assert_eq!(set.as_ss(), Some(&["a".to_string(), "b".to_string()][..]));
    }

    #[test]
    fn test_number_set_from_strs_validates_elements() {
        assert!(AttributeValue::number_set_from_strs(["1", "2.5"]).is_ok());
        assert_eq!(
            AttributeValue::number_set_from_strs(["1", "x"]),
            Err(AttributeError::InvalidNumber("x".to_string()))
        );
    }

    #[test]
    fn test_null_is_distinct_from_other_variants() {
        assert!(AttributeValue::null().is_null());
        assert_ne!(AttributeValue::Null, AttributeValue::S(String::new()));
        assert_ne!(AttributeValue::Null, AttributeValue::Bool(false));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(AttributeValue::string("x").type_name(), "S");
        assert_eq!(AttributeValue::binary(vec![1]).type_name(), "B");
        assert_eq!(AttributeValue::map([("a", AttributeValue::Null)]).type_name(), "M");
        assert_eq!(AttributeValue::bool(true).type_name(), "BOOL");
    }

    #[test]
    fn test_as_i64() {
        assert_eq!(AttributeValue::number(12_i64).as_i64(), Some(12));
        assert_eq!(AttributeValue::N("1.5".to_string()).as_i64(), None);
        assert_eq!(AttributeValue::string("12").as_i64(), None);
    }
}
