//! Value types for representing database values in a backend-agnostic way.
//!
//! The [`Value`] enum is the core type used throughout the query layer to
//! represent bound parameters, fetched columns and model attributes. It
//! supports the common SQL types and provides conversions from standard Rust
//! types, plus the loose comparisons result collections rely on.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use jad_rs_core::{JadError, JadResult};
use regex::Regex;

static LEADING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").expect("valid regex")
});

/// A backend-agnostic representation of a database value.
///
/// Serializes as plain JSON (`null`, numbers, strings, arrays), which is
/// what rows and collections expose to callers.
///
/// # Examples
///
/// ```
/// use jad_rs_db::value::Value;
///
/// let v = Value::from(42_i64);
/// assert_eq!(v, Value::Int(42));
///
/// let v = Value::from("hello");
/// assert_eq!(v, Value::String("hello".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// Raw binary data.
    Bytes(Vec<u8>),
    /// A date without time.
    Date(chrono::NaiveDate),
    /// A date and time without timezone.
    DateTime(chrono::NaiveDateTime),
    /// A JSON value.
    Json(serde_json::Value),
    /// A list of values (for IN clauses and multi-value predicates).
    List(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Self::Json(j) => write!(f, "{j}"),
            Self::List(vals) => {
                write!(f, "[")?;
                for (i, v) in vals.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

// ── From implementations ───────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<chrono::NaiveDate> for Value {
    fn from(v: chrono::NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<chrono::NaiveDateTime> for Value {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Self::Null,
        }
    }
}

impl Value {
    /// Returns `true` if this value is `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for "empty" values: NULL, `false`, zero, `""`, `"0"`
    /// and empty lists or blobs.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Int(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::String(s) => s.is_empty() || s == "0",
            Self::Bytes(b) => b.is_empty(),
            Self::Date(_) | Self::DateTime(_) => false,
            Self::Json(j) => match j {
                serde_json::Value::Null => true,
                serde_json::Value::Bool(b) => !b,
                serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
                serde_json::Value::String(s) => s.is_empty() || s == "0",
                serde_json::Value::Array(a) => a.is_empty(),
                serde_json::Value::Object(o) => o.is_empty(),
            },
            Self::List(l) => l.is_empty(),
        }
    }

    /// Attempts to extract a boolean value.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to extract a float value.
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric coercion: integers, floats, booleans and numeric strings.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Self::Json(serde_json::Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    /// Lenient numeric cast: like [`as_number`](Self::as_number), but a
    /// string contributes its leading numeric prefix (`"12abc"` is `12`,
    /// `"abc"` is `0`). NULL, lists and non-numeric JSON are `None`.
    pub fn leading_number(&self) -> Option<f64> {
        match self {
            Self::String(s) => Some(
                LEADING_NUMBER_RE
                    .find(s)
                    .and_then(|m| m.as_str().trim_start().parse::<f64>().ok())
                    .filter(|n| n.is_finite())
                    .unwrap_or(0.0),
            ),
            other => other.as_number(),
        }
    }

    /// Returns `true` for integers, floats and strings that parse as numbers.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Bool(_)) && self.as_number().is_some()
    }

    /// Three-way comparison used for sorting collections.
    ///
    /// NULL sorts lowest. Two numeric values compare numerically; anything
    /// else compares by string form. `NaN` compares equal to everything.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Null, _) => Ordering::Less,
            (_, Self::Null) => Ordering::Greater,
            _ => {
                let numeric = |v: &Self| {
                    if matches!(v, Self::Bool(_)) || v.is_numeric() {
                        v.as_number()
                    } else {
                        None
                    }
                };
                match (numeric(self), numeric(other)) {
                    (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                    _ => self.to_string().cmp(&other.to_string()),
                }
            }
        }
    }

    /// Converts to a plain JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Trait for converting a [`Value`] to a concrete Rust type.
pub trait FromValue: Sized {
    /// Attempts to convert a value reference to this type.
    fn from_value(value: &Value) -> JadResult<Self>;
}

fn type_mismatch(expected: &str, value: &Value) -> JadError {
    JadError::DatabaseError(format!("Expected {expected}, got {value:?}"))
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> JadResult<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            Value::String(s) => s.trim().parse().map_err(|_| type_mismatch("Int", value)),
            _ => Err(type_mismatch("Int", value)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> JadResult<Self> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide)
            .map_err(|e| JadError::DatabaseError(format!("Int value out of i32 range: {e}")))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> JadResult<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            _ => Err(type_mismatch("Float", value)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> JadResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            // SQLite has no boolean storage class.
            Value::Int(i) => Ok(*i != 0),
            _ => Err(type_mismatch("Bool", value)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> JadResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(type_mismatch("String", value)),
        }
    }
}

impl FromValue for chrono::NaiveDate {
    fn from_value(value: &Value) -> JadResult<Self> {
        match value {
            Value::Date(d) => Ok(*d),
            Value::String(s) => chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| type_mismatch("Date", value)),
            _ => Err(type_mismatch("Date", value)),
        }
    }
}

impl FromValue for chrono::NaiveDateTime {
    fn from_value(value: &Value) -> JadResult<Self> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            Value::String(s) => chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .map_err(|_| type_mismatch("DateTime", value)),
            _ => Err(type_mismatch("DateTime", value)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> JadResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> JadResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_integers() {
        assert_eq!(Value::from(42_i32), Value::Int(42));
        assert_eq!(Value::from(42_i64), Value::Int(42));
        assert_eq!(Value::from(42_u32), Value::Int(42));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(Some(42_i64)), Value::Int(42));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_display_dates_use_sql_format() {
        let d = chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(Value::Date(d).to_string(), "2024-01-15");
        let dt = d.and_hms_opt(9, 5, 0).unwrap();
        assert_eq!(Value::DateTime(dt).to_string(), "2024-01-15 09:05:00");
    }

    #[test]
    fn test_display_list() {
        let list = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(list.to_string(), "[1, 2, 3]");
        assert_eq!(Value::Null.to_string(), "NULL");
    }

    #[test]
    fn test_is_blank() {
        assert!(Value::Null.is_blank());
        assert!(Value::String(String::new()).is_blank());
        assert!(Value::String("0".into()).is_blank());
        assert!(Value::Int(0).is_blank());
        assert!(Value::Bool(false).is_blank());
        assert!(Value::List(vec![]).is_blank());
        assert!(!Value::String("a".into()).is_blank());
        assert!(!Value::Int(7).is_blank());
        assert!(!Value::Bool(true).is_blank());
    }

    #[test]
    fn test_as_number() {
        assert_eq!(Value::Int(3).as_number(), Some(3.0));
        assert_eq!(Value::Float(1.5).as_number(), Some(1.5));
        assert_eq!(Value::String(" 12.5 ".into()).as_number(), Some(12.5));
        assert_eq!(Value::Bool(true).as_number(), Some(1.0));
        assert_eq!(Value::String("abc".into()).as_number(), None);
        assert_eq!(Value::Null.as_number(), None);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(Value::String("12abc".into()).leading_number(), Some(12.0));
        assert_eq!(Value::String(" -3.5kg".into()).leading_number(), Some(-3.5));
        assert_eq!(Value::String(".5".into()).leading_number(), Some(0.5));
        assert_eq!(Value::String("1e3x".into()).leading_number(), Some(1000.0));
        assert_eq!(Value::String("abc".into()).leading_number(), Some(0.0));
        assert_eq!(Value::Int(4).leading_number(), Some(4.0));
        assert_eq!(Value::Null.leading_number(), None);
    }

    #[test]
    fn test_is_numeric() {
        assert!(Value::String("42".into()).is_numeric());
        assert!(Value::Float(0.5).is_numeric());
        assert!(!Value::Bool(true).is_numeric());
        assert!(!Value::String("4x".into()).is_numeric());
    }

    #[test]
    fn test_compare_numbers_numerically() {
        assert_eq!(Value::Int(9).compare(&Value::Int(10)), Ordering::Less);
        assert_eq!(Value::String("9".into()).compare(&Value::Int(10)), Ordering::Less);
        assert_eq!(Value::Float(2.5).compare(&Value::Int(2)), Ordering::Greater);
    }

    #[test]
    fn test_compare_strings_lexically() {
        assert_eq!(
            Value::from("apple").compare(&Value::from("banana")),
            Ordering::Less
        );
        assert_eq!(Value::from("b").compare(&Value::from("b")), Ordering::Equal);
    }

    #[test]
    fn test_compare_null_lowest() {
        assert_eq!(Value::Null.compare(&Value::Int(-100)), Ordering::Less);
        assert_eq!(Value::from("x").compare(&Value::Null), Ordering::Greater);
        assert_eq!(Value::Null.compare(&Value::Null), Ordering::Equal);
    }

    #[test]
    fn test_serializes_as_plain_json() {
        assert_eq!(Value::Int(1).to_json(), serde_json::json!(1));
        assert_eq!(Value::from("a").to_json(), serde_json::json!("a"));
        assert_eq!(Value::Null.to_json(), serde_json::Value::Null);
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::from("b")]).to_json(),
            serde_json::json!([1, "b"])
        );
    }

    #[test]
    fn test_from_value_conversions() {
        assert_eq!(i64::from_value(&Value::Int(5)).unwrap(), 5);
        assert_eq!(i64::from_value(&Value::from("12")).unwrap(), 12);
        assert!(i64::from_value(&Value::from("x")).is_err());
        assert!(bool::from_value(&Value::Int(1)).unwrap());
        assert_eq!(f64::from_value(&Value::Int(2)).unwrap(), 2.0);
        assert_eq!(Option::<i64>::from_value(&Value::Null).unwrap(), None);
        assert!(i32::from_value(&Value::Int(i64::MAX)).is_err());
    }

    #[test]
    fn test_from_value_dates_from_text() {
        let d = chrono::NaiveDate::from_value(&Value::from("2026-01-26")).unwrap();
        assert_eq!(d, chrono::NaiveDate::from_ymd_opt(2026, 1, 26).unwrap());
        let dt = chrono::NaiveDateTime::from_value(&Value::from("2026-01-26 10:00:00")).unwrap();
        assert_eq!(dt.date(), d);
        assert!(chrono::NaiveDate::from_value(&Value::from("26/01/2026")).is_err());
    }
}
