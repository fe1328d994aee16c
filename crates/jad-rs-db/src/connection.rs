//! Connection and statement traits.
//!
//! This is the bridge between the query layer (`jad-rs-db`) and the concrete
//! database drivers (`jad-rs-db-backends`). The query builder only ever
//! talks to a [`SharedConnection`]: it prepares SQL text carrying named
//! placeholders, binds one value per placeholder with a [`ParamType`] hint,
//! executes, then fetches rows or reads the affected-row count.
//!
//! All calls are synchronous and blocking.

use std::fmt;
use std::sync::Arc;

use jad_rs_core::JadResult;

use crate::row::Row;
use crate::value::Value;

/// Type hint attached to every bound value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// Bind as an integer.
    Int,
    /// Bind as text (NULL also carries this hint).
    Str,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "INT"),
            Self::Str => write!(f, "STR"),
        }
    }
}

/// A database connection able to prepare statements.
pub trait Connection: Send + Sync {
    /// Prepares `sql` for execution.
    fn prepare(&self, sql: &str) -> JadResult<Box<dyn Statement + '_>>;

    /// Short name of the driver (e.g. `"sqlite"`).
    fn vendor(&self) -> &str;
}

/// A prepared statement.
///
/// Values are bound by placeholder name (including the leading `:`). A
/// statement is executed once.
pub trait Statement {
    /// Binds `value` to `placeholder`.
    fn bind_value(&mut self, placeholder: &str, value: &Value, param_type: ParamType)
        -> JadResult<()>;

    /// Executes the statement. Returns `true` on success.
    fn execute(&mut self) -> JadResult<bool>;

    /// Returns every row produced by the last execution.
    fn fetch_all(&mut self) -> JadResult<Vec<Row>>;

    /// Number of rows changed by the last execution.
    fn row_count(&self) -> u64;

    /// Row id generated by this statement's INSERT.
    ///
    /// Captured during [`execute`](Self::execute) under the same lock as the
    /// write, so concurrent inserts on a shared connection cannot leak into
    /// it. Zero when nothing was generated.
    fn last_insert_id(&self) -> i64;
}

/// A connection handle shared by every builder and entity.
pub type SharedConnection = Arc<dyn Connection>;

/// Normalizes a value for binding and picks its type hint.
///
/// Integers bind as [`ParamType::Int`]. Everything else binds as text:
/// booleans become `"1"`/`""`, floats their shortest decimal form, dates
/// `YYYY-MM-DD` and datetimes `YYYY-MM-DD HH:MM:SS`, JSON and lists their
/// JSON text. Numeric strings stay strings. NULL stays NULL.
///
/// # Examples
///
/// ```
/// use jad_rs_db::connection::{bind_parameter, ParamType};
/// use jad_rs_db::value::Value;
///
/// assert_eq!(bind_parameter(&Value::Int(5)), (Value::Int(5), ParamType::Int));
/// assert_eq!(
///     bind_parameter(&Value::from("5")),
///     (Value::from("5"), ParamType::Str)
/// );
/// ```
pub fn bind_parameter(value: &Value) -> (Value, ParamType) {
    match value {
        Value::Int(i) => (Value::Int(*i), ParamType::Int),
        Value::Null => (Value::Null, ParamType::Str),
        Value::String(s) => (Value::String(s.clone()), ParamType::Str),
        Value::Bool(b) => (Value::String(if *b { "1" } else { "" }.to_string()), ParamType::Str),
        Value::Bytes(b) => (Value::Bytes(b.clone()), ParamType::Str),
        Value::Json(_) | Value::List(_) => (Value::String(value.to_json().to_string()), ParamType::Str),
        Value::Float(_) | Value::Date(_) | Value::DateTime(_) => {
            (Value::String(value.to_string()), ParamType::Str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_bind_as_int() {
        assert_eq!(bind_parameter(&Value::Int(-3)).1, ParamType::Int);
    }

    #[test]
    fn test_numeric_string_binds_as_str() {
        let (v, t) = bind_parameter(&Value::from("42"));
        assert_eq!(v, Value::from("42"));
        assert_eq!(t, ParamType::Str);
    }

    #[test]
    fn test_bool_coercion() {
        assert_eq!(bind_parameter(&Value::Bool(true)).0, Value::from("1"));
        assert_eq!(bind_parameter(&Value::Bool(false)).0, Value::from(""));
    }

    #[test]
    fn test_float_coercion() {
        assert_eq!(
            bind_parameter(&Value::Float(19.5)),
            (Value::from("19.5"), ParamType::Str)
        );
    }

    #[test]
    fn test_date_coercion() {
        let d = chrono::NaiveDate::from_ymd_opt(2026, 1, 26).unwrap();
        assert_eq!(bind_parameter(&Value::Date(d)).0, Value::from("2026-01-26"));
        let dt = d.and_hms_opt(8, 0, 1).unwrap();
        assert_eq!(
            bind_parameter(&Value::DateTime(dt)).0,
            Value::from("2026-01-26 08:00:01")
        );
    }

    #[test]
    fn test_json_and_list_coercion() {
        let j = Value::Json(serde_json::json!({"k": 1}));
        assert_eq!(bind_parameter(&j).0, Value::from(r#"{"k":1}"#));
        let l = Value::List(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(bind_parameter(&l).0, Value::from("[1,2]"));
    }

    #[test]
    fn test_null_keeps_str_hint() {
        assert_eq!(bind_parameter(&Value::Null), (Value::Null, ParamType::Str));
    }

    #[test]
    fn test_param_type_display() {
        assert_eq!(ParamType::Int.to_string(), "INT");
        assert_eq!(ParamType::Str.to_string(), "STR");
    }
}
