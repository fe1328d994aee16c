//! Ordered field maps.
//!
//! A [`Row`] is what a query returns per record and what models keep as
//! their attribute bag: column names mapped to [`Value`]s, in insertion
//! order. Writing an existing key replaces its value in place.

use std::ops::Index;

use jad_rs_core::JadResult;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::value::{FromValue, Value};

static NULL_VALUE: Value = Value::Null;

/// An ordered `column -> value` map.
///
/// # Examples
///
/// ```
/// use jad_rs_db::row::Row;
/// use jad_rs_db::value::Value;
///
/// let mut row = Row::new();
/// row.set("name", "Ada");
/// row.set("age", 36);
/// row.set("name", "Grace");
/// assert_eq!(row.columns().collect::<Vec<_>>(), ["name", "age"]);
/// assert_eq!(row["name"], Value::from("Grace"));
/// assert_eq!(row["missing"], Value::Null);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    /// Creates an empty row.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builds a row from parallel column and value vectors. Extra entries on
    /// either side are dropped.
    pub fn from_columns(columns: Vec<String>, values: Vec<Value>) -> Self {
        columns.into_iter().zip(values).collect()
    }

    /// Sets `column` to `value`; last write wins, position is kept.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((column, value)),
        }
    }

    /// Merges every entry of `other` into this row.
    pub fn merge(&mut self, other: Self) {
        for (column, value) in other.entries {
            self.set(column, value);
        }
    }

    /// Returns the raw value at `column`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// Gets a typed value by column name.
    pub fn get_as<T: FromValue>(&self, column: &str) -> JadResult<T> {
        T::from_value(self.get(column).unwrap_or(&NULL_VALUE))
    }

    /// Returns `true` if `column` is present (even when NULL).
    pub fn contains(&self, column: &str) -> bool {
        self.entries.iter().any(|(c, _)| c == column)
    }

    /// Removes `column` and returns its value.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(c, _)| c == column)?;
        Some(self.entries.remove(idx).1)
    }

    /// Keeps only the columns accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(c, _)| keep(c));
    }

    /// Returns the column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    /// Iterates over `(column, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts to a JSON object. Use `serde_json::to_string` on the row
    /// itself when column order matters.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(c, v)| (c.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl Index<&str> for Row {
    type Output = Value;

    /// Missing columns read as NULL.
    fn index(&self, column: &str) -> &Value {
        self.get(column).unwrap_or(&NULL_VALUE)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (k, v) in iter {
            row.set(k, v);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, value) in &self.entries {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Builds a [`Row`] from `column => value` pairs.
///
/// ```
/// use jad_rs_db::row;
///
/// let r = row! { "title" => "Hello", "views" => 3 };
/// assert_eq!(r.len(), 2);
/// ```
#[macro_export]
macro_rules! row {
    () => { $crate::row::Row::new() };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut r = $crate::row::Row::new();
        $( r.set($column, $value); )+
        r
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_last_write_wins_in_place() {
        let mut row = Row::new();
        row.set("a", 1);
        row.set("b", 2);
        row.set("a", 3);
        assert_eq!(row.len(), 2);
        assert_eq!(row.columns().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(row["a"], Value::Int(3));
    }

    #[test]
    fn test_from_columns() {
        let row = Row::from_columns(
            vec!["id".into(), "name".into()],
            vec![Value::Int(1), Value::from("x")],
        );
        assert_eq!(row.get_as::<i64>("id").unwrap(), 1);
        assert_eq!(row.get_as::<String>("name").unwrap(), "x");
    }

    #[test]
    fn test_get_as_missing_column_reads_null() {
        let row = Row::new();
        assert_eq!(row.get_as::<Option<i64>>("id").unwrap(), None);
        assert!(row.get_as::<i64>("id").is_err());
    }

    #[test]
    fn test_contains_and_remove() {
        let mut row = crate::row! { "id" => Value::Null, "name" => "x" };
        assert!(row.contains("id"));
        assert_eq!(row.remove("id"), Some(Value::Null));
        assert!(!row.contains("id"));
        assert_eq!(row.remove("id"), None);
    }

    #[test]
    fn test_merge_and_retain() {
        let mut row = crate::row! { "a" => 1, "b" => 2 };
        row.merge(crate::row! { "b" => 20, "c" => 30 });
        assert_eq!(row["b"], Value::Int(20));
        row.retain(|c| c != "a");
        assert_eq!(row.columns().collect::<Vec<_>>(), ["b", "c"]);
    }

    #[test]
    fn test_serialize_keeps_order() {
        let row = crate::row! { "z" => 1, "a" => "x" };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"z":1,"a":"x"}"#);
        assert_eq!(row.to_json()["a"], "x");
    }
}
