//! Result collections.
//!
//! A [`Collection`] wraps the items a query returned (raw [`Row`]s or
//! hydrated entities) and offers the usual list transforms. Every transform
//! returns a new collection and leaves the receiver untouched.
//!
//! Key-based operations (`sum`, `unique`, `sort_by`, `pluck`, `group_by`)
//! work on any item implementing [`Fields`]; a missing key reads as NULL.
//!
//! ```
//! use jad_rs_db::collection::Collection;
//! use jad_rs_db::query::SortDirection;
//! use jad_rs_db::row;
//! use jad_rs_db::value::Value;
//!
//! let orders = Collection::from(vec![
//!     row! { "customer" => "ada", "total" => 30 },
//!     row! { "customer" => "bob", "total" => 12.5 },
//!     row! { "customer" => "ada", "total" => "7.5" },
//! ]);
//!
//! assert_eq!(orders.sum("total"), 50.0);
//! assert_eq!(orders.unique("customer").count(), 2);
//! let sorted = orders.sort_by("total", SortDirection::Desc);
//! assert_eq!(sorted[0]["total"], Value::Int(30));
//! ```

use std::cmp::Ordering;
use std::ops::Index;

use jad_rs_core::JadResult;
use serde::Serialize;

use crate::query::SortDirection;
use crate::row::Row;
use crate::value::Value;

/// Keyed access shared by raw rows and model entities.
pub trait Fields {
    /// Returns the value stored under `key`, if any.
    fn field(&self, key: &str) -> Option<&Value>;
}

impl Fields for Row {
    fn field(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

/// Items sharing one value of the grouping key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group<T> {
    /// The shared key value.
    pub key: Value,
    /// Members, in their original order.
    pub items: Collection<T>,
}

/// An ordered, indexable list of query results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Collection<T> {
    /// Creates an empty collection.
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Applies `f` to every item.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Collection<U> {
        Collection {
            items: self.items.iter().map(f).collect(),
        }
    }

    /// Returns the first item.
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Returns the item at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Number of items.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Borrows the items as a slice.
    pub fn all(&self) -> &[T] {
        &self.items
    }

    /// Iterates over the items.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Consumes the collection and returns the items.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Clone> Collection<T> {
    /// Keeps the items for which `f` returns `true`, re-indexed densely.
    pub fn filter(&self, mut f: impl FnMut(&T) -> bool) -> Self {
        Self {
            items: self.items.iter().filter(|item| f(item)).cloned().collect(),
        }
    }
}

impl<T: Fields> Collection<T> {
    /// Sums `key` over all items, casting each value the lenient way
    /// ([`Value::leading_number`]): `"12abc"` adds 12, while non-numeric and
    /// missing values add nothing.
    pub fn sum(&self, key: &str) -> f64 {
        self.items
            .iter()
            .filter_map(|item| item.field(key).and_then(Value::leading_number))
            .sum()
    }

    /// Extracts `key` from every item.
    pub fn pluck(&self, key: &str) -> Collection<Value> {
        self.map(|item| field_or_null(item, key).clone())
    }
}

impl<T: Fields + Clone> Collection<T> {
    /// Keeps the first item for each distinct value of `key`.
    ///
    /// Values compare loosely: `1` and `"1"` are the same key.
    pub fn unique(&self, key: &str) -> Self {
        let mut seen: Vec<&Value> = Vec::new();
        let mut items = Vec::new();
        for item in &self.items {
            let value = field_or_null(item, key);
            if seen.iter().any(|s| s.compare(value) == Ordering::Equal) {
                continue;
            }
            seen.push(value);
            items.push(item.clone());
        }
        Self { items }
    }

    /// Stable sort on `key`.
    pub fn sort_by(&self, key: &str, direction: impl Into<SortDirection>) -> Self {
        let direction = direction.into();
        let mut items = self.items.clone();
        items.sort_by(|a, b| {
            let ord = field_or_null(a, key).compare(field_or_null(b, key));
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
        Self { items }
    }

    /// Groups items by the value of `key`, groups in first-seen order.
    pub fn group_by(&self, key: &str) -> Collection<Group<T>> {
        let mut groups: Vec<Group<T>> = Vec::new();
        for item in &self.items {
            let value = field_or_null(item, key);
            match groups
                .iter_mut()
                .find(|g| g.key.compare(value) == Ordering::Equal)
            {
                Some(group) => group.items.items.push(item.clone()),
                None => groups.push(Group {
                    key: value.clone(),
                    items: Collection {
                        items: vec![item.clone()],
                    },
                }),
            }
        }
        Collection { items: groups }
    }
}

impl<T: Serialize> Collection<T> {
    /// Serializes the items to a JSON array.
    pub fn to_json(&self) -> JadResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl<T: Fields> Fields for Group<T> {
    /// A group exposes its key under `"key"`.
    fn field(&self, key: &str) -> Option<&Value> {
        (key == "key").then_some(&self.key)
    }
}

fn field_or_null<'a, T: Fields>(item: &'a T, key: &str) -> &'a Value {
    static NULL: Value = Value::Null;
    item.field(key).unwrap_or(&NULL)
}

impl<T> From<Vec<T>> for Collection<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> Index<usize> for Collection<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn people() -> Collection<Row> {
        Collection::from(vec![
            row! { "name" => "ada", "city" => "paris", "age" => 36 },
            row! { "name" => "bob", "city" => "lyon", "age" => 25 },
            row! { "name" => "cyd", "city" => "paris", "age" => 25 },
            row! { "name" => "dee", "city" => "nice", "age" => "41" },
        ])
    }

    #[test]
    fn test_map_returns_new_collection() {
        let c = people();
        let names = c.map(|r| r["name"].to_string());
        assert_eq!(names.into_vec(), ["ada", "bob", "cyd", "dee"]);
        assert_eq!(c.len(), 4);
    }

    #[test]
    fn test_filter_reindexes() {
        let c = people().filter(|r| r["city"] == Value::from("paris"));
        assert_eq!(c.count(), 2);
        assert_eq!(c[1]["name"], Value::from("cyd"));
    }

    #[test]
    fn test_first_and_empty() {
        let empty: Collection<Row> = Collection::new();
        assert!(empty.first().is_none());
        assert!(empty.is_empty());
        assert_eq!(people().first().unwrap()["name"], Value::from("ada"));
    }

    #[test]
    fn test_sum_coerces_and_defaults() {
        let c = people();
        assert_eq!(c.sum("age"), 127.0);
        assert_eq!(c.sum("missing"), 0.0);
        let mixed = Collection::from(vec![row! { "v" => "abc" }, row! { "v" => 2.5 }]);
        assert_eq!(mixed.sum("v"), 2.5);
    }

    #[test]
    fn test_sum_uses_leading_numeric_prefix() {
        let c = Collection::from(vec![
            row! { "w" => "12abc" },
            row! { "w" => "3.5kg" },
            row! { "w" => "abc" },
            row! { "w" => 1 },
        ]);
        assert_eq!(c.sum("w"), 16.5);
    }

    #[test]
    fn test_unique_first_seen_wins() {
        let u = people().unique("city");
        let names: Vec<_> = u.iter().map(|r| r["name"].to_string()).collect();
        assert_eq!(names, ["ada", "bob", "dee"]);
    }

    #[test]
    fn test_unique_loose_equality() {
        let c = Collection::from(vec![row! { "id" => 1 }, row! { "id" => "1" }, row! { "id" => 2 }]);
        assert_eq!(c.unique("id").count(), 2);
    }

    #[test]
    fn test_sort_by_is_stable() {
        let sorted = people().sort_by("age", SortDirection::Asc);
        let names: Vec<_> = sorted.iter().map(|r| r["name"].to_string()).collect();
        // bob and cyd share age 25 and keep their relative order
        assert_eq!(names, ["bob", "cyd", "ada", "dee"]);

        let desc = people().sort_by("age", "desc");
        assert_eq!(desc[0]["name"], Value::from("dee"));
        assert_eq!(desc[3]["name"], Value::from("cyd"));
    }

    #[test]
    fn test_sort_by_missing_key_sorts_first() {
        let c = Collection::from(vec![row! { "n" => 2 }, row! { "x" => 1 }]);
        let sorted = c.sort_by("n", SortDirection::Asc);
        assert!(!sorted[0].contains("n"));
    }

    #[test]
    fn test_pluck() {
        let ages = people().pluck("age");
        assert_eq!(ages.len(), 4);
        assert_eq!(ages[0], Value::Int(36));
        assert_eq!(people().pluck("nope")[0], Value::Null);
    }

    #[test]
    fn test_group_by_first_seen_order() {
        let groups = people().group_by("city");
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].key, Value::from("paris"));
        assert_eq!(groups[0].items.len(), 2);
        assert_eq!(groups[1].key, Value::from("lyon"));
        assert_eq!(groups[2].items[0]["name"], Value::from("dee"));
        assert_eq!(groups.pluck("key")[1], Value::from("lyon"));
    }

    #[test]
    fn test_to_json() {
        let c = Collection::from(vec![row! { "id" => 1 }]);
        assert_eq!(c.to_json().unwrap(), serde_json::json!([{"id": 1}]));
        let g = c.group_by("id");
        assert_eq!(
            g.to_json().unwrap(),
            serde_json::json!([{"key": 1, "items": [{"id": 1}]}])
        );
    }

    #[test]
    fn test_iteration() {
        let c = people();
        let mut n = 0;
        for _ in &c {
            n += 1;
        }
        assert_eq!(n, 4);
        let collected: Collection<Row> = c.into_iter().take(2).collect();
        assert_eq!(collected.len(), 2);
    }
}
