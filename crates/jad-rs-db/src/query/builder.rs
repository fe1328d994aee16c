//! The fluent query builder.
//!
//! A [`QueryBuilder`] accumulates the structural state of one query (table,
//! projection, joins, predicate, grouping, ordering, paging) through method
//! chaining, then compiles and runs it when a terminal method is called.
//!
//! # Predicate compilation
//!
//! Each `where*` call appends one parenthesized fragment to a single
//! predicate string, prefixed with `WHERE` for the first fragment and with
//! the connective (`AND` / `OR`) afterwards. Values never appear in the SQL
//! text: each one gets a named placeholder whose suffix is the size of the
//! binding map at allocation time, so repeated column/operator pairs never
//! collide:
//!
//! | call | placeholder |
//! |---|---|
//! | scalar `where_` | `:p{n}` |
//! | list `where_` | `:p_{n}`, `:p_{n+1}`, ... |
//! | `where_in` family | `:p_in_{n}`, ... |
//! | `where_between` | `:p{n}`, `:p{n+1}` |
//! | `update` SET list | `:u_{column}` |
//! | `insert` | `:{column}` |
//!
//! # Terminal methods
//!
//! Every terminal comes in two forms. The strict form (`try_get`,
//! `try_insert`, ...) returns a [`JadResult`]. The plain form (`get`,
//! `insert`, ...) converts failures into an empty collection or `None`.
//! Both forms log execution failures with the SQL and its bindings.
//!
//! ```
//! # use std::sync::Arc;
//! # use jad_rs_db::connection::{Connection, SharedConnection, Statement};
//! # use jad_rs_core::{JadError, JadResult};
//! # struct Offline;
//! # impl Connection for Offline {
//! #     fn prepare(&self, _: &str) -> JadResult<Box<dyn Statement + '_>> {
//! #         Err(JadError::OperationalError("offline".into()))
//! #     }
//! #     fn vendor(&self) -> &str { "offline" }
//! # }
//! use jad_rs_db::query::QueryBuilder;
//! use jad_rs_db::value::Value;
//!
//! # let conn: SharedConnection = Arc::new(Offline);
//! let qb = QueryBuilder::new(conn)
//!     .table("users")
//!     .where_("email", "=", "a@b.com")?
//!     .or_where("email", "=", "c@d.com")?;
//!
//! assert_eq!(
//!     qb.to_sql(),
//!     "SELECT * FROM users  WHERE  (email = ( :p0 ))  OR  (email = ( :p1 )) "
//! );
//! assert_eq!(qb.bindings().get(":p1"), Some(&Value::from("c@d.com")));
//! # Ok::<(), JadError>(())
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use jad_rs_core::logging::query_span;
use jad_rs_core::{JadError, JadResult};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::{error, info, warn};

use crate::collection::Collection;
use crate::connection::{bind_parameter, Connection, SharedConnection, Statement};
use crate::model::{Entity, Model};
use crate::query::{Operator, SortDirection};
use crate::row::Row;
use crate::value::Value;

/// Builds a query result item from a fetched row.
///
/// [`Row`] is the identity hydration; model entities keep the connection
/// so they can save or delete themselves later.
pub trait FromRow: Sized {
    /// Converts `row` into `Self`.
    fn from_row(row: Row, conn: &SharedConnection) -> Self;
}

impl FromRow for Row {
    fn from_row(row: Row, _conn: &SharedConnection) -> Self {
        row
    }
}

// ── Bindings ─────────────────────────────────────────────────────────

/// Ordered `placeholder -> value` map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    entries: Vec<(String, Value)>,
}

impl Bindings {
    fn push(&mut self, placeholder: String, value: Value) {
        self.entries.push((placeholder, value));
    }

    /// Returns the value bound to `placeholder` (including the leading `:`).
    pub fn get(&self, placeholder: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(p, _)| p == placeholder)
            .map(|(_, v)| v)
    }

    /// Number of bound values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(placeholder, value)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(p, v)| (p.as_str(), v))
    }

    /// Placeholder names in allocation order.
    pub fn placeholders(&self) -> Vec<&str> {
        self.entries.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl FromIterator<(String, Value)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Bindings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (placeholder, value) in &self.entries {
            map.serialize_entry(placeholder, value)?;
        }
        map.end()
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

impl Connective {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

// ── QueryBuilder ─────────────────────────────────────────────────────

/// A fluent, single-query SQL builder bound to one connection.
///
/// `T` is the result item type: [`Row`] for raw maps, or
/// [`Entity<M>`](crate::model::Entity) after [`set_model`](Self::set_model).
pub struct QueryBuilder<T = Row> {
    conn: SharedConnection,
    table: String,
    select: Vec<String>,
    joins: String,
    where_sql: String,
    bindings: Bindings,
    order_by: Vec<String>,
    group_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    debug: bool,
    _output: PhantomData<fn() -> T>,
}

impl<T> Clone for QueryBuilder<T> {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            table: self.table.clone(),
            select: self.select.clone(),
            joins: self.joins.clone(),
            where_sql: self.where_sql.clone(),
            bindings: self.bindings.clone(),
            order_by: self.order_by.clone(),
            group_by: self.group_by.clone(),
            limit: self.limit,
            offset: self.offset,
            debug: self.debug,
            _output: PhantomData,
        }
    }
}

impl<T> fmt::Debug for QueryBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("vendor", &self.conn.vendor())
            .field("table", &self.table)
            .field("where", &self.where_sql)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

impl QueryBuilder<Row> {
    /// Creates an empty builder returning raw rows.
    pub fn new(conn: SharedConnection) -> Self {
        Self {
            conn,
            table: String::new(),
            select: Vec::new(),
            joins: String::new(),
            where_sql: String::new(),
            bindings: Bindings::default(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            limit: None,
            offset: None,
            debug: false,
            _output: PhantomData,
        }
    }
}

impl<T: FromRow> QueryBuilder<T> {
    // ── Configuration ────────────────────────────────────────────────

    /// Switches the result item type, keeping all accumulated state.
    pub fn hydrate<U: FromRow>(self) -> QueryBuilder<U> {
        QueryBuilder {
            conn: self.conn,
            table: self.table,
            select: self.select,
            joins: self.joins,
            where_sql: self.where_sql,
            bindings: self.bindings,
            order_by: self.order_by,
            group_by: self.group_by,
            limit: self.limit,
            offset: self.offset,
            debug: self.debug,
            _output: PhantomData,
        }
    }

    /// Makes reads return [`Entity<M>`] instead of raw rows.
    pub fn set_model<M: Model>(self) -> QueryBuilder<Entity<M>> {
        self.hydrate()
    }

    /// Logs the compiled SQL and every binding before execution.
    #[must_use]
    pub fn debug(mut self, enable: bool) -> Self {
        self.debug = enable;
        self
    }

    /// Sets the active table.
    #[must_use]
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = name.into();
        self
    }

    /// Returns the active table.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Replaces the projection. An empty list selects `*`.
    #[must_use]
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Appends `INNER JOIN table ON condition`. Both parts are trusted SQL.
    #[must_use]
    pub fn innerjoin(mut self, table: &str, on: &str) -> Self {
        self.joins.push_str(&format!("INNER JOIN {table} ON {on} "));
        self
    }

    /// Appends `LEFT JOIN table ON condition`. Both parts are trusted SQL.
    #[must_use]
    pub fn leftjoin(mut self, table: &str, on: &str) -> Self {
        self.joins.push_str(&format!("LEFT JOIN {table} ON {on} "));
        self
    }

    // ── Predicates ───────────────────────────────────────────────────

    /// Adds `AND (column operator value)`.
    ///
    /// Fails with [`JadError::InvalidOperator`] when `operator` is not
    /// allow-listed; nothing is appended in that case.
    pub fn where_(self, column: &str, operator: &str, value: impl Into<Value>) -> JadResult<Self> {
        self.add_condition(column, operator, value.into(), Connective::And, false)
    }

    /// Adds `OR (column operator value)`.
    pub fn or_where(self, column: &str, operator: &str, value: impl Into<Value>) -> JadResult<Self> {
        self.add_condition(column, operator, value.into(), Connective::Or, false)
    }

    /// Adds `AND NOT (column operator value)`.
    pub fn where_not(self, column: &str, operator: &str, value: impl Into<Value>) -> JadResult<Self> {
        self.add_condition(column, operator, value.into(), Connective::And, true)
    }

    /// Adds `OR NOT (column operator value)`.
    pub fn or_where_not(
        self,
        column: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> JadResult<Self> {
        self.add_condition(column, operator, value.into(), Connective::Or, true)
    }

    /// Adds `AND (column IN (...))`. An empty list matches nothing.
    #[must_use]
    pub fn where_in<I>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.push_where_in(column, collect_values(values), Operator::In, Connective::And);
        self
    }

    /// Adds `AND (column NOT IN (...))`. An empty list matches everything.
    #[must_use]
    pub fn where_not_in<I>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.push_where_in(column, collect_values(values), Operator::NotIn, Connective::And);
        self
    }

    /// Adds `OR (column IN (...))`.
    #[must_use]
    pub fn or_where_in<I>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.push_where_in(column, collect_values(values), Operator::In, Connective::Or);
        self
    }

    /// Adds `OR (column NOT IN (...))`.
    #[must_use]
    pub fn or_where_not_in<I>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.push_where_in(column, collect_values(values), Operator::NotIn, Connective::Or);
        self
    }

    /// Adds `AND (column BETWEEN low AND high)`.
    #[must_use]
    pub fn where_between(
        mut self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        let start = self.fragment_start(Connective::And);
        let n = self.bindings.len();
        let (lo, hi) = (format!(":p{n}"), format!(":p{}", n + 1));
        self.where_sql
            .push_str(&format!("{start}({column} BETWEEN {lo} AND {hi})"));
        self.bindings.push(lo, low.into());
        self.bindings.push(hi, high.into());
        self
    }

    /// Appends a trusted SQL condition with `AND`. Nothing is bound.
    #[must_use]
    pub fn where_raw(mut self, condition: &str) -> Self {
        self.push_raw(condition, Connective::And);
        self
    }

    /// Appends a trusted SQL condition with `OR`. Nothing is bound.
    #[must_use]
    pub fn or_where_raw(mut self, condition: &str) -> Self {
        self.push_raw(condition, Connective::Or);
        self
    }

    // ── Ordering, grouping, paging ───────────────────────────────────

    /// Appends `column direction` to the `ORDER BY` list.
    #[must_use]
    pub fn order_by(mut self, column: &str, direction: impl Into<SortDirection>) -> Self {
        self.order_by
            .push(format!("{column} {}", direction.into().as_sql()));
        self
    }

    /// Appends columns to the `GROUP BY` list.
    #[must_use]
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Sets `LIMIT`.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets `OFFSET`. Only emitted together with a limit.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    // ── Compilation ──────────────────────────────────────────────────

    /// Compiles the SELECT statement. Pure: calling it twice yields the
    /// same text.
    pub fn to_sql(&self) -> String {
        let projection = if self.select.is_empty() {
            "*".to_string()
        } else {
            self.select.join(", ")
        };

        let mut sql = format!(
            "SELECT {projection} FROM {} {}{}",
            self.table, self.joins, self.where_sql
        );

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = self.offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }
        sql
    }

    /// The values bound to the predicate so far.
    pub const fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Runs the query and hydrates every row.
    ///
    /// Without an explicit ordering, `ORDER BY <table>.created_at DESC` is
    /// appended first (and kept on the builder).
    pub fn try_get(&mut self) -> JadResult<Collection<T>> {
        let _span = query_span(&self.table, "select").entered();
        let rows = self.fetch_rows("get")?;
        Ok(rows
            .into_iter()
            .map(|row| T::from_row(row, &self.conn))
            .collect())
    }

    /// Like [`try_get`](Self::try_get), but a failure yields an empty
    /// collection.
    pub fn get(&mut self) -> Collection<T> {
        self.try_get().unwrap_or_default()
    }

    /// Returns the first item of [`get`](Self::get).
    pub fn first(&mut self) -> Option<T> {
        self.get().into_iter().next()
    }

    /// Counts matching rows with `COUNT(*) AS value`. The projection is
    /// restored afterwards, whatever the outcome.
    pub fn try_count(&mut self) -> JadResult<i64> {
        let _span = query_span(&self.table, "count").entered();
        let projection = std::mem::replace(&mut self.select, vec!["COUNT(*) AS value".to_string()]);
        let result = self.fetch_rows("count");
        self.select = projection;

        let rows = result?;
        Ok(rows
            .first()
            .and_then(|row| row.get_as::<Option<i64>>("value").ok().flatten())
            .unwrap_or(0))
    }

    /// Like [`try_count`](Self::try_count), but a failure counts as zero.
    pub fn count(&mut self) -> i64 {
        self.try_count().unwrap_or(0)
    }

    /// Shorthand for `where_("id", "=", id)` followed by [`first`](Self::first).
    pub fn find(&mut self, id: impl Into<Value>) -> Option<T> {
        self.push_condition("id", Operator::Eq, id.into(), Connective::And, false);
        self.first()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Inserts one row and returns the generated id.
    ///
    /// Refuses (without contacting the connection) when no table is set or
    /// `values` is empty. The builder state is reset afterwards, whatever
    /// the outcome.
    pub fn try_insert(&mut self, values: Row) -> JadResult<i64> {
        let result = self.insert_inner(&values);
        self.reset_state();
        result
    }

    /// Like [`try_insert`](Self::try_insert), but failures yield `None`.
    pub fn insert(&mut self, values: Row) -> Option<i64> {
        self.try_insert(values).ok()
    }

    /// Updates the matching rows and returns how many changed.
    ///
    /// SET placeholders are `:u_<column>` so they never collide with
    /// predicate placeholders. An empty predicate is allowed and updates the
    /// whole table (a warning is logged). The builder state is reset
    /// afterwards, whatever the outcome.
    pub fn try_update(&mut self, values: Row) -> JadResult<u64> {
        let result = self.update_inner(&values);
        self.reset_state();
        result
    }

    /// Like [`try_update`](Self::try_update), but failures yield `None`.
    pub fn update(&mut self, values: Row) -> Option<u64> {
        self.try_update(values).ok()
    }

    /// Deletes the matching rows and returns how many were removed.
    ///
    /// Refuses when no table is set or the predicate is empty, so a full
    /// table delete cannot be built. The builder state is reset afterwards,
    /// whatever the outcome.
    pub fn try_delete(&mut self) -> JadResult<u64> {
        let result = self.delete_inner();
        self.reset_state();
        result
    }

    /// Like [`try_delete`](Self::try_delete), but failures yield `None`.
    pub fn delete(&mut self) -> Option<u64> {
        self.try_delete().ok()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn fragment_start(&self, connective: Connective) -> String {
        if self.where_sql.is_empty() {
            " WHERE ".to_string()
        } else {
            format!(" {} ", connective.as_sql())
        }
    }

    fn add_condition(
        mut self,
        column: &str,
        operator: &str,
        value: Value,
        connective: Connective,
        negate: bool,
    ) -> JadResult<Self> {
        let op = operator.parse::<Operator>().map_err(|err| {
            error!(column, operator, "{err}");
            err
        })?;
        self.push_condition(column, op, value, connective, negate);
        Ok(self)
    }

    fn push_condition(
        &mut self,
        column: &str,
        op: Operator,
        value: Value,
        connective: Connective,
        negate: bool,
    ) {
        let start = self.fragment_start(connective);
        let negation = if negate { "NOT " } else { "" };

        let clause = if op.is_null_check() {
            format!(" ({column} {op}) ")
        } else if let Value::List(items) = value {
            if !op.is_membership() {
                // TODO: reject list operands for scalar operators once callers are audited.
                warn!(column, operator = %op, "List value used with a scalar operator. Did you mean IN or NOT IN?");
            }
            if items.is_empty() {
                let always = if op == Operator::NotIn { "1 = 1" } else { "0 = 1" };
                format!(" ({always}) ")
            } else {
                let base = self.bindings.len();
                let mut placeholders = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    let placeholder = format!(":p_{}", base + i);
                    placeholders.push(placeholder.clone());
                    self.bindings.push(placeholder, item);
                }
                format!(" ({column} {op} ( {} )) ", placeholders.join(", "))
            }
        } else {
            let placeholder = format!(":p{}", self.bindings.len());
            let clause = format!(" ({column} {op} ( {placeholder} )) ");
            self.bindings.push(placeholder, value);
            clause
        };

        self.where_sql.push_str(&start);
        self.where_sql.push_str(negation);
        self.where_sql.push_str(&clause);
    }

    fn push_where_in(
        &mut self,
        column: &str,
        values: Vec<Value>,
        op: Operator,
        connective: Connective,
    ) {
        let start = self.fragment_start(connective);

        if values.is_empty() {
            let always = if op == Operator::In { " (0 = 1) " } else { " (1 = 1) " };
            self.where_sql.push_str(&start);
            self.where_sql.push_str(always);
            return;
        }

        let base = self.bindings.len();
        let mut placeholders = Vec::with_capacity(values.len());
        for (i, value) in values.into_iter().enumerate() {
            let placeholder = format!(":p_in_{}", base + i);
            placeholders.push(placeholder.clone());
            self.bindings.push(placeholder, value);
        }
        self.where_sql.push_str(&format!(
            "{start} ({column} {op} ({})) ",
            placeholders.join(", ")
        ));
    }

    fn push_raw(&mut self, condition: &str, connective: Connective) {
        let start = self.fragment_start(connective);
        self.where_sql.push_str(&format!("{start}{condition} "));
    }

    fn insert_inner(&self, values: &Row) -> JadResult<i64> {
        if self.table.is_empty() {
            warn!(operation = "insert", "Table name not specified. Use table(name) first.");
            return Err(refused("insert", "table name not specified"));
        }
        if values.is_empty() {
            warn!(table = %self.table, operation = "insert", "No values provided for insertion.");
            return Err(refused("insert", "no values provided"));
        }

        let _span = query_span(&self.table, "insert").entered();
        let columns: Vec<&str> = values.columns().collect();
        let placeholders: Vec<String> = columns.iter().map(|c| format!(":{c}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders.join(", ")
        );
        let bindings: Bindings = values
            .iter()
            .map(|(column, value)| (format!(":{column}"), value.clone()))
            .collect();

        self.execute_write(&sql, &bindings, "insert", |stmt| stmt.last_insert_id())
    }

    fn update_inner(&self, values: &Row) -> JadResult<u64> {
        if self.table.is_empty() {
            warn!(operation = "update", "Table name not specified. Use table(name) first.");
            return Err(refused("update", "table name not specified"));
        }
        if values.is_empty() {
            warn!(table = %self.table, operation = "update", "No values provided for update.");
            return Err(refused("update", "no values provided"));
        }
        if self.where_sql.is_empty() {
            warn!(table = %self.table, "UPDATE without a WHERE clause affects every row");
        }

        let _span = query_span(&self.table, "update").entered();
        let mut set = Vec::with_capacity(values.len());
        let mut all = Bindings::default();
        for (column, value) in values.iter() {
            let placeholder = format!(":u_{column}");
            set.push(format!("{column} = {placeholder}"));
            all.push(placeholder, value.clone());
        }
        for (placeholder, value) in self.bindings.iter() {
            all.push(placeholder.to_string(), value.clone());
        }

        let sql = format!("UPDATE {} SET {} {}", self.table, set.join(", "), self.where_sql);
        self.run_write(&sql, &all, "update")
    }

    fn delete_inner(&self) -> JadResult<u64> {
        if self.table.is_empty() {
            error!(operation = "delete", "Table name not specified. Use table(name) first.");
            return Err(refused("delete", "table name not specified"));
        }
        if self.where_sql.is_empty() {
            error!(table = %self.table, "WHERE clause is missing. Full table deletion is prevented.");
            return Err(refused("delete", "WHERE clause is missing"));
        }

        let _span = query_span(&self.table, "delete").entered();
        let sql = format!("DELETE FROM {} {}", self.table, self.where_sql);
        self.run_write(&sql, &self.bindings, "delete")
    }

    fn fetch_rows(&mut self, operation: &'static str) -> JadResult<Vec<Row>> {
        if self.order_by.is_empty() {
            self.order_by.push(format!("{}.created_at DESC", self.table));
        }
        let sql = self.to_sql();
        let conn = Arc::clone(&self.conn);
        let result = self
            .bind_and_execute(conn.as_ref(), &sql, &self.bindings)
            .and_then(|mut stmt| stmt.fetch_all());
        if let Err(err) = &result {
            log_execution_error(operation, &sql, &self.bindings, err);
        }
        result
    }

    fn run_write(&self, sql: &str, bindings: &Bindings, operation: &'static str) -> JadResult<u64> {
        self.execute_write(sql, bindings, operation, |stmt| stmt.row_count())
    }

    fn execute_write<R>(
        &self,
        sql: &str,
        bindings: &Bindings,
        operation: &'static str,
        read: impl FnOnce(&dyn Statement) -> R,
    ) -> JadResult<R> {
        let conn = Arc::clone(&self.conn);
        let result = self
            .bind_and_execute(conn.as_ref(), sql, bindings)
            .map(|stmt| read(stmt.as_ref()));
        if let Err(err) = &result {
            log_execution_error(operation, sql, bindings, err);
        }
        result
    }

    fn bind_and_execute<'c>(
        &self,
        conn: &'c dyn Connection,
        sql: &str,
        bindings: &Bindings,
    ) -> JadResult<Box<dyn Statement + 'c>> {
        let mut stmt = conn.prepare(sql)?;
        if self.debug {
            info!(sql, "QueryBuilder SQL");
        }
        for (placeholder, value) in bindings.iter() {
            let (bound, param_type) = bind_parameter(value);
            if self.debug {
                info!(placeholder, value = %bound, param_type = %param_type, "QueryBuilder binding");
            }
            stmt.bind_value(placeholder, &bound, param_type)?;
        }
        if !stmt.execute()? {
            return Err(JadError::DatabaseError(
                "statement execution reported failure".to_string(),
            ));
        }
        Ok(stmt)
    }

    fn reset_state(&mut self) {
        self.table.clear();
        self.select.clear();
        self.joins.clear();
        self.where_sql.clear();
        self.bindings = Bindings::default();
        self.order_by.clear();
        self.group_by.clear();
        self.limit = None;
        self.offset = None;
        self.debug = false;
    }
}

fn collect_values<I>(values: I) -> Vec<Value>
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    values.into_iter().map(Into::into).collect()
}

fn refused(operation: &str, reason: &str) -> JadError {
    JadError::RefusedOperation(format!("{operation}: {reason}"))
}

fn log_execution_error(operation: &str, sql: &str, bindings: &Bindings, err: &JadError) {
    warn!(operation, sql, bindings = %bindings, error = %err, "DB {operation} error");
}
