//! # jad-rs-db
//!
//! Query layer for the jad-rs framework. Provides the fluent
//! [`QueryBuilder`](query::QueryBuilder), the [`Collection`](collection::Collection)
//! returned by reads, the [`Model`](model::Model) trait with its
//! [`Entity`](model::Entity) rows, and the [`Db`](db::Db) dispatcher that
//! hands out one fresh builder per query.
//!
//! ## Architecture
//!
//! A builder accumulates clauses through method chaining without touching
//! the database. SQL is only compiled and sent when a terminal method
//! (`get`, `first`, `count`, `insert`, `update`, `delete`) is called. Values
//! never appear in the SQL text: every one is bound to a named placeholder
//! through the [`Connection`](connection::Connection) trait, which the
//! drivers in `jad-rs-db-backends` implement.
//!
//! ## Module Overview
//!
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum
//! - [`row`] - Ordered [`Row`](row::Row) field maps and the `row!` macro
//! - [`connection`] - Connection/statement traits and parameter typing
//! - [`query`] - Operators and the query builder
//! - [`collection`] - Result collections
//! - [`model`] - Models, metadata and entities
//! - [`validators`] - Rule-string validation
//! - [`db`] - The dispatcher

// These clippy lints are intentionally allowed for the query crate:
// - cast_precision_loss: i64-to-f64 casts are acceptable for numeric coercion
// - result_large_err: JadError is the framework error type and is used consistently
// - format_push_string: format! with push_str is clearer than write! for SQL generation
// - doc_markdown: backtick requirements for documentation items are too strict
// - needless_pass_by_value: builder methods take owned values like the rest of the API
// - return_self_not_must_use: builder pattern methods are self-documenting
// - missing_const_for_fn: builder methods are not meant for const contexts
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::result_large_err)]
#![allow(clippy::format_push_string)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
// significant_drop_tightening: false positives with short-lived Mutex guards
#![allow(clippy::significant_drop_tightening)]

pub mod collection;
pub mod connection;
pub mod db;
pub mod model;
pub mod query;
pub mod row;
pub mod validators;
pub mod value;

#[cfg(test)]
pub(crate) mod mock;

// Re-export the most commonly used types at the crate root.
pub use collection::{Collection, Fields, Group};
pub use connection::{bind_parameter, Connection, ParamType, SharedConnection, Statement};
pub use db::Db;
pub use model::{Entity, Model, ModelMeta, ValidationOutcome};
pub use query::{Bindings, FromRow, Operator, QueryBuilder, SortDirection};
pub use row::Row;
pub use validators::{Rule, Validator};
pub use value::{FromValue, Value};
