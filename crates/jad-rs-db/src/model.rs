//! Model trait, metadata and entities.
//!
//! A model type describes one table: its name, the columns callers may
//! assign, and the validation rules for incoming data. Implementors only
//! provide [`Model::meta`]; the query entry points (`query`, `all`, `find`,
//! `where_`, ...) are provided methods taking the [`Db`] handle explicitly.
//!
//! Rows read through a model-bound builder hydrate into [`Entity<M>`]: an
//! attribute [`Row`] plus the connection it came from, able to save or
//! delete itself.
//!
//! # Examples
//!
//! ```
//! use jad_rs_db::model::{Model, ModelMeta};
//! use jad_rs_db::row;
//!
//! struct Article;
//!
//! impl Model for Article {
//!     fn meta() -> &'static ModelMeta {
//!         static META: ModelMeta = ModelMeta {
//!             table: "articles",
//!             columns: &["title", "body", "published_at"],
//!             rules: &[("title", "required|text|max:120"), ("published_at", "timestamp")],
//!         };
//!         &META
//!     }
//! }
//!
//! let outcome = Article::validate(&row! { "title" => "Hello", "views" => 3 });
//! let data = outcome.into_result().unwrap();
//! // columns outside the allow-list are dropped
//! assert!(!data.contains("views"));
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::ops::Index;
use std::sync::Arc;

use jad_rs_core::{FieldErrors, JadError, JadResult};
use serde::{Serialize, Serializer};
use tracing::{info, warn};

use crate::collection::{Collection, Fields};
use crate::connection::SharedConnection;
use crate::db::Db;
use crate::query::{FromRow, QueryBuilder, SortDirection};
use crate::row::Row;
use crate::validators::Validator;
use crate::value::Value;

/// Static description of a model's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelMeta {
    /// Table name.
    pub table: &'static str,
    /// Columns callers may assign (`id` is always assignable).
    pub columns: &'static [&'static str],
    /// `(field, "rule|rule:arg")` pairs checked by [`Model::validate`].
    pub rules: &'static [(&'static str, &'static str)],
}

impl ModelMeta {
    /// Returns `true` if `column` may be written through [`Entity::set`].
    pub fn allows(&self, column: &str) -> bool {
        column == "id" || self.columns.iter().any(|c| *c == column)
    }
}

/// Result of [`Model::validate`]: filtered data or field errors, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Every rule passed. Holds the data restricted to the allow-list.
    Valid(Row),
    /// At least one rule failed.
    Invalid(FieldErrors),
}

impl ValidationOutcome {
    /// Returns `true` for [`ValidationOutcome::Valid`].
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Converts into a result, failures becoming [`JadError::ValidationError`].
    pub fn into_result(self) -> JadResult<Row> {
        match self {
            Self::Valid(row) => Ok(row),
            Self::Invalid(errors) => Err(JadError::ValidationError(errors)),
        }
    }
}

/// A database table mapped to a Rust type.
pub trait Model: Sized + 'static {
    /// Returns the static metadata for this model.
    fn meta() -> &'static ModelMeta;

    /// A fresh builder on this model's table, hydrating into entities.
    fn query(db: &Db) -> JadResult<QueryBuilder<Entity<Self>>> {
        Ok(db.table(Self::meta().table)?.set_model::<Self>())
    }

    /// Every row of the table.
    fn all(db: &Db) -> JadResult<Collection<Entity<Self>>> {
        Ok(Self::query(db)?.get())
    }

    /// The row whose `id` equals `id`.
    fn find(db: &Db, id: impl Into<Value>) -> JadResult<Option<Entity<Self>>> {
        Ok(Self::query(db)?.find(id))
    }

    /// Starts a query with `where_(column, operator, value)`.
    fn where_(
        db: &Db,
        column: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> JadResult<QueryBuilder<Entity<Self>>> {
        Self::query(db)?.where_(column, operator, value)
    }

    /// Starts a query with `where_in(column, values)`.
    fn where_in<I>(db: &Db, column: &str, values: I) -> JadResult<QueryBuilder<Entity<Self>>>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Ok(Self::query(db)?.where_in(column, values))
    }

    /// Starts a query with a trusted raw condition.
    fn where_raw(db: &Db, condition: &str) -> JadResult<QueryBuilder<Entity<Self>>> {
        Ok(Self::query(db)?.where_raw(condition))
    }

    /// Starts a query ordered by `column`.
    fn order_by(
        db: &Db,
        column: &str,
        direction: impl Into<SortDirection>,
    ) -> JadResult<QueryBuilder<Entity<Self>>> {
        Ok(Self::query(db)?.order_by(column, direction))
    }

    /// Number of rows in the table.
    fn count(db: &Db) -> JadResult<i64> {
        Ok(Self::query(db)?.count())
    }

    /// Restricts `data` to the allow-list and checks it against the rules.
    fn validate(data: &Row) -> ValidationOutcome {
        let meta = Self::meta();
        let mut filtered = data.clone();
        filtered.retain(|column| meta.columns.iter().any(|c| *c == column));

        let mut validator = Validator::new();
        if validator.validate(&filtered, meta.rules) {
            ValidationOutcome::Valid(filtered)
        } else {
            ValidationOutcome::Invalid(validator.into_errors())
        }
    }

    /// An empty, unsaved entity bound to `db`'s connection.
    fn new_entity(db: &Db) -> JadResult<Entity<Self>> {
        Ok(Entity::new(db.connection()?))
    }
}

/// One row of a model's table.
pub struct Entity<M> {
    conn: SharedConnection,
    attributes: Row,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Entity<M> {
    /// Creates an empty entity.
    pub const fn new(conn: SharedConnection) -> Self {
        Self::from_attributes(conn, Row::new())
    }

    /// Wraps existing attributes.
    pub const fn from_attributes(conn: SharedConnection, attributes: Row) -> Self {
        Self {
            conn,
            attributes,
            _model: PhantomData,
        }
    }

    /// Reads an attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Writes an allow-listed attribute (or `id`). Other keys are logged and
    /// dropped; returns whether the write happened.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> bool {
        let meta = M::meta();
        if meta.allows(key) {
            self.attributes.set(key, value);
            true
        } else {
            info!(
                table = meta.table,
                column = key,
                "Error while setting {key}. Column {key} does not exist in model {}",
                meta.table
            );
            false
        }
    }

    /// Merges `data` into the attributes without any allow-list check.
    pub fn fill(&mut self, data: Row) -> &mut Self {
        self.attributes.merge(data);
        self
    }

    /// Removes an attribute, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    /// Returns `true` when `key` is present and not NULL.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_null())
    }

    /// The primary key, if set and not NULL.
    pub fn id(&self) -> Option<&Value> {
        self.get("id").filter(|v| !v.is_null())
    }

    /// All attributes.
    pub const fn attributes(&self) -> &Row {
        &self.attributes
    }

    /// Consumes the entity and returns its attributes.
    pub fn into_attributes(self) -> Row {
        self.attributes
    }

    /// Persists the entity.
    ///
    /// With an `id` this is an UPDATE keyed on it, successful when at least
    /// one row changed. Without one it is an INSERT; the generated id is
    /// written back on success.
    pub fn save(&mut self) -> bool {
        match self.id().cloned() {
            Some(id) => self.update_existing(id).is_some_and(|affected| affected > 0),
            None => match self.builder().insert(self.attributes.clone()) {
                Some(id) if id != 0 => {
                    self.attributes.set("id", id);
                    true
                }
                _ => false,
            },
        }
    }

    /// Deletes the row keyed on `id`. Without an id nothing is sent.
    pub fn delete(&self) -> bool {
        let Some(id) = self.id().cloned() else {
            warn!(table = M::meta().table, "Cannot delete an entity without id");
            return false;
        };
        self.builder()
            .where_("id", "=", id)
            .ok()
            .and_then(|mut qb| qb.delete())
            .is_some_and(|affected| affected > 0)
    }

    /// The attributes as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        self.attributes.to_json()
    }

    fn builder(&self) -> QueryBuilder<Row> {
        QueryBuilder::new(Arc::clone(&self.conn)).table(M::meta().table)
    }

    fn update_existing(&self, id: Value) -> Option<u64> {
        self.builder()
            .where_("id", "=", id)
            .ok()?
            .update(self.attributes.clone())
    }
}

impl<M: Model> FromRow for Entity<M> {
    fn from_row(row: Row, conn: &SharedConnection) -> Self {
        Self::from_attributes(Arc::clone(conn), row)
    }
}

impl<M> Fields for Entity<M> {
    fn field(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

impl<M> Index<&str> for Entity<M> {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        &self.attributes[key]
    }
}

impl<M> Clone for Entity<M> {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            attributes: self.attributes.clone(),
            _model: PhantomData,
        }
    }
}

impl<M> PartialEq for Entity<M> {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }
}

impl<M> fmt::Debug for Entity<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("model", &std::any::type_name::<M>())
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

impl<M> Serialize for Entity<M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attributes.serialize(serializer)
    }
}
