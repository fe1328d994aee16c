//! The query dispatcher.
//!
//! [`Db`] holds the one connection an application talks to and hands out a
//! fresh [`QueryBuilder`] per call chain, so builder state never leaks from
//! one query into the next. It is built once at startup and passed (or
//! cloned, it is cheap) to every entry point.

use std::fmt;
use std::sync::Arc;

use jad_rs_core::{JadError, JadResult};
use tracing::error;

use crate::connection::SharedConnection;
use crate::query::QueryBuilder;
use crate::row::Row;

/// A handle on the application's database connection.
///
/// A default `Db` is not booted: every method needing the connection fails
/// with [`JadError::ImproperlyConfigured`] until [`Db::boot`] is called.
#[derive(Clone, Default)]
pub struct Db {
    connection: Option<SharedConnection>,
    query_debug: bool,
}

impl Db {
    /// Creates a booted dispatcher.
    pub fn new(connection: SharedConnection) -> Self {
        Self {
            connection: Some(connection),
            query_debug: false,
        }
    }

    /// Installs (or replaces) the connection.
    pub fn boot(&mut self, connection: SharedConnection) {
        self.connection = Some(connection);
    }

    /// Makes every builder from this dispatcher log its SQL and bindings.
    #[must_use]
    pub fn with_query_debug(mut self, enable: bool) -> Self {
        self.query_debug = enable;
        self
    }

    /// Returns `true` once a connection is installed.
    pub const fn is_booted(&self) -> bool {
        self.connection.is_some()
    }

    /// The shared connection.
    pub fn connection(&self) -> JadResult<SharedConnection> {
        self.connection.as_ref().map(Arc::clone).ok_or_else(|| {
            let message = "Database connection not initialized. Call Db::boot(connection) first.";
            error!("{message}");
            JadError::ImproperlyConfigured(message.to_string())
        })
    }

    /// A fresh builder with no table selected.
    pub fn builder(&self) -> JadResult<QueryBuilder<Row>> {
        Ok(QueryBuilder::new(self.connection()?).debug(self.query_debug))
    }

    /// A fresh builder on `table`.
    ///
    /// ```
    /// use jad_rs_db::db::Db;
    ///
    /// let db = Db::default();
    /// assert!(db.table("users").is_err());
    /// ```
    pub fn table(&self, name: &str) -> JadResult<QueryBuilder<Row>> {
        Ok(self.builder()?.table(name))
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("vendor", &self.connection.as_ref().map(|c| c.vendor().to_string()))
            .field("query_debug", &self.query_debug)
            .finish()
    }
}
