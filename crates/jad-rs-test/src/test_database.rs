//! Test database utilities for jad-rs.
//!
//! Provides [`TestDatabase`], an in-memory SQLite database for use in tests.
//! Queries sent through [`TestDatabase::db`] are recorded so tests can count
//! them (see [`assert_num_queries`](crate::assert_num_queries)); schema
//! helpers go straight to SQLite and are never counted.
//!
//! ## Example
//!
//! ```rust
//! use jad_rs_db::row;
//! use jad_rs_test::test_database::TestDatabase;
//!
//! let tdb = TestDatabase::new();
//! tdb.execute_raw("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
//!     .unwrap();
//! let id = tdb.db().table("users").unwrap().insert(row! { "name" => "Ada" });
//! assert_eq!(id, Some(1));
//! assert_eq!(tdb.query_count(), 1);
//! ```

use std::sync::Arc;

use jad_rs_core::JadResult;
use jad_rs_db::connection::{Connection, SharedConnection};
use jad_rs_db::model::ModelMeta;
use jad_rs_db::Db;
use jad_rs_db_backends::SqliteConnection;

use crate::recording::RecordingConnection;

/// An in-memory SQLite database for testing.
///
/// The database is created fresh in memory for each `TestDatabase::new()`
/// call, providing complete test isolation.
#[derive(Clone)]
pub struct TestDatabase {
    sqlite: Arc<SqliteConnection>,
    recorder: Arc<RecordingConnection>,
}

impl TestDatabase {
    /// Creates a new in-memory SQLite test database.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory database cannot be created.
    pub fn new() -> Self {
        Self::try_new().expect("Failed to create in-memory SQLite database")
    }

    /// Creates a new in-memory SQLite test database.
    pub fn try_new() -> JadResult<Self> {
        let sqlite = Arc::new(SqliteConnection::memory()?);
        let shared: SharedConnection = sqlite.clone();
        Ok(Self {
            sqlite,
            recorder: Arc::new(RecordingConnection::wrapping(shared)),
        })
    }

    /// A dispatcher whose queries are recorded.
    pub fn db(&self) -> Db {
        Db::new(self.connection())
    }

    /// The recording connection, as a shared handle.
    pub fn connection(&self) -> SharedConnection {
        self.recorder.clone()
    }

    /// The recorder behind [`db`](Self::db), for inspecting SQL and binds.
    pub fn recorder(&self) -> &RecordingConnection {
        &self.recorder
    }

    /// Creates the table described by `meta`.
    ///
    /// Adds `id INTEGER PRIMARY KEY AUTOINCREMENT` and
    /// `created_at TEXT DEFAULT CURRENT_TIMESTAMP`; every allow-listed column
    /// is created without a declared type, so values keep the storage class
    /// they were bound with.
    pub fn setup_table(&self, meta: &ModelMeta) -> JadResult<()> {
        self.execute_raw(&Self::create_table_sql(meta))
    }

    /// Runs raw SQL directly on SQLite. Not counted.
    pub fn execute_raw(&self, sql: &str) -> JadResult<()> {
        self.sqlite.execute_batch(sql)
    }

    /// Drops every user table.
    pub fn teardown(&self) -> JadResult<()> {
        let mut stmt = self.sqlite.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )?;
        stmt.execute()?;
        let tables = stmt.fetch_all()?;
        drop(stmt);
        for row in tables {
            if let Some(name) = row.get("name").and_then(|v| v.as_str()) {
                self.execute_raw(&format!("DROP TABLE IF EXISTS \"{name}\""))?;
            }
        }
        Ok(())
    }

    /// Number of statements prepared through [`db`](Self::db) since the last
    /// reset.
    pub fn query_count(&self) -> usize {
        self.recorder.prepare_count()
    }

    /// Resets the query counter.
    pub fn reset_query_count(&self) {
        self.recorder.reset();
    }

    /// The `CREATE TABLE` statement used by [`setup_table`](Self::setup_table).
    pub fn create_table_sql(meta: &ModelMeta) -> String {
        let mut columns = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
        columns.extend(
            meta.columns
                .iter()
                .filter(|c| **c != "id" && **c != "created_at")
                .map(|c| format!("\"{c}\"")),
        );
        columns.push("created_at TEXT DEFAULT CURRENT_TIMESTAMP".to_string());
        format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
            meta.table,
            columns.join(", ")
        )
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TestDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestDatabase")
            .field("query_count", &self.query_count())
            .finish_non_exhaustive()
    }
}
