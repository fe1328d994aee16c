//! SQLite database backend using `rusqlite`.
//!
//! This module provides [`SqliteConnection`], which implements the
//! [`Connection`](jad_rs_db::connection::Connection) trait on top of a
//! `rusqlite` connection guarded by a `Mutex`.
//!
//! Features:
//! - WAL mode and foreign keys enabled for file-based databases
//! - In-memory database support via `:memory:` path (great for testing)
//! - Named placeholders (`:p0`, `:u_email`, ...) resolved per statement
//!
//! Statements buffer their bindings and only touch the database on
//! `execute`, so the connection lock is never held across calls.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use jad_rs_core::{JadError, JadResult};
use jad_rs_db::connection::{Connection, ParamType, Statement};
use jad_rs_db::row::Row;
use jad_rs_db::value::Value;
use rusqlite::types::ValueRef;
use tracing::debug;

/// A SQLite database connection.
pub struct SqliteConnection {
    /// The path to the database file (or ":memory:").
    path: PathBuf,
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteConnection {
    /// Opens a SQLite database at the given path.
    ///
    /// If the path is `:memory:`, an in-memory database is created.
    /// File-based databases are switched to WAL journal mode.
    pub fn open(path: impl Into<PathBuf>) -> JadResult<Self> {
        let path = path.into();
        let in_memory = path.to_str() == Some(":memory:");
        let conn = if in_memory {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| JadError::OperationalError(format!("SQLite open failed: {e}")))?;

        if !in_memory {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| JadError::OperationalError(format!("Failed to set pragmas: {e}")))?;
        }
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|e| JadError::OperationalError(format!("Failed to set pragmas: {e}")))?;

        debug!(path = %path.display(), "Opened SQLite database");
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Opens an in-memory database (convenience constructor).
    pub fn memory() -> JadResult<Self> {
        Self::open(":memory:")
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs one or more `;`-separated statements without bindings (schema
    /// setup, fixtures).
    pub fn execute_batch(&self, sql: &str) -> JadResult<()> {
        self.lock().execute_batch(sql).map_err(db_error)
    }

    fn lock(&self) -> MutexGuard<'_, rusqlite::Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Connection for SqliteConnection {
    fn prepare(&self, sql: &str) -> JadResult<Box<dyn Statement + '_>> {
        // Compile once up front so syntax errors surface here, not at execute.
        self.lock().prepare_cached(sql).map_err(db_error)?;
        Ok(Box::new(SqliteStatement {
            conn: self,
            sql: sql.to_string(),
            params: Vec::new(),
            rows: Vec::new(),
            changes: 0,
            last_insert_id: 0,
        }))
    }

    fn vendor(&self) -> &str {
        "sqlite"
    }
}

/// A statement prepared on a [`SqliteConnection`].
///
/// SQLite columns are dynamically typed, so the [`ParamType`] hint is not
/// needed to bind correctly: the already-normalized value decides the
/// storage class.
pub struct SqliteStatement<'c> {
    conn: &'c SqliteConnection,
    sql: String,
    params: Vec<(String, Value)>,
    rows: Vec<Row>,
    changes: u64,
    last_insert_id: i64,
}

impl Statement for SqliteStatement<'_> {
    fn bind_value(&mut self, placeholder: &str, value: &Value, _param_type: ParamType) -> JadResult<()> {
        match self.params.iter_mut().find(|(p, _)| p == placeholder) {
            Some((_, slot)) => *slot = value.clone(),
            None => self.params.push((placeholder.to_string(), value.clone())),
        }
        Ok(())
    }

    fn execute(&mut self) -> JadResult<bool> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&self.sql).map_err(db_error)?;

        for (placeholder, value) in &self.params {
            let idx = stmt
                .parameter_index(placeholder)
                .map_err(db_error)?
                .ok_or_else(|| {
                    JadError::DatabaseError(format!("Unknown placeholder {placeholder}"))
                })?;
            bind_one(&mut stmt, idx, value).map_err(|e| {
                JadError::DatabaseError(format!("Bind error on {placeholder}: {e}"))
            })?;
        }

        if stmt.column_count() > 0 {
            let column_names: Vec<String> =
                stmt.column_names().into_iter().map(String::from).collect();
            let mut raw_rows = stmt.raw_query();
            let mut rows = Vec::new();
            while let Some(row) = raw_rows.next().map_err(db_error)? {
                rows.push(convert_row(row, &column_names));
            }
            self.rows = rows;
            self.changes = 0;
        } else {
            let changed = stmt.raw_execute().map_err(db_error)?;
            self.changes = changed as u64;
            self.rows.clear();
            // read while the lock is held; another writer could move it otherwise
            self.last_insert_id = if changed > 0 && generates_rowid(&self.sql) {
                conn.last_insert_rowid()
            } else {
                0
            };
        }
        Ok(true)
    }

    fn fetch_all(&mut self) -> JadResult<Vec<Row>> {
        Ok(std::mem::take(&mut self.rows))
    }

    fn row_count(&self) -> u64 {
        self.changes
    }

    fn last_insert_id(&self) -> i64 {
        self.last_insert_id
    }
}

/// `INSERT` and `REPLACE` statements assign rowids.
fn generates_rowid(sql: &str) -> bool {
    let head = sql.trim_start();
    ["INSERT", "REPLACE"].iter().any(|kw| {
        head.get(..kw.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(kw))
    })
}

/// Binds one jad `Value` to a `rusqlite` statement parameter.
fn bind_one(stmt: &mut rusqlite::Statement<'_>, idx: usize, value: &Value) -> rusqlite::Result<()> {
    match value {
        Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null),
        Value::Bool(b) => stmt.raw_bind_parameter(idx, b),
        Value::Int(v) => stmt.raw_bind_parameter(idx, v),
        Value::Float(v) => stmt.raw_bind_parameter(idx, v),
        Value::String(s) => stmt.raw_bind_parameter(idx, s.as_str()),
        Value::Bytes(b) => stmt.raw_bind_parameter(idx, b.as_slice()),
        Value::Date(_) | Value::DateTime(_) => stmt.raw_bind_parameter(idx, value.to_string()),
        Value::Json(_) | Value::List(_) => {
            stmt.raw_bind_parameter(idx, value.to_json().to_string())
        }
    }
}

/// Converts a `rusqlite::Row` to a jad [`Row`].
fn convert_row(sqlite_row: &rusqlite::Row<'_>, column_names: &[String]) -> Row {
    let values = (0..column_names.len())
        .map(|i| match sqlite_row.get_ref(i).unwrap_or(ValueRef::Null) {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Int(v),
            ValueRef::Real(v) => Value::Float(v),
            ValueRef::Text(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
            ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
        })
        .collect();
    Row::from_columns(column_names.to_vec(), values)
}

fn db_error(e: rusqlite::Error) -> JadError {
    JadError::DatabaseError(e.to_string())
}
