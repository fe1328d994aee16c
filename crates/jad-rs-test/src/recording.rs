//! A connection that records what the query layer sends it.
//!
//! [`RecordingConnection`] works in two modes:
//!
//! - **standalone** ([`RecordingConnection::new`]): nothing is executed;
//!   `fetch_all` serves scripted row sets, `row_count` and
//!   `last_insert_id` return configured values;
//! - **wrapping** ([`RecordingConnection::wrapping`]): every call is
//!   forwarded to a real connection and recorded on the way.
//!
//! In both modes [`fail_next`](RecordingConnection::fail_next) makes the
//! next `prepare` fail with a [`JadError::DatabaseError`].
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use jad_rs_db::{row, Db};
//! use jad_rs_test::recording::RecordingConnection;
//!
//! let conn = Arc::new(RecordingConnection::new());
//! conn.push_rows(vec![row! { "id" => 1 }]);
//! let db = Db::new(conn.clone());
//!
//! let rows = db.table("users").unwrap().where_("id", "=", 1).unwrap().get();
//! assert_eq!(rows.len(), 1);
//! assert_eq!(
//!     conn.prepared_sql(),
//!     ["SELECT * FROM users  WHERE  (id = ( :p0 ))  ORDER BY users.created_at DESC"]
//! );
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use jad_rs_core::{JadError, JadResult};
use jad_rs_db::connection::{Connection, ParamType, SharedConnection, Statement};
use jad_rs_db::row::Row;
use jad_rs_db::value::Value;

/// One call observed by a [`RecordingConnection`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    /// `prepare(sql)`.
    Prepare(String),
    /// `bind_value(placeholder, value, type)`.
    Bind {
        /// Placeholder including the leading `:`.
        placeholder: String,
        /// The normalized value.
        value: Value,
        /// The type hint.
        param_type: ParamType,
    },
    /// `execute()`.
    Execute,
}

/// A recording (and optionally forwarding) connection.
pub struct RecordingConnection {
    inner: Option<SharedConnection>,
    calls: Mutex<Vec<RecordedCall>>,
    scripted_rows: Mutex<VecDeque<Vec<Row>>>,
    failures: Mutex<VecDeque<String>>,
    last_insert_id: AtomicI64,
    row_count: AtomicU64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingConnection {
    /// A standalone recorder serving scripted results.
    pub fn new() -> Self {
        Self {
            inner: None,
            calls: Mutex::new(Vec::new()),
            scripted_rows: Mutex::new(VecDeque::new()),
            failures: Mutex::new(VecDeque::new()),
            last_insert_id: AtomicI64::new(1),
            row_count: AtomicU64::new(0),
        }
    }

    /// A recorder forwarding every call to `inner`.
    pub fn wrapping(inner: SharedConnection) -> Self {
        Self {
            inner: Some(inner),
            ..Self::new()
        }
    }

    /// Queues a row set for the next standalone `fetch_all`.
    pub fn push_rows(&self, rows: Vec<Row>) {
        lock(&self.scripted_rows).push_back(rows);
    }

    /// Makes the next `prepare` fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        lock(&self.failures).push_back(message.into());
    }

    /// Standalone mode: the id returned by `last_insert_id`.
    pub fn set_last_insert_id(&self, id: i64) {
        self.last_insert_id.store(id, Ordering::SeqCst);
    }

    /// Standalone mode: the value returned by `row_count`.
    pub fn set_row_count(&self, count: u64) {
        self.row_count.store(count, Ordering::SeqCst);
    }

    /// Every recorded call, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// The SQL of every successful `prepare`, oldest first.
    pub fn prepared_sql(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Prepare(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(placeholder, value)` pairs bound so far, oldest first.
    pub fn bound_values(&self) -> Vec<(String, Value)> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Bind {
                    placeholder, value, ..
                } => Some((placeholder.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }

    /// Number of statements prepared so far.
    pub fn prepare_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| matches!(call, RecordedCall::Prepare(_)))
            .count()
    }

    /// Forgets every recorded call.
    pub fn reset(&self) {
        lock(&self.calls).clear();
    }

    fn record(&self, call: RecordedCall) {
        lock(&self.calls).push(call);
    }
}

impl Default for RecordingConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RecordingConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingConnection")
            .field("forwarding", &self.inner.is_some())
            .field("calls", &lock(&self.calls).len())
            .finish_non_exhaustive()
    }
}

impl Connection for RecordingConnection {
    fn prepare(&self, sql: &str) -> JadResult<Box<dyn Statement + '_>> {
        if let Some(message) = lock(&self.failures).pop_front() {
            return Err(JadError::DatabaseError(message));
        }
        let inner = match &self.inner {
            Some(conn) => Some(conn.prepare(sql)?),
            None => None,
        };
        self.record(RecordedCall::Prepare(sql.to_string()));
        Ok(Box::new(RecordingStatement { conn: self, inner }))
    }

    fn vendor(&self) -> &str {
        self.inner.as_ref().map_or("recording", |conn| conn.vendor())
    }
}

struct RecordingStatement<'a> {
    conn: &'a RecordingConnection,
    inner: Option<Box<dyn Statement + 'a>>,
}

impl Statement for RecordingStatement<'_> {
    fn bind_value(&mut self, placeholder: &str, value: &Value, param_type: ParamType) -> JadResult<()> {
        self.conn.record(RecordedCall::Bind {
            placeholder: placeholder.to_string(),
            value: value.clone(),
            param_type,
        });
        match &mut self.inner {
            Some(stmt) => stmt.bind_value(placeholder, value, param_type),
            None => Ok(()),
        }
    }

    fn execute(&mut self) -> JadResult<bool> {
        self.conn.record(RecordedCall::Execute);
        match &mut self.inner {
            Some(stmt) => stmt.execute(),
            None => Ok(true),
        }
    }

    fn fetch_all(&mut self) -> JadResult<Vec<Row>> {
        match &mut self.inner {
            Some(stmt) => stmt.fetch_all(),
            None => Ok(lock(&self.conn.scripted_rows).pop_front().unwrap_or_default()),
        }
    }

    fn row_count(&self) -> u64 {
        match &self.inner {
            Some(stmt) => stmt.row_count(),
            None => self.conn.row_count.load(Ordering::SeqCst),
        }
    }

    fn last_insert_id(&self) -> i64 {
        match &self.inner {
            Some(stmt) => stmt.last_insert_id(),
            None => self.conn.last_insert_id.load(Ordering::SeqCst),
        }
    }
}
