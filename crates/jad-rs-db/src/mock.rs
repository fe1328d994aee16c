//! In-memory connection for unit tests.
//!
//! Records every prepare/bind/execute call and serves scripted results:
//! queued row sets for `fetch_all`, a fixed affected-row count and a fixed
//! last insert id. [`MockConnection::fail_next`] makes the next `prepare`
//! fail with a [`JadError::DatabaseError`].
//!
//! `jad-rs-test` depends on this crate, so its `RecordingConnection` cannot
//! be used here; this is the minimal subset the unit tests call.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jad_rs_core::{JadError, JadResult};

use crate::connection::{Connection, ParamType, Statement};
use crate::row::Row;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Prepare(String),
    Bind(String, Value, ParamType),
    Execute,
}

#[derive(Debug)]
pub struct MockConnection {
    calls: Mutex<Vec<MockCall>>,
    rows: Mutex<VecDeque<Vec<Row>>>,
    failure: Mutex<Option<String>>,
    last_insert_id: AtomicI64,
    row_count: AtomicU64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockConnection {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            rows: Mutex::new(VecDeque::new()),
            failure: Mutex::new(None),
            last_insert_id: AtomicI64::new(1),
            row_count: AtomicU64::new(0),
        })
    }

    pub fn push_rows(&self, rows: Vec<Row>) {
        lock(&self.rows).push_back(rows);
    }

    pub fn fail_next(&self, message: &str) {
        *lock(&self.failure) = Some(message.to_string());
    }

    pub fn set_last_insert_id(&self, id: i64) {
        self.last_insert_id.store(id, Ordering::SeqCst);
    }

    pub fn set_row_count(&self, count: u64) {
        self.row_count.store(count, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    pub fn prepared_sql(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                MockCall::Prepare(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Connection for MockConnection {
    fn prepare(&self, sql: &str) -> JadResult<Box<dyn Statement + '_>> {
        if let Some(message) = lock(&self.failure).take() {
            return Err(JadError::DatabaseError(message));
        }
        lock(&self.calls).push(MockCall::Prepare(sql.to_string()));
        Ok(Box::new(MockStatement { conn: self }))
    }

    fn vendor(&self) -> &str {
        "mock"
    }
}

struct MockStatement<'a> {
    conn: &'a MockConnection,
}

impl Statement for MockStatement<'_> {
    fn bind_value(&mut self, placeholder: &str, value: &Value, param_type: ParamType) -> JadResult<()> {
        lock(&self.conn.calls).push(MockCall::Bind(
            placeholder.to_string(),
            value.clone(),
            param_type,
        ));
        Ok(())
    }

    fn execute(&mut self) -> JadResult<bool> {
        lock(&self.conn.calls).push(MockCall::Execute);
        Ok(true)
    }

    fn fetch_all(&mut self) -> JadResult<Vec<Row>> {
        Ok(lock(&self.conn.rows).pop_front().unwrap_or_default())
    }

    fn row_count(&self) -> u64 {
        self.conn.row_count.load(Ordering::SeqCst)
    }

    fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_id.load(Ordering::SeqCst)
    }
}
