//! MySQL database backend using `mysql_async`.
//!
//! This module provides [`MySqlConnection`], which implements the
//! [`Connection`](jad_rs_db::connection::Connection) trait on top of a single
//! `mysql_async` connection driven by a private current-thread `tokio`
//! runtime. Every call blocks until the server answers.
//!
//! The builder's named placeholders (`:p0`, `:u_email`, ...) are passed to
//! the server as `mysql_async` named parameters. Like the SQLite backend,
//! statements buffer their bindings and only take the connection lock on
//! `execute`.
//!
//! The connection must not be used from inside another `tokio` runtime:
//! blocking on one from an async task panics.

use std::sync::{Mutex, MutexGuard, PoisonError};

use jad_rs_core::settings::DatabaseSettings;
use jad_rs_core::{JadError, JadResult};
use jad_rs_db::connection::{Connection, ParamType, Statement};
use jad_rs_db::row::Row;
use jad_rs_db::value::Value;
use mysql_async::prelude::Queryable;
use mysql_async::{OptsBuilder, Params};
use tokio::runtime::Runtime;
use tracing::debug;

const DEFAULT_PORT: u16 = 3306;

/// A MySQL (or MariaDB) database connection.
pub struct MySqlConnection {
    runtime: Runtime,
    conn: Mutex<Option<mysql_async::Conn>>,
    database: String,
}

impl MySqlConnection {
    /// Connects using the host, port, user, password and database name of
    /// `settings`.
    ///
    /// An empty host means `localhost` and port `0` means 3306. Network and
    /// authentication failures are
    /// [`OperationalError`](JadError::OperationalError)s.
    pub fn connect(settings: &DatabaseSettings) -> JadResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| JadError::OperationalError(format!("MySQL runtime failed: {e}")))?;
        let conn = runtime
            .block_on(mysql_async::Conn::new(opts_from_settings(settings)))
            .map_err(|e| JadError::OperationalError(format!("MySQL connection error: {e}")))?;

        debug!(host = %host_or_default(settings), database = %settings.name, "Opened MySQL connection");
        Ok(Self {
            runtime,
            conn: Mutex::new(Some(conn)),
            database: settings.name.clone(),
        })
    }

    /// Returns the database (schema) name.
    pub fn database(&self) -> &str {
        &self.database
    }

    fn lock(&self) -> MutexGuard<'_, Option<mysql_async::Conn>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MySqlConnection {
    fn drop(&mut self) {
        let slot = self.conn.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(conn) = slot.take() {
            if let Err(e) = self.runtime.block_on(conn.disconnect()) {
                debug!(error = %e, "MySQL disconnect failed");
            }
        }
    }
}

impl std::fmt::Debug for MySqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlConnection")
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl Connection for MySqlConnection {
    fn prepare(&self, sql: &str) -> JadResult<Box<dyn Statement + '_>> {
        // The server parses the statement here; mysql_async caches it per
        // connection, so execute re-uses it.
        {
            let mut guard = self.lock();
            let conn = guard.as_mut().ok_or_else(closed)?;
            self.runtime.block_on(conn.prep(sql)).map_err(db_error)?;
        }
        Ok(Box::new(MySqlStatement {
            conn: self,
            sql: sql.to_string(),
            params: Vec::new(),
            rows: Vec::new(),
            changes: 0,
            last_insert_id: 0,
        }))
    }

    fn vendor(&self) -> &str {
        "mysql"
    }
}

/// A statement prepared on a [`MySqlConnection`].
///
/// Values arrive already normalized, so the [`ParamType`] hint is not
/// needed: integers bind as integers and everything else as text or bytes.
pub struct MySqlStatement<'c> {
    conn: &'c MySqlConnection,
    sql: String,
    params: Vec<(String, Value)>,
    rows: Vec<Row>,
    changes: u64,
    last_insert_id: i64,
}

enum Outcome {
    Rows(Vec<mysql_async::Row>),
    Write { changes: u64, last_insert_id: Option<u64> },
}

impl Statement for MySqlStatement<'_> {
    fn bind_value(&mut self, placeholder: &str, value: &Value, _param_type: ParamType) -> JadResult<()> {
        match self.params.iter_mut().find(|(p, _)| p == placeholder) {
            Some((_, slot)) => *slot = value.clone(),
            None => self.params.push((placeholder.to_string(), value.clone())),
        }
        Ok(())
    }

    fn execute(&mut self) -> JadResult<bool> {
        let params = to_params(&self.params);
        let sql = self.sql.as_str();
        let mut guard = self.conn.lock();
        let conn = guard.as_mut().ok_or_else(closed)?;

        // affected rows and the insert id come from the same OK packet, read
        // before the lock is released
        let outcome = self
            .conn
            .runtime
            .block_on(async move {
                let stmt = conn.prep(sql).await?;
                if stmt.columns().is_empty() {
                    conn.exec_drop(&stmt, params).await?;
                    Ok::<_, mysql_async::Error>(Outcome::Write {
                        changes: conn.affected_rows(),
                        last_insert_id: conn.last_insert_id(),
                    })
                } else {
                    let rows: Vec<mysql_async::Row> = conn.exec(&stmt, params).await?;
                    Ok(Outcome::Rows(rows))
                }
            })
            .map_err(db_error)?;
        drop(guard);

        match outcome {
            Outcome::Rows(rows) => {
                self.rows = rows.into_iter().map(convert_row).collect();
                self.changes = 0;
                self.last_insert_id = 0;
            }
            Outcome::Write {
                changes,
                last_insert_id,
            } => {
                self.rows.clear();
                self.changes = changes;
                self.last_insert_id = last_insert_id
                    .and_then(|id| i64::try_from(id).ok())
                    .unwrap_or(0);
            }
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

fn host_or_default(settings: &DatabaseSettings) -> &str {
    let host = settings.host.trim();
    if host.is_empty() {
        "localhost"
    } else {
        host
    }
}

/// Connection options for `settings`; empty user, password or database
/// name are left unset.
fn opts_from_settings(settings: &DatabaseSettings) -> OptsBuilder {
    let port = if settings.port == 0 {
        DEFAULT_PORT
    } else {
        settings.port
    };
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    OptsBuilder::default()
        .ip_or_hostname(host_or_default(settings))
        .tcp_port(port)
        .user(non_empty(&settings.user))
        .pass(non_empty(&settings.password))
        .db_name(non_empty(&settings.name))
}

/// Named parameters keyed without the leading `:`.
fn to_params(bound: &[(String, Value)]) -> Params {
    if bound.is_empty() {
        return Params::Empty;
    }
    let named: Vec<(String, mysql_async::Value)> = bound
        .iter()
        .map(|(placeholder, value)| {
            (
                placeholder.trim_start_matches(':').to_string(),
                to_mysql_value(value),
            )
        })
        .collect();
    Params::from(named)
}

/// Converts a jad `Value` to a `mysql_async` parameter value.
fn to_mysql_value(value: &Value) -> mysql_async::Value {
    match value {
        Value::Null => mysql_async::Value::NULL,
        Value::Bool(b) => mysql_async::Value::Int(i64::from(*b)),
        Value::Int(i) => mysql_async::Value::Int(*i),
        Value::Float(f) => mysql_async::Value::Double(*f),
        Value::String(s) => mysql_async::Value::Bytes(s.as_bytes().to_vec()),
        Value::Bytes(b) => mysql_async::Value::Bytes(b.clone()),
        Value::Date(_) | Value::DateTime(_) => mysql_async::Value::Bytes(value.to_string().into_bytes()),
        Value::Json(_) | Value::List(_) => {
            mysql_async::Value::Bytes(value.to_json().to_string().into_bytes())
        }
    }
}

/// Converts a `mysql_async` column value to a jad `Value`.
///
/// Text that is not valid UTF-8 stays raw bytes. Unsigned integers beyond
/// `i64` become floats. Zero dates and `TIME` values keep their textual form.
#[allow(clippy::cast_precision_loss)]
fn from_mysql_value(value: mysql_async::Value) -> Value {
    match value {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(b) => match String::from_utf8(b) {
            Ok(s) => Value::String(s),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        mysql_async::Value::Int(i) => Value::Int(i),
        mysql_async::Value::UInt(u) => i64::try_from(u).map_or(Value::Float(u as f64), Value::Int),
        mysql_async::Value::Float(f) => Value::Float(f64::from(f)),
        mysql_async::Value::Double(d) => Value::Float(d),
        mysql_async::Value::Date(year, month, day, hour, minute, second, micros) => {
            chrono::NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
                .and_then(|date| {
                    date.and_hms_micro_opt(
                        u32::from(hour),
                        u32::from(minute),
                        u32::from(second),
                        micros,
                    )
                })
                .map_or_else(
                    || {
                        Value::String(format!(
                            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
                        ))
                    },
                    Value::DateTime,
                )
        }
        mysql_async::Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let hours = days * 24 + u32::from(hours);
            let mut text = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
            if micros > 0 {
                text.push_str(&format!(".{micros:06}"));
            }
            Value::String(text)
        }
    }
}

/// Converts a `mysql_async::Row` to a jad [`Row`].
fn convert_row(mut mysql_row: mysql_async::Row) -> Row {
    let columns: Vec<String> = mysql_row
        .columns_ref()
        .iter()
        .map(|c| c.name_str().into_owned())
        .collect();
    let values = (0..columns.len())
        .map(|i| {
            mysql_row
                .take::<mysql_async::Value, _>(i)
                .map_or(Value::Null, from_mysql_value)
        })
        .collect();
    Row::from_columns(columns, values)
}

fn closed() -> JadError {
    JadError::OperationalError("MySQL connection is closed".to_string())
}

fn db_error(e: mysql_async::Error) -> JadError {
    JadError::DatabaseError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> DatabaseSettings {
        DatabaseSettings {
            engine: "mysql".into(),
            name: "shop".into(),
            host: "db.internal".into(),
            port: 3307,
            user: "app".into(),
            password: "secret".into(),
            ..DatabaseSettings::default()
        }
    }

    #[test]
    fn test_opts_from_settings() {
        let opts = mysql_async::Opts::from(opts_from_settings(&settings()));
        assert_eq!(opts.ip_or_hostname(), "db.internal");
        assert_eq!(opts.tcp_port(), 3307);
        assert_eq!(opts.user(), Some("app"));
        assert_eq!(opts.pass(), Some("secret"));
        assert_eq!(opts.db_name(), Some("shop"));
    }

    #[test]
    fn test_opts_defaults() {
        let bare = DatabaseSettings {
            engine: "mysql".into(),
            name: String::new(),
            host: "  ".into(),
            ..DatabaseSettings::default()
        };
        let opts = mysql_async::Opts::from(opts_from_settings(&bare));
        assert_eq!(opts.ip_or_hostname(), "localhost");
        assert_eq!(opts.tcp_port(), DEFAULT_PORT);
        assert_eq!(opts.user(), None);
        assert_eq!(opts.pass(), None);
        assert_eq!(opts.db_name(), None);
    }

    #[test]
    fn test_to_params_strips_colon() {
        let params = to_params(&[
            (":p0".to_string(), Value::Int(7)),
            (":u_name".to_string(), Value::from("ada")),
        ]);
        let Params::Named(named) = params else {
            panic!("expected named params");
        };
        assert_eq!(named.len(), 2);
        assert_eq!(named.get(b"p0".as_slice()), Some(&mysql_async::Value::Int(7)));
        assert_eq!(
            named.get(b"u_name".as_slice()),
            Some(&mysql_async::Value::Bytes(b"ada".to_vec()))
        );
    }

    #[test]
    fn test_to_params_empty() {
        assert!(matches!(to_params(&[]), Params::Empty));
    }

    #[test]
    fn test_to_mysql_value() {
        assert_eq!(to_mysql_value(&Value::Null), mysql_async::Value::NULL);
        assert_eq!(to_mysql_value(&Value::Bool(true)), mysql_async::Value::Int(1));
        assert_eq!(to_mysql_value(&Value::Float(1.5)), mysql_async::Value::Double(1.5));
        assert_eq!(
            to_mysql_value(&Value::List(vec![Value::Int(1), Value::Int(2)])),
            mysql_async::Value::Bytes(b"[1,2]".to_vec())
        );
    }

    #[test]
    fn test_from_mysql_value() {
        assert_eq!(from_mysql_value(mysql_async::Value::NULL), Value::Null);
        assert_eq!(
            from_mysql_value(mysql_async::Value::Bytes(b"hi".to_vec())),
            Value::from("hi")
        );
        assert_eq!(
            from_mysql_value(mysql_async::Value::Bytes(vec![0xff, 0xfe])),
            Value::Bytes(vec![0xff, 0xfe])
        );
        assert_eq!(from_mysql_value(mysql_async::Value::UInt(5)), Value::Int(5));
        assert_eq!(
            from_mysql_value(mysql_async::Value::UInt(u64::MAX)),
            Value::Float(u64::MAX as f64)
        );
        assert_eq!(from_mysql_value(mysql_async::Value::Float(0.5)), Value::Float(0.5));
    }

    #[test]
    fn test_from_mysql_dates_and_times() {
        let dt = chrono::NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(
            from_mysql_value(mysql_async::Value::Date(2024, 6, 15, 10, 30, 0, 0)),
            Value::DateTime(dt)
        );
        assert_eq!(
            from_mysql_value(mysql_async::Value::Date(0, 0, 0, 0, 0, 0, 0)),
            Value::from("0000-00-00 00:00:00")
        );
        assert_eq!(
            from_mysql_value(mysql_async::Value::Time(true, 1, 2, 3, 4, 0)),
            Value::from("-26:03:04")
        );
        assert_eq!(
            from_mysql_value(mysql_async::Value::Time(false, 0, 0, 0, 1, 500)),
            Value::from("00:00:01.000500")
        );
    }

    #[test]
    fn test_connect_refused_is_operational() {
        let unreachable = DatabaseSettings {
            host: "127.0.0.1".into(),
            port: 1,
            ..settings()
        };
        let err = MySqlConnection::connect(&unreachable).err().unwrap();
        assert!(matches!(err, JadError::OperationalError(ref m) if m.contains("MySQL")));
    }
}
