//! # jad-rs-db-backends
//!
//! Database drivers for the jad-rs framework. Each driver implements the
//! [`Connection`](jad_rs_db::connection::Connection) trait so the query
//! builder can prepare, bind and execute against it.
//!
//! Supported backends:
//! - `SQLite` (feature `sqlite`, on by default)
//! - `MySQL`/`MariaDB` (feature `mysql`)

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mysql")]
pub use mysql::{MySqlConnection, MySqlStatement};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConnection, SqliteStatement};

use jad_rs_core::settings::DatabaseSettings;
use jad_rs_core::{JadError, JadResult};
use jad_rs_db::connection::SharedConnection;
use tracing::{error, info};

/// Opens the connection described by `settings`.
///
/// The engine name is matched case-insensitively. Unknown engines, and
/// engines whose feature is disabled, are
/// [`ImproperlyConfigured`](JadError::ImproperlyConfigured).
pub fn connect(settings: &DatabaseSettings) -> JadResult<SharedConnection> {
    let engine = settings.engine.trim().to_lowercase();
    match engine.as_str() {
        #[cfg(feature = "sqlite")]
        "sqlite" | "sqlite3" => {
            let conn = SqliteConnection::open(&settings.name)?;
            info!(engine = %engine, name = %settings.name, "Database connection established");
            Ok(std::sync::Arc::new(conn))
        }
        #[cfg(feature = "mysql")]
        "mysql" | "mariadb" => {
            let conn = MySqlConnection::connect(settings)?;
            info!(engine = %engine, host = %settings.host, name = %settings.name, "Database connection established");
            Ok(std::sync::Arc::new(conn))
        }
        _ => {
            error!(engine = %settings.engine, "Unsupported database engine");
            Err(JadError::ImproperlyConfigured(format!(
                "Unsupported database engine '{}'",
                settings.engine
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_unknown_engine() {
        let settings = DatabaseSettings {
            engine: "oracle".into(),
            ..DatabaseSettings::default()
        };
        let err = connect(&settings).err().unwrap();
        assert!(matches!(err, JadError::ImproperlyConfigured(ref m) if m.contains("oracle")));
    }

    #[cfg(not(feature = "mysql"))]
    #[test]
    fn test_connect_mysql_needs_feature() {
        let settings = DatabaseSettings {
            engine: "mysql".into(),
            ..DatabaseSettings::default()
        };
        assert!(matches!(
            connect(&settings),
            Err(JadError::ImproperlyConfigured(_))
        ));
    }

    #[cfg(feature = "mysql")]
    #[test]
    fn test_connect_mysql_unreachable() {
        let settings = DatabaseSettings {
            engine: "MariaDB".into(),
            name: "app".into(),
            host: "127.0.0.1".into(),
            port: 1,
            ..DatabaseSettings::default()
        };
        assert!(matches!(
            connect(&settings),
            Err(JadError::OperationalError(_))
        ));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_connect_sqlite_memory() {
        let settings = DatabaseSettings {
            engine: "SQLite3".into(),
            ..DatabaseSettings::sqlite_memory()
        };
        let conn = connect(&settings).unwrap();
        assert_eq!(conn.vendor(), "sqlite");
    }
}
