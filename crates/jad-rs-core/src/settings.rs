//! Settings system for the jad-rs framework.
//!
//! This module provides the [`Settings`] struct, which holds the framework
//! configuration (application name, logging, database connections), and
//! [`LazySettings`], a globally-accessible, lazily-initialized settings
//! instance. The query layer never reads the global; connection handles are
//! always passed explicitly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{JadError, JadResult};

/// Database connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// The database engine: `sqlite` (bundled), or `mysql`/`mariadb` with the
    /// `mysql` feature.
    pub engine: String,
    /// The database name (or file path for `SQLite`, `:memory:` allowed).
    pub name: String,
    /// The database host.
    pub host: String,
    /// The database port.
    pub port: u16,
    /// The database user.
    pub user: String,
    /// The database password.
    pub password: String,
    /// Additional engine-specific options.
    pub options: HashMap<String, String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine: "sqlite".to_string(),
            name: "database.sqlite3".to_string(),
            host: "localhost".to_string(),
            port: 0,
            user: String::new(),
            password: String::new(),
            options: HashMap::new(),
        }
    }
}

impl DatabaseSettings {
    /// Shorthand for an in-memory `SQLite` database.
    pub fn sqlite_memory() -> Self {
        Self {
            name: ":memory:".to_string(),
            ..Self::default()
        }
    }
}

/// The complete set of framework settings.
///
/// # Examples
///
/// ```
/// use jad_rs_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.log_level, "info");
/// assert!(settings.databases.contains_key("default"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,
    /// Human readable application name.
    pub app_name: String,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level or filter directive (e.g. "info", "jad_rs_db=debug").
    pub log_level: String,
    /// Append log output to this file instead of stderr.
    pub log_file: Option<PathBuf>,

    // ── Database ─────────────────────────────────────────────────────

    /// Log every compiled query and its bindings before execution.
    pub query_debug: bool,
    /// Database configurations, keyed by alias (e.g. "default").
    pub databases: HashMap<String, DatabaseSettings>,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut databases = HashMap::new();
        databases.insert("default".to_string(), DatabaseSettings::default());

        Self {
            debug: true,
            app_name: "jad".to_string(),
            log_level: "info".to_string(),
            log_file: None,
            query_debug: false,
            databases,
            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Returns the `default` database configuration.
    pub fn default_database(&self) -> JadResult<&DatabaseSettings> {
        self.database("default")
    }

    /// Returns the database configuration registered under `alias`.
    pub fn database(&self, alias: &str) -> JadResult<&DatabaseSettings> {
        self.databases.get(alias).ok_or_else(|| {
            JadError::ImproperlyConfigured(format!("No database configured for alias '{alias}'"))
        })
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup to set the
/// settings, then use [`get`](LazySettings::get) to access them.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Only the first call wins.
    pub fn configure(&self, settings: Settings) -> JadResult<()> {
        self.inner.set(settings).map_err(|_| {
            JadError::ImproperlyConfigured("Settings have already been configured".to_string())
        })
    }

    /// Returns a reference to the configured settings.
    pub fn get(&self) -> JadResult<&Settings> {
        self.inner.get().ok_or_else(|| {
            JadError::ImproperlyConfigured(
                "Settings have not been configured. Call SETTINGS.configure() first.".to_string(),
            )
        })
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.app_name, "jad");
        assert_eq!(s.log_level, "info");
        assert!(s.log_file.is_none());
        assert!(!s.query_debug);
        assert!(s.extra.is_empty());
    }

    #[test]
    fn test_default_database() {
        let s = Settings::default();
        let db = s.default_database().unwrap();
        assert_eq!(db.engine, "sqlite");
        assert_eq!(db.name, "database.sqlite3");
        assert_eq!(db.host, "localhost");
    }

    #[test]
    fn test_missing_alias_is_improperly_configured() {
        let s = Settings::default();
        let err = s.database("replica").unwrap_err();
        assert!(matches!(err, JadError::ImproperlyConfigured(_)));
        assert!(err.to_string().contains("replica"));
    }

    #[test]
    fn test_sqlite_memory() {
        let db = DatabaseSettings::sqlite_memory();
        assert_eq!(db.name, ":memory:");
        assert_eq!(db.engine, "sqlite");
    }

    #[test]
    fn test_settings_serialization_roundtrip() {
        let s = Settings::default();
        let json = serde_json::to_string(&s).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.app_name, s.app_name);
        assert_eq!(back.databases, s.databases);
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let s: Settings = serde_json::from_str(r#"{"app_name": "blog"}"#).unwrap();
        assert_eq!(s.app_name, "blog");
        assert_eq!(s.log_level, "info");
        assert!(s.databases.contains_key("default"));
    }

    #[test]
    fn test_lazy_settings_lifecycle() {
        let lazy = LazySettings::new();
        assert!(!lazy.is_configured());
        assert!(lazy.get().is_err());

        let s = Settings {
            app_name: "lazy".to_string(),
            ..Settings::default()
        };
        lazy.configure(s).unwrap();
        assert!(lazy.is_configured());
        assert_eq!(lazy.get().unwrap().app_name, "lazy");

        let again = lazy.configure(Settings::default());
        assert!(matches!(again, Err(JadError::ImproperlyConfigured(_))));
    }
}
