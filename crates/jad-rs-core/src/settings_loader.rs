//! Settings loading from configuration files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply a `.env` map and/or process environment overrides (highest
//!    priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `APP_NAME` | `app_name` |
//! | `APP_DEBUG` | `debug` |
//! | `APP_LOG_LEVEL` | `log_level` |
//! | `APP_LOG_FILE` | `log_file` |
//! | `DB_QUERY_DEBUG` | `query_debug` |
//! | `DB_CONNECTION` | `databases.default.engine` |
//! | `DB_HOST` | `databases.default.host` |
//! | `DB_PORT` | `databases.default.port` |
//! | `DB_NAME` | `databases.default.name` |
//! | `DB_USERNAME` | `databases.default.user` |
//! | `DB_PASSWORD` | `databases.default.password` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use jad_rs_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/settings.toml").unwrap();
//! let settings = settings_loader::from_env_file(".env").unwrap();
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::env::{load_env_file, EnvValue};
use crate::error::{JadError, JadResult};
use crate::settings::Settings;

/// Loads settings from a TOML string, merged over the defaults.
pub fn from_toml_str(toml_str: &str) -> JadResult<Settings> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| JadError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;
    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> JadResult<Settings> {
    from_toml_str(&read_config(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies process environment
/// overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> JadResult<Settings> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string, merged over the defaults.
pub fn from_json_str(json_str: &str) -> JadResult<Settings> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| JadError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> JadResult<Settings> {
    from_json_str(&read_config(path.as_ref(), "JSON")?)
}

/// Loads settings from a JSON file and then applies process environment
/// overrides.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> JadResult<Settings> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Loads settings from a `.env` file, then lets the process environment
/// override it. A missing file is an error.
pub fn from_env_file(path: impl AsRef<Path>) -> JadResult<Settings> {
    let vars = load_env_file(path)?;
    let mut settings = Settings::default();
    apply_env_map(&mut settings, &vars);
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Applies overrides from the process environment.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_env_with(settings, |key| std::env::var(key).ok());
}

/// Applies overrides from an explicit variable map (typically a parsed
/// `.env` file).
pub fn apply_env_map(settings: &mut Settings, vars: &HashMap<String, String>) {
    apply_env_with(settings, |key| vars.get(key).cloned());
}

fn apply_env_with(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).map(|raw| EnvValue::parse(&raw));

    if let Some(val) = get("APP_NAME").and_then(|v| v.as_str().map(str::to_string)) {
        settings.app_name = val;
    }
    if let Some(val) = get("APP_DEBUG") {
        settings.debug = val.as_bool();
    }
    if let Some(val) = get("APP_LOG_LEVEL").and_then(|v| v.as_str().map(str::to_string)) {
        settings.log_level = val;
    }
    if let Some(val) = get("APP_LOG_FILE") {
        settings.log_file = val.as_str().filter(|s| !s.is_empty()).map(PathBuf::from);
    }
    if let Some(val) = get("DB_QUERY_DEBUG") {
        settings.query_debug = val.as_bool();
    }

    let db = settings.databases.entry("default".to_string()).or_default();

    if let Some(val) = get("DB_CONNECTION").and_then(|v| v.as_str().map(str::to_string)) {
        db.engine = val;
    }
    if let Some(val) = get("DB_HOST").and_then(|v| v.as_str().map(str::to_string)) {
        db.host = val;
    }
    if let Some(val) = get("DB_PORT").and_then(|v| v.as_str().map(str::to_string)) {
        match val.parse::<u16>() {
            Ok(port) => db.port = port,
            Err(_) => warn!(value = %val, "Ignoring non-numeric DB_PORT"),
        }
    }
    if let Some(val) = get("DB_NAME").and_then(|v| v.as_str().map(str::to_string)) {
        db.name = val;
    }
    if let Some(val) = get("DB_USERNAME").and_then(|v| v.as_str().map(str::to_string)) {
        db.user = val;
    }
    if let Some(val) = get("DB_PASSWORD") {
        db.password = val.as_str().unwrap_or_default().to_string();
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn read_config(path: &Path, format: &str) -> JadResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        JadError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(value: serde_json::Value, format: &str) -> JadResult<Settings> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        JadError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    serde_json::from_value(merge_json(default_json, value)).map_err(|e| {
        JadError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = match base_map.remove(&key) {
                    Some(base_v) => merge_json(base_v, override_v),
                    None => override_v,
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
