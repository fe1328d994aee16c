//! `.env` file support.
//!
//! A `.env` file holds `KEY=value` lines. Blank lines and lines starting
//! with `#` are skipped, keys and values are trimmed, and one pair of
//! surrounding quotes is stripped from the value. The parsed map is fed to
//! [`settings_loader::apply_env_map`](crate::settings_loader::apply_env_map).
//!
//! ```
//! use jad_rs_core::env::{parse_env_str, EnvValue};
//!
//! let vars = parse_env_str("APP_DEBUG=true\nDB_NAME=\"blog.sqlite3\"\n");
//! assert_eq!(vars["DB_NAME"], "blog.sqlite3");
//! assert_eq!(EnvValue::parse(&vars["APP_DEBUG"]), EnvValue::Bool(true));
//! ```

use std::collections::HashMap;
use std::path::Path;

use crate::error::{JadError, JadResult};

/// A typed view of a raw environment string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    /// `true` or `false`, case-insensitive.
    Bool(bool),
    /// `null`, case-insensitive.
    Null,
    /// Anything else, verbatim.
    Str(String),
}

impl EnvValue {
    /// Coerces the literal words `true`, `false` and `null`; everything else
    /// stays a string.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            "null" => Self::Null,
            _ => Self::Str(raw.to_string()),
        }
    }

    /// Interprets the value as a flag. `"1"` and `"yes"` count as true too.
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Null => false,
            Self::Str(s) => matches!(s.to_ascii_lowercase().as_str(), "1" | "yes" | "on"),
        }
    }

    /// Returns the string form, `None` for `null`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Bool(true) => Some("true"),
            Self::Bool(false) => Some("false"),
            Self::Null => None,
            Self::Str(s) => Some(s),
        }
    }
}

/// Parses the content of a `.env` file.
///
/// Lines without `=` or with an empty key are ignored. Later keys win.
pub fn parse_env_str(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), strip_quotes(value.trim()).to_string());
    }
    vars
}

/// Reads and parses a `.env` file.
///
/// Unlike the settings files, a missing `.env` is an error: the caller asked
/// for that file explicitly.
pub fn load_env_file(path: impl AsRef<Path>) -> JadResult<HashMap<String, String>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(JadError::ConfigurationError(format!(
            ".env file not found at: {}",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(parse_env_str(&content))
}

fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if matches!(first, b'"' | b'\'') && matches!(last, b'"' | b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}
