//! Core error types for the jad-rs framework.
//!
//! This module provides the framework error enum [`JadError`] covering the
//! query layer (execution failures, invalid operators, refused mutations),
//! configuration problems and model validation failures, plus the
//! [`FieldErrors`] container of per-field messages.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Per-field validation messages, keyed by field name.
///
/// A field is only present when at least one rule failed for it. Messages
/// keep the order in which the rules were declared.
///
/// # Examples
///
/// ```
/// use jad_rs_core::error::FieldErrors;
///
/// let mut errors = FieldErrors::new();
/// errors.add("email", "The email format is invalid.");
/// assert!(!errors.is_empty());
/// assert_eq!(errors.messages("email").len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    field_errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates an empty error set.
    pub const fn new() -> Self {
        Self {
            field_errors: BTreeMap::new(),
        }
    }

    /// Records a message for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns `true` when no field has failed.
    pub fn is_empty(&self) -> bool {
        self.field_errors.is_empty()
    }

    /// Returns the messages recorded for `field` (empty when it passed).
    pub fn messages(&self, field: &str) -> &[String] {
        self.field_errors.get(field).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if `field` has at least one message.
    pub fn has(&self, field: &str) -> bool {
        self.field_errors.contains_key(field)
    }

    /// Returns the number of failing fields.
    pub fn len(&self) -> usize {
        self.field_errors.len()
    }

    /// Iterates over `(field, messages)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.field_errors
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    /// Consumes the error set and returns the underlying map.
    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.field_errors
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.field_errors {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// The primary error type for the jad-rs framework.
#[derive(Error, Debug)]
pub enum JadError {
    // ── Query layer ──────────────────────────────────────────────────

    /// A statement failed to prepare, bind, execute or fetch.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// The database could not be opened or configured.
    #[error("Operational error: {0}")]
    OperationalError(String),

    /// A WHERE operator outside the allow-list was supplied.
    #[error("Invalid operator '{operator}'. Authorized operators are: {allowed}")]
    InvalidOperator {
        /// The rejected operator, as given by the caller.
        operator: String,
        /// Comma-separated list of accepted operators.
        allowed: String,
    },

    /// A guard rail refused to build a mutation (missing table, missing
    /// predicate, empty values).
    #[error("Refused operation: {0}")]
    RefusedOperation(String),

    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The framework is used before being configured (e.g. no connection).
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl JadError {
    /// Returns `true` for errors that mean nothing can be executed at all.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ImproperlyConfigured(_) | Self::OperationalError(_)
        )
    }
}

impl From<serde_json::Error> for JadError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<FieldErrors> for JadError {
    fn from(err: FieldErrors) -> Self {
        Self::ValidationError(err)
    }
}

/// A convenience type alias for `Result<T, JadError>`.
pub type JadResult<T> = Result<T, JadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let mut err = FieldErrors::new();
        err.add("email", "Invalid email.");
        err.add("age", "Must be a number.");
        // BTreeMap ordering: age before email
        assert_eq!(err.to_string(), "age: Must be a number.; email: Invalid email.");
    }

    #[test]
    fn test_validation_error_keeps_message_order() {
        let mut err = FieldErrors::new();
        err.add("name", "first");
        err.add("name", "second");
        assert_eq!(err.messages("name"), ["first", "second"]);
        assert_eq!(err.len(), 1);
        assert!(err.has("name"));
        assert!(!err.has("email"));
        assert!(err.messages("email").is_empty());
    }

    #[test]
    fn test_validation_error_serializes_as_map() {
        let mut err = FieldErrors::new();
        err.add("title", "required");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!({"title": ["required"]}));
    }

    #[test]
    fn test_invalid_operator_display() {
        let err = JadError::InvalidOperator {
            operator: "; DROP TABLE".into(),
            allowed: "=, !=".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid operator '; DROP TABLE'. Authorized operators are: =, !="
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(JadError::ImproperlyConfigured("x".into()).is_fatal());
        assert!(JadError::OperationalError("x".into()).is_fatal());
        assert!(!JadError::DatabaseError("x".into()).is_fatal());
        assert!(!JadError::RefusedOperation("x".into()).is_fatal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: JadError = io_err.into();
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn test_validation_error_conversion() {
        let mut fields = FieldErrors::new();
        fields.add("email", "required");
        let err: JadError = fields.into();
        assert!(matches!(err, JadError::ValidationError(ref v) if v.has("email")));
    }
}
