//! Rule-string validation for model input.
//!
//! Rules are written per field as a pipe-separated string such as
//! `"required|email|max:120"`. Each segment parses into a [`Rule`]; segments
//! that name no known rule are ignored.
//!
//! A blank value (NULL, `""`, `"0"`, `0`, `false`) skips every rule except
//! `required`, so optional fields only get checked when filled in.

use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use jad_rs_core::FieldErrors;
use regex::Regex;
use tracing::debug;

use crate::row::Row;
use crate::value::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

/// A single validation rule.
///
/// # Examples
///
/// ```
/// use jad_rs_db::validators::Rule;
///
/// assert_eq!(
///     Rule::parse_all("required|min:3|shiny"),
///     vec![Rule::Required, Rule::MinLength(3)]
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// The value must not be blank.
    Required,
    /// The value must be a string.
    Text,
    /// The value must be numeric (numeric strings included).
    Number,
    /// `YYYY-MM-DD`, and a real calendar date.
    Date,
    /// `YYYY-MM-DD HH:MM:SS`.
    Timestamp,
    /// A plausible e-mail address.
    Email,
    /// One of `true`, `false`, `1`, `0`, `"1"`, `"0"`, `"true"`, `"false"`.
    Boolean,
    /// At least this many characters in the string form.
    MinLength(usize),
    /// At most this many characters in the string form.
    MaxLength(usize),
}

impl Rule {
    /// Parses one rule segment. Unknown names and malformed lengths yield
    /// `None`.
    pub fn parse(segment: &str) -> Option<Self> {
        let segment = segment.trim();
        if let Some((name, arg)) = segment.split_once(':') {
            let n = arg.trim().parse::<usize>().ok()?;
            return match name.trim() {
                "min" => Some(Self::MinLength(n)),
                "max" => Some(Self::MaxLength(n)),
                _ => None,
            };
        }
        match segment {
            "required" => Some(Self::Required),
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "timestamp" => Some(Self::Timestamp),
            "email" => Some(Self::Email),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Parses a pipe-separated rule string, dropping unknown segments.
    pub fn parse_all(rules: &str) -> Vec<Self> {
        rules
            .split('|')
            .filter(|s| !s.trim().is_empty())
            .filter_map(|segment| {
                let rule = Self::parse(segment);
                if rule.is_none() {
                    debug!(rule = segment, "Ignoring unknown validation rule");
                }
                rule
            })
            .collect()
    }

    /// Checks `value`, returning the error message on failure.
    pub fn check(self, field: &str, value: &Value) -> Result<(), String> {
        if value.is_blank() {
            return if self == Self::Required {
                Err(self.message(field))
            } else {
                Ok(())
            };
        }

        let ok = match self {
            Self::Required => true,
            Self::Text => matches!(value, Value::String(_)),
            Self::Number => value.is_numeric(),
            Self::Date => is_date(value),
            Self::Timestamp => is_timestamp(value),
            Self::Email => value.as_str().is_some_and(|s| EMAIL_RE.is_match(s)),
            Self::Boolean => is_boolean(value),
            Self::MinLength(n) => char_len(value) >= n,
            Self::MaxLength(n) => char_len(value) <= n,
        };
        if ok {
            Ok(())
        } else {
            Err(self.message(field))
        }
    }

    fn message(self, field: &str) -> String {
        match self {
            Self::Required => format!("The {field} field is required."),
            Self::Text => format!("The {field} field must be text."),
            Self::Number => format!("The {field} field must be a number."),
            Self::Date => {
                format!("The {field} field must be a date in YYYY-MM-DD format (e.g. 2026-01-26).")
            }
            Self::Timestamp => {
                format!("The {field} field must be a timestamp in YYYY-MM-DD HH:MM:SS format.")
            }
            Self::Email => "The email format is invalid.".to_string(),
            Self::Boolean => format!("The {field} field must be a boolean."),
            Self::MinLength(n) => format!("The {field} field must contain at least {n} characters."),
            Self::MaxLength(n) => format!("The {field} field must not exceed {n} characters."),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("required"),
            Self::Text => f.write_str("text"),
            Self::Number => f.write_str("number"),
            Self::Date => f.write_str("date"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Email => f.write_str("email"),
            Self::Boolean => f.write_str("boolean"),
            Self::MinLength(n) => write!(f, "min:{n}"),
            Self::MaxLength(n) => write!(f, "max:{n}"),
        }
    }
}

fn is_date(value: &Value) -> bool {
    match value {
        Value::Date(_) => true,
        Value::String(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .is_ok_and(|d| d.format(DATE_FORMAT).to_string() == *s),
        _ => false,
    }
}

fn is_timestamp(value: &Value) -> bool {
    match value {
        Value::DateTime(_) => true,
        Value::String(s) => NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .is_ok_and(|d| d.format(TIMESTAMP_FORMAT).to_string() == *s),
        _ => false,
    }
}

fn is_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Int(i) => *i == 0 || *i == 1,
        Value::String(s) => matches!(s.as_str(), "1" | "0" | "true" | "false"),
        _ => false,
    }
}

fn char_len(value: &Value) -> usize {
    value.to_string().chars().count()
}

/// Validates a data row against per-field rule strings.
///
/// ```
/// use jad_rs_db::row;
/// use jad_rs_db::validators::Validator;
///
/// let mut v = Validator::new();
/// let ok = v.validate(
///     &row! { "email" => "nope", "name" => "" },
///     &[("email", "required|email"), ("name", "required")],
/// );
/// assert!(!ok);
/// assert_eq!(v.errors().messages("email"), ["The email format is invalid."]);
/// assert!(v.errors().has("name"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    /// Creates a validator with no errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every rule of every field against `data`. Fields missing from
    /// `data` read as NULL. Errors from a previous run are discarded.
    ///
    /// Returns `true` when no rule failed.
    pub fn validate(&mut self, data: &Row, rules: &[(&str, &str)]) -> bool {
        self.errors = FieldErrors::new();
        for (field, spec) in rules {
            let value = &data[*field];
            for rule in Rule::parse_all(spec) {
                if let Err(message) = rule.check(field, value) {
                    self.errors.add(*field, message);
                }
            }
        }
        self.errors.is_empty()
    }

    /// Field errors from the last run.
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Consumes the validator and returns its errors.
    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn check(rule: &str, value: impl Into<Value>) -> Result<(), String> {
        Rule::parse(rule).unwrap().check("f", &value.into())
    }

    #[test]
    fn test_parse_rules() {
        assert_eq!(Rule::parse("email"), Some(Rule::Email));
        assert_eq!(Rule::parse(" max:10 "), Some(Rule::MaxLength(10)));
        assert_eq!(Rule::parse("min:x"), None);
        assert_eq!(Rule::parse("between:1"), None);
        assert_eq!(Rule::parse("unknown"), None);
        assert_eq!(Rule::parse_all(""), Vec::<Rule>::new());
    }

    #[test]
    fn test_rule_display_round_trips() {
        for rule in ["required", "text", "number", "date", "timestamp", "email", "boolean", "min:2", "max:9"] {
            assert_eq!(Rule::parse(rule).unwrap().to_string(), rule);
        }
    }

    #[test]
    fn test_required() {
        assert!(check("required", Value::Null).is_err());
        assert!(check("required", "").is_err());
        assert!(check("required", "0").is_err());
        assert!(check("required", "x").is_ok());
        assert_eq!(
            check("required", "").unwrap_err(),
            "The f field is required."
        );
    }

    #[test]
    fn test_blank_skips_other_rules() {
        for rule in ["text", "number", "date", "timestamp", "email", "boolean", "min:5"] {
            assert!(check(rule, "").is_ok(), "{rule}");
            assert!(check(rule, Value::Null).is_ok(), "{rule}");
        }
    }

    #[test]
    fn test_text_and_number() {
        assert!(check("text", "hello").is_ok());
        assert!(check("text", 12).is_err());
        assert!(check("number", "12.5").is_ok());
        assert!(check("number", 7).is_ok());
        assert!(check("number", "12a").is_err());
    }

    #[test]
    fn test_date_requires_exact_format() {
        assert!(check("date", "2026-01-26").is_ok());
        assert!(check("date", "2026-02-30").is_err());
        assert!(check("date", "2026-1-26").is_err());
        assert!(check("date", "26/01/2026").is_err());
    }

    #[test]
    fn test_timestamp() {
        assert!(check("timestamp", "2026-01-26 08:30:00").is_ok());
        assert!(check("timestamp", "2026-01-26").is_err());
        assert!(check("timestamp", "2026-01-26 25:00:00").is_err());
    }

    #[test]
    fn test_email() {
        assert!(check("email", "ada@example.com").is_ok());
        assert!(check("email", "ada@example").is_err());
        assert!(check("email", "not an email").is_err());
    }

    #[test]
    fn test_boolean() {
        for ok in [Value::Bool(true), Value::Int(1), Value::from("1"), Value::from("true"), Value::from("false")] {
            assert!(Rule::Boolean.check("f", &ok).is_ok(), "{ok:?}");
        }
        assert!(check("boolean", "yes").is_err());
        assert!(check("boolean", 2).is_err());
    }

    #[test]
    fn test_lengths_count_characters() {
        assert!(check("min:3", "abc").is_ok());
        assert!(check("min:3", "ab").is_err());
        assert!(check("max:3", "été").is_ok());
        assert!(check("max:3", "abcd").is_err());
        assert_eq!(
            check("max:3", "abcd").unwrap_err(),
            "The f field must not exceed 3 characters."
        );
    }

    #[test]
    fn test_validator_collects_per_field() {
        let mut v = Validator::new();
        let data = row! { "title" => "ab", "published_at" => "yesterday" };
        let ok = v.validate(
            &data,
            &[
                ("title", "required|text|min:3"),
                ("published_at", "timestamp"),
                ("author", "required"),
            ],
        );
        assert!(!ok);
        assert_eq!(v.errors().len(), 3);
        assert_eq!(v.errors().messages("title").len(), 1);
        assert!(v.errors().has("author"));
    }

    #[test]
    fn test_validator_resets_between_runs() {
        let mut v = Validator::new();
        assert!(!v.validate(&Row::new(), &[("a", "required")]));
        assert!(v.validate(&row! { "a" => "x" }, &[("a", "required")]));
        assert!(v.into_errors().is_empty());
    }
}
