//! Comparison operators accepted in WHERE conditions.
//!
//! Column names and raw fragments are trusted, but operators come from
//! caller input often enough that they are checked against a fixed
//! allow-list before any SQL is assembled.

use std::fmt;
use std::str::FromStr;

use jad_rs_core::JadError;

/// An allow-listed SQL comparison operator.
///
/// Parsing trims and upper-cases the input, so `" like "` is accepted.
///
/// ```
/// use jad_rs_db::query::Operator;
///
/// assert_eq!(" like ".parse::<Operator>().unwrap(), Operator::Like);
/// assert!("; DROP TABLE".parse::<Operator>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `<>`
    LtGt,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `IN`
    In,
    /// `NOT IN`
    NotIn,
    /// `IS NULL`
    IsNull,
    /// `IS NOT NULL`
    IsNotNull,
    /// `BETWEEN`
    Between,
}

impl Operator {
    /// Every accepted operator, in documentation order.
    pub const ALL: [Self; 14] = [
        Self::Eq,
        Self::NotEq,
        Self::LtGt,
        Self::Lt,
        Self::Lte,
        Self::Gt,
        Self::Gte,
        Self::Like,
        Self::NotLike,
        Self::In,
        Self::NotIn,
        Self::IsNull,
        Self::IsNotNull,
        Self::Between,
    ];

    /// The SQL spelling of the operator.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::LtGt => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
            Self::Between => "BETWEEN",
        }
    }

    /// `IS NULL` and `IS NOT NULL` take no operand.
    pub const fn is_null_check(self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }

    /// `IN` and `NOT IN` expect a list operand.
    pub const fn is_membership(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// Comma-separated list of every accepted operator.
    pub fn allowed_list() -> String {
        Self::ALL
            .iter()
            .map(|op| op.as_sql())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Operator {
    type Err = JadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|op| op.as_sql() == normalized)
            .ok_or_else(|| JadError::InvalidOperator {
                operator: s.to_string(),
                allowed: Self::allowed_list(),
            })
    }
}

/// Sort direction for `ORDER BY` and collection sorting.
///
/// Converting from a string is lenient: `"desc"` in any case means
/// [`SortDirection::Desc`], anything else [`SortDirection::Asc`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// The SQL keyword.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl From<&str> for SortDirection {
    fn from(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_allowed_operator() {
        for op in Operator::ALL {
            assert_eq!(op.as_sql().parse::<Operator>().unwrap(), op);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive_and_trimmed() {
        assert_eq!("  not like ".parse::<Operator>().unwrap(), Operator::NotLike);
        assert_eq!("is not null".parse::<Operator>().unwrap(), Operator::IsNotNull);
        assert_eq!("In".parse::<Operator>().unwrap(), Operator::In);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        for bad in ["; DROP TABLE", "==", "REGEXP", "", "NOTLIKE"] {
            let err = bad.parse::<Operator>().unwrap_err();
            assert!(matches!(err, JadError::InvalidOperator { .. }), "{bad}");
        }
    }

    #[test]
    fn test_error_lists_allowed_operators() {
        let err = "~".parse::<Operator>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'~'"));
        assert!(msg.contains("=, !=, <>, <, <=, >, >=, LIKE, NOT LIKE, IN, NOT IN, IS NULL, IS NOT NULL, BETWEEN"));
    }

    #[test]
    fn test_sort_direction_from_str() {
        assert_eq!(SortDirection::from("DESC"), SortDirection::Desc);
        assert_eq!(SortDirection::from(" desc "), SortDirection::Desc);
        assert_eq!(SortDirection::from("asc"), SortDirection::Asc);
        assert_eq!(SortDirection::from("sideways"), SortDirection::Asc);
        assert_eq!(SortDirection::default().to_string(), "ASC");
    }

    #[test]
    fn test_classification() {
        assert!(Operator::IsNull.is_null_check());
        assert!(!Operator::Eq.is_null_check());
        assert!(Operator::NotIn.is_membership());
        assert!(!Operator::Between.is_membership());
    }
}
