//! Query building and execution.
//!
//! - [`operator`] - Allow-listed comparison operators and sort directions
//! - [`builder`] - The fluent [`QueryBuilder`], its [`Bindings`] and the
//!   [`FromRow`] hydration hook

pub mod builder;
pub mod operator;

pub use builder::{Bindings, FromRow, QueryBuilder};
pub use operator::{Operator, SortDirection};
