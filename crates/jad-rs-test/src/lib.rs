//! # jad-rs-test
//!
//! Testing utilities for the jad-rs query layer. Provides a recording
//! connection that captures prepared SQL and bindings, an in-memory SQLite
//! database with query counting, and assertion helpers for query counts.

pub mod recording;

#[cfg(feature = "sqlite")]
pub mod assert_queries;
#[cfg(feature = "sqlite")]
pub mod test_database;

pub use recording::{RecordedCall, RecordingConnection};

#[cfg(feature = "sqlite")]
pub use assert_queries::{assert_max_queries, assert_num_queries};
#[cfg(feature = "sqlite")]
pub use test_database::TestDatabase;
