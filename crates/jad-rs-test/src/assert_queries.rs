//! Query counting assertion for database tests.
//!
//! Provides [`assert_num_queries`] which counts the number of SQL queries
//! executed during a closure and asserts that the count matches an
//! expected value. This is essential for detecting N+1 query problems.
//!
//! ## Example
//!
//! ```rust
//! use jad_rs_db::row;
//! use jad_rs_test::test_database::TestDatabase;
//! use jad_rs_test::assert_queries::assert_num_queries;
//!
//! let tdb = TestDatabase::new();
//! tdb.execute_raw("CREATE TABLE t (id INTEGER PRIMARY KEY, val TEXT)")
//!     .unwrap();
//! let db = tdb.db();
//!
//! assert_num_queries(&tdb, 1, || {
//!     db.table("t").unwrap().insert(row! { "val" => "x" });
//! });
//! ```

use crate::test_database::TestDatabase;

/// Asserts that exactly `expected_count` SQL queries are executed during the
/// closure.
///
/// Resets the query counter on the [`TestDatabase`] before executing the closure,
/// then checks the counter after execution.
///
/// # Panics
///
/// Panics if the number of queries does not match `expected_count`.
pub fn assert_num_queries<F>(db: &TestDatabase, expected_count: usize, f: F)
where
    F: FnOnce(),
{
    db.reset_query_count();
    f();
    let actual = db.query_count();
    assert_eq!(
        actual, expected_count,
        "Expected {expected_count} SQL queries, but {actual} were executed"
    );
}

/// Asserts that at most `max_count` SQL queries are executed during the
/// closure.
///
/// Useful when the exact count is not important but you want to prevent query
/// count regression.
///
/// # Panics
///
/// Panics if more than `max_count` queries are executed.
pub fn assert_max_queries<F>(db: &TestDatabase, max_count: usize, f: F)
where
    F: FnOnce(),
{
    db.reset_query_count();
    f();
    let actual = db.query_count();
    assert!(
        actual <= max_count,
        "Expected at most {max_count} SQL queries, but {actual} were executed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use jad_rs_db::model::{Model, ModelMeta};
    use jad_rs_db::row;

    struct Tag;

    impl Model for Tag {
        fn meta() -> &'static ModelMeta {
            static META: ModelMeta = ModelMeta {
                table: "tags",
                columns: &["label"],
                rules: &[],
            };
            &META
        }
    }

    fn setup() -> TestDatabase {
        let tdb = TestDatabase::new();
        tdb.setup_table(Tag::meta()).unwrap();
        tdb
    }

    #[test]
    fn test_assert_num_queries_pass() {
        let tdb = setup();
        let db = tdb.db();
        assert_num_queries(&tdb, 2, || {
            db.table("tags").unwrap().insert(row! { "label" => "a" });
            db.table("tags").unwrap().insert(row! { "label" => "b" });
        });
    }

    #[test]
    #[should_panic(expected = "Expected 1 SQL queries, but 2 were executed")]
    fn test_assert_num_queries_fail() {
        let tdb = setup();
        let db = tdb.db();
        assert_num_queries(&tdb, 1, || {
            db.table("tags").unwrap().insert(row! { "label" => "a" });
            db.table("tags").unwrap().count();
        });
    }

    #[test]
    fn test_assert_num_queries_zero() {
        let tdb = setup();
        assert_num_queries(&tdb, 0, || {});
    }

    #[test]
    fn test_refused_operations_issue_no_queries() {
        let tdb = setup();
        let db = tdb.db();
        assert_num_queries(&tdb, 0, || {
            assert_eq!(db.table("tags").unwrap().delete(), None);
            assert_eq!(db.table("tags").unwrap().insert(jad_rs_db::Row::new()), None);
        });
    }

    #[test]
    fn test_model_queries_are_counted() {
        let tdb = setup();
        let db = tdb.db();
        assert_max_queries(&tdb, 3, || {
            let mut tag = Tag::new_entity(&db).unwrap();
            tag.set("label", "rust");
            assert!(tag.save());
            assert_eq!(Tag::all(&db).unwrap().len(), 1);
        });
    }

    #[test]
    #[should_panic(expected = "Expected at most 0 SQL queries, but 1 were executed")]
    fn test_assert_max_queries_fail() {
        let tdb = setup();
        let db = tdb.db();
        assert_max_queries(&tdb, 0, || {
            db.table("tags").unwrap().get();
        });
    }
}
