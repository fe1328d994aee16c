//! Inserts from several threads sharing one connection.
//!
//! Every thread must get back the id of its own row, never one generated by
//! a neighbour that wrote in between.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use jad_rs_db::row;
use jad_rs_db::value::Value;
use jad_rs_db::Db;
use jad_rs_db_backends::SqliteConnection;

const THREADS: usize = 8;
const INSERTS_PER_THREAD: usize = 300;

fn setup_db() -> Db {
    let conn = SqliteConnection::memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tag TEXT NOT NULL,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP
        );",
    )
    .unwrap();
    Db::new(Arc::new(conn))
}

#[test]
fn test_concurrent_inserts_return_their_own_id() {
    let db = setup_db();
    let mismatches = AtomicUsize::new(0);

    thread::scope(|scope| {
        for t in 0..THREADS {
            let db = db.clone();
            let mismatches = &mismatches;
            scope.spawn(move || {
                for i in 0..INSERTS_PER_THREAD {
                    let tag = format!("{t}-{i}");
                    let id = db
                        .table("tags")
                        .unwrap()
                        .try_insert(row! { "tag" => tag.clone() })
                        .unwrap();
                    let found = db.table("tags").unwrap().find(id).unwrap();
                    if found["tag"] != Value::from(tag) {
                        mismatches.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    assert_eq!(mismatches.load(Ordering::SeqCst), 0);
    assert_eq!(
        db.table("tags").unwrap().count(),
        (THREADS * INSERTS_PER_THREAD) as i64
    );
}

#[test]
fn test_concurrent_inserts_generate_distinct_ids() {
    let db = setup_db();

    let mut ids: Vec<i64> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let db = db.clone();
                scope.spawn(move || {
                    (0..50)
                        .map(|i| {
                            db.table("tags")
                                .unwrap()
                                .insert(row! { "tag" => format!("{t}/{i}") })
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), THREADS * 50);
}
