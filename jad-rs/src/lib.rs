//! # jad-rs
//!
//! A small MVC framework core for Rust.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `jad-rs` to get the entire framework, or depend on
//! individual crates for finer-grained control.
//!
//! ## Example
//!
//! ```rust
//! use jad_rs::core::settings::{DatabaseSettings, Settings};
//! use jad_rs::db::row;
//!
//! let mut settings = Settings::default();
//! settings
//!     .databases
//!     .insert("default".into(), DatabaseSettings::sqlite_memory());
//!
//! let db = jad_rs::bootstrap(&settings).unwrap();
//! assert!(db.is_booted());
//! assert_eq!(db.table("missing").unwrap().insert(row! { "a" => 1 }), None);
//! ```

use tracing::info;

/// Core types, settings, logging, and error types.
pub use jad_rs_core as core;

/// Query builder, result collections, models, and validation.
pub use jad_rs_db as db;

/// Database backends: `SQLite`, and `MySQL` with the `mysql` feature.
pub use jad_rs_db_backends as db_backends;

/// Testing utilities.
#[cfg(feature = "testing")]
pub use jad_rs_test as test;

pub use chrono;
pub use serde;
pub use serde_json;

pub use jad_rs_core::{JadError, JadResult, Settings};
pub use jad_rs_db::{Collection, Db, Entity, Model, ModelMeta, QueryBuilder, Row, Value};

/// Boots the framework from `settings`.
///
/// Installs the tracing subscriber, opens the `default` database and
/// returns a dispatcher bound to it. Query logging follows
/// `settings.query_debug`.
///
/// A missing `default` alias or an unsupported engine is
/// [`JadError::ImproperlyConfigured`].
pub fn bootstrap(settings: &Settings) -> JadResult<Db> {
    jad_rs_core::logging::setup_logging(settings)?;
    let database = settings.default_database()?;
    let connection = jad_rs_db_backends::connect(database)?;
    info!(
        app = %settings.app_name,
        vendor = connection.vendor(),
        query_debug = settings.query_debug,
        "Framework booted"
    );
    Ok(Db::new(connection).with_query_debug(settings.query_debug))
}
