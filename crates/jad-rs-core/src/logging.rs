//! Logging integration for the jad-rs framework.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings), for managing an on-disk log file
//! and for creating per-query spans.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use crate::error::JadResult;
use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level` (e.g. "debug", "info",
/// "`jad_rs_db=debug`"). In debug mode a pretty, human-readable format is
/// used; otherwise a structured JSON format is used. When `settings.log_file`
/// is set, output is appended to that file (created along with its parent
/// directories) instead of stderr.
///
/// Installing a subscriber twice is not an error; the second call is a no-op.
pub fn setup_logging(settings: &Settings) -> JadResult<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = &settings.log_file {
        let file = open_log_file(path)?;
        let builder = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(Mutex::new(file));
        if settings.debug {
            builder.try_init().ok();
        } else {
            builder.json().try_init().ok();
        }
        return Ok(());
    }

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
    Ok(())
}

/// Truncates the log file, creating it if needed.
pub fn clear_log(path: impl AsRef<Path>) -> JadResult<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    std::fs::write(path, "")?;
    Ok(())
}

/// Returns the whole content of the log file, creating an empty one if it
/// does not exist yet.
pub fn read_log(path: impl AsRef<Path>) -> JadResult<String> {
    let path = path.as_ref();
    open_log_file(path)?;
    Ok(std::fs::read_to_string(path)?)
}

/// Creates a tracing span for a single query-builder terminal.
///
/// # Examples
///
/// ```
/// use jad_rs_core::logging::query_span;
///
/// let span = query_span("users", "select");
/// let _guard = span.enter();
/// tracing::info!("running query");
/// ```
pub fn query_span(table: &str, operation: &'static str) -> tracing::Span {
    tracing::info_span!("query", table = table, operation = operation)
}

fn open_log_file(path: &Path) -> JadResult<std::fs::File> {
    ensure_parent(path)?;
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

fn ensure_parent(path: &Path) -> JadResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
