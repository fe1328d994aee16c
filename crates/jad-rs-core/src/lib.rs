//! # jad-rs-core
//!
//! Core types, settings and error types for the jad-rs framework.
//! This crate has zero framework dependencies and provides the foundation for all other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Framework settings and global configuration
//! - [`settings_loader`] - TOML/JSON/environment settings loading
//! - [`env`] - `.env` file parsing
//! - [`logging`] - Tracing-based logging integration

pub mod env;
pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{FieldErrors, JadError, JadResult};
pub use settings::{DatabaseSettings, Settings, SETTINGS};
