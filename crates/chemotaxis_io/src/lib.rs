//! # Chemotaxis IO
//!
//! File-facing collaborators of the simulation core.
//!
//! This crate provides:
//! - Structured error handling with custom error types
//! - JSON serialization helpers
//! - Configuration loading and saving (TOML or JSON)
//! - Statistics export (CSV, JSON, JSON lines)

/// Configuration file loading and saving
pub mod config_file;
/// Error types and result aliases for I/O operations
pub mod error;
/// Validated serialization helpers for JSON
pub mod serialization;
/// Statistics export
pub mod stats;

pub use config_file::{load_config, parse_config, save_config, ConfigFormat};
pub use error::{IoError, Result};
pub use serialization::{
    from_json, read_json_file, to_json, to_json_pretty, validate_json, write_json_file,
};
pub use stats::{StatsExporter, StatsFormat};
