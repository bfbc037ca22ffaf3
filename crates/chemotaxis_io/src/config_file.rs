//! Loading and saving [`AppConfig`] files.
//!
//! The format follows the file extension: `.toml` or `.json`. Loaded
//! configurations are validated before they are returned.

use crate::error::{IoError, Result};
use crate::serialization::{from_json, to_json_pretty};
use chemotaxis_core::config::AppConfig;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Picks the format from the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            other => Err(IoError::unsupported(format!(
                "config extension {:?} (expected .toml or .json)",
                other.unwrap_or("")
            ))),
        }
    }
}

/// Parses and validates configuration text.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<AppConfig> {
    let config: AppConfig = match format {
        ConfigFormat::Toml => toml::from_str(content)?,
        ConfigFormat::Json => from_json(content)?,
    };
    config
        .validate()
        .map_err(|e| IoError::validation(e.to_string()))?;
    Ok(config)
}

/// Reads, parses and validates the configuration at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    if !path.exists() {
        return Err(IoError::not_found(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("reading config from {:?}", path))
    })?;
    let config =
        parse_config(&content, format).map_err(|e| e.with_context(format!("loading {:?}", path)))?;
    tracing::info!(path = %path.display(), fingerprint = %config.fingerprint(), "Config loaded");
    Ok(config)
}

/// Writes `config` to `path` in the format implied by its extension.
pub fn save_config<P: AsRef<Path>>(config: &AppConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    let content = match ConfigFormat::from_path(path)? {
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Json => to_json_pretty(config)?,
    };
    std::fs::write(path, content).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("writing config to {:?}", path))
    })?;
    tracing::debug!(path = %path.display(), "Config saved");
    Ok(())
}
