//! Error types for settings loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or reading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a settings file.
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or write a local file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings text is not valid YAML.
    #[error("invalid YAML in {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Settings document root is not a mapping.
    #[error("settings document {origin} must be a mapping at the top level")]
    NotAMapping { origin: String },

    /// A mapping key that cannot be used as a key-path segment.
    #[error("unsupported key {key} in {origin}")]
    InvalidKey { origin: String, key: String },

    /// Required key-path is absent from the merged settings.
    #[error("missing setting: {path}")]
    MissingKey { path: String },

    /// Setting exists but has the wrong shape.
    #[error("setting {path} must be {expected}, found {found}")]
    InvalidValue {
        path: String,
        expected: &'static str,
        found: String,
    },

    /// Year selection text could not be parsed.
    #[error("invalid year selection '{input}': {reason}")]
    InvalidYears { input: String, reason: String },

    /// Selected year lies outside the configured survey range.
    #[error("year {year} is outside the available range {first}-{last}")]
    YearOutOfRange { year: u32, first: u32, last: u32 },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
