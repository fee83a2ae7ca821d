//! Error types for metadata loading, resolution and column lookup.

use std::path::PathBuf;
use thiserror::Error;

use hbs_config::ConfigError;

/// Errors raised while loading or interpreting metadata documents.
#[derive(Debug, Error)]
pub enum MetadataError {
    // === Configuration ===
    /// Settings lookup failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Metadata file could not be read.
    #[error("failed to read metadata file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata text is not valid YAML.
    #[error("invalid YAML in {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Document root is not a mapping.
    #[error("metadata document {origin} must be a mapping at the top level")]
    NotAMapping { origin: String },

    /// A mapping key that is neither text nor an integer.
    #[error("unsupported mapping key {key} in {origin}")]
    UnsupportedKey { origin: String, key: String },

    /// A year-range key that parses but is not a valid range.
    #[error("invalid year range '{key}' in {origin}: {reason}")]
    InvalidYearRange {
        origin: String,
        key: String,
        reason: &'static str,
    },

    /// No document with that name is configured or loaded.
    #[error("unknown metadata document '{name}'")]
    UnknownDocument { name: String },

    /// Interpreter name in settings is not one of the known transforms.
    #[error("unknown interpreter '{interpreter}' configured for document '{document}'")]
    UnknownInterpreter {
        document: String,
        interpreter: String,
    },

    /// Placeholder could not be resolved against the interpreter context.
    #[error("unresolved placeholder '{{{{{placeholder}}}}}' in document '{document}': {reason}")]
    UnresolvedPlaceholder {
        document: String,
        placeholder: String,
        reason: &'static str,
    },

    // === Resolution ===
    /// No year branch matched and no fallback exists.
    #[error("no metadata branch of '{field}' applies to year {year}")]
    Resolution { field: String, year: u32 },

    // === Schema ===
    /// Table is not described by the tables document.
    #[error("table '{table}' is not defined in the metadata")]
    UnknownTable { table: String },

    /// Table-level metadata is malformed.
    #[error("invalid metadata for table '{table}': {reason}")]
    InvalidTable { table: String, reason: String },

    /// A listed column entry is neither a sentinel nor a well-formed mapping.
    #[error("invalid metadata for column '{column}' of table '{table}': {reason}")]
    Schema {
        table: String,
        column: String,
        reason: String,
    },

    /// Unrecognized declared type or malformed type parameters.
    #[error("cannot coerce column '{column}' of table '{table}': {reason}")]
    ValueCoercion {
        table: String,
        column: String,
        reason: String,
    },

    /// Classification document entry is malformed.
    #[error("invalid classification '{name}': {reason}")]
    InvalidClassification { name: String, reason: String },
}

impl MetadataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn schema(table: &str, column: &str, reason: impl Into<String>) -> Self {
        Self::Schema {
            table: table.to_string(),
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn coercion(table: &str, column: &str, reason: impl Into<String>) -> Self {
        Self::ValueCoercion {
            table: table.to_string(),
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for metadata operations.
pub type Result<T> = std::result::Result<T, MetadataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_display() {
        let err = MetadataError::Resolution {
            field: "household.file_code".to_string(),
            year: 1400,
        };
        assert_eq!(
            err.to_string(),
            "no metadata branch of 'household.file_code' applies to year 1400"
        );
    }

    #[test]
    fn test_placeholder_display() {
        let err = MetadataError::UnresolvedPlaceholder {
            document: "tables".to_string(),
            placeholder: "codes.sex".to_string(),
            reason: "no such key",
        };
        assert_eq!(
            err.to_string(),
            "unresolved placeholder '{{codes.sex}}' in document 'tables': no such key"
        );
    }
}
