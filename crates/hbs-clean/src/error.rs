//! Error types for cleaning survey tables.

use thiserror::Error;

use hbs_ingest::IngestError;
use hbs_metadata::MetadataError;

/// Errors that stop cleaning of a (table, year) unit.
#[derive(Debug, Error)]
pub enum CleanError {
    /// Metadata could not be resolved or is malformed.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Raw extract could not be read or the cleaned table not written.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Raw column not listed in the metadata under an `error` policy.
    #[error("column '{column}' of table '{table}' ({year}) is not described in the metadata")]
    UnexpectedColumn {
        table: String,
        year: u32,
        column: String,
    },

    /// The table has no extract file in that year.
    #[error("table '{table}' is not available for year {year}")]
    TableUnavailable { table: String, year: u32 },

    /// Two raw columns map to the same cleaned name.
    #[error("columns '{first}' and '{second}' of table '{table}' ({year}) both map to '{column}'")]
    DuplicateColumn {
        table: String,
        year: u32,
        column: String,
        first: String,
        second: String,
    },

    /// Column needed for classification is absent.
    #[error("column '{column}' not found")]
    ColumnNotFound { column: String },

    /// Requested classification level does not fit the code width.
    #[error("classification '{name}' has no level {level} (code width {width})")]
    InvalidLevel { name: String, level: u32, width: u32 },

    /// Classification request text could not be parsed.
    #[error("invalid classification request '{input}': {reason}")]
    InvalidClassificationRequest { input: String, reason: String },

    /// Polars DataFrame operation error.
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

/// Result type for cleaning operations.
pub type Result<T> = std::result::Result<T, CleanError>;
