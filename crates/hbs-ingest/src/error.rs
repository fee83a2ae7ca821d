//! Error types for reading raw extracts and writing cleaned tables.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or persisting tables.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Extract file not found.
    #[error("extract file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or write an output file or directory.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Parsing Errors ===
    /// Failed to parse CSV with Polars.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV header contains an empty column name.
    #[error("CSV file has an empty column name: {path}")]
    EmptyColumnName { path: PathBuf },

    // === Parquet Errors ===
    /// Failed to read or write a Parquet file.
    #[error("parquet I/O failed for {path}: {message}")]
    Parquet { path: PathBuf, message: String },

    // === Source Errors ===
    /// Table was not found in an in-memory source.
    #[error("no raw table '{file_code}' for year {year}")]
    MissingTable { year: u32, file_code: String },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/data/extracted/1390/P1.csv"),
        };
        assert_eq!(
            err.to_string(),
            "extract file not found: /data/extracted/1390/P1.csv"
        );
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let ingest_err: IngestError = polars_err.into();
        assert!(matches!(ingest_err, IngestError::DataFrame { .. }));
    }
}
