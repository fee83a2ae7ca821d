//! Raw extract loading and cleaned table persistence.
//!
//! Raw extracts are CSV files under `{extracted_data}/{year}/{file_code}.csv`;
//! cleaned tables are written as Parquet to
//! `{cleaned_data}/{year}_{table}.parquet`. Both ends sit behind small traits
//! ([`RawTableSource`], [`TableSink`]) so batch cleaning can run against
//! memory in tests. Per-year parts of one table are combined with
//! [`stack_tables`].

mod csv;
mod error;
mod sink;
mod source;
mod stack;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use csv::{read_csv_table, validate_dataframe_shape};

// === Sources ===
pub use source::{CsvExtractSource, MemorySource, RawTableSource};

// === Sinks ===
pub use sink::{
    MemorySink, ParquetSink, TableSink, read_parquet_table, table_key, write_parquet_table,
};

// === Stacking ===
pub use stack::stack_tables;
