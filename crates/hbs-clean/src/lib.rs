//! Cleaning of raw survey tables.
//!
//! Each raw column is looked up in the year-resolved table metadata and then
//! substituted, sanitized and coerced to its declared type
//! ([`clean_column`]). [`TableAssembler`] does this for whole tables and
//! drives batches of (table, year) pairs from a [`hbs_ingest::RawTableSource`]
//! to a [`hbs_ingest::TableSink`].

mod assembler;
mod classify;
mod error;
mod pipeline;
mod sanitize;

// === Error Types ===
pub use error::{CleanError, Result};

// === Column Pipeline ===
pub use pipeline::{apply_replacements, clean_column, coerce};
pub use sanitize::{sanitize_column, sanitize_text};

// === Table Assembly ===
pub use assembler::{BatchProgress, BatchSummary, PairSummary, TableAssembler};

// === Classification ===
pub use classify::{ClassificationRequest, add_classification, level_column_name};
