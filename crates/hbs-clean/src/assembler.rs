//! Table assembly: metadata lookup plus column cleaning for whole tables.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use hbs_ingest::{RawTableSource, TableSink};
use hbs_metadata::{ColumnMetadata, MetadataContext};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::error::{CleanError, Result};
use crate::pipeline::clean_column;

/// Cleans raw tables against a loaded [`MetadataContext`].
#[derive(Debug, Clone, Copy)]
pub struct TableAssembler<'a> {
    context: &'a MetadataContext,
}

/// Emitted before each (table, year) pair of a batch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress<'a> {
    /// Zero-based position in the batch.
    pub index: usize,
    pub total: usize,
    pub table: &'a str,
    pub year: u32,
}

/// Outcome of one cleaned (table, year) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairSummary {
    pub table: String,
    pub year: u32,
    pub file_code: String,
    pub rows: usize,
    pub columns: usize,
    /// Where the sink put the table.
    pub target: String,
    pub elapsed_ms: u64,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub pairs: Vec<PairSummary>,
    pub elapsed_ms: u64,
}

impl BatchSummary {
    pub fn total_rows(&self) -> usize {
        self.pairs.iter().map(|pair| pair.rows).sum()
    }
}

impl<'a> TableAssembler<'a> {
    pub fn new(context: &'a MetadataContext) -> Self {
        Self { context }
    }

    /// Clean one raw table as `table` for `year`.
    ///
    /// Columns keep their raw order. A dropped column is omitted; a column
    /// the metadata rejects fails the whole table.
    pub fn clean(&self, raw: &DataFrame, year: u32, table: &str) -> Result<DataFrame> {
        let span = info_span!("clean_table", table, year);
        let _guard = span.enter();

        let metadata = self.context.table_metadata(table, year)?;
        let sanitize = metadata.settings().sanitize;
        let mut columns: Vec<Column> = Vec::with_capacity(raw.width());
        let mut sources: HashMap<String, String> = HashMap::new();

        for raw_column in raw.get_columns() {
            let raw_name = raw_column.name().to_string();
            match metadata.lookup(&raw_name) {
                ColumnMetadata::Drop => {
                    debug!(column = %raw_name, "Dropping column");
                }
                ColumnMetadata::Error => {
                    return Err(CleanError::UnexpectedColumn {
                        table: table.to_string(),
                        year,
                        column: raw_name,
                    });
                }
                ColumnMetadata::Keep(spec) => {
                    if let Some(first) = sources.get(&spec.new_name) {
                        return Err(CleanError::DuplicateColumn {
                            table: table.to_string(),
                            year,
                            column: spec.new_name,
                            first: first.clone(),
                            second: raw_name,
                        });
                    }
                    let cleaned = clean_column(raw_column, &spec, sanitize)?;
                    debug!(
                        column = %raw_name,
                        new_name = %spec.new_name,
                        declared = spec.declared.name(),
                        dtype = %cleaned.dtype(),
                        "Cleaned column"
                    );
                    sources.insert(spec.new_name, raw_name);
                    columns.push(cleaned);
                }
            }
        }

        let df = DataFrame::new(columns)?;
        debug!(rows = df.height(), columns = df.width(), "Assembled table");
        Ok(df)
    }

    /// Raw extract of `table` for `year`, with the file identifier it was read from.
    pub fn load_raw<S>(&self, table: &str, year: u32, source: &S) -> Result<(String, DataFrame)>
    where
        S: RawTableSource + ?Sized,
    {
        let file_code = self
            .context
            .resolve_file_identifier(table, year)?
            .ok_or_else(|| CleanError::TableUnavailable {
                table: table.to_string(),
                year,
            })?;
        let raw = source.load(year, &file_code)?;
        Ok((file_code, raw))
    }

    /// Clean every `(table, year)` pair, table-major, writing each to `sink`.
    ///
    /// Pairs run strictly in order and the first failure stops the batch;
    /// tables already written stay written.
    pub fn clean_batch<S, K, F>(
        &self,
        tables: &[String],
        years: &[u32],
        source: &S,
        sink: &mut K,
        mut progress: F,
    ) -> Result<BatchSummary>
    where
        S: RawTableSource + ?Sized,
        K: TableSink + ?Sized,
        F: FnMut(BatchProgress<'_>),
    {
        let started = Instant::now();
        let total = tables.len() * years.len();
        let mut summary = BatchSummary::default();

        let pairs = tables
            .iter()
            .flat_map(|table| years.iter().map(move |year| (table.as_str(), *year)));
        for (index, (table, year)) in pairs.enumerate() {
            progress(BatchProgress {
                index,
                total,
                table,
                year,
            });
            let pair_started = Instant::now();

            let (file_code, raw) = self.load_raw(table, year, source)?;
            let mut cleaned = self.clean(&raw, year, table)?;
            let target = sink.write(table, year, &mut cleaned)?;

            let elapsed = pair_started.elapsed();
            info!(
                table,
                year,
                file_code = %file_code,
                rows = cleaned.height(),
                columns = cleaned.width(),
                elapsed_ms = millis(elapsed),
                "Cleaned table"
            );
            summary.pairs.push(PairSummary {
                table: table.to_string(),
                year,
                file_code,
                rows: cleaned.height(),
                columns: cleaned.width(),
                target,
                elapsed_ms: millis(elapsed),
            });
        }

        summary.elapsed_ms = millis(started.elapsed());
        Ok(summary)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
