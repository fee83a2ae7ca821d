//! Settings, data layout and metadata loaded together for one run.

use std::path::Path;

use anyhow::{Context, Result, bail};
use hbs_clean::{BatchProgress, BatchSummary, ClassificationRequest, TableAssembler};
use hbs_config::{DataLayout, SettingsStore, SetupOutcome, setup_metadata, setup_settings};
use hbs_ingest::{CsvExtractSource, ParquetSink, read_parquet_table, stack_tables};
use hbs_metadata::{DOCUMENTS, MetadataContext};
use polars::prelude::DataFrame;
use tracing::{debug, info};

/// Which version of a table to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableForm {
    /// The extract as delivered, read from the extract directory.
    Raw,
    /// The output of `clean`, read from the cleaned directory.
    Cleaned,
}

/// Everything a command needs, loaded from a package and a root directory.
#[derive(Debug)]
pub struct Workspace {
    pub layout: DataLayout,
    pub context: MetadataContext,
}

impl Workspace {
    pub fn load(package_dir: &Path, root_dir: &Path) -> Result<Self> {
        let settings = SettingsStore::load(package_dir, root_dir).context("load settings")?;
        let layout = DataLayout::from_settings(&settings).context("resolve data layout")?;
        let context = MetadataContext::load(settings).context("load metadata")?;
        debug!(
            package_dir = %package_dir.display(),
            root_dir = %root_dir.display(),
            local_dir = %layout.local_dir.display(),
            "Loaded workspace"
        );
        Ok(Self { layout, context })
    }

    /// Write the local settings sample and copies of the package metadata
    /// into `root_dir`. Existing files are kept unless `replace` is set.
    pub fn bootstrap(package_dir: &Path, root_dir: &Path, replace: bool) -> Result<Vec<SetupOutcome>> {
        let settings = SettingsStore::load(package_dir, root_dir).context("load settings")?;
        let mut outcomes = vec![setup_settings(&settings, replace).context("write local settings")?];
        outcomes.extend(setup_metadata(&settings, &DOCUMENTS, replace).context("copy package metadata")?);
        Ok(outcomes)
    }

    /// Tables to process: every described table when `requested` is empty.
    pub fn select_tables(&self, requested: &[String]) -> Result<Vec<String>> {
        let known = self.context.table_names().context("list tables")?;
        if requested.is_empty() {
            return Ok(known);
        }
        for table in requested {
            if !known.contains(table) {
                bail!(
                    "unknown table '{table}' (known tables: {})",
                    known.join(", ")
                );
            }
        }
        Ok(requested.to_vec())
    }

    /// Clean every (table, year) pair from the extract directory into the
    /// cleaned directory.
    pub fn clean<F>(&self, tables: &[String], years: &[u32], progress: F) -> Result<BatchSummary>
    where
        F: FnMut(BatchProgress<'_>),
    {
        self.layout.ensure_dirs().context("create data directories")?;
        let source = CsvExtractSource::from_layout(&self.layout);
        let mut sink = ParquetSink::from_layout(&self.layout);
        info!(
            tables = tables.len(),
            years = years.len(),
            output = %self.layout.cleaned_data.display(),
            "Starting batch"
        );
        TableAssembler::new(&self.context)
            .clean_batch(tables, years, &source, &mut sink, progress)
            .context("clean batch")
    }

    /// Load `table` for every year in `years` and stack the parts in order.
    ///
    /// Each classification is resolved for the year of the part it labels.
    pub fn load_table(
        &self,
        table: &str,
        years: &[u32],
        form: TableForm,
        classify: &[ClassificationRequest],
    ) -> Result<DataFrame> {
        self.select_tables(&[table.to_string()])?;
        let assembler = TableAssembler::new(&self.context);
        let source = CsvExtractSource::from_layout(&self.layout);
        let cleaned = ParquetSink::from_layout(&self.layout);

        let mut parts = Vec::with_capacity(years.len());
        for &year in years {
            let mut part = match form {
                TableForm::Raw => {
                    assembler
                        .load_raw(table, year, &source)
                        .with_context(|| format!("load raw '{table}' for {year}"))?
                        .1
                }
                TableForm::Cleaned => read_parquet_table(&cleaned.path_for(table, year))
                    .with_context(|| format!("load cleaned '{table}' for {year}"))?,
            };
            for request in classify {
                part = request
                    .apply(&part, &self.context, year)
                    .with_context(|| format!("classify {request} for {year}"))?;
            }
            parts.push(part);
        }

        let df = stack_tables(parts).context("stack yearly tables")?;
        info!(table, years = years.len(), rows = df.height(), columns = df.width(), "Loaded table");
        Ok(df)
    }
}
