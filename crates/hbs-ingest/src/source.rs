//! Where raw tables come from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hbs_config::DataLayout;
use polars::prelude::DataFrame;

use crate::csv::read_csv_table;
use crate::error::{IngestError, Result};

/// Provider of raw extracts keyed by survey year and file identifier.
pub trait RawTableSource {
    fn load(&self, year: u32, file_code: &str) -> Result<DataFrame>;
}

/// Reads `{root}/{year}/{file_code}.csv`.
#[derive(Debug, Clone)]
pub struct CsvExtractSource {
    root: PathBuf,
}

impl CsvExtractSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_layout(layout: &DataLayout) -> Self {
        Self::new(&layout.extracted_data)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, year: u32, file_code: &str) -> PathBuf {
        self.root.join(year.to_string()).join(format!("{file_code}.csv"))
    }
}

impl RawTableSource for CsvExtractSource {
    fn load(&self, year: u32, file_code: &str) -> Result<DataFrame> {
        read_csv_table(&self.path_for(year, file_code))
    }
}

/// In-memory source, mostly for tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: BTreeMap<(u32, String), DataFrame>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table(mut self, year: u32, file_code: &str, df: DataFrame) -> Self {
        self.insert(year, file_code, df);
        self
    }

    pub fn insert(&mut self, year: u32, file_code: &str, df: DataFrame) {
        self.tables.insert((year, file_code.to_string()), df);
    }
}

impl RawTableSource for MemorySource {
    fn load(&self, year: u32, file_code: &str) -> Result<DataFrame> {
        self.tables
            .get(&(year, file_code.to_string()))
            .cloned()
            .ok_or_else(|| IngestError::MissingTable {
                year,
                file_code: file_code.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn extract_paths() {
        let source = CsvExtractSource::new("/data/extracted");
        assert_eq!(
            source.path_for(1390, "P1"),
            PathBuf::from("/data/extracted/1390/P1.csv")
        );
    }

    #[test]
    fn memory_source_round_trip() {
        let df = df!("A" => [1i64, 2]).unwrap();
        let source = MemorySource::new().with_table(1390, "P1", df.clone());
        assert!(source.load(1390, "P1").unwrap().equals(&df));
        assert!(matches!(
            source.load(1391, "P1"),
            Err(IngestError::MissingTable { year: 1391, .. })
        ));
    }
}
