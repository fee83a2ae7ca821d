//! Where cleaned tables go.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use hbs_config::DataLayout;
use polars::prelude::*;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Storage key of a cleaned table: `{year}_{table}`.
pub fn table_key(table: &str, year: u32) -> String {
    format!("{year}_{table}")
}

/// Destination for cleaned tables.
pub trait TableSink {
    /// Persist `df` for `(table, year)` and describe where it went.
    fn write(&mut self, table: &str, year: u32, df: &mut DataFrame) -> Result<String>;
}

/// Writes `{dir}/{year}_{table}.parquet`, creating `dir` on first use.
#[derive(Debug, Clone)]
pub struct ParquetSink {
    dir: PathBuf,
}

impl ParquetSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_layout(layout: &DataLayout) -> Self {
        Self::new(&layout.cleaned_data)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, table: &str, year: u32) -> PathBuf {
        self.dir.join(format!("{}.parquet", table_key(table, year)))
    }
}

impl TableSink for ParquetSink {
    fn write(&mut self, table: &str, year: u32, df: &mut DataFrame) -> Result<String> {
        fs::create_dir_all(&self.dir).map_err(|source| IngestError::FileWrite {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(table, year);
        write_parquet_table(&path, df)?;
        Ok(path.display().to_string())
    }
}

/// Write `df` to `path` as Parquet.
pub fn write_parquet_table(path: &Path, df: &mut DataFrame) -> Result<()> {
    let file = File::create(path).map_err(|source| IngestError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| IngestError::Parquet {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    debug!(path = %path.display(), rows = df.height(), "Wrote table");
    Ok(())
}

/// Read a table written by [`ParquetSink`].
pub fn read_parquet_table(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    ParquetReader::new(file)
        .finish()
        .map_err(|e| IngestError::Parquet {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Keeps cleaned tables in memory, keyed by [`table_key`].
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    tables: BTreeMap<String, DataFrame>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, table: &str, year: u32) -> Option<&DataFrame> {
        self.tables.get(&table_key(table, year))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl TableSink for MemorySink {
    fn write(&mut self, table: &str, year: u32, df: &mut DataFrame) -> Result<String> {
        let key = table_key(table, year);
        self.tables.insert(key.clone(), df.clone());
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parquet_sink_writes_keyed_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ParquetSink::new(dir.path().join("cleaned"));
        let mut df = df!("ID" => [1u32, 2], "Sex" => ["Male", "Female"]).unwrap();

        let target = sink.write("members", 1390, &mut df).unwrap();
        let path = dir.path().join("cleaned").join("1390_members.parquet");
        assert_eq!(target, path.display().to_string());

        let back = read_parquet_table(&path).unwrap();
        assert!(back.equals(&df));
    }

    #[test]
    fn memory_sink_keys() {
        let mut sink = MemorySink::new();
        let mut df = df!("A" => [1i64]).unwrap();
        sink.write("food", 1401, &mut df).unwrap();
        assert_eq!(sink.keys().collect::<Vec<_>>(), vec!["1401_food"]);
        assert!(sink.get("food", 1401).is_some());
        assert!(sink.get("food", 1400).is_none());
    }
}
