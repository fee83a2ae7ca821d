//! Typed view of the data directory layout.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::settings::SettingsTable;

/// Data directories and the survey year range derived from settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    /// Root of all local data.
    pub local_dir: PathBuf,
    /// Raw per-year extracts: `{extracted_data}/{year}/{file_code}.csv`.
    pub extracted_data: PathBuf,
    /// Cleaned tables: `{cleaned_data}/{year}_{table}.parquet`.
    pub cleaned_data: PathBuf,
    pub first_year: u32,
    pub last_year: u32,
}

impl DataLayout {
    /// `local_directory` is used as-is when absolute, otherwise it is placed
    /// under the root directory (`in_root: true`) or the package directory.
    pub fn from_settings(settings: &SettingsTable) -> Result<Self> {
        let local = settings.get_path(&["local_directory"])?;
        let local_dir = if local.is_absolute() {
            local
        } else if settings.get_bool(&["in_root"])? {
            settings.root_dir().join(local)
        } else {
            settings.package_dir().join(local)
        };

        let first_year = settings.get_u32(&["first_year"])?;
        let last_year = settings.get_u32(&["last_year"])?;
        if first_year > last_year {
            return Err(ConfigError::InvalidValue {
                path: "first_year".to_string(),
                expected: "a year not after last_year",
                found: first_year.to_string(),
            });
        }

        Ok(Self {
            extracted_data: local_dir.join(settings.get_path(&["extracted_data"])?),
            cleaned_data: local_dir.join(settings.get_path(&["cleaned_data"])?),
            local_dir,
            first_year,
            last_year,
        })
    }

    /// Directory holding the raw extracts of one year.
    pub fn extracted_year_dir(&self, year: u32) -> PathBuf {
        self.extracted_data.join(year.to_string())
    }

    /// Create the data directories if they do not exist.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.local_dir, &self.extracted_data, &self.cleaned_data] {
            create_dir(dir)?;
        }
        Ok(())
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| ConfigError::io(dir, e))
}
